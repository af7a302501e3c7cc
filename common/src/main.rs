use anyhow::Result;
use clap::Parser;
use minesweeper_ai::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "minesweeper-ai")]
#[command(about = "Autonomous Minesweeper bot driven by logical inference")]
#[command(version = "0.1.0")]
struct Cli {
    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board height (overrides config)
    #[arg(long)]
    height: Option<usize>,

    /// Board width (overrides config)
    #[arg(long)]
    width: Option<usize>,

    /// Number of mines (overrides config)
    #[arg(short, long)]
    mines: Option<usize>,

    /// Seed for mine placement and guesses
    #[arg(short, long)]
    seed: Option<u64>,

    /// Pause between moves in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print the knowledge base after every move
    #[arg(long)]
    show_knowledge: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_with_cli(&CliOverrides {
        height: cli.height,
        width: cli.width,
        mines: cli.mines,
        seed: cli.seed,
        delay_ms: cli.delay_ms,
        show_knowledge: cli.show_knowledge,
    });
    settings.validate()?;

    // --- 1. Initialization ---
    let seed = settings.bot.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(&settings, &mut rng);
    let delay = Duration::from_millis(settings.bot.delay_ms);

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: Play cells proven safe, guess randomly otherwise.");
    println!(
        "Board: {}x{} with {} mines (seed {})",
        settings.board.height, settings.board.width, settings.board.mines, seed
    );
    print_board(&game);

    // --- 2. Game Loop ---
    let mut move_count = 0;
    while game.game_state == GameState::Playing {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        let Some(mv) = game.step(&mut rng)? else {
            println!("No valid moves left for the bot to make.");
            break;
        };

        match mv.source {
            MoveSource::Deduced => println!("Logic found a guaranteed safe cell."),
            MoveSource::Random => {
                println!("No logically safe move found. Making a random guess...")
            }
        }
        match mv.revealed {
            Some(count) => println!("Bot reveals {}: {} adjacent mines.", mv.cell, count),
            None => println!("Bot reveals {}: it was a mine!", mv.cell),
        }
        println!(
            "Known safe: {}, known mines: {}, statements: {}",
            game.agent.safes().len(),
            game.agent.mines().len(),
            game.agent.knowledge().len()
        );
        if settings.bot.show_knowledge {
            for constraint in game.agent.knowledge() {
                println!("  {}", constraint);
            }
        }

        print_board(&game);

        thread::sleep(delay);
    }

    // --- 3. Final Result ---
    println!("\n--- Game Over ---");
    println!("Mine layout:");
    print!("{}", game.board);

    match game.game_state {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }

    Ok(())
}

fn print_board(game: &Game) {
    // Print header
    print!("   ");
    for col in 0..game.board.width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(game.board.width));

    // Print rows
    for (row, tiles) in game.tiles().iter().enumerate() {
        print!("{:^2}|", row);
        for tile in tiles {
            let display = match tile {
                Tile::Hidden => " ■ ".to_string(),
                Tile::Flagged => " F ".to_string(),
                Tile::Revealed(n) => format!(" {} ", n),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
