use minesweeper_ai as ms;
use wasm_bindgen::prelude::*;

fn load(bts: &[u8]) -> Result<ms::Game, String> {
    ms::Game::deserialize(bts).map_err(|e| e.to_string())
}

fn store(game: &ms::Game) -> Result<Vec<u8>, String> {
    game.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn create_game(height: u8, width: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut settings = ms::Settings::default();
    settings.board.height = height as usize;
    settings.board.width = width as usize;
    settings.board.mines = mines as usize;
    settings.validate().map_err(|e| e.to_string())?;

    let game = ms::Game::new(&settings, &mut rand::rng());
    store(&game)
}

#[wasm_bindgen]
pub fn is_won(bts: Vec<u8>) -> Result<bool, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game.game_state == ms::GameState::Won)
}

/// Reveals a cell chosen by the player. The last byte of the result is 0 if the
/// cell was safe and 1 if it was a mine.
#[wasm_bindgen]
pub fn choose_cell(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    let res = game
        .reveal_cell(ms::Cell { row, col })
        .map_err(|e| e.to_string())?;
    let mut xs = store(&game)?;
    xs.push(if res.is_some() { 0 } else { 1 });
    Ok(xs)
}

/// Lets the agent play one move. Same trailing byte as `choose_cell`, or 2 when
/// no move was left.
#[wasm_bindgen]
pub fn step(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = load(&bts)?;
    let mv = game.step(&mut rand::rng()).map_err(|e| e.to_string())?;
    let mut xs = store(&game)?;
    xs.push(match mv {
        Some(ms::Move {
            revealed: Some(_), ..
        }) => 0,
        Some(_) => 1,
        None => 2,
    });
    Ok(xs)
}

/// The agent's proven-safe suggestion as `[row, col]`, empty if it has none.
#[wasm_bindgen]
pub fn next_safe_move(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game
        .agent
        .next_safe_move()
        .map(|cell| vec![cell.row as u32, cell.col as u32])
        .unwrap_or_default())
}

/// Row-major tiles: -1 hidden, -2 flagged, otherwise the adjacent mine count.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = load(&bts)?;
    Ok(game
        .tiles()
        .into_iter()
        .flatten()
        .map(|tile| match tile {
            ms::Tile::Hidden => -1,
            ms::Tile::Flagged => -2,
            ms::Tile::Revealed(n) => n as i8,
        })
        .collect())
}
