//! Configuration for the board, the inference engine and the autoplay bot.

use crate::engine::EngineConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub board: BoardConfig,
    pub engine: EngineConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Seed for mine placement and guesses. A fresh seed is drawn when absent.
    pub seed: Option<u64>,
    /// Pause between moves so a game can be watched.
    pub delay_ms: u64,
    /// Print every known statement after each move.
    pub show_knowledge: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board: BoardConfig {
                height: 8,
                width: 8,
                mines: 8,
            },
            engine: EngineConfig::default(),
            bot: BotConfig {
                seed: None,
                delay_ms: 500,
                show_knowledge: false,
            },
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let BoardConfig {
            height,
            width,
            mines,
        } = self.board;

        if height == 0 || width == 0 {
            anyhow::bail!("Board dimensions must be positive, got {}x{}", height, width);
        }

        if mines >= height * width {
            anyhow::bail!(
                "Total mines ({}) must be less than the number of cells on a {}x{} board",
                mines,
                height,
                width
            );
        }

        if self.engine.max_passes == 0 {
            anyhow::bail!("Closure pass limit must be positive");
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, overrides: &CliOverrides) {
        if let Some(height) = overrides.height {
            self.board.height = height;
        }
        if let Some(width) = overrides.width {
            self.board.width = width;
        }
        if let Some(mines) = overrides.mines {
            self.board.mines = mines;
        }
        if let Some(seed) = overrides.seed {
            self.bot.seed = Some(seed);
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.bot.delay_ms = delay_ms;
        }
        if overrides.show_knowledge {
            self.bot.show_knowledge = true;
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub height: Option<usize>,
    pub width: Option<usize>,
    pub mines: Option<usize>,
    pub seed: Option<u64>,
    pub delay_ms: Option<u64>,
    pub show_knowledge: bool,
}
