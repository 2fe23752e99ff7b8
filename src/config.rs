// Configuration module for reading Snafu.toml
// Board geometry, round pacing, spawn slots and the debug tick log all live here

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::player::{SpawnSlot, PLAYER_FLAGS};
use crate::types::{Cell, Coord};

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub board: BoardConfig,
    pub game: GameConfig,
    #[serde(default)]
    pub players: Vec<PlayerSlotConfig>,
    pub debug: DebugConfig,
}

/// Board dimensions and the colour cleared cells take
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub width: u32,
    pub height: u32,
    pub background: [u8; 3],
}

impl BoardConfig {
    pub fn background_cell(&self) -> Cell {
        Cell::with_color(self.background[0], self.background[1], self.background[2])
    }
}

/// Who gains a point when a player is eliminated
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// Every registered player, including ones already out
    EveryPlayer,
    /// Only players still alive after the elimination
    SurvivorsOnly,
}

/// Round pacing and rules
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub number_players: usize,
    /// Milliseconds between ticks
    pub frequency_ms: u64,
    pub frequency_min_ms: u64,
    pub frequency_max_ms: u64,
    pub scoring: ScoringRule,
    /// Fixed RNG seed; random per process when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Configured range as (low, high), whichever order the bounds were given in
    pub fn frequency_bounds(&self) -> (u64, u64) {
        let (a, b) = (self.frequency_min_ms, self.frequency_max_ms);
        (a.min(b), a.max(b))
    }

    /// Clamps a requested tick interval into the configured range
    pub fn clamp_frequency(&self, frequency_ms: u64) -> u64 {
        let (low, high) = self.frequency_bounds();
        frequency_ms.clamp(low, high)
    }
}

/// One configured spawn position and trail colour
#[derive(Debug, Deserialize, Clone)]
pub struct PlayerSlotConfig {
    pub x: i32,
    pub y: i32,
    pub color: [u8; 3],
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snafu.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let config: Config =
            toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Snafu.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snafu.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the values in Snafu.toml
    pub fn default_hardcoded() -> Self {
        Config {
            board: BoardConfig {
                width: 45,
                height: 30,
                background: [128, 128, 128],
            },
            game: GameConfig {
                number_players: 4,
                frequency_ms: 85,
                frequency_min_ms: 2,
                frequency_max_ms: 500,
                scoring: ScoringRule::EveryPlayer,
                seed: None,
            },
            players: vec![
                PlayerSlotConfig { x: 6, y: 15, color: [255, 0, 0] },
                PlayerSlotConfig { x: 39, y: 15, color: [0, 0, 255] },
                PlayerSlotConfig { x: 22, y: 6, color: [0, 80, 0] },
                PlayerSlotConfig { x: 22, y: 24, color: [255, 0, 255] },
            ],
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snafu_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: Could not load Snafu.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Rejects configurations the engine cannot run
    pub fn validate(&self) -> Result<(), String> {
        if self.board.width == 0 || self.board.height == 0 {
            return Err(format!(
                "Board must be at least 1x1 (got {}x{})",
                self.board.width, self.board.height
            ));
        }
        if self.game.frequency_min_ms == 0 || self.game.frequency_min_ms > self.game.frequency_max_ms {
            return Err(format!(
                "Invalid frequency range {}..={} ms",
                self.game.frequency_min_ms, self.game.frequency_max_ms
            ));
        }
        if self.game.number_players > u8::MAX as usize {
            return Err(format!("Too many players: {}", self.game.number_players));
        }
        for (i, slot) in self.players.iter().enumerate() {
            if slot.x < 0
                || slot.y < 0
                || slot.x >= self.board.width as i32
                || slot.y >= self.board.height as i32
            {
                return Err(format!(
                    "Spawn slot {} at ({}, {}) lies outside the {}x{} board",
                    i + 1,
                    slot.x,
                    slot.y,
                    self.board.width,
                    self.board.height
                ));
            }
        }
        Ok(())
    }

    /// Spawn slot for player `index`.
    ///
    /// Configured slots are used first. Further players are spread across the
    /// middle row with colours stepped evenly through the byte range.
    pub fn spawn_slot(&self, index: usize) -> SpawnSlot {
        if let Some(slot) = self.players.get(index) {
            return SpawnSlot {
                position: Coord::new(slot.x, slot.y),
                cell: Cell::new(PLAYER_FLAGS, slot.color[0], slot.color[1], slot.color[2]),
            };
        }

        let n = self.game.number_players.max(1) as i32;
        let width = self.board.width as i32;
        let height = self.board.height as i32;
        let i = index as i32;

        let x = (5 + i * ((width - 10).max(0) / n)).clamp(0, (width - 1).max(0));
        let y = height / 2;

        let step = i * (0xff / n);
        let red = !step as u8;
        let green = step as u8;
        let blue = (!step >> 1) as u8;

        SpawnSlot {
            position: Coord::new(x, y),
            cell: Cell::new(PLAYER_FLAGS, red, green, blue),
        }
    }
}
