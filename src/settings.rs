//! Run settings
//!
//! Loaded from an optional JSON file; anything missing falls back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::TARGET_FPS;

/// Run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Loop ===
    /// Frames per second the loop aims for
    pub target_fps: u32,
    /// Stop after this many ticks (headless runs)
    pub max_ticks: Option<u64>,
    /// Headless surface logs a summary every N frames
    pub log_every_frames: u64,

    // === Board scale ===
    /// Cell edge in pixels
    pub cell_size_px: i32,
    /// Cell edge in meters
    pub cell_size_m: f32,

    // === HUD ===
    /// Report cooldown progress of busy pieces
    pub cooldown_overlay: bool,

    // === Demo input ===
    pub bot_seed: u64,
    /// Time between bot clicks
    pub bot_interval_ms: u64,
    /// Time before the bot moves the same piece again
    pub bot_piece_cooldown_ms: u64,

    // === Content ===
    /// Directory of piece types; the built-in set is used when unset
    pub pieces_dir: Option<PathBuf>,
    /// Board layout CSV; required together with `pieces_dir`
    pub board_csv: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_fps: TARGET_FPS,
            max_ticks: None,
            log_every_frames: 60,

            cell_size_px: 100,
            cell_size_m: 1.0,

            cooldown_overlay: true,

            bot_seed: 0x5eed,
            bot_interval_ms: 250,
            bot_piece_cooldown_ms: 2000,

            pieces_dir: None,
            board_csv: None,
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Could not read {}: {e}; using default settings", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings in {}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Both content paths, if the game should be loaded from disk
    pub fn content_paths(&self) -> Option<(&Path, &Path)> {
        match (&self.pieces_dir, &self.board_csv) {
            (Some(pieces), Some(board)) => Some((pieces.as_path(), board.as_path())),
            _ => None,
        }
    }
}
