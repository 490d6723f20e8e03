//! Cell Clash - a real-time grid board game engine
//!
//! Core modules:
//! - `sim`: Piece state machines, timed physics, tick loop, captures and win detection
//! - `board`: Cell/pixel/meter coordinate system
//! - `moves`: Per-piece-type relative move rules
//! - `animation`: Frame selection for sprite animations (frames are handles only)
//! - `loader`: Piece-type templates and board layouts from disk
//! - `input`: Thread-safe command queue and background input sources
//! - `render`: Per-tick render snapshots and the surface they are pushed to
//! - `runtime`: The paced game loop
//! - `settings`: Run configuration

pub mod animation;
pub mod board;
pub mod clock;
pub mod error;
pub mod input;
pub mod loader;
pub mod moves;
pub mod render;
pub mod runtime;
pub mod settings;
pub mod sim;

pub use board::Board;
pub use clock::{GameClock, ManualClock, MonotonicClock};
pub use error::LoadError;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Target loop cadence
    pub const TARGET_FPS: u32 = 60;
    /// Fixed hop duration, independent of distance
    pub const JUMP_DURATION_MS: u64 = 200;
    /// Peak height of the hop arc, as a fraction of the cell height
    pub const JUMP_ARC_CELLS: f32 = 0.5;
    /// Physics speed when a state config does not name one
    pub const DEFAULT_SPEED_M_PER_S: f32 = 1.0;
    /// Rest duration when a rest state config does not name one
    pub const DEFAULT_REST_MS: u64 = 1000;
    /// Animation frame rate when a state config does not name one
    pub const DEFAULT_ANIMATION_FPS: f32 = 6.0;
    /// Name of the fallback initial state
    pub const IDLE_STATE: &str = "idle";
}
