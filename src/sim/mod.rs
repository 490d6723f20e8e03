//! Game simulation module
//!
//! All gameplay logic lives here. Everything is driven by explicit game time:
//! - No wall-clock reads; the caller passes `now_ms`
//! - Stable iteration order (pieces sorted by id)
//! - No rendering or platform dependencies

pub mod collision;
pub mod command;
pub mod machine;
pub mod physics;
pub mod piece;
pub mod state;
pub mod template;
pub mod tick;

pub use collision::{Capture, resolve_collisions};
pub use command::{Cell, Command, CommandKind};
pub use machine::StateMachine;
pub use physics::{Flight, Physics, PhysicsKind, PhysicsSpec, move_duration_ms};
pub use piece::Piece;
pub use state::{GamePhase, GameState};
pub use template::{PieceTemplate, StateId, StateTemplate, TemplateBuilder};
pub use tick::{TickReport, tick};
