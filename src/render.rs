//! Render snapshots and surfaces
//!
//! Each tick produces a [`RenderSnapshot`]: where every live piece is drawn,
//! which animation frame it shows, and its cooldown. A [`RenderSurface`]
//! consumes one snapshot per tick and reports whether it is still open.
//! Pixel compositing belongs to the surface; the core never touches images.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::animation::FrameHandle;
use crate::sim::{Cell, GameState};

/// Draw instruction for one piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDraw {
    pub piece_id: String,
    pub state: String,
    pub frame: FrameHandle,
    pub position: IVec2,
    pub cell: Cell,
    /// `None` when the overlay is disabled or the piece is not cooling down
    pub cooldown: Option<f32>,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub time_ms: u64,
    pub tick: u64,
    pub sprites: Vec<SpriteDraw>,
}

impl RenderSnapshot {
    /// Capture the current draw state of every live piece
    pub fn capture(state: &GameState, now_ms: u64, cooldown_overlay: bool) -> Self {
        let sprites = state
            .pieces()
            .iter()
            .map(|piece| {
                let ratio = piece.cooldown_ratio(now_ms);
                SpriteDraw {
                    piece_id: piece.id.clone(),
                    state: piece.state_name().to_string(),
                    frame: piece.current_frame(),
                    position: piece.draw_position(now_ms),
                    cell: piece.occupied_cell(),
                    cooldown: (cooldown_overlay && ratio < 1.0).then_some(ratio),
                }
            })
            .collect();
        Self {
            time_ms: now_ms,
            tick: state.time_ticks,
            sprites,
        }
    }

    /// Pieces still cooling down
    pub fn cooling(&self) -> impl Iterator<Item = &SpriteDraw> {
        self.sprites.iter().filter(|s| s.cooldown.is_some())
    }
}

/// Destination for rendered frames
pub trait RenderSurface {
    /// Show a frame; returns `false` once the surface has been closed
    fn present(&mut self, snapshot: &RenderSnapshot) -> bool;

    /// Show the end-of-game banner
    fn game_over(&mut self, winner: Option<&str>) {
        let _ = winner;
    }
}

/// Surface without a window: logs periodically and closes after an optional tick limit
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    max_ticks: Option<u64>,
    log_every: u64,
    frames: u64,
}

impl HeadlessSurface {
    pub fn new(max_ticks: Option<u64>) -> Self {
        Self {
            max_ticks,
            log_every: 60,
            frames: 0,
        }
    }

    #[must_use]
    pub fn log_every(mut self, frames: u64) -> Self {
        self.log_every = frames.max(1);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSurface for HeadlessSurface {
    fn present(&mut self, snapshot: &RenderSnapshot) -> bool {
        self.frames += 1;
        if self.frames % self.log_every == 0 {
            log::info!(
                "t={}ms tick={} pieces={} cooling={}",
                snapshot.time_ms,
                snapshot.tick,
                snapshot.sprites.len(),
                snapshot.cooling().count()
            );
            for sprite in snapshot.cooling() {
                log::debug!(
                    "  {} {} at {:?} ({:.0}%)",
                    sprite.piece_id,
                    sprite.state,
                    sprite.position,
                    sprite.cooldown.unwrap_or(1.0) * 100.0
                );
            }
        }
        self.max_ticks.is_none_or(|max| self.frames < max)
    }

    fn game_over(&mut self, winner: Option<&str>) {
        match winner {
            Some(tag) => log::info!("GAME OVER - winner: {tag}"),
            None => log::info!("GAME OVER - no winner"),
        }
    }
}
