//! Game tick
//!
//! One fixed-order pass over the game: advance pieces, deliver queued
//! commands, snapshot for rendering, resolve captures, check for a winner.

use super::collision::{Capture, resolve_collisions};
use super::command::Command;
use super::state::{GamePhase, GameState};
use crate::render::RenderSnapshot;

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub snapshot: RenderSnapshot,
    pub captures: Vec<Capture>,
    /// Commands that reached a live piece
    pub delivered: usize,
    /// Commands addressed to pieces that do not exist
    pub unknown: usize,
}

/// Advance the game to `now_ms`, applying `commands` in order
pub fn tick(
    state: &mut GameState,
    commands: impl IntoIterator<Item = Command>,
    now_ms: u64,
    cooldown_overlay: bool,
) -> TickReport {
    match state.phase {
        GamePhase::GameOver { .. } => return TickReport::default(),
        GamePhase::Setup => state.start(now_ms),
        GamePhase::Playing => {}
    }
    debug_assert!(now_ms >= state.time_ms, "game clock went backwards");

    state.time_ticks += 1;
    state.time_ms = now_ms;

    for piece in state.pieces_mut().iter_mut() {
        piece.update(now_ms);
    }

    let mut report = TickReport::default();
    for cmd in commands {
        match state.piece_mut(&cmd.piece_id) {
            Some(piece) => {
                piece.on_command(cmd, now_ms);
                report.delivered += 1;
            }
            None => {
                log::debug!("Dropping {} for unknown piece {:?}", cmd.kind, cmd.piece_id);
                report.unknown += 1;
            }
        }
    }

    report.snapshot = RenderSnapshot::capture(state, now_ms, cooldown_overlay);
    report.captures = resolve_collisions(state.pieces_mut());

    if state.is_decided() {
        let winner = state.leading_team();
        log::info!(
            "Game over after {} ticks: {}",
            state.time_ticks,
            winner.as_deref().unwrap_or("no winner")
        );
        state.phase = GamePhase::GameOver { winner };
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::animation::AnimationSpec;
    use crate::board::Board;
    use crate::sim::command::{Cell, CommandKind};
    use crate::sim::physics::{PhysicsKind, PhysicsSpec};
    use crate::sim::template::{PieceTemplate, TemplateBuilder};

    fn board() -> Arc<Board> {
        Arc::new(Board::new(8, 8, 100, 100, 1.0, 1.0).unwrap())
    }

    /// idle <-> move; only idle pieces capture
    fn template(board: &Arc<Board>) -> Arc<PieceTemplate> {
        let mut b = TemplateBuilder::new("x", Arc::clone(board));
        let anim = AnimationSpec::default();
        let idle = b
            .add_state("idle", PhysicsSpec::new(PhysicsKind::Idle).capturing(true), anim, None)
            .unwrap();
        let mv = b
            .add_state(
                "move",
                PhysicsSpec::new(PhysicsKind::Move { speed_m_per_s: 2.0 }),
                anim,
                None,
            )
            .unwrap();
        b.add_transition(idle, CommandKind::Move, mv).unwrap();
        b.add_transition(mv, CommandKind::MoveDone, idle).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_single_team_wins() {
        let board = board();
        let t = template(&board);
        let mut state = GameState::with_pieces(
            Arc::clone(&board),
            [t.instantiate("P1", Cell::new(0, 0)), t.instantiate("P2", Cell::new(1, 1))],
        )
        .unwrap();

        tick(&mut state, Vec::new(), 0, false);
        assert_eq!(state.winner(), Some("P"));
        assert!(state.is_over());
    }

    #[test]
    fn test_empty_table_has_no_winner() {
        let mut state = GameState::new(board());
        tick(&mut state, Vec::new(), 0, false);
        assert!(state.is_over());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_unknown_piece_dropped() {
        let board = board();
        let t = template(&board);
        let mut state = GameState::with_pieces(
            Arc::clone(&board),
            [t.instantiate("A1", Cell::new(0, 0)), t.instantiate("B1", Cell::new(7, 7))],
        )
        .unwrap();

        let cmd = Command::move_to(0, "Z9", Cell::new(0, 0), Cell::new(0, 1));
        let report = tick(&mut state, vec![cmd], 0, false);
        assert_eq!(report.unknown, 1);
        assert_eq!(report.delivered, 0);
        assert_eq!(state.pieces().len(), 2);
        assert!(!state.is_over());
    }

    #[test]
    fn test_arrival_capture_ends_game() {
        let board = board();
        let t = template(&board);
        let mut state = GameState::with_pieces(
            Arc::clone(&board),
            [t.instantiate("A1", Cell::new(0, 1)), t.instantiate("B1", Cell::new(0, 0))],
        )
        .unwrap();

        let cmd = Command::move_to(0, "B1", Cell::new(0, 0), Cell::new(0, 1));
        let report = tick(&mut state, vec![cmd], 0, true);
        assert_eq!(report.delivered, 1);
        assert_eq!(state.piece("B1").unwrap().state_name(), "move");
        assert_eq!(report.snapshot.cooling().count(), 1);

        // Mid-move B1 still occupies its start cell
        let report = tick(&mut state, Vec::new(), 300, true);
        assert!(report.captures.is_empty());
        assert_eq!(state.pieces().len(), 2);

        // On arrival both are idle and capture-capable; table order decides
        let report = tick(&mut state, Vec::new(), 500, true);
        assert_eq!(report.captures.len(), 1);
        assert_eq!(report.captures[0].captor, "A1");
        assert_eq!(report.captures[0].victim, "B1");
        assert_eq!(state.winner(), Some("A"));
    }

    #[test]
    fn test_game_over_is_sticky() {
        let mut state = GameState::new(board());
        tick(&mut state, Vec::new(), 0, false);
        let ticks = state.time_ticks;
        let report = tick(&mut state, Vec::new(), 100, false);
        assert_eq!(state.time_ticks, ticks);
        assert!(report.snapshot.sprites.is_empty());
    }
}
