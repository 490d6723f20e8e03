//! Board pieces
//!
//! A piece is an id plus a state machine instance. It is the legality gate:
//! commands that fail [`Piece::is_command_possible`] never reach the machine.

use std::sync::Arc;

use glam::IVec2;

use crate::animation::FrameHandle;

use super::command::{Cell, Command, CommandKind};
use super::machine::StateMachine;
use super::template::{PieceTemplate, StateId};

#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub id: String,
    machine: StateMachine,
}

impl Piece {
    pub fn new(id: impl Into<String>, template: Arc<PieceTemplate>, cell: Cell) -> Self {
        Self {
            id: id.into(),
            machine: StateMachine::new(template, cell),
        }
    }

    /// Team/type discriminator: the first character of the id
    pub fn type_tag(&self) -> &str {
        self.id
            .char_indices()
            .nth(1)
            .map_or(self.id.as_str(), |(end, _)| &self.id[..end])
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn active_state(&self) -> StateId {
        self.machine.active()
    }

    /// Name of the active state
    pub fn state_name(&self) -> &str {
        &self.machine.active_state().name
    }

    /// Cell used for occupancy and collisions
    pub fn occupied_cell(&self) -> Cell {
        self.machine.current_cell()
    }

    /// Whether `cmd` may be applied in the current state
    ///
    /// A command that names a start cell must start where the piece is.
    pub fn is_command_possible(&self, cmd: &Command) -> bool {
        if cmd.start_cell().is_some_and(|from| from != self.occupied_cell()) {
            return false;
        }
        if cmd.kind == CommandKind::Move && cmd.params.len() >= 2 {
            let (from, to) = (cmd.params[0], cmd.params[1]);
            return match &self.machine.active_state().moves {
                Some(moves) => moves.legal_destinations(from).contains(&to),
                None => from.chebyshev(to) == 1,
            };
        }
        self.machine.can_transition(&cmd.kind)
    }

    /// Apply a command if legal; returns whether the active state changed
    pub fn on_command(&mut self, mut cmd: Command, now_ms: u64) -> bool {
        if !self.is_command_possible(&cmd) {
            log::trace!("{}: dropped illegal {} in {}", self.id, cmd.kind, self.state_name());
            return false;
        }
        cmd.piece_id.clone_from(&self.id);

        let before = self.machine.active();
        let after = self.machine.process_command(&cmd, now_ms);
        if after == before {
            return false;
        }
        // Catch up with the tick so zero-length actions finish immediately
        self.machine.update(now_ms);
        true
    }

    /// Advance the active state
    pub fn update(&mut self, now_ms: u64) {
        self.machine.update(now_ms);
    }

    /// Put the piece back in its initial state on the cell it occupies
    pub fn reset(&mut self, start_ms: u64) {
        let cmd = Command::reset(start_ms, self.id.clone(), self.occupied_cell());
        self.machine.restart(&cmd);
    }

    pub fn can_capture(&self) -> bool {
        self.machine.physics().can_capture()
    }

    pub fn can_be_captured(&self) -> bool {
        self.machine.physics().can_be_captured()
    }

    pub fn draw_position(&self, now_ms: u64) -> IVec2 {
        self.machine.draw_position(now_ms)
    }

    pub fn cooldown_ratio(&self, now_ms: u64) -> f32 {
        self.machine.cooldown_ratio(now_ms)
    }

    pub fn current_frame(&self) -> FrameHandle {
        self.machine.current_frame()
    }

    /// Same template, fresh runtime, new identity and cell
    pub fn clone_as(&self, id: impl Into<String>, cell: Cell) -> Self {
        Self::new(id, Arc::clone(self.machine.template()), cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationSpec;
    use crate::board::Board;
    use crate::moves::Moves;
    use crate::sim::physics::{PhysicsKind, PhysicsSpec};
    use crate::sim::template::TemplateBuilder;

    fn template(moves: Option<Moves>) -> Arc<PieceTemplate> {
        let board = Arc::new(Board::new(8, 8, 100, 100, 1.0, 1.0).unwrap());
        let moves = moves.map(Arc::new);
        let mut b = TemplateBuilder::new("P", board);
        let anim = AnimationSpec::default();
        let idle = b
            .add_state("idle", PhysicsSpec::new(PhysicsKind::Idle), anim, moves.clone())
            .unwrap();
        let mv = b
            .add_state(
                "move",
                PhysicsSpec::new(PhysicsKind::Move { speed_m_per_s: 2.0 }).capturing(true),
                anim,
                moves.clone(),
            )
            .unwrap();
        let jump = b
            .add_state("jump", PhysicsSpec::new(PhysicsKind::Jump), anim, moves)
            .unwrap();
        b.add_transition(idle, CommandKind::Move, mv).unwrap();
        b.add_transition(idle, CommandKind::Jump, jump).unwrap();
        b.add_transition(mv, CommandKind::MoveDone, idle).unwrap();
        b.add_transition(jump, CommandKind::JumpDone, idle).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_type_tag_is_first_char() {
        let p = template(None).instantiate("Qw1", Cell::new(0, 0));
        assert_eq!(p.type_tag(), "Q");
        let empty = template(None).instantiate("", Cell::new(0, 0));
        assert_eq!(empty.type_tag(), "");
    }

    #[test]
    fn test_adjacent_fallback_without_rules() {
        let p = template(None).instantiate("P1", Cell::new(3, 3));
        let ok = Command::move_to(0, "", Cell::new(3, 3), Cell::new(4, 4));
        let far = Command::move_to(0, "", Cell::new(3, 3), Cell::new(5, 3));
        let stay = Command::move_to(0, "", Cell::new(3, 3), Cell::new(3, 3));
        assert!(p.is_command_possible(&ok));
        assert!(!p.is_command_possible(&far));
        assert!(!p.is_command_possible(&stay));
    }

    #[test]
    fn test_move_rules_consulted() {
        let rules = Moves::new(vec![(2, 0)], 8, 8);
        let p = template(Some(rules)).instantiate("P1", Cell::new(3, 3));
        assert!(p.is_command_possible(&Command::move_to(0, "", Cell::new(3, 3), Cell::new(5, 3))));
        assert!(!p.is_command_possible(&Command::move_to(0, "", Cell::new(3, 3), Cell::new(4, 3))));
        // Off the board
        assert!(!p.is_command_possible(&Command::move_to(0, "", Cell::new(7, 3), Cell::new(9, 3))));
    }

    #[test]
    fn test_non_move_requires_transition() {
        let p = template(None).instantiate("P1", Cell::new(0, 0));
        assert!(p.is_command_possible(&Command::jump_to(0, "", Cell::new(0, 0), Cell::new(0, 0))));
        assert!(!p.is_command_possible(&Command::reset(0, "", Cell::new(0, 0))));
    }

    #[test]
    fn test_illegal_command_is_noop() {
        let mut p = template(None).instantiate("P1", Cell::new(3, 3));
        p.reset(0);
        let before = p.clone();
        let changed = p.on_command(Command::move_to(10, "", Cell::new(3, 3), Cell::new(6, 6)), 10);
        assert!(!changed);
        assert_eq!(p, before);

        // Mid-move: a jump has no transition and is dropped
        assert!(p.on_command(Command::move_to(20, "", Cell::new(3, 3), Cell::new(3, 4)), 20));
        let moving = p.clone();
        assert!(!p.on_command(Command::jump_to(30, "", Cell::new(3, 3), Cell::new(3, 3)), 30));
        assert_eq!(p, moving);
    }

    #[test]
    fn test_move_from_wrong_cell_is_noop() {
        let right = Moves::new(vec![(0, 1)], 8, 8);
        let mut p = template(Some(right)).instantiate("WP1", Cell::new(3, 3));
        p.reset(0);
        let before = p.clone();

        // Legal vector, but the piece is not at (6, 5)
        let elsewhere = Command::move_to(10, "", Cell::new(6, 5), Cell::new(6, 6));
        assert!(!p.is_command_possible(&elsewhere));
        assert!(!p.on_command(elsewhere, 10));
        assert_eq!(p, before);

        let jump = Command::jump_to(20, "", Cell::new(0, 0), Cell::new(0, 0));
        assert!(!p.on_command(jump, 20));
        assert_eq!(p, before);

        p.update(5000);
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.occupied_cell(), Cell::new(3, 3));

        // The same vector from the real cell goes through
        assert!(p.on_command(Command::move_to(5000, "", Cell::new(3, 3), Cell::new(3, 4)), 5000));
    }

    #[test]
    fn test_move_then_arrive() {
        let mut p = template(None).instantiate("P1", Cell::new(0, 0));
        p.reset(0);
        assert!(p.on_command(Command::move_to(100, "", Cell::new(0, 0), Cell::new(0, 1)), 100));
        assert_eq!(p.state_name(), "move");
        assert!(p.can_capture());
        assert_eq!(p.occupied_cell(), Cell::new(0, 0));

        p.update(599);
        assert_eq!(p.state_name(), "move");
        p.update(600);
        assert_eq!(p.state_name(), "idle");
        assert_eq!(p.occupied_cell(), Cell::new(0, 1));
    }

    #[test]
    fn test_stale_jump_completes_on_dispatch() {
        let mut p = template(None).instantiate("P1", Cell::new(2, 2));
        p.reset(0);
        let jump = Command::jump_to(0, "", Cell::new(2, 2), Cell::new(2, 2));
        assert!(p.on_command(jump, 1000));
        assert_eq!(p.state_name(), "idle");
    }

    #[test]
    fn test_clones_are_deterministic() {
        let t = template(None);
        let origin = t.instantiate("P1", Cell::new(0, 0));
        let mut a = origin.clone_as("P1", Cell::new(4, 4));
        let mut b = origin.clone_as("P1", Cell::new(4, 4));
        assert!(Arc::ptr_eq(a.machine().template(), b.machine().template()));

        let script = [
            (0, Command::move_to(0, "", Cell::new(4, 4), Cell::new(5, 5))),
            (300, Command::move_to(300, "", Cell::new(5, 5), Cell::new(6, 6))),
            (800, Command::jump_to(800, "", Cell::new(5, 5), Cell::new(5, 6))),
            (1200, Command::move_to(1200, "", Cell::new(5, 6), Cell::new(4, 6))),
        ];
        for p in [&mut a, &mut b] {
            p.reset(0);
            let mut pending = script.iter().peekable();
            for now in (0..2000).step_by(16) {
                p.update(now);
                while let Some((_, cmd)) = pending.next_if(|(at, _)| *at <= now) {
                    p.on_command(cmd.clone(), now);
                }
            }
        }
        assert_eq!(a, b);
        assert_eq!(a.occupied_cell(), b.occupied_cell());
        assert_eq!(a.active_state(), b.active_state());
    }
}
