//! Timed cell-to-cell physics
//!
//! One `Physics` value per active state. The variant tag decides how the
//! piece travels; all variants share the same record so a single set of
//! functions handles update, draw position and cooldown. `current_cell` is
//! the authoritative position for occupancy and collisions. The draw
//! position is derived for rendering only.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::command::{Cell, Command, CommandKind};
use crate::board::Board;
use crate::consts::{JUMP_ARC_CELLS, JUMP_DURATION_MS};

/// Physics variant of a state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhysicsKind {
    /// Stands still, never completes
    Idle,
    /// Slides to the target at a constant speed
    Move { speed_m_per_s: f32 },
    /// Hops to the target in a fixed time
    Jump,
    /// Waits in place for a fixed time
    Rest { duration_ms: u64 },
}

impl PhysicsKind {
    /// Command emitted when a timed action of this kind finishes
    pub fn completion_kind(&self) -> Option<CommandKind> {
        match self {
            PhysicsKind::Idle => None,
            PhysicsKind::Move { .. } => Some(CommandKind::MoveDone),
            PhysicsKind::Jump => Some(CommandKind::JumpDone),
            PhysicsKind::Rest { .. } => Some(CommandKind::RestDone),
        }
    }
}

/// Immutable per-state physics settings, shared through the template
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSpec {
    pub kind: PhysicsKind,
    pub can_capture: bool,
    pub can_be_captured: bool,
}

impl PhysicsSpec {
    pub fn new(kind: PhysicsKind) -> Self {
        Self {
            kind,
            can_capture: false,
            can_be_captured: true,
        }
    }

    #[must_use]
    pub fn capturing(mut self, can_capture: bool) -> Self {
        self.can_capture = can_capture;
        self
    }

    #[must_use]
    pub fn capturable(mut self, can_be_captured: bool) -> Self {
        self.can_be_captured = can_be_captured;
        self
    }
}

/// A timed action in progress. Target and start time exist together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub target_cell: Cell,
    pub start_time_ms: u64,
    pub duration_ms: u64,
}

/// Runtime physics of the active state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    pub spec: PhysicsSpec,
    pub start_cell: Cell,
    pub current_cell: Cell,
    pub flight: Option<Flight>,
}

impl Physics {
    /// Physics at rest on `cell`, before any reset
    pub fn new(spec: PhysicsSpec, cell: Cell) -> Self {
        Self {
            spec,
            start_cell: cell,
            current_cell: cell,
            flight: None,
        }
    }

    /// (Re)start from a command
    pub fn reset(&mut self, cmd: &Command, board: &Board) {
        let start = cmd.start_cell().unwrap_or(self.current_cell);
        let target = cmd.target_cell().unwrap_or(start);

        match self.spec.kind {
            PhysicsKind::Idle => {
                self.start_cell = start;
                self.current_cell = start;
                self.flight = None;
            }
            PhysicsKind::Move { speed_m_per_s } => {
                let duration_ms = move_duration_ms(board, start, target, speed_m_per_s);
                self.begin(start, target, cmd.timestamp, duration_ms);
            }
            PhysicsKind::Jump => {
                self.begin(start, target, cmd.timestamp, JUMP_DURATION_MS);
            }
            PhysicsKind::Rest { duration_ms } => {
                // Rests in the cell the previous action ended in
                self.begin(target, target, cmd.timestamp, duration_ms);
            }
        }
    }

    fn begin(&mut self, start: Cell, target: Cell, start_time_ms: u64, duration_ms: u64) {
        self.start_cell = start;
        self.current_cell = start;
        self.flight = Some(Flight {
            target_cell: target,
            start_time_ms,
            duration_ms,
        });
    }

    /// Advance to `now_ms`; returns the completion command once the action ends
    pub fn update(&mut self, now_ms: u64) -> Option<Command> {
        let completion = self.spec.kind.completion_kind()?;
        let flight = self.flight?;

        // Not clamped: a clock regression just reads as "not finished yet"
        let dt = now_ms as i64 - flight.start_time_ms as i64;
        if dt < flight.duration_ms as i64 {
            return None;
        }

        self.current_cell = flight.target_cell;
        self.start_cell = flight.target_cell;
        self.flight = None;
        Some(Command::completion(now_ms, completion, self.current_cell))
    }

    /// Progress of the current action in `[0, 1]`
    fn progress(flight: &Flight, now_ms: u64) -> f32 {
        if flight.duration_ms == 0 {
            return 1.0;
        }
        let dt = now_ms as f64 - flight.start_time_ms as f64;
        (dt / flight.duration_ms as f64).clamp(0.0, 1.0) as f32
    }

    /// Pixel position the piece should be drawn at
    pub fn draw_position(&self, now_ms: u64, board: &Board) -> IVec2 {
        let Some(flight) = self.flight else {
            return board.cell_to_px(self.current_cell);
        };

        match self.spec.kind {
            PhysicsKind::Idle | PhysicsKind::Rest { .. } => board.cell_to_px(self.current_cell),
            PhysicsKind::Move { .. } => {
                let ratio = Self::progress(&flight, now_ms);
                lerp_px(board.cell_to_px(self.start_cell), board.cell_to_px(flight.target_cell), ratio)
            }
            PhysicsKind::Jump => {
                let ratio = Self::progress(&flight, now_ms);
                let dst = board.cell_to_px(flight.target_cell);
                if ratio >= 1.0 {
                    return dst;
                }
                let ground = lerp_px(board.cell_to_px(self.start_cell), dst, ratio);
                // Parabola, exactly zero at both ends
                let lift = 4.0 * ratio * (1.0 - ratio) * JUMP_ARC_CELLS * board.cell_height_px as f32;
                ground - IVec2::new(0, lift.floor() as i32)
            }
        }
    }

    /// Cooldown in `[0, 1]`: 0 when the action starts, 1 once finished or idle
    pub fn cooldown_ratio(&self, now_ms: u64) -> f32 {
        match (self.spec.kind, self.flight) {
            (PhysicsKind::Idle, _) | (_, None) => 1.0,
            (_, Some(flight)) => Self::progress(&flight, now_ms),
        }
    }

    #[inline]
    pub fn can_capture(&self) -> bool {
        self.spec.can_capture
    }

    #[inline]
    pub fn can_be_captured(&self) -> bool {
        self.spec.can_be_captured
    }

    /// Whether a timed action is running
    #[inline]
    pub fn in_flight(&self) -> bool {
        self.flight.is_some()
    }

    pub fn target_cell(&self) -> Option<Cell> {
        self.flight.map(|f| f.target_cell)
    }

    pub fn start_time_ms(&self) -> Option<u64> {
        self.flight.map(|f| f.start_time_ms)
    }

    pub fn move_duration_ms(&self) -> Option<u64> {
        self.flight.map(|f| f.duration_ms)
    }
}

/// Travel time between two cells at `speed_m_per_s`, truncated to whole ms
pub fn move_duration_ms(board: &Board, from: Cell, to: Cell, speed_m_per_s: f32) -> u64 {
    let delta = (board.cell_to_px(to) - board.cell_to_px(from)).as_vec2();
    let meters = delta.length() / board.pixels_per_meter();
    let seconds = meters / speed_m_per_s;
    (seconds * 1000.0).floor() as u64
}

/// Per-axis linear interpolation, floored to whole pixels
fn lerp_px(src: IVec2, dst: IVec2, ratio: f32) -> IVec2 {
    let p = src.as_vec2() + (dst - src).as_vec2() * ratio;
    let p: Vec2 = p.floor();
    p.as_ivec2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn board() -> Board {
        Board::new(8, 8, 100, 100, 1.0, 1.0).unwrap()
    }

    fn move_physics() -> Physics {
        Physics::new(
            PhysicsSpec::new(PhysicsKind::Move { speed_m_per_s: 2.0 }),
            Cell::new(0, 0),
        )
    }

    #[test]
    fn test_move_duration_formula() {
        let b = board();
        let mut p = move_physics();
        p.reset(&Command::move_to(1000, "P1", Cell::new(0, 0), Cell::new(0, 1)), &b);
        assert_eq!(p.move_duration_ms(), Some(500));
        assert_eq!(p.start_time_ms(), Some(1000));
        assert_eq!(p.current_cell, Cell::new(0, 0));
        assert_eq!(p.target_cell(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn test_move_duration_diagonal_truncates() {
        let b = board();
        // sqrt(2) m at 1 m/s = 1414.21 ms
        assert_eq!(move_duration_ms(&b, Cell::new(0, 0), Cell::new(1, 1), 1.0), 1414);
    }

    #[test]
    fn test_move_interpolates_midpoint() {
        let b = board();
        let mut p = move_physics();
        p.reset(&Command::move_to(0, "P1", Cell::new(0, 0), Cell::new(0, 1)), &b);

        let mid = p.draw_position(250, &b);
        assert!((mid.x - 50).abs() <= 1);
        assert_eq!(mid.y, 0);

        // Clamped outside the action window
        assert_eq!(p.draw_position(2000, &b), IVec2::new(100, 0));
    }

    #[test]
    fn test_move_completes_once() {
        let b = board();
        let mut p = move_physics();
        p.reset(&Command::move_to(0, "P1", Cell::new(0, 0), Cell::new(0, 1)), &b);

        assert!(p.update(499).is_none());
        assert_eq!(p.current_cell, Cell::new(0, 0));

        let done = p.update(500).expect("move should complete");
        assert_eq!(done.kind, CommandKind::MoveDone);
        assert_eq!(done.timestamp, 500);
        assert_eq!(done.params, vec![Cell::new(0, 1), Cell::new(0, 1)]);
        assert_eq!(p.current_cell, Cell::new(0, 1));

        assert!(p.update(600).is_none());
        assert!(p.update(10_000).is_none());
        assert_eq!(p.current_cell, Cell::new(0, 1));
    }

    #[test]
    fn test_completion_content_independent_of_lateness() {
        let b = board();
        let cmd = Command::move_to(0, "P1", Cell::new(0, 0), Cell::new(0, 1));

        let mut a = move_physics();
        a.reset(&cmd, &b);
        let mut c = move_physics();
        c.reset(&cmd, &b);

        let da = a.update(500).unwrap();
        let dc = c.update(9000).unwrap();
        assert_eq!(da.params, dc.params);
        assert_eq!(da.kind, dc.kind);
    }

    #[test]
    fn test_zero_distance_move_completes_immediately() {
        let b = board();
        let mut p = move_physics();
        p.reset(&Command::move_to(42, "P1", Cell::new(3, 3), Cell::new(3, 3)), &b);
        assert_eq!(p.move_duration_ms(), Some(0));
        assert!(p.update(42).is_some());
    }

    #[test]
    fn test_update_before_reset_is_noop() {
        let b = board();
        let mut p = move_physics();
        assert!(p.update(1_000_000).is_none());
        assert_eq!(p.draw_position(5, &b), IVec2::ZERO);
        assert_eq!(p.cooldown_ratio(5), 1.0);
    }

    #[test]
    fn test_idle_never_completes() {
        let b = board();
        let mut p = Physics::new(PhysicsSpec::new(PhysicsKind::Idle), Cell::new(0, 0));
        p.reset(&Command::reset(0, "P1", Cell::new(4, 2)), &b);
        assert_eq!(p.current_cell, Cell::new(4, 2));
        assert!(p.update(u64::MAX / 2).is_none());
        assert_eq!(p.cooldown_ratio(0), 1.0);
        assert_eq!(p.draw_position(100, &b), IVec2::new(200, 400));
    }

    #[test]
    fn test_jump_fixed_duration() {
        let b = board();
        let mut p = Physics::new(PhysicsSpec::new(PhysicsKind::Jump), Cell::new(0, 0));
        p.reset(&Command::jump_to(100, "P1", Cell::new(0, 0), Cell::new(5, 5)), &b);
        assert_eq!(p.move_duration_ms(), Some(JUMP_DURATION_MS));

        // Airborne mid-hop
        let mid = p.draw_position(200, &b);
        assert!(mid.y < 250);

        assert!(p.update(299).is_none());
        let done = p.update(300).unwrap();
        assert_eq!(done.kind, CommandKind::JumpDone);
        assert_eq!(p.draw_position(300, &b), IVec2::new(500, 500));
    }

    #[test]
    fn test_rest_waits_in_place() {
        let b = board();
        let spec = PhysicsSpec::new(PhysicsKind::Rest { duration_ms: 300 }).capturing(false);
        let mut p = Physics::new(spec, Cell::new(0, 0));
        p.reset(&Command::completion(1000, CommandKind::MoveDone, Cell::new(2, 2)), &b);
        assert_eq!(p.current_cell, Cell::new(2, 2));
        assert_eq!(p.draw_position(1100, &b), IVec2::new(200, 200));
        assert!(p.update(1299).is_none());
        let done = p.update(1300).unwrap();
        assert_eq!(done.kind, CommandKind::RestDone);
        assert!(!p.can_capture());
    }

    #[test]
    fn test_cooldown_bounds() {
        let b = board();
        let mut p = move_physics();
        p.reset(&Command::move_to(100, "P1", Cell::new(0, 0), Cell::new(0, 1)), &b);
        assert_eq!(p.cooldown_ratio(100), 0.0);
        assert!((p.cooldown_ratio(350) - 0.5).abs() < 1e-6);
        assert_eq!(p.cooldown_ratio(600), 1.0);
        assert_eq!(p.cooldown_ratio(50), 0.0);
    }

    #[test]
    fn test_default_capture_flags() {
        let spec = PhysicsSpec::new(PhysicsKind::Idle);
        assert!(!spec.can_capture);
        assert!(spec.can_be_captured);
    }

    proptest! {
        #[test]
        fn prop_cooldown_monotonic(
            col in 1i32..8,
            speed in 0.5f32..10.0,
            start in 0u64..100_000,
            a in 0.0f64..=1.0,
            b in 0.0f64..=1.0,
        ) {
            let board = board();
            let mut p = Physics::new(
                PhysicsSpec::new(PhysicsKind::Move { speed_m_per_s: speed }),
                Cell::new(0, 0),
            );
            p.reset(&Command::move_to(start, "P1", Cell::new(0, 0), Cell::new(0, col)), &board);
            let duration = p.move_duration_ms().unwrap();

            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let t1 = start + (lo * duration as f64) as u64;
            let t2 = start + (hi * duration as f64) as u64;
            let r1 = p.cooldown_ratio(t1);
            let r2 = p.cooldown_ratio(t2);
            prop_assert!(r1 <= r2);
            prop_assert!((0.0..=1.0).contains(&r1));
            prop_assert!((0.0..=1.0).contains(&r2));
        }

        #[test]
        fn prop_move_draw_stays_between_endpoints(
            row in 0i32..8,
            col in 0i32..8,
            t in 0u64..5_000,
        ) {
            let board = board();
            let mut p = Physics::new(
                PhysicsSpec::new(PhysicsKind::Move { speed_m_per_s: 1.0 }),
                Cell::new(0, 0),
            );
            p.reset(&Command::move_to(0, "P1", Cell::new(0, 0), Cell::new(row, col)), &board);
            let pos = p.draw_position(t, &board);
            let dst = board.cell_to_px(Cell::new(row, col));
            prop_assert!(pos.x >= 0 && pos.x <= dst.x);
            prop_assert!(pos.y >= 0 && pos.y <= dst.y);
        }
    }
}
