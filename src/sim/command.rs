//! Commands delivered to pieces
//!
//! A command is plain data. The canonical shape is positional: `params[0]` is
//! the start cell, `params[1]` the target cell, and the start time is the
//! command timestamp. Every producer and every physics variant goes through
//! [`Command::start_cell`] and [`Command::target_cell`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Offset by a relative `(d_row, d_col)` vector; `None` when a coordinate overflows
    #[inline]
    pub fn offset(self, d_row: i32, d_col: i32) -> Option<Self> {
        Some(Self::new(self.row.checked_add(d_row)?, self.col.checked_add(d_col)?))
    }

    /// Chebyshev (king-move) distance
    #[inline]
    pub fn chebyshev(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Event type carried by a command; also the key of a state's transition table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Move,
    Jump,
    Reset,
    MoveDone,
    JumpDone,
    RestDone,
    /// Piece-type-specific event, usually the name of the target state
    Named(String),
}

impl CommandKind {
    /// Canonical event name
    pub fn name(&self) -> &str {
        match self {
            CommandKind::Move => "move",
            CommandKind::Jump => "jump",
            CommandKind::Reset => "reset",
            CommandKind::MoveDone => "move_done",
            CommandKind::JumpDone => "jump_done",
            CommandKind::RestDone => "rest_done",
            CommandKind::Named(name) => name,
        }
    }

    /// Parse an event name; anything unrecognised becomes `Named`
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "move" => CommandKind::Move,
            "jump" => CommandKind::Jump,
            "reset" => CommandKind::Reset,
            "move_done" => CommandKind::MoveDone,
            "jump_done" => CommandKind::JumpDone,
            "rest_done" => CommandKind::RestDone,
            _ => CommandKind::Named(name.to_string()),
        }
    }

    /// Whether this kind is emitted by physics on completion
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            CommandKind::MoveDone | CommandKind::JumpDone | CommandKind::RestDone
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A timestamped event addressed to one piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Game time in milliseconds
    pub timestamp: u64,
    /// Target piece; stamped by the dispatcher before delivery
    pub piece_id: String,
    pub kind: CommandKind,
    /// Positional cell parameters: `[start, target]`
    pub params: Vec<Cell>,
}

impl Command {
    pub fn new(timestamp: u64, piece_id: impl Into<String>, kind: CommandKind, params: Vec<Cell>) -> Self {
        Self {
            timestamp,
            piece_id: piece_id.into(),
            kind,
            params,
        }
    }

    /// Move request from `from` to `to`
    pub fn move_to(timestamp: u64, piece_id: impl Into<String>, from: Cell, to: Cell) -> Self {
        Self::new(timestamp, piece_id, CommandKind::Move, vec![from, to])
    }

    /// Jump request from `from` to `to` (the same cell for a jump in place)
    pub fn jump_to(timestamp: u64, piece_id: impl Into<String>, from: Cell, to: Cell) -> Self {
        Self::new(timestamp, piece_id, CommandKind::Jump, vec![from, to])
    }

    /// Reset at `cell`
    pub fn reset(timestamp: u64, piece_id: impl Into<String>, cell: Cell) -> Self {
        Self::new(timestamp, piece_id, CommandKind::Reset, vec![cell])
    }

    /// Completion signal; start and target are both the cell reached
    pub fn completion(timestamp: u64, kind: CommandKind, cell: Cell) -> Self {
        debug_assert!(kind.is_completion());
        Self::new(timestamp, String::new(), kind, vec![cell, cell])
    }

    /// First positional cell
    #[inline]
    pub fn start_cell(&self) -> Option<Cell> {
        self.params.first().copied()
    }

    /// Second positional cell, or the first when only one is given
    #[inline]
    pub fn target_cell(&self) -> Option<Cell> {
        self.params.get(1).or_else(|| self.params.first()).copied()
    }
}
