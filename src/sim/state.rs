//! Game state
//!
//! The live piece table plus the board it sits on. Pieces are kept sorted by
//! id so every scan (updates, collisions, snapshots) runs in a stable order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::command::Cell;
use super::piece::Piece;
use crate::board::Board;
use crate::error::LoadError;

/// Current phase of play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Pieces placed, start time not yet applied
    Setup,
    Playing,
    /// At most one team remains
    GameOver { winner: Option<String> },
}

/// Complete in-memory game state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Arc<Board>,
    /// Live pieces, sorted by id
    pieces: Vec<Piece>,
    pub phase: GamePhase,
    /// Game time of the last tick
    pub time_ms: u64,
    /// Tick counter
    pub time_ticks: u64,
}

impl GameState {
    pub fn new(board: Arc<Board>) -> Self {
        Self {
            board,
            pieces: Vec::new(),
            phase: GamePhase::Setup,
            time_ms: 0,
            time_ticks: 0,
        }
    }

    /// Build from pieces, rejecting duplicate ids
    pub fn with_pieces(
        board: Arc<Board>,
        pieces: impl IntoIterator<Item = Piece>,
    ) -> Result<Self, LoadError> {
        let mut state = Self::new(board);
        for piece in pieces {
            state.add_piece(piece)?;
        }
        Ok(state)
    }

    /// Insert a piece at its sorted position
    pub fn add_piece(&mut self, piece: Piece) -> Result<(), LoadError> {
        match self.pieces.binary_search_by(|p| p.id.cmp(&piece.id)) {
            Ok(_) => Err(LoadError::DuplicatePieceId(piece.id)),
            Err(pos) => {
                self.pieces.insert(pos, piece);
                Ok(())
            }
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub(crate) fn pieces_mut(&mut self) -> &mut Vec<Piece> {
        &mut self.pieces
    }

    pub fn piece(&self, id: &str) -> Option<&Piece> {
        self.pieces
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.pieces[i])
    }

    pub fn piece_mut(&mut self, id: &str) -> Option<&mut Piece> {
        self.pieces
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|i| &mut self.pieces[i])
    }

    /// Remove a piece; returns it if it was live
    pub fn remove_piece(&mut self, id: &str) -> Option<Piece> {
        self.pieces
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|i| self.pieces.remove(i))
    }

    /// Pieces standing on `cell`
    pub fn pieces_at(&self, cell: Cell) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(move |p| p.occupied_cell() == cell)
    }

    /// Reset every piece to its initial state at `start_ms` and begin play
    pub fn start(&mut self, start_ms: u64) {
        for piece in &mut self.pieces {
            piece.reset(start_ms);
        }
        self.time_ms = start_ms;
        self.phase = GamePhase::Playing;
        log::info!("Game started with {} pieces", self.pieces.len());
    }

    /// Live piece count per team tag
    pub fn team_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for piece in &self.pieces {
            *counts.entry(piece.type_tag()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether at most one team is left (including none)
    pub fn is_decided(&self) -> bool {
        self.team_counts().len() <= 1
    }

    /// Most populous remaining team; ties go to the smallest tag
    pub fn leading_team(&self) -> Option<String> {
        self.team_counts()
            .into_iter()
            .fold(None::<(&str, usize)>, |best, (tag, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((tag, n)),
            })
            .map(|(tag, _)| tag.to_string())
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver { .. })
    }

    pub fn winner(&self) -> Option<&str> {
        match &self.phase {
            GamePhase::GameOver { winner } => winner.as_deref(),
            _ => None,
        }
    }
}
