//! Relative move rules for a piece type
//!
//! A rule table is a list of `(d_row, d_col)` vectors. Legal destinations are
//! the vectors applied to a source cell, filtered to the board.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::sim::Cell;

/// Move rule table, bounded to a board of `rows x cols`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moves {
    rows: i32,
    cols: i32,
    vectors: Vec<(i32, i32)>,
}

impl Moves {
    pub fn new(vectors: Vec<(i32, i32)>, rows: i32, cols: i32) -> Self {
        Self { rows, cols, vectors }
    }

    /// Parse `d_row,d_col` lines; blank lines and `#` comments are skipped
    pub fn parse(text: &str, rows: i32, cols: i32, origin: &Path) -> Result<Self, LoadError> {
        let mut vectors = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = || LoadError::InvalidMove {
                path: origin.to_path_buf(),
                line: idx + 1,
                text: line.to_string(),
            };
            let mut parts = line.split(',');
            let (Some(dr), Some(dc), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(invalid());
            };
            let dr = dr.trim().parse::<i32>().map_err(|_| invalid())?;
            let dc = dc.trim().parse::<i32>().map_err(|_| invalid())?;
            vectors.push((dr, dc));
        }
        Ok(Self::new(vectors, rows, cols))
    }

    /// Read and parse a moves file
    pub fn load(path: &Path, rows: i32, cols: i32) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::parse(&text, rows, cols, path)
    }

    #[inline]
    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }

    /// Destinations reachable from `from`, in rule order
    pub fn legal_destinations(&self, from: Cell) -> Vec<Cell> {
        self.vectors
            .iter()
            .filter_map(|&(dr, dc)| from.offset(dr, dc))
            .filter(|&cell| self.in_bounds(cell))
            .collect()
    }
}
