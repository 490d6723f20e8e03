//! Capture resolution
//!
//! Two pieces collide when they occupy the same cell. Draw positions are
//! never consulted. Pairs are scanned once per tick in table order, so when
//! both pieces of a pair could capture the other, the earlier one wins.

use serde::{Deserialize, Serialize};

use super::command::Cell;
use super::piece::Piece;

/// One capture resolved during a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub captor: String,
    pub victim: String,
    pub cell: Cell,
}

/// Decide the captor of a colliding pair: `Some(true)` if `a` takes `b`
fn capture_direction(a: &Piece, b: &Piece) -> Option<bool> {
    if a.can_capture() && b.can_be_captured() {
        Some(true)
    } else if b.can_capture() && a.can_be_captured() {
        Some(false)
    } else {
        None
    }
}

/// Scan all unordered pairs and remove captured pieces
pub fn resolve_collisions(pieces: &mut Vec<Piece>) -> Vec<Capture> {
    let mut captured = vec![false; pieces.len()];
    let mut captures = Vec::new();

    for i in 0..pieces.len() {
        for j in (i + 1)..pieces.len() {
            if captured[i] || captured[j] {
                continue;
            }
            let (a, b) = (&pieces[i], &pieces[j]);
            let cell = a.occupied_cell();
            if cell != b.occupied_cell() {
                continue;
            }
            let Some(a_wins) = capture_direction(a, b) else {
                continue;
            };
            let (captor, victim, victim_idx) = if a_wins { (a, b, j) } else { (b, a, i) };
            log::info!("{} captured {} at {}", captor.id, victim.id, cell);
            captures.push(Capture {
                captor: captor.id.clone(),
                victim: victim.id.clone(),
                cell,
            });
            captured[victim_idx] = true;
        }
    }

    if !captures.is_empty() {
        let mut flags = captured.into_iter();
        pieces.retain(|_| !flags.next().unwrap_or(false));
    }
    captures
}
