//! Input queue and background input sources
//!
//! Input runs on its own thread and only ever pushes finished [`Command`]s
//! into a FIFO. The game loop drains the queue once per tick; nothing on the
//! input side reads or writes game state.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::clock::GameClock;
use crate::moves::Moves;
use crate::sim::{Cell, Command, GameState, Piece};

/// Producer half of the command queue
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Push a command; returns `false` once the game loop has gone away
    pub fn send(&self, cmd: Command) -> bool {
        self.tx.send(cmd).is_ok()
    }
}

/// Consumer half of the command queue, owned by the game loop
#[derive(Debug)]
pub struct CommandQueue {
    rx: Receiver<Command>,
}

impl CommandQueue {
    pub fn channel() -> (CommandSender, Self) {
        let (tx, rx) = mpsc::channel();
        (CommandSender { tx }, Self { rx })
    }

    /// Everything queued so far, in arrival order
    pub fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}

/// Something that turns device events into commands
pub trait InputSource: Send {
    /// Commands produced since the last poll, stamped with `now_ms`
    fn poll(&mut self, now_ms: u64) -> Vec<Command>;

    /// `false` once the source has nothing more to say
    fn is_active(&self) -> bool {
        true
    }
}

/// Run `source` on a background thread until it goes quiet or the queue closes
pub fn spawn_input_thread<S, C>(
    mut source: S,
    sender: CommandSender,
    clock: C,
    poll_interval: Duration,
) -> std::io::Result<JoinHandle<()>>
where
    S: InputSource + 'static,
    C: GameClock + 'static,
{
    std::thread::Builder::new()
        .name("input".into())
        .spawn(move || {
            log::debug!("Input thread started");
            while source.is_active() {
                for cmd in source.poll(clock.now_ms()) {
                    if !sender.send(cmd) {
                        log::debug!("Command queue closed, input thread exiting");
                        return;
                    }
                }
                std::thread::sleep(poll_interval);
            }
            log::debug!("Input source finished");
        })
}

/// Fixed command list, each released once game time reaches its timestamp
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    pending: VecDeque<Command>,
}

impl ScriptedInput {
    /// Commands are released in timestamp order
    pub fn new(mut commands: Vec<Command>) -> Self {
        commands.sort_by_key(|c| c.timestamp);
        Self {
            pending: commands.into(),
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, now_ms: u64) -> Vec<Command> {
        let mut due = Vec::new();
        while let Some(cmd) = self.pending.pop_front() {
            if cmd.timestamp > now_ms {
                self.pending.push_front(cmd);
                break;
            }
            due.push(cmd);
        }
        due
    }

    fn is_active(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// A piece as the demo bot knows it: where it starts and how it may move
#[derive(Debug, Clone)]
pub struct BotPiece {
    pub id: String,
    pub cell: Cell,
    /// `None` means one step in any direction
    pub moves: Option<Arc<Moves>>,
}

impl BotPiece {
    pub fn new(id: impl Into<String>, cell: Cell, moves: Option<Arc<Moves>>) -> Self {
        Self {
            id: id.into(),
            cell,
            moves,
        }
    }
}

impl From<&Piece> for BotPiece {
    fn from(piece: &Piece) -> Self {
        let template = piece.machine().template();
        let moves = template.state(template.initial()).moves.clone();
        Self::new(piece.id.clone(), piece.occupied_cell(), moves)
    }
}

/// Demo input: clicks a random piece, then a random legal destination
///
/// Works from the layout it was given at start and its own record of the
/// moves it issued. A move only updates that record once `piece_cooldown_ms`
/// has passed, and the piece is left alone until then. The record is not
/// checked against the game, so a move the game drops leaves it stale; the
/// game then rejects later moves for that piece because they start from the
/// wrong cell.
#[derive(Debug, Clone)]
pub struct RandomMover {
    rng: Pcg32,
    rows: i32,
    cols: i32,
    /// Believed cell of every piece, sorted by id
    pieces: Vec<BotPiece>,
    /// Issued moves by piece index: target and the time it is assumed done
    pending: BTreeMap<usize, (Cell, u64)>,
    interval_ms: u64,
    piece_cooldown_ms: u64,
    next_at: Option<u64>,
}

impl RandomMover {
    pub fn new(seed: u64, rows: i32, cols: i32, layout: Vec<BotPiece>) -> Self {
        let mut pieces = layout;
        pieces.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            rng: Pcg32::seed_from_u64(seed),
            rows,
            cols,
            pieces,
            pending: BTreeMap::new(),
            interval_ms: 250,
            piece_cooldown_ms: 1500,
            next_at: None,
        }
    }

    /// Bot over every piece currently on the board
    pub fn for_game(seed: u64, state: &GameState) -> Self {
        let (cols, rows) = state.board.dims();
        Self::new(seed, rows, cols, state.pieces().iter().map(BotPiece::from).collect())
    }

    /// Time between clicks
    #[must_use]
    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = ms;
        self
    }

    /// Time before a move is assumed done and the piece may move again
    #[must_use]
    pub fn piece_cooldown_ms(mut self, ms: u64) -> Self {
        self.piece_cooldown_ms = ms;
        self
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }

    fn destinations(&self, piece: &BotPiece) -> Vec<Cell> {
        match &piece.moves {
            Some(moves) => moves.legal_destinations(piece.cell),
            None => (-1..=1)
                .flat_map(|dr| (-1..=1).map(move |dc| (dr, dc)))
                .filter(|&d| d != (0, 0))
                .filter_map(|(dr, dc)| piece.cell.offset(dr, dc))
                .filter(|&cell| self.in_bounds(cell))
                .collect(),
        }
    }

    /// Commit moves whose cooldown has run out
    fn settle(&mut self, now_ms: u64) {
        let pieces = &mut self.pieces;
        self.pending.retain(|&idx, &mut (to, done_at)| {
            if done_at > now_ms {
                return true;
            }
            pieces[idx].cell = to;
            false
        });
    }

    /// Pick one move, if any piece is free to make one
    fn click(&mut self, now_ms: u64) -> Option<Command> {
        self.settle(now_ms);
        let mut options: Vec<(usize, Vec<Cell>)> = self
            .pieces
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.pending.contains_key(idx))
            .map(|(idx, piece)| (idx, self.destinations(piece)))
            .filter(|(_, targets)| !targets.is_empty())
            .collect();
        if options.is_empty() {
            return None;
        }
        let (idx, targets) = options.swap_remove(self.rng.random_range(0..options.len()));
        let to = targets[self.rng.random_range(0..targets.len())];

        self.pending
            .insert(idx, (to, now_ms.saturating_add(self.piece_cooldown_ms)));
        let piece = &self.pieces[idx];
        Some(Command::move_to(now_ms, piece.id.clone(), piece.cell, to))
    }
}

impl InputSource for RandomMover {
    fn poll(&mut self, now_ms: u64) -> Vec<Command> {
        let due = *self.next_at.get_or_insert(now_ms);
        if now_ms < due {
            return Vec::new();
        }
        self.next_at = Some(now_ms + self.interval_ms);
        self.click(now_ms).into_iter().collect()
    }
}
