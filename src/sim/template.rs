//! Piece-type templates
//!
//! A template is the immutable state graph of one piece type: an arena of
//! state nodes addressed by [`StateId`], each with its physics and animation
//! settings and a transition table keyed by command kind. Templates are built
//! once per type and shared by `Arc` between every piece of that type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::animation::AnimationSpec;
use crate::board::Board;
use crate::consts::IDLE_STATE;
use crate::error::LoadError;
use crate::moves::Moves;

use super::command::{Cell, CommandKind};
use super::physics::PhysicsSpec;
use super::piece::Piece;

/// Index of a state node within its template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u16);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the state graph
#[derive(Debug, Clone)]
pub struct StateTemplate {
    pub name: String,
    pub physics: PhysicsSpec,
    pub animation: AnimationSpec,
    /// Move rules checked while this state is active
    pub moves: Option<Arc<Moves>>,
    transitions: HashMap<CommandKind, StateId>,
}

impl StateTemplate {
    /// Target state for an event, if wired
    pub fn transition(&self, kind: &CommandKind) -> Option<StateId> {
        self.transitions.get(kind).copied()
    }
}

/// Immutable state graph for one piece type
#[derive(Debug)]
pub struct PieceTemplate {
    pub type_code: String,
    board: Arc<Board>,
    states: Vec<StateTemplate>,
    initial: StateId,
}

impl PieceTemplate {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn state(&self, id: StateId) -> &StateTemplate {
        &self.states[id.index()]
    }

    pub fn states(&self) -> &[StateTemplate] {
        &self.states
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(|i| StateId(i as u16))
    }

    /// New piece of this type standing on `cell`
    pub fn instantiate(self: &Arc<Self>, piece_id: impl Into<String>, cell: Cell) -> Piece {
        Piece::new(piece_id, Arc::clone(self), cell)
    }
}

/// Incremental construction of a [`PieceTemplate`]
#[derive(Debug)]
pub struct TemplateBuilder {
    type_code: String,
    board: Arc<Board>,
    states: Vec<StateTemplate>,
    initial: Option<StateId>,
}

impl TemplateBuilder {
    pub fn new(type_code: impl Into<String>, board: Arc<Board>) -> Self {
        Self {
            type_code: type_code.into(),
            board,
            states: Vec::new(),
            initial: None,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> LoadError {
        LoadError::piece_type(&self.type_code, reason)
    }

    /// Add a state node; names must be unique within the type
    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        physics: PhysicsSpec,
        animation: AnimationSpec,
        moves: Option<Arc<Moves>>,
    ) -> Result<StateId, LoadError> {
        let name = name.into();
        if self.states.iter().any(|s| s.name == name) {
            return Err(self.invalid(format!("duplicate state {name:?}")));
        }
        if self.states.len() >= u16::MAX as usize {
            return Err(self.invalid("too many states"));
        }
        let id = StateId(self.states.len() as u16);
        self.states.push(StateTemplate {
            name,
            physics,
            animation,
            moves,
            transitions: HashMap::new(),
        });
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(|i| StateId(i as u16))
    }

    /// Wire `event` from `from` to `to`; a state never transitions to itself
    pub fn add_transition(
        &mut self,
        from: StateId,
        event: CommandKind,
        to: StateId,
    ) -> Result<(), LoadError> {
        if from.index() >= self.states.len() || to.index() >= self.states.len() {
            return Err(self.invalid(format!("transition {event} references a missing state")));
        }
        if from == to {
            return Err(self.invalid(format!(
                "self transition on {:?} for {event}",
                self.states[from.index()].name
            )));
        }
        self.states[from.index()].transitions.insert(event, to);
        Ok(())
    }

    /// Wire every distinct pair, keyed by the target state's name
    pub fn connect_all(&mut self) {
        let names: Vec<CommandKind> = self
            .states
            .iter()
            .map(|s| CommandKind::from_name(&s.name))
            .collect();
        for (from, state) in self.states.iter_mut().enumerate() {
            for (to, event) in names.iter().enumerate() {
                if from != to {
                    state.transitions.insert(event.clone(), StateId(to as u16));
                }
            }
        }
    }

    pub fn set_initial(&mut self, id: StateId) -> &mut Self {
        self.initial = Some(id);
        self
    }

    /// Finish the graph; the initial state is the explicit one, else `idle`
    pub fn build(self) -> Result<Arc<PieceTemplate>, LoadError> {
        if self.states.is_empty() {
            return Err(self.invalid("no states"));
        }
        let initial = self
            .initial
            .or_else(|| self.find(IDLE_STATE))
            .ok_or_else(|| self.invalid("no initial state and no idle state"))?;

        log::debug!(
            "Built template {:?}: {} states, initial {:?}",
            self.type_code,
            self.states.len(),
            self.states[initial.index()].name
        );

        Ok(Arc::new(PieceTemplate {
            type_code: self.type_code,
            board: self.board,
            states: self.states,
            initial,
        }))
    }
}
