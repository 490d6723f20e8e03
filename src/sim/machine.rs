//! Per-piece state machine instance
//!
//! Holds the active state id plus that state's live physics and animation.
//! The transition graph itself stays in the shared [`PieceTemplate`]; cloning
//! a machine copies only the runtime record.

use std::sync::Arc;

use glam::IVec2;

use crate::animation::{Animation, FrameHandle};

use super::command::{Cell, Command, CommandKind};
use super::physics::Physics;
use super::template::{PieceTemplate, StateId, StateTemplate};

#[derive(Debug, Clone)]
pub struct StateMachine {
    template: Arc<PieceTemplate>,
    active: StateId,
    physics: Physics,
    animation: Animation,
}

impl StateMachine {
    /// Machine in the template's initial state, standing on `cell`
    pub fn new(template: Arc<PieceTemplate>, cell: Cell) -> Self {
        let active = template.initial();
        let node = template.state(active);
        let physics = Physics::new(node.physics, cell);
        let animation = Animation::new(node.animation);
        Self {
            template,
            active,
            physics,
            animation,
        }
    }

    pub fn template(&self) -> &Arc<PieceTemplate> {
        &self.template
    }

    pub fn active(&self) -> StateId {
        self.active
    }

    pub fn active_state(&self) -> &StateTemplate {
        self.template.state(self.active)
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Whether the active state wires a transition for `kind`
    pub fn can_transition(&self, kind: &CommandKind) -> bool {
        self.active_state().transition(kind).is_some()
    }

    /// Make `id` active and reset its physics and animation from `cmd`
    fn enter(&mut self, id: StateId, cmd: &Command) {
        let node = self.template.state(id);
        let mut physics = Physics::new(node.physics, self.physics.current_cell);
        physics.reset(cmd, self.template.board());
        let mut animation = Animation::new(node.animation);
        animation.reset(cmd);

        self.active = id;
        self.physics = physics;
        self.animation = animation;
    }

    /// Follow the transition for `cmd.kind`; unknown events leave the machine untouched
    pub fn process_command(&mut self, cmd: &Command, _now_ms: u64) -> StateId {
        let Some(next) = self.active_state().transition(&cmd.kind) else {
            return self.active;
        };
        log::trace!(
            "{}: {} -> {} on {}",
            cmd.piece_id,
            self.active_state().name,
            self.template.state(next).name,
            cmd.kind
        );
        self.enter(next, cmd);
        self.active
    }

    /// Advance animation and physics; completions run through the transition table
    pub fn update(&mut self, now_ms: u64) -> StateId {
        self.animation.update(now_ms);
        match self.physics.update(now_ms) {
            Some(done) => self.process_command(&done, now_ms),
            None => self.active,
        }
    }

    /// Re-enter the initial state
    pub fn restart(&mut self, cmd: &Command) {
        let initial = self.template.initial();
        self.enter(initial, cmd);
    }

    pub fn current_cell(&self) -> Cell {
        self.physics.current_cell
    }

    pub fn draw_position(&self, now_ms: u64) -> IVec2 {
        self.physics.draw_position(now_ms, self.template.board())
    }

    pub fn cooldown_ratio(&self, now_ms: u64) -> f32 {
        self.physics.cooldown_ratio(now_ms)
    }

    pub fn current_frame(&self) -> FrameHandle {
        self.animation.current_frame()
    }
}

impl PartialEq for StateMachine {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.template, &other.template)
            && self.active == other.active
            && self.physics == other.physics
            && self.animation == other.animation
    }
}
