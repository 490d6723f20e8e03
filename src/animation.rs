//! Sprite animation timing
//!
//! Picks which frame of a state's sprite strip is showing. Image data lives
//! with the renderer; the core only ever hands out [`FrameHandle`]s.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_ANIMATION_FPS;
use crate::sim::Command;

/// Index of a frame within a state's sprite strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameHandle(pub usize);

/// Immutable per-state animation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub frame_count: usize,
    pub fps: f32,
    pub looping: bool,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            frame_count: 1,
            fps: DEFAULT_ANIMATION_FPS,
            looping: true,
        }
    }
}

impl AnimationSpec {
    /// Milliseconds each frame stays on screen (at least 1)
    pub fn frame_duration_ms(&self) -> u64 {
        if self.fps <= 0.0 {
            return u64::MAX;
        }
        ((1000.0 / self.fps) as u64).max(1)
    }
}

/// Runtime animation of the active state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub spec: AnimationSpec,
    current_frame: usize,
    start_time_ms: Option<u64>,
    playing: bool,
}

impl Animation {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            current_frame: 0,
            start_time_ms: None,
            playing: false,
        }
    }

    /// Restart from the first frame at the command's timestamp
    pub fn reset(&mut self, cmd: &Command) {
        self.current_frame = 0;
        self.start_time_ms = Some(cmd.timestamp);
        self.playing = true;
    }

    /// Select the frame for game time `now_ms`
    pub fn update(&mut self, now_ms: u64) {
        let Some(start) = self.start_time_ms else {
            return;
        };
        if !self.playing {
            return;
        }
        let count = self.spec.frame_count;
        if count <= 1 {
            self.current_frame = 0;
            return;
        }

        let elapsed = now_ms.saturating_sub(start);
        let target = (elapsed / self.spec.frame_duration_ms()) as usize;
        if self.spec.looping {
            self.current_frame = target % count;
        } else if target >= count {
            self.current_frame = count - 1;
            self.playing = false;
        } else {
            self.current_frame = target;
        }
    }

    pub fn current_frame(&self) -> FrameHandle {
        FrameHandle(self.current_frame.min(self.spec.frame_count.saturating_sub(1)))
    }

    /// A non-looping animation that reached its last frame
    pub fn is_complete(&self) -> bool {
        !self.spec.looping
            && !self.playing
            && self.current_frame + 1 >= self.spec.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Cell, Command};

    fn started(spec: AnimationSpec, at: u64) -> Animation {
        let mut a = Animation::new(spec);
        a.reset(&Command::reset(at, "P1", Cell::new(0, 0)));
        a
    }

    #[test]
    fn test_looping_wraps() {
        let spec = AnimationSpec {
            frame_count: 4,
            fps: 10.0,
            looping: true,
        };
        let mut a = started(spec, 1000);
        a.update(1000);
        assert_eq!(a.current_frame(), FrameHandle(0));
        a.update(1250);
        assert_eq!(a.current_frame(), FrameHandle(2));
        a.update(1450);
        assert_eq!(a.current_frame(), FrameHandle(0));
        assert!(!a.is_complete());
    }

    #[test]
    fn test_one_shot_stops_on_last_frame() {
        let spec = AnimationSpec {
            frame_count: 3,
            fps: 10.0,
            looping: false,
        };
        let mut a = started(spec, 0);
        a.update(150);
        assert_eq!(a.current_frame(), FrameHandle(1));
        a.update(900);
        assert_eq!(a.current_frame(), FrameHandle(2));
        assert!(a.is_complete());
        // Stopped: later updates do not move it
        a.update(100_000);
        assert_eq!(a.current_frame(), FrameHandle(2));
    }

    #[test]
    fn test_not_started_holds_first_frame() {
        let mut a = Animation::new(AnimationSpec::default());
        a.update(5000);
        assert_eq!(a.current_frame(), FrameHandle(0));
    }
}
