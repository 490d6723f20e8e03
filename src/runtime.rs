//! Paced game loop
//!
//! Single-threaded: reads the clock, drains the command queue, ticks, and
//! pushes the snapshot to the surface. Pacing sleeps whatever is left of the
//! frame budget; a slow frame simply runs late.

use std::time::{Duration, Instant};

use crate::clock::GameClock;
use crate::input::CommandQueue;
use crate::render::RenderSurface;
use crate::settings::Settings;
use crate::sim::{Capture, GameState, tick};

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSummary {
    /// Winning team tag; `None` for an empty board or an unfinished game
    pub winner: Option<String>,
    pub finished: bool,
    /// The surface was closed before the game ended
    pub closed: bool,
    pub ticks: u64,
    pub end_time_ms: u64,
    pub captures: Vec<Capture>,
    pub dropped_commands: usize,
}

/// Loop driver owning the clock and the consumer end of the queue
pub struct GameLoop<C: GameClock> {
    clock: C,
    queue: CommandQueue,
    frame_budget: Option<Duration>,
    cooldown_overlay: bool,
}

impl<C: GameClock> GameLoop<C> {
    pub fn new(clock: C, queue: CommandQueue) -> Self {
        Self {
            clock,
            queue,
            frame_budget: None,
            cooldown_overlay: false,
        }
    }

    /// Loop configured from settings
    pub fn from_settings(clock: C, queue: CommandQueue, settings: &Settings) -> Self {
        Self::new(clock, queue)
            .target_fps(Some(settings.target_fps))
            .cooldown_overlay(settings.cooldown_overlay)
    }

    /// Pace to `fps`; `None` or zero runs flat out
    #[must_use]
    pub fn target_fps(mut self, fps: Option<u32>) -> Self {
        self.frame_budget = target_frame_duration(fps);
        self
    }

    #[must_use]
    pub fn cooldown_overlay(mut self, enabled: bool) -> Self {
        self.cooldown_overlay = enabled;
        self
    }

    /// Run until the game is decided or the surface closes
    pub fn run(&mut self, state: &mut GameState, surface: &mut impl RenderSurface) -> GameSummary {
        let mut summary = GameSummary::default();
        log::info!(
            "Game loop starting ({} pieces, budget {:?})",
            state.pieces().len(),
            self.frame_budget
        );

        loop {
            let frame_start = Instant::now();
            let now_ms = self.clock.now_ms();
            let report = tick(state, self.queue.drain(), now_ms, self.cooldown_overlay);
            summary.captures.extend(report.captures);
            summary.dropped_commands += report.unknown;

            let open = surface.present(&report.snapshot);
            if state.is_over() {
                break;
            }
            if !open {
                log::info!("Surface closed at tick {}", state.time_ticks);
                summary.closed = true;
                break;
            }

            let sleep = compute_cap_sleep(frame_start.elapsed(), self.frame_budget);
            if sleep > Duration::ZERO {
                std::thread::sleep(sleep);
            }
        }

        summary.finished = state.is_over();
        summary.winner = state.winner().map(str::to_string);
        summary.ticks = state.time_ticks;
        summary.end_time_ms = state.time_ms;
        if summary.finished {
            surface.game_over(state.winner());
        }
        summary
    }
}

fn target_frame_duration(fps: Option<u32>) -> Option<Duration> {
    fps.filter(|&fps| fps > 0)
        .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}
