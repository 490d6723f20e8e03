//! Cell Clash entry point
//!
//! `cell-clash [settings.json]`: loads the game, starts the demo input
//! thread, and runs the paced loop headless until someone wins.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use cell_clash::input::{CommandQueue, RandomMover, spawn_input_thread};
use cell_clash::loader::{demo_game, load_game};
use cell_clash::render::HeadlessSurface;
use cell_clash::runtime::GameLoop;
use cell_clash::sim::GameState;
use cell_clash::{LoadError, MonotonicClock, Settings};

/// How often the input thread polls its source
const INPUT_POLL: Duration = Duration::from_millis(5);

fn load_state(settings: &Settings) -> Result<GameState, LoadError> {
    match settings.content_paths() {
        Some((pieces, board)) => load_game(pieces, board, settings),
        None => demo_game(settings),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Cell Clash starting...");

    let settings = std::env::args_os()
        .nth(1)
        .map(|path| Settings::load(Path::new(&path)))
        .unwrap_or_default();

    let mut state = match load_state(&settings) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to load game: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The bot only ever sees this starting layout
    let bot = RandomMover::for_game(settings.bot_seed, &state)
        .interval_ms(settings.bot_interval_ms)
        .piece_cooldown_ms(settings.bot_piece_cooldown_ms);

    let clock = MonotonicClock::new();
    let (sender, queue) = CommandQueue::channel();
    if let Err(e) = spawn_input_thread(bot, sender, clock.clone(), INPUT_POLL) {
        log::error!("Failed to start input thread: {e}");
        return ExitCode::FAILURE;
    }

    let mut surface = HeadlessSurface::new(settings.max_ticks).log_every(settings.log_every_frames);
    let summary = GameLoop::from_settings(clock, queue, &settings).run(&mut state, &mut surface);

    log::info!(
        "Finished after {} ticks ({} ms): {} captures, {} commands dropped",
        summary.ticks,
        summary.end_time_ms,
        summary.captures.len(),
        summary.dropped_commands
    );
    match (&summary.winner, summary.finished) {
        (Some(winner), true) => log::info!("Winner: {winner}"),
        (None, true) => log::info!("No winner"),
        _ => log::info!("Stopped before the game was decided"),
    }
    ExitCode::SUCCESS
}
