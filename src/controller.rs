// Lifecycle controller: start/stop/reset around a Game plus the tick source that
// drives it.
//
// idle --start--> running --last survivor--> ended --stop--> idle
//
// The controller owns both the game and the tick source, so it can guarantee that
// a new schedule is only installed after the previous one is cancelled.

use log::{debug, info};
use std::time::Duration;

use crate::config::GameConfig;
use crate::engine::{Game, GameSnapshot, RoundState};
use crate::types::Direction;

/// Something that invokes `Controller::tick` periodically
pub trait TickSource {
    fn schedule(&mut self, interval: Duration);
    fn cancel(&mut self);
    fn is_scheduled(&self) -> bool;
}

/// Tick source driven by hand: it only records what was asked of it.
/// Used for headless simulation and tests, where the caller loops over `tick`.
#[derive(Debug, Default, Clone)]
pub struct ManualTicks {
    interval: Option<Duration>,
    schedules: u32,
    cancels: u32,
}

impl ManualTicks {
    pub fn new() -> Self {
        ManualTicks::default()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// How many times a schedule was installed
    pub fn schedules(&self) -> u32 {
        self.schedules
    }

    /// How many live schedules were cancelled
    pub fn cancels(&self) -> u32 {
        self.cancels
    }
}

impl TickSource for ManualTicks {
    fn schedule(&mut self, interval: Duration) {
        self.interval = Some(interval);
        self.schedules += 1;
    }

    fn cancel(&mut self) {
        if self.interval.take().is_some() {
            self.cancels += 1;
        }
    }

    fn is_scheduled(&self) -> bool {
        self.interval.is_some()
    }
}

pub struct Controller<T: TickSource> {
    game: Game,
    ticks: T,
    frequency_min_ms: u64,
    frequency_max_ms: u64,
}

impl<T: TickSource> Controller<T> {
    pub fn new(game: Game, ticks: T, limits: &GameConfig) -> Self {
        let (frequency_min_ms, frequency_max_ms) = limits.frequency_bounds();
        Controller {
            game,
            ticks,
            frequency_min_ms,
            frequency_max_ms,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn tick_source(&self) -> &T {
        &self.ticks
    }

    pub fn state(&self) -> RoundState {
        self.game.round_state()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot()
    }

    /// Starts a round unless one is already started
    pub fn start(&mut self) -> bool {
        if self.game.is_started() {
            debug!("start ignored: round {} already started", self.game.round());
            return false;
        }
        if self.ticks.is_scheduled() {
            self.ticks.cancel();
        }
        self.game.begin_round();
        self.ticks.schedule(self.game.frequency());
        true
    }

    /// Cancels ticking, clears the board and returns everyone to their spawn.
    /// Does nothing beyond cancelling the tick source when no round was started.
    pub fn stop(&mut self) {
        self.ticks.cancel();
        if !self.game.is_started() {
            return;
        }
        info!("Stopping round {}", self.game.round());
        self.game.end_round();
    }

    /// What the play button does: abandon any started round, then start afresh
    pub fn restart(&mut self) {
        if self.game.is_started() {
            self.stop();
        }
        self.start();
    }

    /// Runs one tick. When the round ends the tick source is cancelled.
    pub fn tick(&mut self) -> bool {
        let active = self.game.tick();
        if !active {
            self.ticks.cancel();
        }
        active
    }

    /// Applies a steering request from outside
    pub fn input(&mut self, player_id: usize, direction: Direction) -> bool {
        self.game.request_direction(player_id, direction)
    }

    pub fn reset_scores(&mut self) {
        self.game.reset_scores();
    }

    /// Changes the tick interval, clamped into the configured range.
    ///
    /// A change of speed invalidates the running tally: a started round is
    /// stopped and every score goes back to zero before the new interval is
    /// stored. It applies from the next `start`. Returns the interval in effect.
    pub fn set_frequency(&mut self, frequency_ms: u64) -> u64 {
        let frequency_ms = frequency_ms.clamp(self.frequency_min_ms, self.frequency_max_ms);
        let current = self.game.frequency().as_millis() as u64;
        if frequency_ms == current {
            return current;
        }

        if self.game.is_started() {
            self.stop();
        }
        self.game.reset_scores();
        self.game.set_frequency(Duration::from_millis(frequency_ms));
        info!("Tick interval changed from {}ms to {}ms", current, frequency_ms);
        frequency_ms
    }
}

impl Controller<ManualTicks> {
    /// Ticks until the round ends or `max_ticks` is reached. Returns ticks run.
    pub fn run_to_end(&mut self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while ran < max_ticks && self.ticks.is_scheduled() {
            ran += 1;
            if !self.tick() {
                break;
            }
        }
        ran
    }
}
