// Session: a single tokio task that owns the controller
//
// Everything that touches the game - ticks from the interval task, control
// requests from the server - arrives as a message and is handled one at a time.
// A tick can therefore never overlap another tick or a stop/start.
//
// Ticks carry the generation of the schedule that produced them. Cancelling or
// rescheduling bumps the generation, so ticks still queued from an old schedule
// are dropped instead of driving the new round.

use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::GameConfig;
use crate::controller::{Controller, TickSource};
use crate::debug_logger::DebugLogger;
use crate::engine::{Game, GameSnapshot};
use crate::types::Direction;

/// Requests a SessionHandle can send
#[derive(Debug)]
pub enum Command {
    Start { reply: oneshot::Sender<bool> },
    Stop { reply: oneshot::Sender<()> },
    Restart { reply: oneshot::Sender<()> },
    Input { player: usize, direction: Direction, reply: oneshot::Sender<bool> },
    SetFrequency { frequency_ms: u64, reply: oneshot::Sender<u64> },
    ResetScores { reply: oneshot::Sender<()> },
    Snapshot { reply: oneshot::Sender<GameSnapshot> },
    Shutdown,
}

/// Tick source backed by a tokio interval task
///
/// The tick channel has room for a single pending tick, so a slow session
/// delays the interval instead of building a backlog.
pub struct IntervalTicker {
    ticks: mpsc::Sender<u64>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl IntervalTicker {
    pub fn new(ticks: mpsc::Sender<u64>) -> Self {
        IntervalTicker {
            ticks,
            task: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when `generation` belongs to the schedule that is currently live
    pub fn is_current(&self, generation: u64) -> bool {
        self.task.is_some() && generation == self.generation
    }
}

impl TickSource for IntervalTicker {
    fn schedule(&mut self, interval: Duration) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let ticks = self.ticks.clone();
        let interval = interval.max(Duration::from_millis(1));

        self.task = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately
            timer.tick().await;
            loop {
                timer.tick().await;
                if ticks.send(generation).await.is_err() {
                    break;
                }
            }
        }));
        debug!("Tick schedule {} installed ({}ms)", generation, interval.as_millis());
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.generation += 1;
        }
    }

    fn is_scheduled(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct Session {
    controller: Controller<IntervalTicker>,
    commands: mpsc::UnboundedReceiver<Command>,
    ticks: mpsc::Receiver<u64>,
    logger: DebugLogger,
}

/// Cloneable sender side of a session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl Session {
    /// Wraps `game` in a controller driven by an interval ticker.
    /// Spawn `Session::run` on a tokio runtime to bring it to life.
    pub fn new(game: Game, limits: &GameConfig, logger: DebugLogger) -> (Session, SessionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::channel(1);

        let controller = Controller::new(game, IntervalTicker::new(tick_tx), limits);

        (
            Session {
                controller,
                commands: command_rx,
                ticks: tick_rx,
                logger,
            },
            SessionHandle {
                commands: command_tx,
            },
        )
    }

    /// Processes commands and ticks until shut down or every handle is dropped
    pub async fn run(mut self) {
        info!("Session running");
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(generation) = self.ticks.recv() => self.on_tick(generation),
            }
        }
        self.controller.stop();
        info!("Session stopped");
    }

    fn on_tick(&mut self, generation: u64) {
        if !self.controller.tick_source().is_current(generation) {
            debug!("Dropping stale tick from schedule {}", generation);
            return;
        }
        self.controller.tick();
        self.logger.log_tick(self.controller.snapshot());
    }

    fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            Command::Start { reply } => {
                let _ = reply.send(self.controller.start());
            }
            Command::Stop { reply } => {
                self.controller.stop();
                let _ = reply.send(());
            }
            Command::Restart { reply } => {
                self.controller.restart();
                let _ = reply.send(());
            }
            Command::Input {
                player,
                direction,
                reply,
            } => {
                let _ = reply.send(self.controller.input(player, direction));
            }
            Command::SetFrequency {
                frequency_ms,
                reply,
            } => {
                let _ = reply.send(self.controller.set_frequency(frequency_ms));
            }
            Command::ResetScores { reply } => {
                self.controller.reset_scores();
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
            Command::Shutdown => {}
        }
    }
}

impl SessionHandle {
    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> Command,
    ) -> Result<R, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .map_err(|_| "Session is no longer running".to_string())?;
        reply_rx
            .await
            .map_err(|_| "Session dropped the request".to_string())
    }

    pub async fn start(&self) -> Result<bool, String> {
        self.request(|reply| Command::Start { reply }).await
    }

    pub async fn stop(&self) -> Result<(), String> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn restart(&self) -> Result<(), String> {
        self.request(|reply| Command::Restart { reply }).await
    }

    pub async fn input(&self, player: usize, direction: Direction) -> Result<bool, String> {
        self.request(|reply| Command::Input {
            player,
            direction,
            reply,
        })
        .await
    }

    pub async fn set_frequency(&self, frequency_ms: u64) -> Result<u64, String> {
        self.request(|reply| Command::SetFrequency {
            frequency_ms,
            reply,
        })
        .await
    }

    pub async fn reset_scores(&self) -> Result<(), String> {
        self.request(|reply| Command::ResetScores { reply }).await
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, String> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).is_err() {
            warn!("Shutdown requested but the session is already gone");
        }
    }
}
