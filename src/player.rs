// Per-contender state: where the player is, where it started, where it is
// heading and how it is scoring.

use std::fmt;
use std::sync::Arc;

use crate::sinks::ScoreSink;
use crate::types::{Cell, Coord, Direction};

/// Occupancy flags written by every player trail
pub const PLAYER_FLAGS: u8 = 1;

/// Where a player starts and what its trail looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSlot {
    pub position: Coord,
    pub cell: Cell,
}

pub struct Player {
    id: usize,
    name: String,
    position: Coord,
    spawn: Coord,
    direction: Option<Direction>,
    last_heading: Option<Direction>,
    alive: bool,
    human: bool,
    cell: Cell,
    score: u32,
    score_sink: Option<Arc<dyn ScoreSink>>,
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("spawn", &self.spawn)
            .field("direction", &self.direction)
            .field("alive", &self.alive)
            .field("human", &self.human)
            .field("cell", &self.cell)
            .field("score", &self.score)
            .field("score_sink", &self.score_sink.is_some())
            .finish()
    }
}

impl Player {
    pub fn new(id: usize, slot: SpawnSlot, direction: Option<Direction>) -> Self {
        Player {
            id,
            name: format!("Player {}", id + 1),
            position: slot.position,
            spawn: slot.position,
            direction,
            last_heading: None,
            alive: true,
            human: false,
            cell: slot.cell,
            score: 0,
            score_sink: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    pub fn spawn(&self) -> Coord {
        self.spawn
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Heading of the most recent move, if the player has moved since spawning
    pub fn last_heading(&self) -> Option<Direction> {
        self.last_heading
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_human(&self) -> bool {
        self.human
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn set_direction(&mut self, direction: Option<Direction>) {
        self.direction = direction;
    }

    pub fn set_human(&mut self, human: bool) {
        self.human = human;
    }

    pub fn attach_score_sink(&mut self, sink: Arc<dyn ScoreSink>) {
        sink.update_score(self.id, self.score);
        self.score_sink = Some(sink);
    }

    pub fn has_score_sink(&self) -> bool {
        self.score_sink.is_some()
    }

    /// Direction a new request must not reverse
    pub fn reference_heading(&self) -> Option<Direction> {
        self.last_heading.or(self.direction)
    }

    pub(crate) fn move_to(&mut self, position: Coord, heading: Direction) {
        self.position = position;
        self.direction = Some(heading);
        self.last_heading = Some(heading);
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Adds one point and notifies the score sink
    pub fn award_point(&mut self) {
        self.score = self.score.saturating_add(1);
        self.publish_score();
    }

    pub fn set_score(&mut self, score: u32) {
        self.score = score;
        self.publish_score();
    }

    fn publish_score(&self) {
        if let Some(sink) = &self.score_sink {
            sink.update_score(self.id, self.score);
        }
    }

    /// Puts the player back on its spawn cell, alive and AI-controlled
    pub fn reset(&mut self, direction: Option<Direction>) {
        self.position = self.spawn;
        self.direction = direction;
        self.last_heading = None;
        self.alive = true;
        self.human = false;
    }
}
