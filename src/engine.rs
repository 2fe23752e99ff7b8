// Simulation engine: one round of play on one grid
//
// A tick advances every living player by one cell in index order. Players are
// moved one after another against the live grid, so a later player can run into
// the cell an earlier player claimed during the same tick.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ScoringRule};
use crate::grid::Grid;
use crate::player::Player;
use crate::sinks::{MessageSink, RenderSink, ScoreSink};
use crate::types::{Coord, Direction, DirectionMask};

/// Where a round is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundState {
    /// No round has been started
    Idle,
    /// Started and still ticking
    Running,
    /// Started, but a winner (or no winner) has been declared
    Ended,
}

/// Serializable view of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: usize,
    pub name: String,
    pub position: Coord,
    pub spawn: Coord,
    pub direction: Option<Direction>,
    pub alive: bool,
    pub human: bool,
    pub score: u32,
    pub color: String,
}

/// Serializable view of the whole game, used by the control server and the tick log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub round: u64,
    pub tick: u64,
    pub state: RoundState,
    pub death_count: usize,
    pub width: i32,
    pub height: i32,
    pub frequency_ms: u64,
    pub players: Vec<PlayerSnapshot>,
}

pub struct Game {
    grid: Grid,
    players: Vec<Player>,
    death_count: usize,
    started: bool,
    active: bool,
    round: u64,
    tick_count: u64,
    frequency: Duration,
    scoring: ScoringRule,
    rng: StdRng,
    renderer: Box<dyn RenderSink>,
    messages: Box<dyn MessageSink>,
}

impl Game {
    /// Builds a cleared grid and places `config.game.number_players` players on
    /// their spawn slots with random headings.
    pub fn new(
        config: &Config,
        renderer: Box<dyn RenderSink>,
        messages: Box<dyn MessageSink>,
    ) -> Self {
        let mut rng = match config.game.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let grid = Grid::new(
            config.board.width,
            config.board.height,
            config.board.background_cell(),
        );

        let players = (0..config.game.number_players)
            .map(|i| {
                let heading = DirectionMask::empty().resolve(&mut rng);
                Player::new(i, config.spawn_slot(i), Some(heading))
            })
            .collect();

        let frequency_ms = config.game.clamp_frequency(config.game.frequency_ms);

        info!(
            "New game: {}x{} board, {} players, {}ms ticks",
            grid.width(),
            grid.height(),
            config.game.number_players,
            frequency_ms
        );

        Game {
            grid,
            players,
            death_count: 0,
            started: false,
            active: false,
            round: 0,
            tick_count: 0,
            frequency: Duration::from_millis(frequency_ms),
            scoring: config.game.scoring,
            rng,
            renderer,
            messages,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: usize) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: usize) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn number_players(&self) -> usize {
        self.players.len()
    }

    pub fn death_count(&self) -> usize {
        self.death_count
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn frequency(&self) -> Duration {
        self.frequency
    }

    pub(crate) fn set_frequency(&mut self, frequency: Duration) {
        self.frequency = frequency;
    }

    pub fn scoring(&self) -> ScoringRule {
        self.scoring
    }

    pub fn round_state(&self) -> RoundState {
        match (self.started, self.active) {
            (false, _) => RoundState::Idle,
            (true, true) => RoundState::Running,
            (true, false) => RoundState::Ended,
        }
    }

    /// Sends every player's score changes to `sink`
    pub fn attach_score_sink(&mut self, sink: Arc<dyn ScoreSink>) {
        for player in self.players.iter_mut() {
            player.attach_score_sink(sink.clone());
        }
    }

    pub fn display_message(&mut self, text: &str) {
        self.messages.display_message(text);
    }

    /// Paints every player's spawn cell (marked dirty)
    pub fn paint_spawns(&mut self) {
        for player in &self.players {
            let spawn = player.spawn();
            self.grid.set(spawn.x, spawn.y, player.cell());
        }
    }

    /// Marks a round as started and running. Returns false if one already is.
    pub(crate) fn begin_round(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.paint_spawns();
        self.started = true;
        self.active = true;
        self.death_count = 0;
        self.tick_count = 0;
        self.round += 1;
        info!("Round {} started with {} players", self.round, self.players.len());
        self.messages.display_message("GO!");
        true
    }

    /// Clears the board, repaints it in full and puts every player back on its spawn
    pub(crate) fn end_round(&mut self) {
        self.active = false;
        self.started = false;
        self.death_count = 0;
        self.grid.clear_all(false);
        self.full_redraw();
        for player in self.players.iter_mut() {
            player.reset(Some(DirectionMask::empty().resolve(&mut self.rng)));
        }
        debug!("Round {} reset", self.round);
    }

    pub fn reset_scores(&mut self) {
        for player in self.players.iter_mut() {
            player.set_score(0);
        }
    }

    /// Runs one simulation step. Returns whether the round is still active.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.tick_count += 1;

        for index in 0..self.players.len() {
            self.advance_player(index);
        }

        let total = self.players.len();
        if self.death_count >= total.saturating_sub(1) {
            self.active = false;
            if self.death_count == total {
                info!("Round {} over after {} ticks: no winner", self.round, self.tick_count);
                self.messages.display_message("No winner!");
            } else {
                let winners: Vec<String> = self
                    .players
                    .iter()
                    .filter(|p| p.is_alive())
                    .map(|p| p.name().to_string())
                    .collect();
                for name in winners {
                    info!("Round {} over after {} ticks: {} wins", self.round, self.tick_count, name);
                    self.messages.display_message(&format!("{} Wins!", name));
                }
            }
        }

        self.flush();
        self.active
    }

    /// Moves one player a single cell, falling back to a perpendicular turn for
    /// AI players and eliminating the player when no move is open.
    pub fn advance_player(&mut self, index: usize) {
        let Some(player) = self.players.get(index) else {
            return;
        };
        if !player.is_alive() {
            return;
        }

        let heading = match player.direction() {
            Some(direction) => direction,
            None => {
                let direction = DirectionMask::empty().resolve(&mut self.rng);
                debug!("{} had no heading, picked {}", player.name(), direction);
                self.players[index].set_direction(Some(direction));
                direction
            }
        };

        let player = &self.players[index];
        let here = player.position();
        let ahead = heading.apply(&here);

        let target = if !self.grid.is_blocked(ahead) {
            Some((ahead, heading))
        } else if player.is_human() {
            None
        } else {
            self.perpendicular_escape(here, heading)
        };

        match target {
            Some((position, direction)) => {
                let player = &mut self.players[index];
                if direction != heading {
                    debug!(
                        "{} blocked at {} heading {}, turning {}",
                        player.name(),
                        ahead,
                        heading,
                        direction
                    );
                }
                player.move_to(position, direction);
                self.grid.set(position.x, position.y, player.cell());
            }
            None => self.eliminate(index),
        }
    }

    /// Both perpendicular sides form a two-bit mask; resolving it picks the side
    /// tried first. The first open side wins.
    fn perpendicular_escape(&mut self, here: Coord, heading: Direction) -> Option<(Coord, Direction)> {
        let (positive, negative) = heading.perpendiculars();
        let first = DirectionMask::from(positive).with(negative).resolve(&mut self.rng);
        let second = if first == positive { negative } else { positive };

        [first, second]
            .into_iter()
            .map(|direction| (direction.apply(&here), direction))
            .find(|(candidate, _)| !self.grid.is_blocked(*candidate))
    }

    /// Marks a player dead and hands out points according to the scoring rule.
    /// Eliminating a dead (or unknown) player does nothing.
    pub fn eliminate(&mut self, index: usize) {
        let Some(player) = self.players.get_mut(index) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        player.kill();
        let name = player.name().to_string();
        self.death_count += 1;

        for player in self.players.iter_mut() {
            match self.scoring {
                ScoringRule::EveryPlayer => player.award_point(),
                ScoringRule::SurvivorsOnly if player.is_alive() => player.award_point(),
                ScoringRule::SurvivorsOnly => {}
            }
        }

        info!("{} eliminated at {} (deaths: {})", name, self.players[index].position(), self.death_count);
        self.messages.display_message(&format!("{} Dies!", name));
    }

    /// Applies an external steering request.
    ///
    /// Ignored before a round starts or for unknown players. The player is
    /// switched to human control either way; the heading itself only changes if
    /// it does not reverse the direction the player last travelled.
    pub fn request_direction(&mut self, player_id: usize, direction: Direction) -> bool {
        if !self.started {
            return false;
        }
        let Some(player) = self.players.get_mut(player_id) else {
            return false;
        };

        if !player.is_human() {
            info!("{} is now human-controlled", player.name());
            player.set_human(true);
        }

        if player.reference_heading() == Some(direction.opposite()) {
            debug!("{} cannot reverse into {}", player.name(), direction);
            return false;
        }

        player.set_direction(Some(direction));
        true
    }

    /// Repaints only the cells changed since the last flush
    pub fn flush(&mut self) {
        let dirty = self.grid.drain_dirty();
        self.renderer.draw_dirty(&dirty, &self.grid);
    }

    /// Repaints the whole grid; pending incremental work is superseded
    pub fn full_redraw(&mut self) {
        self.grid.drain_dirty();
        self.renderer.draw_all(&self.grid);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            round: self.round,
            tick: self.tick_count,
            state: self.round_state(),
            death_count: self.death_count,
            width: self.grid.width(),
            height: self.grid.height(),
            frequency_ms: self.frequency.as_millis() as u64,
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id(),
                    name: p.name().to_string(),
                    position: p.position(),
                    spawn: p.spawn(),
                    direction: p.direction(),
                    alive: p.is_alive(),
                    human: p.is_human(),
                    score: p.score(),
                    color: p.cell().hex(),
                })
                .collect(),
        }
    }
}
