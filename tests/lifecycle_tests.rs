// Integration tests for the round lifecycle: start, stop, restart, speed changes
// and the bookkeeping around the tick source.

use std::sync::Arc;
use std::time::Duration;

use new_snafu::config::{Config, PlayerSlotConfig};
use new_snafu::controller::{Controller, ManualTicks, TickSource};
use new_snafu::engine::{Game, RoundState};
use new_snafu::sinks::{FrameBuffer, Scoreboard};
use new_snafu::types::Direction;

fn seeded_config() -> Config {
    let mut config = Config::default_hardcoded();
    config.game.seed = Some(7);
    config
}

/// Two players wedged into a 2x1 board: whatever their headings, both die on the first tick
fn doomed_config() -> Config {
    let mut config = seeded_config();
    config.board.width = 2;
    config.board.height = 1;
    config.game.number_players = 2;
    config.players = vec![
        PlayerSlotConfig { x: 0, y: 0, color: [255, 0, 0] },
        PlayerSlotConfig { x: 1, y: 0, color: [0, 0, 255] },
    ];
    config
}

struct Fixture {
    controller: Controller<ManualTicks>,
    messages: Scoreboard,
    scores: Scoreboard,
    frame: FrameBuffer,
}

fn fixture(config: &Config) -> Fixture {
    let messages = Scoreboard::new();
    let scores = Scoreboard::new();
    let frame = FrameBuffer::new();

    let mut game = Game::new(config, Box::new(frame.clone()), Box::new(messages.clone()));
    game.attach_score_sink(Arc::new(scores.clone()));
    game.full_redraw();

    Fixture {
        controller: Controller::new(game, ManualTicks::new(), &config.game),
        messages,
        scores,
        frame,
    }
}

#[test]
fn test_start_paints_spawns_and_schedules_ticks() {
    let mut f = fixture(&seeded_config());
    assert_eq!(f.controller.state(), RoundState::Idle);

    assert!(f.controller.start());

    let game = f.controller.game();
    assert_eq!(f.controller.state(), RoundState::Running);
    assert_eq!(game.round(), 1);
    assert_eq!(game.grid().occupied_count(), 4);
    for player in game.players() {
        assert_eq!(game.grid().get_at(player.spawn()), player.cell());
    }
    assert_eq!(f.controller.tick_source().schedules(), 1);
    assert_eq!(f.controller.tick_source().interval(), Some(Duration::from_millis(85)));
    assert_eq!(f.messages.message().as_deref(), Some("GO!"));
}

#[test]
fn test_start_while_started_is_ignored() {
    let mut f = fixture(&seeded_config());
    f.controller.start();
    f.controller.tick();

    assert!(!f.controller.start());
    assert_eq!(f.controller.game().round(), 1);
    assert_eq!(f.controller.game().tick_count(), 1);
    assert_eq!(f.controller.tick_source().schedules(), 1);
}

#[test]
fn test_stop_resets_board_and_players() {
    let mut f = fixture(&seeded_config());
    f.controller.start();
    f.controller.input(0, Direction::Up);
    for _ in 0..3 {
        assert!(f.controller.tick());
    }
    let full_redraws = f.frame.full_redraws();

    f.controller.stop();

    let game = f.controller.game();
    assert_eq!(f.controller.state(), RoundState::Idle);
    assert!(!f.controller.tick_source().is_scheduled());
    assert_eq!(f.controller.tick_source().cancels(), 1);
    assert_eq!(game.grid().occupied_count(), 0);
    assert_eq!(game.death_count(), 0);
    for player in game.players() {
        assert_eq!(player.position(), player.spawn());
        assert!(player.is_alive());
        assert!(!player.is_human());
        assert!(player.direction().is_some());
        assert!(player.last_heading().is_none());
    }
    assert_eq!(f.frame.full_redraws(), full_redraws + 1);
    assert_eq!(f.frame.pixel(6, 15), Some(game.grid().background()));
}

#[test]
fn test_stop_twice_is_the_same_as_once() {
    let mut f = fixture(&seeded_config());
    f.controller.start();
    f.controller.tick();

    f.controller.stop();
    let once = f.controller.snapshot();
    let redraws = f.frame.full_redraws();

    f.controller.stop();
    assert_eq!(f.controller.snapshot(), once);
    assert_eq!(f.frame.full_redraws(), redraws);
}

#[test]
fn test_stop_before_any_round_does_nothing() {
    let mut f = fixture(&seeded_config());
    let before = f.controller.snapshot();

    f.controller.stop();

    assert_eq!(f.controller.snapshot(), before);
    assert_eq!(f.controller.tick_source().cancels(), 0);
}

#[test]
fn test_finished_round_cancels_ticks_and_waits_for_restart() {
    let mut f = fixture(&doomed_config());
    f.controller.start();

    assert!(!f.controller.tick());
    assert_eq!(f.controller.state(), RoundState::Ended);
    assert!(!f.controller.tick_source().is_scheduled());
    assert_eq!(f.messages.message().as_deref(), Some("No winner!"));

    // Further ticks are inert
    assert!(!f.controller.tick());
    assert_eq!(f.controller.game().tick_count(), 1);

    // Still counted as started until someone resets
    assert!(!f.controller.start());

    f.controller.restart();
    assert_eq!(f.controller.state(), RoundState::Running);
    assert_eq!(f.controller.game().round(), 2);
    assert_eq!(f.controller.game().death_count(), 0);
    assert!(f.controller.tick_source().is_scheduled());
    assert!(f.controller.game().players().iter().all(|p| p.is_alive()));
}

#[test]
fn test_restart_while_running_begins_a_new_round() {
    let mut f = fixture(&seeded_config());
    f.controller.start();
    f.controller.tick();

    f.controller.restart();

    assert_eq!(f.controller.state(), RoundState::Running);
    assert_eq!(f.controller.game().round(), 2);
    assert_eq!(f.controller.game().tick_count(), 0);
    assert_eq!(f.controller.game().grid().occupied_count(), 4);
    assert_eq!(f.controller.tick_source().schedules(), 2);
    assert_eq!(f.controller.tick_source().cancels(), 1);
}

#[test]
fn test_restart_when_idle_just_starts() {
    let mut f = fixture(&seeded_config());
    f.controller.restart();
    assert_eq!(f.controller.state(), RoundState::Running);
    assert_eq!(f.controller.game().round(), 1);
}

#[test]
fn test_set_frequency_clamps_and_resets_scores() {
    let mut f = fixture(&seeded_config());
    f.controller.game_mut().player_mut(0).unwrap().set_score(5);

    assert_eq!(f.controller.set_frequency(10), 10);
    assert_eq!(f.controller.game().frequency(), Duration::from_millis(10));
    assert_eq!(f.controller.game().player(0).unwrap().score(), 0);
    assert_eq!(f.scores.score(0), Some(0));

    assert_eq!(f.controller.set_frequency(1), 2);
    assert_eq!(f.controller.set_frequency(10_000), 500);
}

#[test]
fn test_set_frequency_to_current_value_keeps_scores() {
    let mut f = fixture(&seeded_config());
    f.controller.game_mut().player_mut(1).unwrap().set_score(3);

    assert_eq!(f.controller.set_frequency(85), 85);
    assert_eq!(f.controller.game().player(1).unwrap().score(), 3);
}

#[test]
fn test_set_frequency_stops_a_running_round() {
    let mut f = fixture(&seeded_config());
    f.controller.start();
    f.controller.tick();
    f.controller.game_mut().player_mut(2).unwrap().set_score(4);

    assert_eq!(f.controller.set_frequency(120), 120);

    assert_eq!(f.controller.state(), RoundState::Idle);
    assert!(!f.controller.tick_source().is_scheduled());
    assert_eq!(f.controller.game().grid().occupied_count(), 0);
    assert!(f.controller.game().players().iter().all(|p| p.score() == 0));

    f.controller.start();
    assert_eq!(f.controller.tick_source().interval(), Some(Duration::from_millis(120)));
}

#[test]
fn test_reset_scores_notifies_score_sink() {
    let mut f = fixture(&doomed_config());
    f.controller.start();
    f.controller.tick();
    assert_eq!(f.scores.score(0), Some(2));
    assert_eq!(f.scores.score(1), Some(2));

    f.controller.reset_scores();
    assert_eq!(f.scores.score(0), Some(0));
    assert_eq!(f.scores.score(1), Some(0));
}

#[test]
fn test_scores_survive_across_rounds() {
    let mut f = fixture(&doomed_config());
    f.controller.start();
    f.controller.tick();
    f.controller.restart();
    f.controller.tick();

    assert!(f.controller.game().players().iter().all(|p| p.score() == 4));
}

#[derive(Default)]
struct RecordingTicks {
    scheduled: bool,
    events: Vec<String>,
}

impl TickSource for RecordingTicks {
    fn schedule(&mut self, interval: Duration) {
        self.scheduled = true;
        self.events.push(format!("schedule {}ms", interval.as_millis()));
    }

    fn cancel(&mut self) {
        self.scheduled = false;
        self.events.push("cancel".to_string());
    }

    fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

#[test]
fn test_start_cancels_a_lingering_schedule_first() {
    let config = seeded_config();
    let game = Game::new(&config, Box::new(FrameBuffer::new()), Box::new(Scoreboard::new()));
    let ticks = RecordingTicks {
        scheduled: true,
        events: Vec::new(),
    };
    let mut controller = Controller::new(game, ticks, &config.game);

    controller.start();

    assert_eq!(controller.tick_source().events, vec!["cancel", "schedule 85ms"]);
}

#[test]
fn test_headless_round_runs_to_completion() {
    let mut config = seeded_config();
    config.board.width = 20;
    config.board.height = 12;
    config.game.number_players = 3;
    config.players.clear();

    let mut f = fixture(&config);
    f.controller.start();
    let ticks = f.controller.run_to_end(10_000);

    // Every tick fills at least one of the 240 cells
    assert!(ticks <= 240);
    assert_eq!(f.controller.state(), RoundState::Ended);
    assert!(f.controller.game().death_count() >= 2);
    let alive = f.controller.game().players().iter().filter(|p| p.is_alive()).count();
    assert!(alive <= 1);
    assert!(!f.controller.tick_source().is_scheduled());
}

#[test]
fn test_swapped_frequency_bounds_still_clamp() {
    let mut config = seeded_config();
    config.game.frequency_min_ms = 100;
    config.game.frequency_max_ms = 50;

    let mut f = fixture(&config);
    assert_eq!(f.controller.game().frequency(), Duration::from_millis(85));
    assert_eq!(f.controller.set_frequency(10), 50);
    assert_eq!(f.controller.set_frequency(400), 100);
}
