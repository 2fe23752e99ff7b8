// Integration tests for the session task: control requests and interval ticks
// all go through one SessionHandle.

use std::sync::Arc;
use std::time::Duration;

use new_snafu::config::Config;
use new_snafu::debug_logger::DebugLogger;
use new_snafu::engine::{Game, RoundState};
use new_snafu::session::{Session, SessionHandle};
use new_snafu::sinks::{NullRenderer, Scoreboard};
use new_snafu::types::Direction;

fn spawn_session(frequency_ms: u64) -> (SessionHandle, Scoreboard, tokio::task::JoinHandle<()>) {
    let mut config = Config::default_hardcoded();
    config.game.seed = Some(11);
    config.game.frequency_ms = frequency_ms;

    let scoreboard = Scoreboard::new();
    let mut game = Game::new(&config, Box::new(NullRenderer), Box::new(scoreboard.clone()));
    game.attach_score_sink(Arc::new(scoreboard.clone()));
    let (session, handle) = Session::new(game, &config.game, DebugLogger::disabled());
    let task = tokio::spawn(session.run());
    (handle, scoreboard, task)
}

#[tokio::test]
async fn test_session_starts_and_ticks() {
    let (handle, scoreboard, task) = spawn_session(5);

    assert!(handle.start().await.unwrap());
    assert!(!handle.start().await.unwrap());

    tokio::time::sleep(Duration::from_millis(60)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.round, 1);
    assert!(snapshot.tick >= 1);
    assert_ne!(snapshot.state, RoundState::Idle);
    assert_eq!(scoreboard.history().first().map(String::as_str), Some("GO!"));

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_no_ticks_after_stop() {
    let (handle, _scoreboard, task) = spawn_session(5);

    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.stop().await.unwrap();

    let stopped = handle.snapshot().await.unwrap();
    assert_eq!(stopped.state, RoundState::Idle);
    assert!(stopped.players.iter().all(|p| p.position == p.spawn && p.alive));

    tokio::time::sleep(Duration::from_millis(30)).await;
    let later = handle.snapshot().await.unwrap();
    assert_eq!(later.tick, stopped.tick);
    assert_eq!(later.state, RoundState::Idle);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_input_is_only_accepted_during_a_round() {
    // Slow ticks so the heading can be checked before anything moves
    let (handle, _scoreboard, task) = spawn_session(500);

    assert!(!handle.input(0, Direction::Up).await.unwrap());

    handle.start().await.unwrap();
    let heading = handle.snapshot().await.unwrap().players[1]
        .direction
        .expect("spawned with a heading");
    let turn = heading.perpendiculars().0;

    assert!(handle.input(1, turn).await.unwrap());
    assert!(!handle.input(1, turn.opposite()).await.unwrap());
    assert!(!handle.input(42, Direction::Down).await.unwrap());

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.players[1].human);
    assert_eq!(snapshot.players[1].direction, Some(turn));

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_speed_change_stops_round_and_resets_scores() {
    let (handle, scoreboard, task) = spawn_session(85);

    handle.start().await.unwrap();
    assert_eq!(handle.set_frequency(1).await.unwrap(), 2);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, RoundState::Idle);
    assert_eq!(snapshot.frequency_ms, 2);
    assert!(snapshot.players.iter().all(|p| p.score == 0));
    assert_eq!(scoreboard.view().scores, vec![0, 0, 0, 0]);

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_restart_and_reset_scores() {
    let (handle, _scoreboard, task) = spawn_session(500);

    handle.restart().await.unwrap();
    handle.restart().await.unwrap();
    handle.reset_scores().await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.round, 2);
    assert_eq!(snapshot.state, RoundState::Running);
    assert!(snapshot.players.iter().all(|p| p.score == 0));

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_requests_fail_after_shutdown() {
    let (handle, _scoreboard, task) = spawn_session(85);

    handle.shutdown();
    task.await.unwrap();

    assert!(handle.start().await.is_err());
    assert!(handle.snapshot().await.is_err());
}
