#[macro_use]
extern crate rocket;

use log::info;
use rocket::fairing::AdHoc;
use std::env;
use std::sync::Arc;

use new_snafu::config::Config;
use new_snafu::debug_logger::DebugLogger;
use new_snafu::engine::Game;
use new_snafu::session::Session;
use new_snafu::sinks::{FrameBuffer, LogMessages, MessageSink, Scoreboard};

mod handler;

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    // Lots of hosting setups expect you to bind to the port specified by the `PORT`
    // environment variable. However, Rocket looks at the `ROCKET_PORT` environment variable.
    // If we find a value for `PORT`, we set `ROCKET_PORT` to that value.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting New SNAFU control server...");

    // Load configuration once at startup
    let config = Config::load_or_default();

    let frame = FrameBuffer::new();
    let scoreboard = Scoreboard::new();
    let messages: Vec<Box<dyn MessageSink>> =
        vec![Box::new(LogMessages), Box::new(scoreboard.clone())];

    let mut game = Game::new(&config, Box::new(frame.clone()), Box::new(messages));
    game.attach_score_sink(Arc::new(scoreboard.clone()));
    game.full_redraw();
    game.display_message("Adjust speed, then POST /start to play!");

    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let (session, handle) = Session::new(game, &config.game, logger);
    let session_task = tokio::spawn(session.run());

    let state = handler::ServerState {
        session: handle.clone(),
        scoreboard,
        frame,
        config,
    };

    let _rocket = rocket::build()
        .manage(state)
        .attach(AdHoc::on_response("Server ID Middleware", |_, res| {
            Box::pin(async move {
                res.set_raw_header("Server", "new-snafu");
            })
        }))
        .mount(
            "/",
            routes![
                handler::index,
                handler::start,
                handler::stop,
                handler::restart,
                handler::input,
                handler::speed,
                handler::reset_scores,
                handler::game_state,
                handler::board
            ],
        )
        .launch()
        .await?;

    handle.shutdown();
    let _ = session_task.await;
    Ok(())
}
