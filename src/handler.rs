// HTTP handler bindings for the local control server
//
// Handlers are thin: they deserialize the request, forward it to the session
// task through its handle and serialize the answer. Read-only views of the
// board and scoreboard come straight from the shared sinks.

use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use new_snafu::config::Config;
use new_snafu::session::SessionHandle;
use new_snafu::sinks::{FrameBuffer, FrameView, Scoreboard};
use new_snafu::types::Direction;

/// Everything the routes need, managed by Rocket
pub struct ServerState {
    pub session: SessionHandle,
    pub scoreboard: Scoreboard,
    pub frame: FrameBuffer,
    pub config: Config,
}

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub player: usize,
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub frequency_ms: u64,
}

fn unavailable(e: String) -> Status {
    error!("Session request failed: {}", e);
    Status::ServiceUnavailable
}

/// GET / endpoint
/// Returns board geometry and the player roster
#[get("/")]
pub fn index(state: &State<ServerState>) -> Json<Value> {
    let config = &state.config;
    let players: Vec<Value> = (0..config.game.number_players)
        .map(|i| {
            let slot = config.spawn_slot(i);
            json!({
                "id": i,
                "name": format!("Player {}", i + 1),
                "spawn": slot.position,
                "color": slot.cell.hex(),
            })
        })
        .collect();

    Json(json!({
        "name": "new-snafu",
        "width": config.board.width,
        "height": config.board.height,
        "background": config.board.background_cell().hex(),
        "frequency_range_ms": [config.game.frequency_min_ms, config.game.frequency_max_ms],
        "players": players,
    }))
}

/// POST /start endpoint
/// Starts a round; does nothing if one is already started
#[post("/start")]
pub async fn start(state: &State<ServerState>) -> Result<Json<Value>, Status> {
    let started = state.session.start().await.map_err(unavailable)?;
    Ok(Json(json!({ "started": started })))
}

/// POST /stop endpoint
#[post("/stop")]
pub async fn stop(state: &State<ServerState>) -> Result<Status, Status> {
    state.session.stop().await.map_err(unavailable)?;
    Ok(Status::Ok)
}

/// POST /restart endpoint
/// Abandons any started round and starts a new one
#[post("/restart")]
pub async fn restart(state: &State<ServerState>) -> Result<Status, Status> {
    state.session.restart().await.map_err(unavailable)?;
    Ok(Status::Ok)
}

/// POST /input endpoint
/// Steers a player; the first input hands that player over to human control
#[post("/input", format = "json", data = "<input_req>")]
pub async fn input(
    state: &State<ServerState>,
    input_req: Json<InputRequest>,
) -> Result<Json<Value>, Status> {
    let accepted = state
        .session
        .input(input_req.player, input_req.direction)
        .await
        .map_err(unavailable)?;
    Ok(Json(json!({ "accepted": accepted })))
}

/// POST /speed endpoint
/// Changing speed stops a started round and resets the scores
#[post("/speed", format = "json", data = "<speed_req>")]
pub async fn speed(
    state: &State<ServerState>,
    speed_req: Json<SpeedRequest>,
) -> Result<Json<Value>, Status> {
    let frequency_ms = state
        .session
        .set_frequency(speed_req.frequency_ms)
        .await
        .map_err(unavailable)?;
    Ok(Json(json!({ "frequency_ms": frequency_ms })))
}

/// POST /scores/reset endpoint
#[post("/scores/reset")]
pub async fn reset_scores(state: &State<ServerState>) -> Result<Status, Status> {
    state.session.reset_scores().await.map_err(unavailable)?;
    Ok(Status::Ok)
}

/// GET /state endpoint
/// Round state, players and the latest messages
#[get("/state")]
pub async fn game_state(state: &State<ServerState>) -> Result<Json<Value>, Status> {
    let snapshot = state.session.snapshot().await.map_err(unavailable)?;
    Ok(Json(json!({
        "game": snapshot,
        "scoreboard": state.scoreboard.view(),
    })))
}

/// GET /board endpoint
/// The last painted frame
#[get("/board")]
pub fn board(state: &State<ServerState>) -> Json<FrameView> {
    Json(state.frame.view())
}
