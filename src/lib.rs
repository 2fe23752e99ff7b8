// Library exports for the New SNAFU engine
// The server binary, the replay tool and the batch simulator all build on these modules

pub mod config;
pub mod controller;
pub mod debug_logger;
pub mod direction;
pub mod engine;
pub mod grid;
pub mod player;
pub mod replay;
pub mod session;
pub mod sinks;
pub mod types;
