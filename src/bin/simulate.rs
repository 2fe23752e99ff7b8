// Headless batch simulator: plays many AI-only rounds and tallies the outcomes
//
// Usage:
//   cargo run --release --bin simulate -- [--rounds N] [--seed S] [--players P] [--config <path>]
//
// Each round gets its own game seeded with seed + round index, so a batch is
// reproducible. Rounds run in parallel on the rayon pool.

use log::info;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::env;
use std::process;

use new_snafu::config::Config;
use new_snafu::controller::{Controller, ManualTicks};
use new_snafu::engine::Game;
use new_snafu::sinks::{NullRenderer, Scoreboard};

/// Hard stop for a single round; a 45x30 board fills up long before this
const MAX_TICKS_PER_ROUND: u64 = 100_000;

#[derive(Debug)]
struct RoundResult {
    winner: Option<String>,
    ticks: u64,
}

fn play_round(config: &Config, seed: u64) -> RoundResult {
    let mut config = config.clone();
    config.game.seed = Some(seed);

    let scoreboard = Scoreboard::new();
    let game = Game::new(&config, Box::new(NullRenderer), Box::new(scoreboard));
    let mut controller = Controller::new(game, ManualTicks::new(), &config.game);

    controller.start();
    let ticks = controller.run_to_end(MAX_TICKS_PER_ROUND);

    let winner = controller
        .game()
        .players()
        .iter()
        .find(|p| p.is_alive())
        .filter(|_| !controller.game().is_active())
        .map(|p| p.name().to_string());

    RoundResult { winner, ticks }
}

fn parse_arg<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i + 1).map(|v| v.parse::<T>()) {
        Some(Ok(value)) => value,
        _ => {
            eprintln!("Error: {} requires a numeric argument", flag);
            process::exit(1);
        }
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut rounds: u64 = 1000;
    let mut seed: u64 = 1;
    let mut players: Option<usize> = None;
    let mut config_path = "Snafu.toml".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rounds" => {
                rounds = parse_arg(&args, i, "--rounds");
                i += 1;
            }
            "--seed" => {
                seed = parse_arg(&args, i, "--seed");
                i += 1;
            }
            "--players" => {
                players = Some(parse_arg(&args, i, "--players"));
                i += 1;
            }
            "--config" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("Error: --config requires an argument");
                    process::exit(1);
                };
                config_path = path.clone();
                i += 1;
            }
            "--help" => {
                eprintln!("simulate [--rounds N] [--seed S] [--players P] [--config <path>]");
                process::exit(0);
            }
            other => {
                eprintln!("Error: Unknown option '{}'", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });
    if let Some(players) = players {
        config.game.number_players = players;
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!(
        "Simulating {} rounds with {} players on {}x{}",
        rounds, config.game.number_players, config.board.width, config.board.height
    );

    let results: Vec<RoundResult> = (0..rounds)
        .into_par_iter()
        .map(|i| play_round(&config, seed.wrapping_add(i)))
        .collect();

    let mut wins: BTreeMap<String, usize> = BTreeMap::new();
    let mut no_winner = 0usize;
    for result in &results {
        match &result.winner {
            Some(name) => *wins.entry(name.clone()).or_default() += 1,
            None => no_winner += 1,
        }
    }
    let total_ticks: u64 = results.iter().map(|r| r.ticks).sum();
    let longest = results.iter().map(|r| r.ticks).max().unwrap_or(0);

    println!("\n═══════════════════════════════════════════════════════════");
    println!("                 SIMULATION REPORT");
    println!("═══════════════════════════════════════════════════════════");
    println!("Rounds:           {}", results.len());
    println!("Players:          {}", config.game.number_players);
    println!(
        "Mean length:      {:.1} ticks",
        if results.is_empty() { 0.0 } else { total_ticks as f64 / results.len() as f64 }
    );
    println!("Longest round:    {} ticks", longest);
    println!("No winner:        {}", no_winner);
    println!("═══════════════════════════════════════════════════════════");
    for (name, count) in &wins {
        let share = *count as f64 * 100.0 / results.len().max(1) as f64;
        println!("{:<12} {:>6} wins ({:.1}%)", name, count, share);
    }
    println!();
}
