// Standalone replay tool for analysing New SNAFU tick logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --rounds <r1,r2>       Only report specific rounds (comma-separated)
//   --expect <R:NAME,...>  Check who won specific rounds ("none" for no winner)
//   --strict               Exit non-zero if any invariant violation is found
//   --verbose              Log every round and violation as it is analysed

use std::env;
use std::process;

use new_snafu::replay::ReplayEngine;

fn print_usage() {
    eprintln!("New SNAFU Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --rounds <R1,R2,...>    Only report specific rounds (comma-separated)");
    eprintln!("  --expect <R:NAME,...>   Check round winners (NAME is e.g. 'Player 2' or 'none')");
    eprintln!("  --strict                Fail when an invariant violation is found");
    eprintln!("  --verbose               Show detailed output for each round");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # Summarise every round");
    eprintln!("  replay snafu_debug.jsonl");
    eprintln!();
    eprintln!("  # Check two outcomes");
    eprintln!("  replay snafu_debug.jsonl --expect '1:Player 2,2:none'");
}

fn parse_rounds(s: &str) -> Result<Vec<u64>, String> {
    s.split(',')
        .map(|r| {
            r.trim()
                .parse::<u64>()
                .map_err(|e| format!("Invalid round number '{}': {}", r, e))
        })
        .collect()
}

fn parse_expected_winners(s: &str) -> Result<Vec<(u64, String)>, String> {
    s.split(',')
        .map(|pair| {
            let (round, name) = pair
                .trim()
                .split_once(':')
                .ok_or_else(|| format!("Invalid format '{}'. Expected 'round:name'", pair))?;

            let round = round
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("Invalid round number '{}': {}", round, e))?;

            Ok((round, name.trim().to_string()))
        })
        .collect()
}

fn main() {
    // Initialize logger
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) {
            0
        } else {
            1
        });
    }

    let log_file = &args[1];
    let mut verbose = false;
    let mut strict = false;
    let mut rounds_filter: Option<Vec<u64>> = None;
    let mut expected: Option<Vec<(u64, String)>> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--rounds" | "--expect" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires an argument", args[i]);
                    process::exit(1);
                };
                let parsed = if args[i] == "--rounds" {
                    parse_rounds(value).map(|r| rounds_filter = Some(r))
                } else {
                    parse_expected_winners(value).map(|e| expected = Some(e))
                };
                if let Err(e) = parsed {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
                i += 1;
            }
            "--strict" => {
                strict = true;
            }
            "--verbose" => {
                verbose = true;
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    println!("Replay log file: {}", log_file);

    let engine = ReplayEngine::new(verbose);

    let entries = match engine.load_log_file(log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    if entries.is_empty() {
        eprintln!("Error: Log file is empty");
        process::exit(1);
    }

    println!("Loaded {} tick entries", entries.len());

    let mut rounds = engine.summarize_rounds(&entries);
    let mut violations = engine.validate(&entries);
    if let Some(filter) = &rounds_filter {
        rounds.retain(|r| filter.contains(&r.round));
        violations.retain(|v| filter.contains(&v.round));
    }

    engine.print_report(&rounds, &violations);

    if let Some(expected) = expected {
        match engine.validate_expected_winners(&rounds, &expected) {
            Ok(()) => println!("✓ All expected outcomes validated successfully!"),
            Err(e) => {
                eprintln!("✗ Validation failed: {}", e);
                process::exit(1);
            }
        }
    }

    if strict && !violations.is_empty() {
        eprintln!("✗ {} invariant violation(s) found", violations.len());
        process::exit(1);
    }
}
