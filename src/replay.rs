// Replay module for analysing tick logs written by the debug logger
//
// This module provides functionality to:
// 1. Parse JSONL tick logs
// 2. Rebuild each round: elimination order, winner, length
// 3. Check the round invariants tick by tick
// 4. Print a summary report

use log::{info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::debug_logger::TickLogEntry;
use crate::engine::{GameSnapshot, RoundState};

/// How a logged round finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Winner(String),
    NoWinner,
    /// The log stops before the round ended (stopped early or truncated)
    Unfinished,
}

/// One elimination as seen in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elimination {
    pub tick: u64,
    pub player: String,
}

/// Everything the log tells us about one round
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub round: u64,
    pub ticks: u64,
    pub outcome: RoundOutcome,
    pub eliminations: Vec<Elimination>,
    pub final_scores: Vec<(String, u32)>,
}

/// An invariant that did not hold at some logged tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub round: u64,
    pub tick: u64,
    pub message: String,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_rounds: usize,
    pub finished_rounds: usize,
    pub no_winner_rounds: usize,
    pub wins: BTreeMap<String, usize>,
    pub average_ticks: f64,
}

/// Replay engine for analysing tick logs
pub struct ReplayEngine {
    verbose: bool,
}

impl ReplayEngine {
    pub fn new(verbose: bool) -> Self {
        ReplayEngine { verbose }
    }

    /// Loads all log entries from a JSONL file, ordered by round then tick
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<TickLogEntry>, String> {
        let file = File::open(log_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        self.load_lines(BufReader::new(file))
    }

    pub fn load_lines<R: BufRead>(&self, reader: R) -> Result<Vec<TickLogEntry>, String> {
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: TickLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        // Writers are fire-and-forget, so lines can arrive slightly out of order
        entries.sort_by_key(|e| (e.snapshot.round, e.snapshot.tick));

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    fn group_by_round(entries: &[TickLogEntry]) -> BTreeMap<u64, Vec<&GameSnapshot>> {
        let mut rounds: BTreeMap<u64, Vec<&GameSnapshot>> = BTreeMap::new();
        for entry in entries {
            rounds.entry(entry.snapshot.round).or_default().push(&entry.snapshot);
        }
        rounds
    }

    /// Rebuilds every round found in the log
    pub fn summarize_rounds(&self, entries: &[TickLogEntry]) -> Vec<RoundSummary> {
        Self::group_by_round(entries)
            .into_iter()
            .map(|(round, ticks)| self.summarize_round(round, &ticks))
            .collect()
    }

    fn summarize_round(&self, round: u64, ticks: &[&GameSnapshot]) -> RoundSummary {
        let mut eliminations = Vec::new();
        let mut previous: Option<&GameSnapshot> = None;

        for &snapshot in ticks {
            for player in &snapshot.players {
                // Players alive at the previous entry (or at spawn, for the first) who are now dead
                let was_alive = previous
                    .and_then(|p| p.players.iter().find(|q| q.id == player.id))
                    .map(|q| q.alive)
                    .unwrap_or(true);
                if was_alive && !player.alive {
                    eliminations.push(Elimination {
                        tick: snapshot.tick,
                        player: player.name.clone(),
                    });
                }
            }
            previous = Some(snapshot);
        }

        let last = ticks.last();
        let outcome = match last {
            Some(s) if s.state == RoundState::Ended => {
                match s.players.iter().find(|p| p.alive) {
                    Some(p) => RoundOutcome::Winner(p.name.clone()),
                    None => RoundOutcome::NoWinner,
                }
            }
            _ => RoundOutcome::Unfinished,
        };

        let summary = RoundSummary {
            round,
            ticks: last.map(|s| s.tick).unwrap_or(0),
            outcome,
            eliminations,
            final_scores: last
                .map(|s| s.players.iter().map(|p| (p.name.clone(), p.score)).collect())
                .unwrap_or_default(),
        };

        if self.verbose {
            info!(
                "Round {}: {:?} after {} ticks ({} eliminations)",
                summary.round,
                summary.outcome,
                summary.ticks,
                summary.eliminations.len()
            );
        }

        summary
    }

    /// Checks the round invariants over consecutive ticks
    pub fn validate(&self, entries: &[TickLogEntry]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (round, ticks) in Self::group_by_round(entries) {
            let mut previous: Option<&GameSnapshot> = None;

            for snapshot in ticks {
                let mut report = |message: String| {
                    if self.verbose {
                        warn!("Round {} tick {}: {}", round, snapshot.tick, message);
                    }
                    violations.push(Violation {
                        round,
                        tick: snapshot.tick,
                        message,
                    });
                };

                let dead = snapshot.players.iter().filter(|p| !p.alive).count();
                if dead != snapshot.death_count {
                    report(format!(
                        "death count {} but {} players are out",
                        snapshot.death_count, dead
                    ));
                }

                for player in snapshot.players.iter().filter(|p| p.alive) {
                    let pos = player.position;
                    if pos.x < 0 || pos.y < 0 || pos.x >= snapshot.width || pos.y >= snapshot.height {
                        report(format!("{} alive outside the board at {}", player.name, pos));
                    }
                }

                if snapshot.state == RoundState::Ended {
                    let alive = snapshot.players.iter().filter(|p| p.alive).count();
                    if alive > 1 {
                        report(format!("round ended with {} players alive", alive));
                    }
                }

                if let Some(prev) = previous {
                    if snapshot.death_count < prev.death_count {
                        report(format!(
                            "death count dropped from {} to {}",
                            prev.death_count, snapshot.death_count
                        ));
                    }
                    for player in &snapshot.players {
                        let Some(before) = prev.players.iter().find(|p| p.id == player.id) else {
                            continue;
                        };
                        if !before.alive && player.alive {
                            report(format!("{} came back to life", player.name));
                        }
                        if !before.alive && before.position != player.position {
                            report(format!(
                                "{} moved from {} to {} while out",
                                player.name, before.position, player.position
                            ));
                        }
                    }
                }

                previous = Some(snapshot);
            }
        }

        violations
    }

    /// Generates statistics from round summaries
    pub fn generate_stats(&self, rounds: &[RoundSummary]) -> ReplayStats {
        let mut stats = ReplayStats {
            total_rounds: rounds.len(),
            ..ReplayStats::default()
        };

        let mut finished_ticks = 0u64;
        for round in rounds {
            match &round.outcome {
                RoundOutcome::Winner(name) => {
                    *stats.wins.entry(name.clone()).or_default() += 1;
                }
                RoundOutcome::NoWinner => stats.no_winner_rounds += 1,
                RoundOutcome::Unfinished => continue,
            }
            stats.finished_rounds += 1;
            finished_ticks += round.ticks;
        }

        if stats.finished_rounds > 0 {
            stats.average_ticks = finished_ticks as f64 / stats.finished_rounds as f64;
        }
        stats
    }

    /// Prints a report of the replayed rounds
    pub fn print_report(&self, rounds: &[RoundSummary], violations: &[Violation]) {
        let stats = self.generate_stats(rounds);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Rounds:           {}", stats.total_rounds);
        println!("Finished:         {}", stats.finished_rounds);
        println!("No winner:        {}", stats.no_winner_rounds);
        println!("Average length:   {:.1} ticks", stats.average_ticks);
        println!("Violations:       {}", violations.len());
        println!("═══════════════════════════════════════════════════════════\n");

        for (name, wins) in &stats.wins {
            println!("{:<12} {} win(s)", name, wins);
        }
        println!();

        for round in rounds {
            let outcome = match &round.outcome {
                RoundOutcome::Winner(name) => format!("{} wins", name),
                RoundOutcome::NoWinner => "no winner".to_string(),
                RoundOutcome::Unfinished => "unfinished".to_string(),
            };
            let order: Vec<String> = round
                .eliminations
                .iter()
                .map(|e| format!("{}@{}", e.player, e.tick))
                .collect();
            println!(
                "Round {:>3}: {:<18} {:>5} ticks  out: {}",
                round.round,
                outcome,
                round.ticks,
                order.join(", ")
            );
        }

        if !violations.is_empty() {
            println!("\n═══════════════════════════════════════════════════════════");
            println!("                  INVARIANT VIOLATIONS");
            println!("═══════════════════════════════════════════════════════════");
            for v in violations {
                println!("Round {} tick {}: {}", v.round, v.tick, v.message);
            }
            println!();
        }
    }

    /// Checks that specific rounds ended the expected way.
    /// `expected` pairs a round number with a player name, or "none" for no winner.
    pub fn validate_expected_winners(
        &self,
        rounds: &[RoundSummary],
        expected: &[(u64, String)],
    ) -> Result<(), String> {
        for (round_number, winner) in expected {
            let round = rounds
                .iter()
                .find(|r| r.round == *round_number)
                .ok_or_else(|| format!("Round {} not found in log", round_number))?;

            let matches = match &round.outcome {
                RoundOutcome::Winner(name) => name.eq_ignore_ascii_case(winner),
                RoundOutcome::NoWinner => winner.eq_ignore_ascii_case("none"),
                RoundOutcome::Unfinished => false,
            };

            if !matches {
                return Err(format!(
                    "Round {}: expected {}, but got {:?}",
                    round_number, winner, round.outcome
                ));
            }
        }

        Ok(())
    }
}
