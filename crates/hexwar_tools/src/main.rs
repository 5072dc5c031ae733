//! Hexwar - Development Tools
//!
//! # Usage
//!
//! ```bash
//! # Check a weapon catalog (or a directory of them)
//! cargo run -p hexwar_tools -- validate assets/data
//!
//! # Resolve a scenario headlessly
//! cargo run -p hexwar_tools -- resolve assets/scenarios/ambush.ron --seed 42 --json
//!
//! # Record and verify a replay
//! cargo run -p hexwar_tools -- record assets/scenarios/ambush.ron --seed 42 --output ambush.replay
//! cargo run -p hexwar_tools -- verify ambush.replay
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hexwar_core::replay::AttackReplay;
use hexwar_tools::scenario::Scenario;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hexwar-tools")]
#[command(about = "Development tools for the hexwar attack resolution engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate weapon catalog files
    Validate {
        /// Catalog file or directory of catalogs
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Resolve a scenario and print the combat log
    Resolve {
        /// Scenario file
        scenario: PathBuf,

        /// Session seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Print the full run as JSON instead of the rendered log
        #[arg(long)]
        json: bool,
    },
    /// Record a scenario as a replay file
    Record {
        /// Scenario file
        scenario: PathBuf,

        /// Session seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Replay file to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Verify that a replay reproduces its recorded log
    Verify {
        /// Replay file
        replay: PathBuf,
    },
}

fn main() {
    // Logs go to stderr; stdout carries the log or JSON.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Resolve {
            scenario,
            seed,
            json,
        } => cmd_resolve(&scenario, seed, json),
        Commands::Record {
            scenario,
            seed,
            output,
        } => cmd_record(&scenario, seed, &output),
        Commands::Verify { replay } => cmd_verify(&replay),
    }
}

fn fail(context: &str, error: &dyn std::fmt::Display) -> ! {
    tracing::error!("{context}: {error}");
    std::process::exit(1);
}

fn cmd_validate(path: &std::path::Path) {
    tracing::info!("Validating catalogs in: {}", path.display());
    match hexwar_tools::validate::validate_data_path(path) {
        Ok(summaries) => {
            for summary in &summaries {
                println!("{}: {} weapons", summary.path.display(), summary.weapons);
            }
            tracing::info!("Validation passed");
        }
        Err(e) => fail("Validation failed", &e),
    }
}

fn cmd_resolve(path: &std::path::Path, seed: u64, json: bool) {
    let scenario = Scenario::load(path).unwrap_or_else(|e| fail("Failed to load scenario", &e));
    let run = scenario
        .resolve(seed)
        .unwrap_or_else(|e| fail("Failed to resolve scenario", &e));

    if json {
        match run.to_json() {
            Ok(text) => println!("{text}"),
            Err(e) => fail("Failed to encode run", &e),
        }
        return;
    }

    for line in &run.log_lines {
        println!("{line}");
    }
    for failure in &run.failures {
        eprintln!("rejected: {failure}");
    }
}

fn cmd_record(path: &std::path::Path, seed: u64, output: &std::path::Path) {
    let scenario = Scenario::load(path).unwrap_or_else(|e| fail("Failed to load scenario", &e));
    let replay = scenario
        .record_replay(seed)
        .unwrap_or_else(|e| fail("Failed to record replay", &e));
    if let Err(e) = replay.save(output) {
        fail("Failed to save replay", &e);
    }
    tracing::info!(
        attacks = replay.declaration_count(),
        hash = replay.final_log_hash,
        "Replay written to {}",
        output.display()
    );
}

fn cmd_verify(path: &std::path::Path) {
    let replay = AttackReplay::load(path).unwrap_or_else(|e| fail("Failed to load replay", &e));
    match replay.verify() {
        Ok(true) => tracing::info!("Replay verified: {}", replay.scenario_id),
        Ok(false) => {
            tracing::error!("Replay diverged: {}", replay.scenario_id);
            std::process::exit(1);
        }
        Err(e) => fail("Failed to play replay", &e),
    }
}
