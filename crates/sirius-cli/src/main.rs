//! sirius CLI
//!
//! Command-line shell for the embeddable database engine: runs SQL from a
//! file, from `-c`, or interactively from stdin, and prints each
//! statement's response as JSON.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sirius_core::{execute, BackendKind, DatabaseManager, EngineConfig, DEFAULT_DATABASE};

/// Run SQL against an embedded database and print JSON responses.
#[derive(Parser)]
#[command(name = "sirius")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to persist tables under. Omit for an in-memory database.
    #[arg(short, long, env = "SIRIUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Logical database name to run statements against.
    #[arg(short = 'n', long, default_value = DEFAULT_DATABASE)]
    database: String,

    /// Run this SQL and exit, instead of reading from stdin.
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Read SQL from this file and exit, instead of reading from stdin.
    #[arg(short, long, conflicts_with = "command")]
    file: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .without_time()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a global tracing subscriber was already installed");
    }

    let config = EngineConfig {
        data_dir: cli.data_dir.clone().unwrap_or_else(|| PathBuf::from("./data")),
        default_backend: if cli.data_dir.is_some() {
            BackendKind::OnDisk
        } else {
            BackendKind::InMemory
        },
        ..EngineConfig::default()
    };

    let manager = match DatabaseManager::new(config) {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("failed to start engine: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(sql) = &cli.command {
        return run_and_print(&manager, &cli.database, sql);
    }

    if let Some(path) = &cli.file {
        let sql = match std::fs::read_to_string(path) {
            Ok(sql) => sql,
            Err(err) => {
                eprintln!("failed to read {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        };
        return run_and_print(&manager, &cli.database, &sql);
    }

    info!(database = %cli.database, "sirius ready, reading statements from stdin");
    run_repl(&manager, &cli.database)
}

fn run_and_print(manager: &DatabaseManager, database: &str, sql: &str) -> ExitCode {
    let mut had_error = false;
    for response in execute(manager, database, sql) {
        had_error |= print_response(&response);
    }
    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_repl(manager: &DatabaseManager, database: &str) -> ExitCode {
    let stdin = io::stdin();
    let mut had_error = false;
    let mut buffer = String::new();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        buffer.push_str(&line);
        buffer.push('\n');
        if !line.trim_end().ends_with(';') {
            continue;
        }
        for response in execute(manager, database, &buffer) {
            had_error |= print_response(&response);
        }
        buffer.clear();
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_response(response: &sirius_core::EngineResponse) -> bool {
    let is_error = serde_json::to_value(response)
        .ok()
        .and_then(|v| v.get("status").and_then(|s| s.as_str().map(str::to_string)))
        .is_some_and(|status| status == "error");
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize response: {err}"),
    }
    let _ = io::stdout().flush();
    is_error
}
