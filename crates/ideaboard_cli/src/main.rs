//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `ideaboard_core` linkage.
//! - Seed a board from an optional persona and print a deterministic summary.
//!
//! Usage: `ideaboard_cli [persona] [db_path]`. Without `db_path` the board
//! lives in memory. `IDEABOARD_LOG_DIR` (absolute) enables file logging.

use ideaboard_core::db::{open_db, open_db_in_memory};
use ideaboard_core::persona::presets;
use ideaboard_core::{init_logging, BoardConfig, BoardController, SqliteBoardRepository};
use log::info;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "IDEABOARD_LOG_DIR";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let persona = args.next();
    let db_path = args.next();

    println!("ideaboard_core ping={}", ideaboard_core::ping());
    println!("ideaboard_core version={}", ideaboard_core::core_version());
    if persona.as_deref() == Some("--list") {
        for preset in presets() {
            println!("persona {} {} {}", preset.kind, preset.icon, preset.name);
        }
        return Ok(());
    }

    let settings = BoardConfig {
        persona,
        ..BoardConfig::default()
    }
    .validate()
    .map_err(|err| err.to_string())?;
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        init_logging(settings.log_level, &log_dir)?;
    }

    let conn = match &db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let board = BoardController::open(SqliteBoardRepository::new(&conn), settings)
        .map_err(|err| err.to_string())?;
    info!("event=cli_summary module=cli status=start");

    let snapshot = board.snapshot();
    println!("board revision={}", snapshot.revision());
    for category in snapshot.categories() {
        println!(
            "column {} {} active={} archived={}",
            category.icon,
            category.title,
            snapshot.active_notes(category.id).len(),
            snapshot
                .lane_notes(category.id)
                .iter()
                .filter(|note| note.archived)
                .count()
        );
    }
    Ok(())
}
