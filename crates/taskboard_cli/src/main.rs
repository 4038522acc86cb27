//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskboard_core` linkage.
//! - Print a card's burndown series from an existing database.
//!
//! Usage: `taskboard_cli <db-path> burndown <card-uuid> [horizon YYYY-MM-DD]`.
//! Set `TASKBOARD_CONFIG` to a TOML file to override core defaults.

use chrono::{DateTime, NaiveDate, Utc};
use std::env;
use std::process::ExitCode;
use taskboard_core::{
    init_logging_from_config, open_db, CoreConfig, EffortService, SqliteEffortRepository,
};
use uuid::Uuid;

const CONFIG_ENV: &str = "TASKBOARD_CONFIG";

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        println!("taskboard_core version={}", taskboard_core::core_version());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("event=cli_run module=cli status=error message={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let (db_path, card_arg, horizon_arg) = match args {
        [db_path, command, card] if command == "burndown" => (db_path, card, None),
        [db_path, command, card, horizon] if command == "burndown" => {
            (db_path, card, Some(horizon))
        }
        _ => return Err(usage()),
    };

    let config = load_config()?;
    init_logging_from_config(&config)?;

    let card_uuid =
        Uuid::parse_str(card_arg).map_err(|err| format!("invalid card uuid `{card_arg}`: {err}"))?;
    let horizon = match horizon_arg {
        Some(value) => parse_horizon(value, &config)?,
        None => Utc::now(),
    };

    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteEffortRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = EffortService::with_config(repo, &config);
    let series = service
        .burndown(card_uuid, horizon)
        .map_err(|err| err.to_string())?;

    for (day, remaining) in series.iter() {
        println!("{day} {remaining}");
    }
    Ok(())
}

fn load_config() -> Result<CoreConfig, String> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => CoreConfig::load_from_file(&path).map_err(|err| err.to_string()),
        None => Ok(CoreConfig::default()),
    }
}

/// Resolves a horizon day to noon of that day in the reference zone.
fn parse_horizon(value: &str, config: &CoreConfig) -> Result<DateTime<Utc>, String> {
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid horizon `{value}`: {err}"))?;
    let noon = day
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| format!("invalid horizon `{value}`"))?;
    noon.and_local_timezone(config.reference_zone().offset())
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("invalid horizon `{value}`"))
}

fn usage() -> String {
    "usage: taskboard_cli <db-path> burndown <card-uuid> [horizon YYYY-MM-DD]".to_string()
}
