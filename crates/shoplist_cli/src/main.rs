//! One-shot startup entry point.
//!
//! # Responsibility
//! - Run the startup sequence: config, logging, store, sentinel, then the
//!   optional seed and dump actions.
//! - Print a short store summary for local sanity checks.
//!
//! # Invariants
//! - The store failing to open is fatal: logged, reported on stderr, non-zero
//!   exit.
//! - Seeding only touches a store holding nothing but the sentinel.

use log::{error, info};
use shoplist_core::db::open_db;
use shoplist_core::{
    export_snapshot, import_snapshot, init_logging, is_store_unseeded, read_snapshot_dir,
    write_snapshot_dir, LocationService, SqliteLocationRepository, StartupConfig,
};
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

#[derive(Debug)]
struct StartupError {
    stage: &'static str,
    message: String,
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Tags a failure with the startup stage it happened in.
fn at<E: Display>(stage: &'static str) -> impl FnOnce(E) -> StartupError {
    move |err| StartupError {
        stage,
        message: err.to_string(),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=startup module=cli status=error stage={} error={}",
                err.stage, err.message
            );
            eprintln!("shoplist: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), StartupError> {
    let config = StartupConfig::global().map_err(at("config"))?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, &log_dir.to_string_lossy()).map_err(at("logging"))?;
    }

    let conn = open_db(&config.db_path).map_err(at("store open"))?;
    let locations = SqliteLocationRepository::try_new(&conn)
        .map(LocationService::new)
        .map_err(at("store open"))?;
    let unknown = locations.unknown_location().map_err(at("unknown location"))?;
    info!(
        "event=startup module=cli status=ok db_path={} unknown_location_id={}",
        config.db_path.display(),
        unknown.uuid
    );

    if let Some(seed_dir) = &config.seed_dir {
        if is_store_unseeded(&conn).map_err(at("seed"))? {
            let snapshot = read_snapshot_dir(seed_dir).map_err(at("seed"))?;
            let summary = import_snapshot(&conn, &snapshot).map_err(at("seed"))?;
            println!(
                "seeded {} location(s), {} item(s) from {}",
                summary.locations_created,
                summary.items_created,
                seed_dir.display()
            );
        } else {
            info!("event=seed module=cli status=skipped reason=store_not_empty");
        }
    }

    if let Some(dump_dir) = &config.dump_dir {
        let snapshot = export_snapshot(&conn).map_err(at("dump"))?;
        write_snapshot_dir(dump_dir, &snapshot).map_err(at("dump"))?;
        println!("dumped store to {}", dump_dir.display());
    }

    let summaries = locations.list_location_summaries().map_err(at("summary"))?;
    let item_total: u32 = summaries.iter().map(|summary| summary.item_count).sum();
    println!("shoplist_core version={}", shoplist_core::core_version());
    println!(
        "store={} locations={} items={}",
        config.db_path.display(),
        summaries.len(),
        item_total
    );
    Ok(())
}
