//! PlanTree command line entry point.
//!
//! # Responsibility
//! - Load a plan (snapshot file, saved snapshot or the demo programme).
//! - Print one derived view as JSON on stdout.
//!
//! # Invariants
//! - Diagnostics go to the log file and stderr, never to stdout.

use clap::{Parser, ValueEnum};
use log::info;
use plantree_core::db::{open_db, open_db_in_memory};
use plantree_core::seed::energy_programme;
use plantree_core::sync::widget::timeline_snapshot;
use plantree_core::{
    init_logging, PlanConfig, PlanService, SqliteSnapshotRepository, TreeStore, ROOT_ID,
};
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Dotted-path table rows
    Rows,
    /// Diagram boxes and elbow edges
    Diagram,
    /// Timeline widget feed
    Timeline,
    /// Programme totals and the priority review queue
    Summary,
}

/// Project plan tree viewer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON snapshot to load instead of the demo programme
    #[arg(short = 's', long = "snapshot", value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// JSON config file (layout, schedule defaults, logging, legend)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database for named snapshots (default: in-memory)
    #[arg(long = "db", value_name = "FILE")]
    db: Option<PathBuf>,

    /// Replace the plan with a saved snapshot
    #[arg(long = "load", value_name = "NAME")]
    load: Option<String>,

    /// Save the plan under NAME after collapses are applied
    #[arg(long = "save", value_name = "NAME")]
    save: Option<String>,

    /// Print saved snapshot names instead of a view
    #[arg(long = "list")]
    list: bool,

    /// Collapse a node (can be specified multiple times)
    #[arg(long = "collapse", value_name = "ID")]
    collapse: Vec<String>,

    /// View to print
    #[arg(short = 'f', long = "format", value_enum, default_value = "rows")]
    format: Format,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("plantree: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => PlanConfig::load(path)?,
        None => PlanConfig::default(),
    };
    init_logging(&config.logging)?;

    let store = match &args.snapshot {
        Some(path) => TreeStore::import_json(&std::fs::read_to_string(path)?)?,
        None => energy_programme(config.legend.clone()),
    };

    let conn = match &args.db {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let mut service =
        PlanService::with_store(SqliteSnapshotRepository::new(&conn), store, config);

    if let Some(name) = &args.load {
        if !service.load(name)? {
            return Err(format!("no saved snapshot named `{name}`").into());
        }
    }
    for id in &args.collapse {
        service.store_mut().set_collapsed(id, true);
    }
    if let Some(name) = &args.save {
        service.save_as(name)?;
    }

    info!(
        "event=cli_render module=cli status=ok format={:?} revision={}",
        args.format,
        service.store().revision()
    );

    if args.list {
        let names: Vec<Value> = service
            .list_saved()?
            .into_iter()
            .map(|summary| {
                json!({
                    "name": summary.name,
                    "nodeCount": summary.node_count,
                    "updatedAt": summary.updated_at,
                })
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&names)?);
    }

    let views = service.views();
    let output = match args.format {
        Format::Rows => serde_json::to_value(&views.rows)?,
        Format::Diagram => serde_json::to_value(&views.diagram)?,
        Format::Timeline => {
            let store = service.store();
            serde_json::to_value(timeline_snapshot(
                store.tree(),
                store.collapsed(),
                &views.schedule,
                &service.config().schedule,
            ))?
        }
        Format::Summary => {
            let root = views.schedule.entry(ROOT_ID);
            let queue: Vec<&str> = views
                .review_queue()
                .into_iter()
                .map(|row| row.id.as_str())
                .collect();
            json!({
                "revision": views.revision,
                "nodes": service.store().tree().len(),
                "visibleRows": views.rows.len(),
                "progress": views.schedule.progress_of(ROOT_ID),
                "start": root.start_text(),
                "end": root.end_text(),
                "durationDays": root.duration,
                "reviewQueue": queue,
            })
        }
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
