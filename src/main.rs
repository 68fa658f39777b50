use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error, info};

use workorder_insights::config::AppConfig;
use workorder_insights::logging::init_logging;
use workorder_insights::{ErrorResponse, WorkOrderError, WorkOrderService};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file, applied over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and work-order table if missing
    Init,
    /// Replace all work orders with the contents of an Excel or CSV file
    Upload {
        /// File to ingest (.xlsx, .xls or .csv)
        file: PathBuf,
    },
    /// Query one page of enriched work orders with KPIs
    Query {
        /// Query parameters as key=value (e.g. Equipement=STS01 page=2)
        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Stream every matching work order as NDJSON
    Stream {
        /// Query parameters as key=value; pagination is ignored
        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Show the row count of every table, backups included
    Tables,
    /// Replace the work-order table with a backup table
    Restore {
        /// Backup table name
        backup_table: String,
    },
}

fn parse_pair(arg: &str) -> std::result::Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {arg:?}"))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database.path = db.to_string_lossy().into_owned();
    } else {
        config.database.path = config.get_database_path();
    }

    // RUST_LOG, when set, overrides the configured level
    let _guard = init_logging(
        Some(config.logging.level.as_str()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;
    debug!(database = %config.database.path, "Configuration loaded");

    let outcome = WorkOrderService::new(config).and_then(|service| run(&service, cli.command));
    match outcome {
        Ok(Ok(code)) => Ok(code),
        Ok(Err(io_err)) => Err(io_err).context("Failed to write output"),
        Err(err) => {
            error!(code = err.code(), error = %err, "Command failed");
            write_json(&ErrorResponse::from(&err)).context("Failed to write error")?;
            if matches!(err, WorkOrderError::RestoreFailed { .. }) {
                Ok(ExitCode::from(2))
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Run one command; the outer error is a domain failure, the inner one an
/// output failure.
fn run(
    service: &WorkOrderService,
    command: Commands,
) -> workorder_insights::Result<std::io::Result<ExitCode>> {
    match command {
        Commands::Init => {
            info!(path = %service.database().path().display(), "Database initialized");
            let tables = service.tables()?;
            Ok(write_json(&tables))
        }
        Commands::Upload { file } => {
            let report = service.upload(&file)?;
            Ok(write_json(&report))
        }
        Commands::Query { params } => {
            let query = service.parse_query(params)?;
            let response = service.query(&query)?;
            Ok(write_json(&response))
        }
        Commands::Stream { params } => {
            let query = service.parse_query(params)?;
            let stdout = std::io::stdout();
            let mut out = std::io::BufWriter::new(stdout.lock());
            // failures mid-stream are already reported inline
            match service.stream(&query, &mut out) {
                Ok(_) => Ok(Ok(ExitCode::SUCCESS)),
                Err(_) => Ok(Ok(ExitCode::FAILURE)),
            }
        }
        Commands::Tables => {
            let tables = service.tables()?;
            Ok(write_json(&tables))
        }
        Commands::Restore { backup_table } => {
            let report = service.restore(&backup_table)?;
            Ok(write_json(&report))
        }
    }
}

fn write_json<T: Serialize>(value: &T) -> std::io::Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(std::io::Error::from)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
