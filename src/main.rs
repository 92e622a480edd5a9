use clap::Parser;
use miette::{IntoDiagnostic, Result};
use ritualbook::application::engine::BookingEngine;
use ritualbook::config::EngineConfig;
use ritualbook::domain::ports::Ports;
use ritualbook::infrastructure::in_memory::in_memory_ports;
use ritualbook::infrastructure::notifier::TracingNotifier;
use ritualbook::interfaces::csv::booking_writer::BookingWriter;
use ritualbook::interfaces::csv::command_reader::CommandReader;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// JSON engine configuration (optional). Missing keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

/// Logs go to stderr; stdout carries only the CSV summary.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();
}

#[cfg(feature = "storage-rocksdb")]
fn open_ports(db_path: Option<PathBuf>) -> Result<Ports> {
    use ritualbook::infrastructure::rocksdb::RocksDBStore;

    let Some(db_path) = db_path else {
        return Ok(in_memory_ports(Box::new(TracingNotifier)));
    };
    tracing::info!(path = %db_path.display(), "opening RocksDB store");
    let store = RocksDBStore::open(db_path).into_diagnostic()?;
    Ok(Ports {
        store: Box::new(store),
        notifier: Box::new(TracingNotifier),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_ports(db_path: Option<PathBuf>) -> Result<Ports> {
    if let Some(db_path) = db_path {
        tracing::warn!(
            path = %db_path.display(),
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(in_memory_ports(Box::new(TracingNotifier)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };
    init_tracing(&config.log_level);

    let engine = BookingEngine::new(open_ports(cli.db_path)?, &config);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (row, command) in reader.commands().enumerate() {
        match command {
            // Rejections are logged at warn by the service; the row is kept here.
            Ok(command) => {
                if let Err(e) = engine.execute(command).await {
                    tracing::debug!(row = row + 1, error = %e, "command not applied");
                }
            }
            Err(e) => {
                tracing::error!(row = row + 1, error = %e, "Error reading command");
            }
        }
    }

    let bookings = engine.shutdown().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = BookingWriter::new(stdout.lock());
    writer.write_bookings(bookings).into_diagnostic()?;

    Ok(())
}
