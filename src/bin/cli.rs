//! partledger CLI
//!
//! Opens a world-state store, runs one command against it, and closes it.
//! Payloads go to stdout, logs to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use partledger::wal::WalRecovery;
use partledger::{AssetService, Config, Store, Transaction, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// partledger CLI
#[derive(Parser, Debug)]
#[command(name = "partledger")]
#[command(about = "Car-part certificate registry over an embedded world state")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./partledger_data")]
    data_dir: PathBuf,

    /// fsync the WAL after every write
    #[arg(long)]
    sync_every_write: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a transaction (InitLedger, CreateAsset, UpdateAsset, DeleteAsset, ...)
    Invoke {
        /// Transaction function name
        function: String,

        /// Positional arguments
        args: Vec<String>,
    },

    /// Evaluate a read-only transaction (ReadAsset, AssetExists, GetAllAssets)
    Query {
        /// Transaction function name
        function: String,

        /// Positional arguments
        args: Vec<String>,
    },

    /// Print raw world-state entries in key order
    Scan {
        /// First key (inclusive); omit for the start of the keyspace
        #[arg(long, default_value = "")]
        start: String,

        /// Last key (exclusive); omit for the end of the keyspace
        #[arg(long, default_value = "")]
        end: String,
    },

    /// Check WAL integrity without modifying it
    VerifyWal,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,partledger=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> partledger::Result<()> {
    let sync = if args.sync_every_write {
        WalSyncStrategy::EveryWrite
    } else {
        Config::default().wal_sync_strategy
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wal_sync_strategy(sync)
        .build();

    match args.command {
        Commands::Invoke { function, args } => with_store(config, |store| {
            let tx = Transaction::parse(&function, &args)?;
            print_payload(AssetService::new(store).execute(tx)?);
            tracing::info!(function = %function, "Transaction committed");
            Ok(())
        }),
        Commands::Query { function, args } => with_store(config, |store| {
            let tx = Transaction::parse(&function, &args)?;
            print_payload(AssetService::new(store).evaluate(tx)?);
            Ok(())
        }),
        Commands::Scan { start, end } => with_store(config, |store| {
            let mut iter = store.range_scan(start.as_bytes(), end.as_bytes())?;
            while iter.has_next() {
                let (key, value) = iter.next()?;
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
            iter.close();
            Ok(())
        }),
        // Reads the log directly; opening the store would replay it
        Commands::VerifyWal => verify_wal(&args.data_dir),
    }
}

/// Open the store, run `command`, and close the store even if it failed
fn with_store<F>(config: Config, command: F) -> partledger::Result<()>
where
    F: FnOnce(&Store) -> partledger::Result<()>,
{
    let store = Store::open(config)?;
    let result = command(&store);
    let closed = store.close();
    result.and(closed)
}

fn verify_wal(data_dir: &Path) -> partledger::Result<()> {
    let wal_path = Store::wal_path(data_dir);
    if !wal_path.exists() {
        println!("No WAL at {}", wal_path.display());
        return Ok(());
    }

    let report = WalRecovery::verify(&wal_path)?;
    println!("WAL:              {}", wal_path.display());
    println!("Valid entries:    {}", report.entries_recovered);
    println!("Corrupted:        {}", report.entries_corrupted);
    println!("Last LSN:         {}", report.last_lsn);
    println!("Valid bytes:      {}", report.valid_bytes);
    println!("Needs truncation: {}", report.was_truncated);
    Ok(())
}

fn print_payload(payload: Option<Vec<u8>>) {
    if let Some(bytes) = payload {
        println!("{}", String::from_utf8_lossy(&bytes));
    }
}
