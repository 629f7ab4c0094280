//! Importar CLI: run an import from a JSON-lines file into a mirror.
//!
//! Usage:
//!   importar import --records <file.jsonl> [--record-type T] [--kind K]
//!                   [--key-type K] [--state <state.json>] [--config <config.yaml>]

use clap::{Parser, Subcommand};
use importar::{
    ImportError, ImportKind, ImportPipeline, ImporterConfig, MirrorStore, MirrorSubscriber,
    Record, SourceItem, ValidationError,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error as _;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

#[derive(Parser)]
#[command(
    name = "importar",
    version,
    about = "Import records and mirror them into a keyed store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one import
    Import {
        /// JSON-lines file, one record per line
        #[arg(long)]
        records: PathBuf,
        /// Record type announced to subscribers
        #[arg(long)]
        record_type: Option<String>,
        /// full-sync or partial-update
        #[arg(long)]
        kind: Option<ImportKind>,
        /// Identifier type that keys the mirror
        #[arg(long)]
        key_type: Option<String>,
        /// Mirror state file, read before and written after a successful import
        #[arg(long)]
        state: Option<PathBuf>,
        /// Path to YAML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

struct ImportArgs {
    records: PathBuf,
    record_type: Option<String>,
    kind: Option<ImportKind>,
    key_type: Option<String>,
    state: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn resolve_config(args: &ImportArgs) -> Result<ImporterConfig, String> {
    let mut config = ImporterConfig::load_or_default(args.config.as_deref())
        .map_err(|e| e.to_string())?;
    if let Some(record_type) = &args.record_type {
        config.record_type = record_type.clone();
    }
    if let Some(kind) = args.kind {
        config.kind = kind;
    }
    if let Some(key_type) = &args.key_type {
        config.key_type = key_type.clone();
    }
    Ok(config)
}

fn load_state(path: Option<&Path>, key_type: &str) -> Result<MirrorStore, String> {
    let entries: BTreeMap<String, Value> = match path {
        Some(path) if path.exists() => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read state {}: {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("invalid state {}: {}", path.display(), e))?
        }
        _ => BTreeMap::new(),
    };
    Ok(MirrorStore::with_entries(key_type, entries))
}

fn save_state(path: &Path, store: &MirrorStore) -> Result<(), String> {
    let text = serde_json::to_string_pretty(&store.snapshot()).map_err(|e| e.to_string())?;
    std::fs::write(path, text)
        .map_err(|e| format!("failed to write state {}: {}", path.display(), e))
}

/// Lazily decode a JSON-lines file. Blank lines are skipped.
fn read_records(path: &Path) -> Result<impl Iterator<Item = Result<Record, ImportError>>, String> {
    let file =
        File::open(path).map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
    let records = BufReader::new(file)
        .lines()
        .enumerate()
        .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|(n, line)| -> Result<Record, ImportError> {
            let line = line.map_err(ImportError::other)?;
            let value: Value = serde_json::from_str(&line).map_err(|e| {
                ValidationError::InvalidRecord(format!("line {}: {}", n + 1, e))
            })?;
            value.into_record()
        });
    Ok(records)
}

fn print_error_chain(err: &ImportError) {
    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn cmd_import(args: ImportArgs) -> i32 {
    let config = match resolve_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let store = match load_state(args.state.as_deref(), &config.key_type) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let records = match read_records(&args.records) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut pipeline = ImportPipeline::new();
    pipeline.subscribe(Arc::new(
        MirrorSubscriber::new(store.clone(), config.record_type.clone())
            .with_controller(config.controller.clone()),
    ));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let result = rt.block_on(pipeline.perform_import(
        config.record_type.clone(),
        config.kind,
        records,
    ));
    let op = match result {
        Ok(op) => op,
        Err(e) => {
            print_error_chain(&e);
            return 1;
        }
    };

    if let Some(path) = &args.state {
        if let Err(e) = save_state(path, &store) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    println!("{} finished: {} entries mirrored", op, store.len());
    0
}

fn main() {
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Import {
            records,
            record_type,
            kind,
            key_type,
            state,
            config,
        } => cmd_import(ImportArgs {
            records,
            record_type,
            kind,
            key_type,
            state,
            config,
        }),
    };
    std::process::exit(code);
}
