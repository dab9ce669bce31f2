use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensor_layout_core::{
    DocumentPoint, MarkerId, PlacementConfig, PlacementEngine, StaticDocument, ZoneElement,
};
use sensor_layout_storage::FileStore;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "sensor-layout")]
#[command(about = "Place sensor markers on floor-plan zones")]
pub struct Cli {
    /// Directory holding persisted layouts (defaults to the local data dir).
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Floor-plan zones as JSON: `{"elements": [...], "viewport": {...}}` or a bare element array.
    #[arg(long, global = true, value_name = "FILE")]
    zones: Option<PathBuf>,

    /// Layout storage key.
    #[arg(long, global = true)]
    key: Option<String>,

    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the zones found in the floor plan.
    Zones,
    /// Place a sensor at a document point.
    Place {
        #[arg(value_name = "TYPE")]
        sensor_type: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(long)]
        label: Option<String>,
    },
    /// Move a placed marker to a document point.
    Move {
        id: u64,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Delete a placed marker.
    Remove { id: u64 },
    /// Print the persisted layout.
    List,
    /// Delete every marker and the persisted layout.
    Clear,
    /// Print CLI version.
    Version,
}

/// Accepted shapes of the `--zones` file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZonesFile {
    Elements(Vec<ZoneElement>),
    Document(StaticDocument),
}

#[derive(Debug, Serialize)]
struct RemovedOutput {
    removed: MarkerId,
}

#[derive(Debug, Serialize)]
struct ClearedOutput {
    cleared: String,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    if let Commands::Version = cli.command {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut engine = open_engine(&cli)?;

    match cli.command {
        Commands::Zones => print_json(engine.zones().zones()),
        Commands::List => print_json(&engine.markers().snapshot()),
        Commands::Place { sensor_type, x, y, label } => {
            let mut marker = engine
                .place(sensor_type, DocumentPoint::new(x, y))
                .with_context(|| format!("cannot place sensor at ({x}, {y})"))?;
            if label.is_some() {
                marker = engine.relabel_marker(marker.id(), label)?;
            }
            engine.save_layout().context("failed to save layout")?;
            print_json(&marker.to_record())
        }
        Commands::Move { id, x, y } => {
            let marker = engine
                .move_marker(MarkerId::new(id), DocumentPoint::new(x, y))
                .with_context(|| format!("cannot move marker {id}"))?;
            engine.save_layout().context("failed to save layout")?;
            print_json(&marker.to_record())
        }
        Commands::Remove { id } => {
            let marker = engine
                .remove_marker(MarkerId::new(id))
                .with_context(|| format!("cannot remove marker {id}"))?;
            engine.save_layout().context("failed to save layout")?;
            print_json(&RemovedOutput { removed: marker.id() })
        }
        Commands::Clear => {
            engine.clear_layout().context("failed to clear layout")?;
            print_json(&ClearedOutput { cleared: engine.config().storage_key.clone() })
        }
        Commands::Version => Ok(()),
    }
}

fn open_engine(cli: &Cli) -> Result<PlacementEngine<FileStore>> {
    let mut config = match &cli.config {
        Some(path) => PlacementConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?
            .apply_env()?,
        None => PlacementConfig::from_env()?,
    };
    if let Some(key) = &cli.key {
        config = config.with_storage_key(key.clone());
    }

    let storage = match &cli.store {
        Some(root) => FileStore::with_root(root),
        None => FileStore::from_default_project()?,
    };
    log::debug!("using layout store at {}", storage.root().display());

    let document = match &cli.zones {
        Some(path) => read_document(path)?,
        None => StaticDocument::empty(),
    };

    let mut engine = PlacementEngine::new(storage, config);
    let load = engine.load_document(Box::new(document)).context("failed to restore layout")?;
    if load.layout_corrupt {
        log::warn!("stored layout was unreadable and has been ignored");
    }

    Ok(engine)
}

fn read_document(path: &Path) -> Result<StaticDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read zones file {}", path.display()))?;

    let parsed: ZonesFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid zones file {}", path.display()))?;

    Ok(match parsed {
        ZonesFile::Document(document) => document,
        ZonesFile::Elements(elements) => StaticDocument::from_elements(elements),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
