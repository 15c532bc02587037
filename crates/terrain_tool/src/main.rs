//! Terrain batch tool.
//!
//! Loads a region of `.optoctrees` batches and runs save or export tasks on
//! it. Every command loads the region `--start..=--end` (batch coordinates)
//! first.
//!
//! Logging goes through `tracing`'s `log` bridge; set `RUST_LOG=debug` for
//! per-batch detail.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glam::IVec3;
use voxel_terrain::{ExportMode, NotificationLevel, Terrain, TerrainConfig};

/// Command-line front end for voxel terrain batches.
#[derive(Parser, Debug)]
#[command(name = "terrain_tool")]
#[command(about = "Loads terrain batches and saves or exports a region")]
struct Cli {
  /// Path to the terrain configuration TOML file.
  #[arg(short, long)]
  config: PathBuf,

  /// Override the configured data directory.
  #[arg(short, long)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

/// Inclusive range of batch coordinates.
#[derive(Args, Debug, Clone, Copy)]
struct Region {
  /// First batch, as `x,y,z`.
  #[arg(long, value_parser = parse_batch, default_value = "0,0,0")]
  start: IVec3,

  /// Last batch (inclusive), as `x,y,z`.
  #[arg(long, value_parser = parse_batch, default_value = "0,0,0")]
  end: IVec3,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load the region and print what it holds.
  Info {
    #[command(flatten)]
    region: Region,
  },
  /// Load the region and write every batch back to the data directory.
  Save {
    #[command(flatten)]
    region: Region,
  },
  /// Apply a patch file to the region, then save it.
  ImportPatch {
    #[command(flatten)]
    region: Region,
    /// Patch file to apply.
    patch: PathBuf,
  },
  /// Copy the region's batches into another directory.
  ExportBatches {
    #[command(flatten)]
    region: Region,
    /// Output directory.
    #[arg(short, long)]
    output: PathBuf,
  },
  /// Diff the region against the data directory into a patch file.
  ExportPatch {
    #[command(flatten)]
    region: Region,
    /// Output `.optoctreepatch` file.
    #[arg(short, long)]
    output: PathBuf,
  },
  /// Mesh the region and write a Wavefront OBJ.
  ExportMesh {
    #[command(flatten)]
    region: Region,
    /// Output `.obj` file.
    #[arg(short, long)]
    output: PathBuf,
  },
}

impl Command {
  fn region(&self) -> Region {
    match self {
      Command::Info { region }
      | Command::Save { region }
      | Command::ImportPatch { region, .. }
      | Command::ExportBatches { region, .. }
      | Command::ExportPatch { region, .. }
      | Command::ExportMesh { region, .. } => *region,
    }
  }
}

/// Parse `x,y,z` into a batch coordinate.
fn parse_batch(s: &str) -> std::result::Result<IVec3, String> {
  let parts = s
    .split(',')
    .map(|p| p.trim().parse::<i32>().map_err(|e| format!("'{p}': {e}")))
    .collect::<std::result::Result<Vec<_>, _>>()?;
  match parts.as_slice() {
    [x, y, z] => Ok(IVec3::new(*x, *y, *z)),
    _ => Err(format!("expected x,y,z, got '{s}'")),
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    .format_timestamp_millis()
    .init();

  let cli = Cli::parse();

  let mut config = TerrainConfig::load(&cli.config)
    .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
  if let Some(dir) = cli.data_dir {
    config.data_dir = dir;
  }
  println!("Data directory: {}", config.data_dir.display());

  let mut terrain = Terrain::new(config);
  let region = cli.command.region();
  terrain
    .load_region(region.start, region.end)
    .context("Failed to start region load")?;
  run(&mut terrain).context("Loading region")?;

  match cli.command {
    Command::Info { .. } => print_info(&terrain),
    Command::Save { .. } => {
      terrain.save_region().context("Failed to start save")?;
      run(&mut terrain).context("Saving region")?;
    }
    Command::ImportPatch { patch, .. } => {
      let applied = terrain
        .import_patch(&patch)
        .with_context(|| format!("Failed to import patch: {}", patch.display()))?;
      println!("Applied {applied} octrees from {}", patch.display());
      terrain.save_region().context("Failed to start save")?;
      run(&mut terrain).context("Saving region")?;
    }
    Command::ExportBatches { output, .. } => {
      export(&mut terrain, ExportMode::Batches { dir: output })?;
    }
    Command::ExportPatch { output, .. } => {
      export(&mut terrain, ExportMode::Patch { path: output })?;
    }
    Command::ExportMesh { output, .. } => {
      export(&mut terrain, ExportMode::Mesh { path: output })?;
    }
  }

  Ok(())
}

fn export(terrain: &mut Terrain, mode: ExportMode) -> Result<()> {
  terrain.export_region(mode).context("Failed to start export")?;
  run(terrain).context("Exporting region")
}

/// Tick the running task to completion, printing progress and notifications.
fn run(terrain: &mut Terrain) -> Result<()> {
  while terrain.is_busy() {
    let result = terrain.tick();
    for notification in terrain.drain_notifications() {
      match notification.level {
        NotificationLevel::Warning => eprintln!("  ! {}", notification.message),
        NotificationLevel::Error => eprintln!("  ✗ {}", notification.message),
        NotificationLevel::Success => println!("  ✓ {}", notification.message),
      }
    }
    let status = result?;
    if terrain.is_busy() {
      println!("  {} ({:.0}%)", status.description, status.fraction * 100.0);
    }
  }
  Ok(())
}

fn print_info(terrain: &Terrain) {
  let metaspace = terrain.metaspace();
  let mut batches = metaspace.loaded_batches();
  batches.sort_by_key(|b| (b.x, b.y, b.z));

  println!("LOD {}", metaspace.lod());
  println!("{} batches, {} octrees", batches.len(), metaspace.octree_count());
  for batch in batches {
    let count = terrain.store().layout().octree_count(batch);
    println!("  batch {},{},{}: {count} octrees", batch.x, batch.y, batch.z);
  }
}
