//! Inspect command: classify one dungeon's legacy tiles without writing.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::classify::{classify, Bucket, SortedTiles};
use crate::discovery::read_json;
use crate::error::{Result, SbError};
use crate::output::{display_path, plural, Printer};
use crate::types::{DungeonFile, LegacyTile};
use crate::validation::{check_duplicate_rgba, print_diagnostics, ValidationResult};

/// Show how a dungeon's legacy tiles are classified
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// The .dungeon file
    pub file: PathBuf,

    /// Print JSON to stdout
    #[arg(long)]
    pub json: bool,
}

/// One bucket with the labels of its tiles.
#[derive(Debug, Serialize)]
pub struct BucketView {
    pub bucket: Bucket,
    pub tiles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Inspection {
    pub name: String,
    pub tiles: usize,
    pub buckets: Vec<BucketView>,
    pub diagnostics: ValidationResult,
}

pub fn inspect(dungeon: &DungeonFile) -> Inspection {
    let mut diagnostics = check_duplicate_rgba(&dungeon.tiles);
    let sorted = classify(&dungeon.tiles, &mut diagnostics);
    Inspection {
        name: dungeon.metadata.name.clone(),
        tiles: dungeon.tiles.len(),
        buckets: bucket_views(&dungeon.tiles, &sorted),
        diagnostics,
    }
}

fn bucket_views(tiles: &[LegacyTile], sorted: &SortedTiles) -> Vec<BucketView> {
    sorted
        .counts()
        .into_iter()
        .map(|(bucket, _)| BucketView {
            bucket,
            tiles: sorted.get(bucket).iter().map(|&i| tiles[i].label()).collect(),
        })
        .collect()
}

pub fn run(args: InspectArgs, printer: &Printer) -> Result<()> {
    let dungeon: DungeonFile = read_json(&args.file)?;
    let inspection = inspect(&dungeon);

    if args.json {
        let json = serde_json::to_string_pretty(&inspection).map_err(|e| SbError::Validation {
            message: format!("Failed to serialize inspection: {}", e),
            help: None,
        })?;
        println!("{}", json);
        return Ok(());
    }

    printer.info(
        "Inspecting",
        &format!(
            "{} ({}, {})",
            display_path(&args.file),
            inspection.name,
            plural(inspection.tiles, "tile", "tiles")
        ),
    );
    for view in &inspection.buckets {
        printer.info(
            view.bucket.name(),
            &format!("{}: {}", view.tiles.len(), printer.dim(&view.tiles.join(", "))),
        );
    }
    print_diagnostics(printer, &inspection.diagnostics);
    Ok(())
}
