//! Init command implementation.
//!
//! Writes a commented `sbtiled.yaml` listing the directories that hold
//! dungeons.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::discovery::{
    scan_directory, Manifest, DEFAULT_TILESETS, DEFAULT_TILESET_SOURCE, MANIFEST_FILENAME,
};
use crate::error::{Result, SbError};
use crate::output::{display_path, plural, Printer};

/// Initialize an sbtiled project by writing sbtiled.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing sbtiled.yaml
    #[arg(long)]
    pub force: bool,
}

/// Manifest text for the given source directories.
pub fn manifest_template(sources: &BTreeSet<String>) -> String {
    let mut yaml = String::from("# sbtiled project settings\n\n");

    if sources.is_empty() || (sources.len() == 1 && sources.contains(".")) {
        yaml.push_str("# Directories scanned for .dungeon files\n# sources:\n#   - dungeons/\n\n");
    } else {
        yaml.push_str("# Directories scanned for .dungeon files\nsources:\n");
        for dir in sources {
            yaml.push_str(&format!("  - \"{}\"\n", dir));
        }
        yaml.push('\n');
    }

    yaml.push_str("# Packed tileset catalogues (materials.json, objects-by-*/...)\n");
    yaml.push_str(&format!("tilesets: {}\n\n", DEFAULT_TILESETS));
    yaml.push_str("# Prefix written before <tileset>.json in chunk files\n");
    yaml.push_str(&format!("tileset_source: \"{}\"\n\n", DEFAULT_TILESET_SOURCE));
    yaml.push_str("# Tile layer data: csv or base64\n");
    yaml.push_str("encoding: csv\n\n");
    yaml.push_str("# Debug dumps written next to each dungeon\n");
    yaml.push_str("dump_tiles: false\n");
    yaml.push_str("verify: false\n\n");
    yaml.push_str("excludes: []\n");
    yaml
}

fn source_dir(file: &Path, root: &Path) -> String {
    let parent = file.parent().unwrap_or(root);
    let relative = parent.strip_prefix(root).unwrap_or(parent);
    if relative == Path::new("") {
        ".".to_string()
    } else {
        format!("{}/", relative.display())
    }
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(SbError::Validation {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &display_path(&args.path));
    // An existing manifest is about to be replaced, so scan without it.
    let scan = scan_directory(&args.path, &Manifest::default());

    let sources: BTreeSet<String> = scan
        .dungeons
        .iter()
        .map(|f| source_dir(f, &args.path))
        .collect();

    fs::write(&manifest_path, manifest_template(&sources)).map_err(|e| SbError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    if !sources.is_empty() {
        let dirs: Vec<&str> = sources.iter().map(String::as_str).collect();
        printer.info("Discovered", &dirs.join(", "));
    }
    printer.status(
        "Created",
        &format!(
            "{} ({} found)",
            MANIFEST_FILENAME,
            plural(scan.total(), "dungeon", "dungeons")
        ),
    );

    Ok(())
}
