//! Convert command implementation.
//!
//! Discovers `.dungeon` files, converts each one and prints a summary.
//! Settings come from `sbtiled.yaml` with command-line flags on top.

use std::path::PathBuf;

use clap::Args;

use crate::catalogue::TilesetCatalogue;
use crate::convert::{ConvertOptions, Converter, DungeonReport};
use crate::discovery::{discover, discover_paths, Encoding, Manifest};
use crate::error::{Result, SbError};
use crate::output::{display_path, plural, Printer};
use crate::validation::print_diagnostics;

/// Convert .dungeon files and their PNG parts to Tiled JSON
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Dungeon files or directories (default: the manifest's sources)
    pub paths: Vec<PathBuf>,

    /// Project root holding sbtiled.yaml
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Directory with the packed tileset catalogues
    #[arg(long)]
    pub tilesets: Option<PathBuf>,

    /// Prefix for tileset sources written into chunks
    #[arg(long)]
    pub tileset_source: Option<String>,

    /// Write tile layer data as base64
    #[arg(long)]
    pub base64: bool,

    /// Write <dungeon>.TILES with the legacy tile list
    #[arg(long)]
    pub dump_tiles: bool,

    /// Write <dungeon>.VERIFY with one object match per object
    #[arg(long)]
    pub verify: bool,
}

impl ConvertArgs {
    /// Manifest settings overridden by flags.
    pub fn options(&self, manifest: &Manifest) -> ConvertOptions {
        let tilesets = self
            .tilesets
            .clone()
            .unwrap_or_else(|| manifest.tilesets_dir(&self.root));
        let source = self
            .tileset_source
            .clone()
            .unwrap_or_else(|| manifest.tileset_source.clone());

        ConvertOptions {
            catalogue: TilesetCatalogue::new(tilesets, source),
            encoding: if self.base64 {
                Encoding::Base64
            } else {
                manifest.encoding
            },
            dump_tiles: self.dump_tiles || manifest.dump_tiles,
            verify: self.verify || manifest.verify,
        }
    }
}

/// Totals across every converted dungeon.
#[derive(Debug, Default, PartialEq)]
pub struct ConvertSummary {
    pub dungeons: usize,
    pub written: usize,
    pub refused: usize,
    pub failed: usize,
    pub unmatched: usize,
}

impl ConvertSummary {
    fn add(&mut self, report: &DungeonReport) {
        self.written += report.written();
        self.refused += report.refused();
        self.failed += report.failed();
        self.unmatched += report.unmatched;
    }
}

/// Convert everything and return the totals; used by `run` and tests.
pub fn convert_all(args: &ConvertArgs, printer: &Printer) -> Result<ConvertSummary> {
    let discovery = if args.paths.is_empty() {
        discover(&args.root)?
    } else {
        discover_paths(&args.root, &args.paths)?
    };

    let converter = Converter::new(args.options(&discovery.manifest))?;
    print_diagnostics(printer, &converter.load_report);

    let mut summary = ConvertSummary::default();
    for path in &discovery.scan.dungeons {
        summary.dungeons += 1;
        match converter.convert_dungeon(path, printer) {
            Ok(report) => {
                print_diagnostics(printer, &report.diagnostics);
                summary.add(&report);
            }
            Err(e) => {
                printer.error("Failed", &format!("{}: {}", display_path(path), e));
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

pub fn run(args: ConvertArgs, printer: &Printer) -> Result<()> {
    let summary = convert_all(&args, printer)?;

    if summary.dungeons == 0 {
        printer.warning("Finished", "no .dungeon files found");
        return Ok(());
    }

    let mut line = format!(
        "{} from {}",
        plural(summary.written, "chunk", "chunks"),
        plural(summary.dungeons, "dungeon", "dungeons")
    );
    if summary.refused > 0 {
        line.push_str(&format!(", {} refused", summary.refused));
    }
    if summary.unmatched > 0 {
        line.push_str(&format!(", {} unmatched", plural(summary.unmatched, "tile", "tiles")));
    }

    if summary.failed > 0 {
        printer.error("Finished", &format!("{}, {} failed", line, summary.failed));
        return Err(SbError::Validation {
            message: format!("{} failed to convert", plural(summary.failed, "chunk", "chunks")),
            help: Some("See the messages above for each failure".to_string()),
        });
    }

    printer.status("Finished", &line);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(root: &Path) -> ConvertArgs {
        ConvertArgs {
            paths: vec![],
            root: root.to_path_buf(),
            tilesets: None,
            tileset_source: None,
            base64: false,
            dump_tiles: false,
            verify: false,
        }
    }

    #[test]
    fn test_flags_override_manifest() {
        let manifest = Manifest {
            verify: true,
            ..Default::default()
        };
        let mut args = args(Path::new("/proj"));
        args.base64 = true;
        args.tileset_source = Some("../ts/".to_string());

        let options = args.options(&manifest);
        assert_eq!(options.encoding, Encoding::Base64);
        assert!(options.verify);
        assert!(!options.dump_tiles);
        assert_eq!(options.catalogue.source_for("liquids"), "../ts/liquids.json");
        assert_eq!(options.catalogue.dir(), Path::new("/proj/tilesets/packed"));
    }

    #[test]
    fn test_missing_base_tilesets_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(convert_all(&args(dir.path()), &Printer::quiet()).is_err());
    }
}
