//! Finding dungeons and reading project files.
//!
//! A project is a directory holding `.dungeon` files, their painted PNGs
//! and optionally an `sbtiled.yaml` manifest. Without a manifest the whole
//! directory is scanned with default settings.
//!
//! # Example
//!
//! ```ignore
//! use sbtiled::discovery::discover;
//!
//! let result = discover("./dungeons")?;
//! println!("Found {} dungeons", result.scan.total());
//! ```

mod json;
mod manifest;
mod scanner;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use json::{read_json, read_json_value, strip_json_comments, write_json_new, write_new, WriteOutcome};
pub use manifest::{Encoding, Manifest, DEFAULT_TILESETS, DEFAULT_TILESET_SOURCE};
pub use scanner::{is_dungeon_file, scan_directory, scan_sources, ScanResult, DUNGEON_EXTENSION};

pub const MANIFEST_FILENAME: &str = "sbtiled.yaml";

/// Result of discovering dungeons in a project.
#[derive(Debug)]
pub struct DiscoveryResult {
    pub root: PathBuf,

    /// The loaded manifest, or the default one.
    pub manifest: Manifest,

    pub has_manifest: bool,

    pub scan: ScanResult,
}

fn load_manifest(root: &Path) -> Result<(Manifest, bool)> {
    let manifest_path = root.join(MANIFEST_FILENAME);
    if manifest_path.exists() {
        Ok((Manifest::load(&manifest_path)?, true))
    } else {
        Ok((Manifest::default(), false))
    }
}

/// Discover dungeons under a project root using its manifest.
pub fn discover(root: impl AsRef<Path>) -> Result<DiscoveryResult> {
    let root = root.as_ref().to_path_buf();
    let (manifest, has_manifest) = load_manifest(&root)?;

    let scan = scan_sources(&manifest.effective_sources(), &root, &manifest);

    Ok(DiscoveryResult {
        root,
        manifest,
        has_manifest,
        scan,
    })
}

/// Discover dungeons from explicit paths.
///
/// Directories are walked and files are taken as given. The manifest, if
/// any, is read from `root` for its settings and excludes only.
pub fn discover_paths(root: impl AsRef<Path>, paths: &[PathBuf]) -> Result<DiscoveryResult> {
    let root = root.as_ref().to_path_buf();
    let (manifest, has_manifest) = load_manifest(&root)?;
    let mut scan = ScanResult::new();

    for path in paths {
        if path.is_dir() {
            scan.merge(scan_directory(path, &manifest));
        } else if path.is_file() && is_dungeon_file(path) {
            scan.merge(ScanResult {
                dungeons: vec![path.clone()],
            });
        }
    }

    Ok(DiscoveryResult {
        root,
        manifest,
        has_manifest,
        scan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discover_without_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tower.dungeon"), "{}").unwrap();

        let result = discover(dir.path()).unwrap();
        assert!(!result.has_manifest);
        assert_eq!(result.scan.total(), 1);
        assert_eq!(result.manifest, Manifest::default());
    }

    #[test]
    fn test_discover_uses_manifest_sources() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dungeons")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("dungeons/a.dungeon"), "{}").unwrap();
        fs::write(dir.path().join("other/b.dungeon"), "{}").unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            "sources:\n  - dungeons\nverify: true\n",
        )
        .unwrap();

        let result = discover(dir.path()).unwrap();
        assert!(result.has_manifest);
        assert!(result.manifest.verify);
        assert_eq!(result.scan.total(), 1);
        assert!(result.scan.dungeons[0].ends_with("a.dungeon"));
    }

    #[test]
    fn test_discover_paths_mixes_files_and_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.dungeon"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("sub/b.dungeon"), "{}").unwrap();

        let paths = vec![
            dir.path().join("a.dungeon"),
            dir.path().join("notes.txt"),
            dir.path().join("sub"),
            dir.path().join("a.dungeon"),
        ];
        let result = discover_paths(dir.path(), &paths).unwrap();
        assert_eq!(result.scan.total(), 2);
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), "sources: [unterminated").unwrap();
        assert!(discover(dir.path()).is_err());
    }
}
