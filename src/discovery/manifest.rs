//! Project manifest (sbtiled.yaml) parsing.
//!
//! The manifest sets where dungeons and tileset catalogues live and how
//! converted chunks are written. Every field has a default, so a missing
//! or empty manifest is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SbError};

/// Tile-layer data encoding in written chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Csv,
    Base64,
}

/// Project manifest loaded from sbtiled.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Directories to scan for `.dungeon` files. Defaults to the root.
    pub sources: Vec<String>,

    /// Directory holding the packed tileset catalogues.
    pub tilesets: PathBuf,

    /// Prefix written before `<name>.json` in chunk tileset references.
    pub tileset_source: String,

    pub encoding: Encoding,

    /// Write `<dungeon>.TILES` with the legacy tile list.
    pub dump_tiles: bool,

    /// Write `<dungeon>.VERIFY` with one object match per object name.
    pub verify: bool,

    /// Patterns to exclude from discovery.
    pub excludes: Vec<String>,
}

pub const DEFAULT_TILESETS: &str = "tilesets/packed";
pub const DEFAULT_TILESET_SOURCE: &str = "../../tiled/packed/";

impl Default for Manifest {
    fn default() -> Self {
        Self {
            sources: vec![],
            tilesets: PathBuf::from(DEFAULT_TILESETS),
            tileset_source: DEFAULT_TILESET_SOURCE.to_string(),
            encoding: Encoding::Csv,
            dump_tiles: false,
            verify: false,
            excludes: vec![],
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SbError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        // An empty document deserializes as null.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| SbError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check sbtiled.yaml syntax".to_string()),
        })
    }

    /// Check if a path should be excluded based on exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.excludes
            .iter()
            .any(|pattern| Self::matches_pattern(&path_str, pattern))
    }

    /// Simple glob matching: `*suffix`, `dir/*`, `**/dir/*`, or substring.
    fn matches_pattern(path: &str, pattern: &str) -> bool {
        if let Some(suffix) = pattern.strip_prefix("**/") {
            if let Some(dir) = suffix.strip_suffix("/*") {
                return path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir));
            }
            return path.contains(suffix);
        }

        if let Some(suffix) = pattern.strip_prefix('*') {
            if !pattern.contains('/') {
                return path.ends_with(suffix);
            }
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", prefix))
                || path.contains(&format!("/{}/", prefix));
        }

        path.contains(pattern)
    }

    pub fn effective_sources(&self) -> Vec<String> {
        if self.sources.is_empty() {
            vec![".".to_string()]
        } else {
            self.sources.clone()
        }
    }

    /// Tileset directory resolved against the project root.
    pub fn tilesets_dir(&self, root: &Path) -> PathBuf {
        if self.tilesets.is_absolute() {
            self.tilesets.clone()
        } else {
            root.join(&self.tilesets)
        }
    }
}
