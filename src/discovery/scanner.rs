//! File system scanner for `.dungeon` files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::manifest::Manifest;

pub const DUNGEON_EXTENSION: &str = "dungeon";

/// Dungeon files found by a scan, in walk order.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub dungeons: Vec<PathBuf>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.dungeons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dungeons.is_empty()
    }

    /// Merge another scan result, skipping paths already present.
    pub fn merge(&mut self, other: ScanResult) {
        for path in other.dungeons {
            if !self.dungeons.contains(&path) {
                self.dungeons.push(path);
            }
        }
    }
}

/// Whether a path names a legacy dungeon definition.
///
/// Rewritten `.dungeon.new` files never match.
pub fn is_dungeon_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(DUNGEON_EXTENSION)
}

/// Recursively scan a directory for dungeon files.
pub fn scan_directory(root: &Path, manifest: &Manifest) -> ScanResult {
    let mut result = ScanResult::new();

    if !root.exists() {
        return result;
    }

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if path.is_dir() || manifest.is_excluded(path) {
            continue;
        }

        if is_dungeon_file(path) {
            result.dungeons.push(path.to_path_buf());
        }
    }

    result
}

/// Scan multiple source paths relative to `base_path`.
pub fn scan_sources(sources: &[String], base_path: &Path, manifest: &Manifest) -> ScanResult {
    let mut result = ScanResult::new();

    for source in sources {
        let source_path = if Path::new(source).is_absolute() {
            PathBuf::from(source)
        } else {
            base_path.join(source)
        };

        result.merge(scan_directory(&source_path, manifest));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_dungeon_file() {
        assert!(is_dungeon_file(Path::new("ruins/tower.dungeon")));
        assert!(!is_dungeon_file(Path::new("ruins/tower.dungeon.new")));
        assert!(!is_dungeon_file(Path::new("ruins/tower.json")));
        assert!(!is_dungeon_file(Path::new("dungeon")));
    }

    #[test]
    fn test_scan_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/deep")).unwrap();
        fs::write(dir.path().join("b/deep/z.dungeon"), "{}").unwrap();
        fs::write(dir.path().join("a.dungeon"), "{}").unwrap();
        fs::write(dir.path().join("a.dungeon.new"), "{}").unwrap();
        fs::write(dir.path().join("a.png"), "").unwrap();

        let result = scan_directory(dir.path(), &Manifest::default());

        let names: Vec<String> = result
            .dungeons
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.dungeon", "z.dungeon"]);
    }

    #[test]
    fn test_scan_with_excludes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("old")).unwrap();
        fs::write(dir.path().join("keep.dungeon"), "{}").unwrap();
        fs::write(dir.path().join("old/skip.dungeon"), "{}").unwrap();

        let manifest = Manifest {
            excludes: vec!["**/old/*".to_string()],
            ..Default::default()
        };
        let result = scan_directory(dir.path(), &manifest);

        assert_eq!(result.total(), 1);
        assert!(result.dungeons[0].ends_with("keep.dungeon"));
    }

    #[test]
    fn test_scan_sources_deduplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.dungeon"), "{}").unwrap();

        let sources = vec![".".to_string(), ".".to_string()];
        let result = scan_sources(&sources, dir.path(), &Manifest::default());
        assert_eq!(result.total(), 1);
    }

    #[test]
    fn test_scan_nonexistent_directory() {
        let result = scan_directory(Path::new("/nonexistent/path"), &Manifest::default());
        assert!(result.is_empty());
    }
}
