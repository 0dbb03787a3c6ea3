//! JSON-with-comments reads and no-overwrite writes.
//!
//! Starbound assets allow `//` and `/* */` comments in JSON. Comments are
//! stripped with a single regex pass that matches quoted strings first so
//! their contents survive verbatim.

use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, SbError};

/// Outcome of a guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The target already existed and was left untouched.
    Refused,
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"("(?:\\.|[^"\\])*")|//[^\n]*|/\*[\s\S]*?\*/"#)
            .expect("comment pattern is valid")
    })
}

/// Remove `//` and `/* */` comments outside of string literals.
pub fn strip_json_comments(text: &str) -> Cow<'_, str> {
    comment_regex().replace_all(text, |caps: &Captures<'_>| {
        caps.get(1).map_or(String::new(), |s| s.as_str().to_string())
    })
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SbError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read file: {}", e),
    })
}

/// Read a JSON-with-comments file into an untyped value.
pub fn read_json_value(path: &Path) -> Result<Value> {
    read_json(path)
}

/// Read a JSON-with-comments file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&strip_json_comments(&text)).map_err(|e| SbError::Parse {
        message: format!("{}: {}", path.display(), e),
        help: None,
    })
}

/// Create `path` with `contents` unless it already exists.
pub fn write_new(path: &Path, contents: &[u8]) -> Result<WriteOutcome> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(WriteOutcome::Refused),
        Err(e) => {
            return Err(SbError::Io {
                path: path.to_path_buf(),
                message: format!("Failed to create file: {}", e),
            })
        }
    };
    file.write_all(contents).map_err(|e| SbError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write file: {}", e),
    })?;
    Ok(WriteOutcome::Written)
}

/// Pretty-print `value` as JSON into a new file.
pub fn write_json_new<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<WriteOutcome> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SbError::Validation {
        message: format!("Failed to serialize {}: {}", path.display(), e),
        help: None,
    })?;
    write_new(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_strip_line_and_block_comments() {
        let text = "{\n  // a comment\n  \"a\": 1, /* inline */ \"b\": 2\n}";
        let value: Value = serde_json::from_str(&strip_json_comments(text)).unwrap();
        assert_eq!(value, serde_json::json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_strings_are_preserved() {
        let text = r#"{ "url": "http://example.com/*x*/", "q": "say \"//hi\"" } // tail"#;
        let value: Value = serde_json::from_str(&strip_json_comments(text)).unwrap();
        assert_eq!(value["url"], "http://example.com/*x*/");
        assert_eq!(value["q"], "say \"//hi\"");
    }

    #[test]
    fn test_multiline_block_comment() {
        let text = "/* header\n spanning\n lines */ [1, 2]";
        let value: Value = serde_json::from_str(&strip_json_comments(text)).unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_read_json_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();

        let err = read_json_value(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_write_new_refuses_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        assert_eq!(write_new(&path, b"first").unwrap(), WriteOutcome::Written);
        assert_eq!(write_new(&path, b"second").unwrap(), WriteOutcome::Refused);
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_write_json_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value.json");

        write_json_new(&path, &serde_json::json!({ "k": [1] })).unwrap();
        let back = read_json_value(&path).unwrap();
        assert_eq!(back["k"][0], 1);
    }
}
