use miette::Diagnostic;
use thiserror::Error;

/// Main error type for sbtiled operations
#[derive(Error, Diagnostic, Debug)]
pub enum SbError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(sbtiled::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(sbtiled::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("GID {value} is outside the valid range (0, 4294967295)")]
    #[diagnostic(
        code(sbtiled::gid),
        help("Pure GIDs start at 1; check the tileset firstgid arithmetic")
    )]
    GidOutOfRange { value: u64 },

    #[error("Malformed brush on tile {tile}: {message}")]
    #[diagnostic(
        code(sbtiled::brush),
        help("Multi-layer brushes must start with [\"clear\"]")
    )]
    MalformedBrush { tile: String, message: String },

    #[error("Layer '{name}' already exists")]
    #[diagnostic(code(sbtiled::layer))]
    DuplicateLayer { name: String },

    #[error("Layer '{name}' does not exist")]
    #[diagnostic(code(sbtiled::layer))]
    MissingLayer { name: String },

    #[error("Layer '{name}' is already encoded and cannot be modified")]
    #[diagnostic(code(sbtiled::layer))]
    EncodedLayer { name: String },

    #[error("Size mismatch: expected {expected} entries, got {actual}")]
    #[diagnostic(code(sbtiled::merge))]
    MergeSizeMismatch { expected: usize, actual: usize },

    #[error("Merge conflict in layer '{layer}' at index {index}: {base} vs {overlay}")]
    #[diagnostic(
        code(sbtiled::merge),
        help("Both images paint content on the same pixel; clear one of them")
    )]
    MergeConflict {
        layer: String,
        index: usize,
        base: u32,
        overlay: u32,
    },

    #[error("Match error: {message}")]
    #[diagnostic(code(sbtiled::matching))]
    Match {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(sbtiled::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, SbError>;
