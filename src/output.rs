//! Terminal output for the sbtiled CLI.
//!
//! Status lines are Cargo-style: a right-aligned coloured verb, then the
//! message. Everything goes to stderr so stdout stays machine-readable.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use crate::validation::{Diagnostic, Severity};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const VERB_WIDTH: usize = 12;

/// Terminal-aware status printer.
///
/// Colour is enabled when stderr is a terminal. A quiet printer drops
/// everything, which keeps library callers and tests silent.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    color: bool,
    quiet: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Create a printer, enabling colour when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
            quiet: false,
        }
    }

    /// Create a printer that prints nothing.
    pub fn quiet() -> Self {
        Self {
            color: false,
            quiet: true,
        }
    }

    /// Print a status line with a green bold verb.
    /// e.g. "  Converting ruins/tower.dungeon"
    pub fn status(&self, verb: &str, message: &str) {
        self.print_line(GREEN, verb, message);
    }

    /// Print an informational line with a cyan bold verb.
    pub fn info(&self, verb: &str, message: &str) {
        self.print_line(CYAN, verb, message);
    }

    /// Print a warning line with a yellow bold verb.
    pub fn warning(&self, verb: &str, message: &str) {
        self.print_line(YELLOW, verb, message);
    }

    /// Print an error line with a red bold verb.
    pub fn error(&self, verb: &str, message: &str) {
        self.print_line(RED, verb, message);
    }

    /// Format a string as dim/grey.
    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    /// Print one diagnostic, indented under the current status line.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        if self.quiet {
            return;
        }
        let color = match diagnostic.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        let label = self.paint(color, &format!("{}[{}]", diagnostic.severity.as_str(), diagnostic.code));
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{:VERB_WIDTH$} {}: {}", "", label, diagnostic.message);
        if let Some(help) = &diagnostic.help {
            let _ = writeln!(stderr, "{:VERB_WIDTH$}   {}", "", self.dim(&format!("help: {}", help)));
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{BOLD}{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_line(&self, color: &str, verb: &str, message: &str) {
        if self.quiet {
            return;
        }
        let mut stderr = io::stderr().lock();
        if self.color {
            let _ = writeln!(stderr, "{BOLD}{color}{verb:>VERB_WIDTH$}{RESET} {message}");
        } else {
            let _ = writeln!(stderr, "{verb:>VERB_WIDTH$} {message}");
        }
    }
}

/// `plural(1, "chunk", "chunks")` is "1 chunk".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, pluralized)
    }
}

/// Path relative to the working directory when possible, absolute otherwise.
pub fn display_path(path: &Path) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        if let Ok(relative) = path.strip_prefix(&cwd) {
            let s = relative.display().to_string();
            if s.is_empty() {
                return ".".to_string();
            }
            return s;
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "chunk", "chunks"), "1 chunk");
        assert_eq!(plural(0, "chunk", "chunks"), "0 chunks");
        assert_eq!(plural(3, "match", "matches"), "3 matches");
    }

    #[test]
    fn test_display_path_outside_cwd() {
        let p = Path::new("/nonexistent/dungeons/tower.dungeon");
        assert_eq!(display_path(p), "/nonexistent/dungeons/tower.dungeon");
    }

    #[test]
    fn test_quiet_printer_has_no_colour() {
        let printer = Printer::quiet();
        assert_eq!(printer.dim("x"), "x");
        assert_eq!(printer.paint(RED, "path"), "path");
    }
}
