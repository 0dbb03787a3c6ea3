//! Diagnostics and consistency checks.
//!
//! Matching and classification record non-fatal findings in a
//! [`ValidationResult`]; the chunk checks run on every assembled chunk
//! before it is written.

mod checks;
mod warning;

pub use checks::{
    check_chunk, check_duplicate_rgba, check_gid_coverage, check_ids, check_layer_names,
    check_layer_sizes,
};
pub use warning::{Diagnostic, Severity, ValidationResult};

use crate::output::{plural, Printer};

/// Print every diagnostic followed by a one-line tally.
pub fn print_diagnostics(printer: &Printer, result: &ValidationResult) {
    for d in result.iter() {
        printer.diagnostic(d);
    }

    let errors = result.error_count();
    let warnings = result.warning_count();

    if errors > 0 {
        printer.error(
            "Invalid",
            &format!(
                "{}, {}",
                plural(errors, "error", "errors"),
                plural(warnings, "warning", "warnings")
            ),
        );
    } else if warnings > 0 {
        printer.warning("Warnings", &plural(warnings, "warning", "warnings"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::TilesetShape;
    use crate::chunk::SbDungeonChunk;
    use crate::types::LayerSide;

    #[test]
    fn test_empty_chunk_is_valid() {
        let chunk = SbDungeonChunk::new(0, 0, vec![]);
        assert!(check_chunk(&chunk, None).is_ok());
    }

    #[test]
    fn test_checks_collect_into_one_result() {
        let mut chunk = SbDungeonChunk::new(
            1,
            1,
            vec![TilesetShape {
                firstgid: 5,
                source: "materials.json".to_string(),
            }],
        );
        chunk.add_tile_layer(LayerSide::Front, vec![2, 2], 1, 1).unwrap();

        let result = check_chunk(&chunk, None);
        assert_eq!(result.count_code("sbtiled::validate::layer-size"), 1);
        assert_eq!(result.count_code("sbtiled::validate::gid"), 2);

        print_diagnostics(&Printer::quiet(), &result);
    }
}
