//! Diagnostics for loaded content.
//!
//! Collects non-fatal findings from loading (redeclared properties, missing
//! package directories) and from the checks in this module. Used by
//! `moddef check` and `moddef watch`.

mod checks;
mod warning;

pub use checks::{check_empty_nodes, check_stale_values, check_uncategorised, check_vacancies};
pub use warning::{Diagnostic, Severity, ValidationResult};

use crate::output::{plural, Printer};
use crate::tree::ContentTree;

/// Run all tree checks.
pub fn validate_tree(tree: &ContentTree) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(checks::check_empty_nodes(tree));
    result.merge(checks::check_uncategorised(tree));
    result.merge(checks::check_stale_values(tree));

    result
}

/// Print diagnostics followed by a one-line verdict.
pub fn print_diagnostics(result: &ValidationResult, printer: &Printer) {
    for d in result.iter() {
        printer.diagnostic(d);
    }

    let errors = result.error_count();
    let warnings = result.warning_count();

    if errors > 0 {
        printer.error(
            "Failed",
            &format!(
                "{}, {}",
                plural(errors, "error", "errors"),
                plural(warnings, "warning", "warnings")
            ),
        );
    } else if warnings > 0 {
        printer.warning("Passed", &format!("with {}", plural(warnings, "warning", "warnings")));
    } else {
        printer.status("Passed", "no problems found");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    #[test]
    fn test_validate_empty_tree() {
        let result = validate_tree(&ContentTree::new());
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_clean_tree() {
        let mut tree = ContentTree::new();
        parse_source(&mut tree, "unit:soldier{hp=10;}").unwrap();
        assert!(validate_tree(&tree).is_ok());
    }

    #[test]
    fn test_validate_collects_findings() {
        let mut tree = ContentTree::new();
        parse_source(&mut tree, "unit:soldier{}stats{hp=1;}").unwrap();
        let result = validate_tree(&tree);
        assert_eq!(result.warning_count(), 2);
        assert!(!result.has_errors());
    }
}
