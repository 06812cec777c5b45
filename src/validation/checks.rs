//! Checks over a loaded content tree and registry rebuilds.
//!
//! Each check returns a `ValidationResult`.

use crate::registry::RebuildReport;
use crate::tree::{ContentTree, NodeRef};

use super::warning::{Diagnostic, ValidationResult};

/// Every node below the root, depth first in tree order.
fn descendants(tree: &ContentTree) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeRef<'_>> = tree.all().collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        let mut children: Vec<_> = node.children().collect();
        children.reverse();
        stack.extend(children);
        out.push(node);
    }
    out
}

fn path_of(node: NodeRef<'_>) -> String {
    let mut keys = vec![node.key().to_string()];
    let mut current = node;
    while let Some(parent) = current.parent() {
        if parent.is_root() {
            break;
        }
        keys.push(parent.key().to_string());
        current = parent;
    }
    keys.reverse();
    keys.join(".")
}

/// Top-level nodes with neither properties nor children.
pub fn check_empty_nodes(tree: &ContentTree) -> ValidationResult {
    let mut result = ValidationResult::new();

    for node in tree.all() {
        if node.properties().is_empty() && node.children().next().is_none() {
            result.push(
                Diagnostic::warning(
                    "moddef::check::empty-node",
                    format!("'{}' defines nothing", node.key()),
                )
                .with_help("Add properties to the block or remove it"),
            );
        }
    }

    result
}

/// Top-level nodes without a category, which no registry picks up.
pub fn check_uncategorised(tree: &ContentTree) -> ValidationResult {
    let mut result = ValidationResult::new();

    for node in tree.all().filter(|n| n.category().is_none()) {
        result.push(
            Diagnostic::warning(
                "moddef::check::uncategorised",
                format!("top-level node '{}' has no category", node.name()),
            )
            .with_help(format!("Write the header as `category:{}`", node.name())),
        );
    }

    result
}

/// Properties whose typed values are not computed. A successful load leaves
/// none; a tree edited through the API may.
pub fn check_stale_values(tree: &ContentTree) -> ValidationResult {
    let mut result = ValidationResult::new();

    for node in descendants(tree) {
        for property in node.properties().iter().filter(|p| !p.is_computed()) {
            result.push(
                Diagnostic::error(
                    "moddef::check::stale-values",
                    format!("'{}.{}' has no computed values", path_of(node), property.key()),
                )
                .with_help("Call `Property::recompute` after editing values"),
            );
        }
    }

    result
}

/// Registries with vacant ids after a rebuild.
pub fn check_vacancies(reports: &[RebuildReport]) -> ValidationResult {
    let mut result = ValidationResult::new();

    for report in reports.iter().filter(|r| r.vacant > 0) {
        result.push(
            Diagnostic::warning(
                "moddef::check::vacant-ids",
                format!(
                    "registry '{}' has {} vacant id(s) out of {}",
                    report.category, report.vacant, report.id_space
                ),
            )
            .with_help("New definitions in this category will take the vacant ids first"),
        );
    }

    result
}
