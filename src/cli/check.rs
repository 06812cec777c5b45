//! Check command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::{DefError, Result};
use crate::output::{plural, Printer};
use crate::validation::{print_diagnostics, validate_tree};

/// Load a project and report problems
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub fn run(args: CheckArgs, printer: &Printer) -> Result<()> {
    let project = super::load_project(&args.path, printer)?;
    let stats = project.loaded.stats;
    let tree = &project.loaded.tree;

    printer.info(
        "Loaded",
        &format!(
            "{}, {}, {}",
            plural(stats.packages, "package", "packages"),
            plural(stats.files, "file", "files"),
            plural(tree.all().count(), "definition", "definitions"),
        ),
    );
    printer.info(
        "Parsed",
        &format!(
            "{}, {}, {} (max depth {})",
            plural(stats.parse.blocks, "block", "blocks"),
            plural(stats.parse.properties, "property", "properties"),
            plural(stats.resolved, "reference", "references"),
            stats.parse.max_depth,
        ),
    );

    let mut diagnostics = project.discovery.diagnostics();
    diagnostics.merge(project.loaded.diagnostics);
    diagnostics.merge(validate_tree(tree));
    print_diagnostics(&diagnostics, printer);

    if diagnostics.has_errors() {
        return Err(DefError::Check {
            errors: diagnostics.error_count(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(path: &std::path::Path) -> CheckArgs {
        CheckArgs {
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn test_check_clean_project() {
        let dir = tempdir().unwrap();
        let defines = dir.path().join("Mods/core/Defines");
        fs::create_dir_all(&defines).unwrap();
        fs::write(defines.join("units.txt"), "unit:soldier {\n  hp = 10\n}\n").unwrap();

        run(args(dir.path()), &Printer::plain()).unwrap();
    }

    #[test]
    fn test_check_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let defines = dir.path().join("Mods/core/Defines");
        fs::create_dir_all(&defines).unwrap();
        fs::write(defines.join("units.txt"), "unit:soldier {\n  hp = 10\n").unwrap();

        let err = run(args(dir.path()), &Printer::plain()).unwrap_err();
        assert!(matches!(err, DefError::Parse { .. }));
    }

    #[test]
    fn test_check_empty_directory() {
        let dir = tempdir().unwrap();
        run(args(dir.path()), &Printer::plain()).unwrap();
    }
}
