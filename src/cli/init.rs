//! Init command implementation.
//!
//! Generates a `moddef.yaml` manifest listing the packages found under the
//! mods directory, in load order.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::{discover_with_manifest, Manifest, MANIFEST_FILENAME};
use crate::error::{DefError, Result};
use crate::output::{display_path, plural, Printer};

/// Initialize a moddef project by generating a moddef.yaml manifest
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to scan (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing moddef.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(DefError::Manifest {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &printer.cyan(&display_path(&args.path)));
    // Keep the layout of a manifest being replaced, but rescan its packages.
    let mut manifest = if manifest_path.exists() {
        Manifest::load(&manifest_path)?
    } else {
        Manifest::default()
    };
    manifest.packages.clear();

    let discovery = discover_with_manifest(&args.path, manifest);
    let file_count = discovery.file_count();
    let mut manifest = discovery.manifest;
    manifest.packages = discovery.packages.into_iter().map(|p| p.name).collect();

    fs::write(&manifest_path, manifest.to_yaml()?).map_err(|e| DefError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    if !manifest.packages.is_empty() {
        printer.info("Discovered", &manifest.packages.join(", "));
    }
    printer.status(
        "Created",
        &format!(
            "{} ({}, {})",
            MANIFEST_FILENAME,
            plural(manifest.packages.len(), "package", "packages"),
            plural(file_count, "file", "files")
        ),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(path: &std::path::Path, force: bool) -> InitArgs {
        InitArgs {
            path: path.to_path_buf(),
            force,
        }
    }

    #[test]
    fn test_init_lists_packages() {
        let dir = tempdir().unwrap();
        for name in ["zeta", "core"] {
            let defines = dir.path().join("Mods").join(name).join("Defines");
            fs::create_dir_all(&defines).unwrap();
            fs::write(defines.join("a.txt"), "a = 1").unwrap();
        }

        run(args(dir.path(), false), &Printer::plain()).unwrap();

        let manifest = Manifest::load(&dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert_eq!(manifest.packages, vec!["core", "zeta"]);
    }

    #[test]
    fn test_init_errors_if_manifest_exists() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), "packages: [core]\n").unwrap();

        let result = run(args(dir.path(), false), &Printer::plain());
        assert!(result.is_err());
    }

    #[test]
    fn test_init_force_rescans_custom_layout() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            "mods_dir: content\npackages: [gone]\n",
        )
        .unwrap();
        let defines = dir.path().join("content/core/Defines");
        fs::create_dir_all(&defines).unwrap();
        fs::write(defines.join("a.txt"), "a = 1").unwrap();

        run(args(dir.path(), true), &Printer::plain()).unwrap();

        let manifest = Manifest::load(&dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert_eq!(manifest.mods_dir, PathBuf::from("content"));
        assert_eq!(manifest.packages, vec!["core"]);
    }

    #[test]
    fn test_init_empty_directory() {
        let dir = tempdir().unwrap();
        run(args(dir.path(), false), &Printer::plain()).unwrap();

        let manifest = Manifest::load(&dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(manifest.packages.is_empty());
    }
}
