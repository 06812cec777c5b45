//! Package discovery for moddef projects.
//!
//! A project keeps one directory per package under `Mods/`, each with its
//! definition files under `Defines/`. A `moddef.yaml` manifest can rename
//! those directories and fix the load order; without one every package
//! directory loads in name order.
//!
//! # Example
//!
//! ```no_run
//! use moddef::discovery::discover;
//! use moddef::loader::load;
//!
//! let result = discover("./my-game")?;
//! println!("Found {} files", result.file_count());
//!
//! let loaded = load(&result.into_packages()?)?;
//! # Ok::<(), moddef::DefError>(())
//! ```

mod manifest;
mod scanner;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::loader::{Package, SourceFile};
use crate::validation::{Diagnostic, ValidationResult};

pub use manifest::Manifest;
pub use scanner::{list_packages, scan_package};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "moddef.yaml";

/// Code of the warning recorded for a listed package without a directory.
pub const MISSING_PACKAGE: &str = "moddef::discovery::missing-package";

/// A package directory found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDir {
    pub name: String,
    /// The package's data directory.
    pub dir: PathBuf,
    /// Definition files in load order.
    pub files: Vec<PathBuf>,
}

/// Result of discovering packages in a project.
#[derive(Debug)]
pub struct DiscoveryResult {
    /// The project root directory.
    pub root: PathBuf,

    /// The loaded manifest (may be default if no moddef.yaml found).
    pub manifest: Manifest,

    /// Whether a moddef.yaml manifest was found.
    pub has_manifest: bool,

    /// Packages found, in load order.
    pub packages: Vec<PackageDir>,

    /// Listed packages whose data directory does not exist.
    pub missing: Vec<String>,
}

impl DiscoveryResult {
    /// Total number of definition files.
    pub fn file_count(&self) -> usize {
        self.packages.iter().map(|p| p.files.len()).sum()
    }

    /// Warnings for missing package directories.
    pub fn diagnostics(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        for name in &self.missing {
            result.push(
                Diagnostic::warning(
                    MISSING_PACKAGE,
                    format!("package '{}' has no {} directory, skipped", name, self.manifest.data_dir.display()),
                )
                .with_help(format!(
                    "Create {} or remove the package from {}",
                    self.package_data_dir(name).display(),
                    MANIFEST_FILENAME
                )),
            );
        }
        result
    }

    /// Where registry ids persist, if the manifest names a file.
    pub fn ids_path(&self) -> Option<PathBuf> {
        self.manifest.ids_file.as_ref().map(|p| self.root.join(p))
    }

    /// Directories (and the manifest) whose changes should trigger a reload.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.packages.iter().map(|p| p.dir.clone()).collect();
        let manifest = self.root.join(MANIFEST_FILENAME);
        if manifest.exists() {
            paths.push(manifest);
        }
        paths
    }

    /// Read every discovered file.
    pub fn read_packages(&self) -> Result<Vec<Package>> {
        self.packages
            .iter()
            .map(|package| {
                let files = package
                    .files
                    .iter()
                    .map(|path| SourceFile::read(path))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Package::new(package.name.clone(), files))
            })
            .collect()
    }

    pub fn into_packages(self) -> Result<Vec<Package>> {
        self.read_packages()
    }

    fn package_data_dir(&self, name: &str) -> PathBuf {
        self.root
            .join(&self.manifest.mods_dir)
            .join(name)
            .join(&self.manifest.data_dir)
    }
}

/// Discover packages in a project directory.
///
/// Reads `moddef.yaml` from `root` when present. Packages listed in the
/// manifest load in that order; otherwise every directory under the mods
/// directory loads in name order. A package without a data directory is
/// skipped with a warning.
pub fn discover(root: impl AsRef<Path>) -> Result<DiscoveryResult> {
    let root = root.as_ref();

    let manifest_path = root.join(MANIFEST_FILENAME);
    if manifest_path.exists() {
        let mut result = discover_with_manifest(root, Manifest::load(&manifest_path)?);
        result.has_manifest = true;
        Ok(result)
    } else {
        Ok(discover_with_manifest(root, Manifest::default()))
    }
}

/// Discover packages under `root` using `manifest` instead of reading one.
pub fn discover_with_manifest(root: impl AsRef<Path>, manifest: Manifest) -> DiscoveryResult {
    let root = root.as_ref().to_path_buf();

    let names = if manifest.packages.is_empty() {
        list_packages(&root.join(&manifest.mods_dir))
    } else {
        manifest.packages.clone()
    };

    let mut result = DiscoveryResult {
        root,
        manifest,
        has_manifest: false,
        packages: Vec::new(),
        missing: Vec::new(),
    };

    for name in names {
        let dir = result.package_data_dir(&name);
        if !dir.is_dir() {
            warn!(package = %name, dir = %dir.display(), "package directory not found, skipping");
            result.missing.push(name);
            continue;
        }
        let files = scan_package(&dir, &result.manifest);
        result.packages.push(PackageDir { name, dir, files });
    }

    result
}

/// Discover packages from specific directories (no manifest lookup).
///
/// Each directory is one package named after it; its files are scanned
/// directly, without the mods/data layout.
pub fn discover_paths(paths: &[PathBuf]) -> Result<DiscoveryResult> {
    let manifest = Manifest::default();
    let mut packages = Vec::new();
    let mut missing = Vec::new();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if path.is_dir() {
            let files = scan_package(path, &manifest);
            packages.push(PackageDir {
                name,
                dir: path.clone(),
                files,
            });
        } else {
            warn!(path = %path.display(), "not a directory, skipping");
            missing.push(name);
        }
    }

    let root = paths
        .first()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(DiscoveryResult {
        root,
        manifest,
        has_manifest: false,
        packages,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempdir().unwrap();
        let result = discover(dir.path()).unwrap();

        assert!(!result.has_manifest);
        assert!(result.packages.is_empty());
        assert_eq!(result.file_count(), 0);
    }

    #[test]
    fn test_discover_without_manifest() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Mods/zeta/Defines/a.txt", "a = 1");
        write(dir.path(), "Mods/core/Defines/units.txt", "unit:soldier { hp = 1 }");
        write(dir.path(), "Mods/core/Defines/readme.md", "ignored");

        let result = discover(dir.path()).unwrap();
        let names: Vec<_> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["core", "zeta"]);
        assert_eq!(result.file_count(), 2);
    }

    #[test]
    fn test_discover_with_manifest_order_and_missing() {
        let dir = tempdir().unwrap();
        write(dir.path(), MANIFEST_FILENAME, "packages: [zeta, ghost, core]\nids_file: ids.json\n");
        write(dir.path(), "Mods/zeta/Defines/a.txt", "a = 1");
        write(dir.path(), "Mods/core/Defines/b.txt", "b = 1");

        let result = discover(dir.path()).unwrap();
        assert!(result.has_manifest);
        let names: Vec<_> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "core"]);
        assert_eq!(result.missing, vec!["ghost"]);
        assert_eq!(result.diagnostics().with_code(MISSING_PACKAGE).count(), 1);
        assert_eq!(result.ids_path(), Some(dir.path().join("ids.json")));
        assert!(result.watch_paths().contains(&dir.path().join(MANIFEST_FILENAME)));
    }

    #[test]
    fn test_discover_custom_layout() {
        let dir = tempdir().unwrap();
        write(dir.path(), MANIFEST_FILENAME, "mods_dir: content\ndata_dir: data\nextension: def\n");
        write(dir.path(), "content/core/data/units.def", "a = 1");
        write(dir.path(), "content/core/data/units.txt", "b = 1");

        let result = discover(dir.path()).unwrap();
        assert_eq!(result.file_count(), 1);
        assert!(result.packages[0].files[0].ends_with("units.def"));
    }

    #[test]
    fn test_into_packages_reads_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Mods/core/Defines/units.txt", "unit:soldier {\n  hp = 1\n}\n");

        let packages = discover(dir.path()).unwrap().into_packages().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "core");
        assert_eq!(packages[0].files[0].lines.len(), 3);
    }

    #[test]
    fn test_discover_paths() {
        let dir = tempdir().unwrap();
        write(dir.path(), "core/units.txt", "a = 1");
        write(dir.path(), "core/nested/more.txt", "b = 1");

        let result = discover_paths(&[dir.path().join("core"), dir.path().join("nope")]).unwrap();
        assert_eq!(result.packages.len(), 1);
        assert_eq!(result.packages[0].name, "core");
        assert_eq!(result.file_count(), 2);
        assert_eq!(result.missing, vec!["nope"]);
    }
}
