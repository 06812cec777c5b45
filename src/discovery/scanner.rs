//! File system scanner for package directories.
//!
//! Files are returned in load order: within each directory, subdirectories
//! (and everything below them) come before the directory's own files, and
//! siblings are sorted by name.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::manifest::Manifest;

fn load_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir
        .cmp(&a_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Definition files under `dir`, in load order.
pub fn scan_package(dir: &Path, manifest: &Manifest) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkDir::new(dir)
        .follow_links(true)
        .sort_by(load_order)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| manifest.is_definition_file(path))
        .filter(|path| {
            let relative = path.strip_prefix(dir).unwrap_or(path);
            !manifest.is_excluded(relative)
        })
        .collect()
}

/// Names of the package directories under `mods_dir`, sorted.
pub fn list_packages(mods_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(mods_dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_scan_order_directories_first() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "z/b.txt");
        touch(dir.path(), "c.txt");
        touch(dir.path(), "m/n/d.txt");
        touch(dir.path(), "m/e.txt");

        let files = scan_package(dir.path(), &Manifest::default());
        assert_eq!(
            relative(dir.path(), &files),
            vec!["m/n/d.txt", "m/e.txt", "z/b.txt", "a.txt", "c.txt"]
        );
    }

    #[test]
    fn test_scan_filters_extension_and_excludes() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "units.txt");
        touch(dir.path(), "notes.md");
        touch(dir.path(), "drafts/wip.txt");

        let manifest = Manifest {
            excludes: vec!["drafts/*".to_string()],
            ..Default::default()
        };
        let files = scan_package(dir.path(), &manifest);
        assert_eq!(relative(dir.path(), &files), vec!["units.txt"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(scan_package(&dir.path().join("nope"), &Manifest::default()).is_empty());
    }

    #[test]
    fn test_list_packages_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("expansion")).unwrap();
        fs::create_dir_all(dir.path().join("core")).unwrap();
        touch(dir.path(), "readme.txt");

        assert_eq!(list_packages(dir.path()), vec!["core", "expansion"]);
        assert!(list_packages(&dir.path().join("nope")).is_empty());
    }
}
