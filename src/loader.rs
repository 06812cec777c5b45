//! Load packages into a content tree.
//!
//! Packages load in order into one tree. Every file of a package is
//! normalized and parsed first, then the package's references are resolved,
//! so a reference sees its own package and the packages before it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{DefError, Result};
use crate::resolve::{resolve, ReferenceQueue};
use crate::syntax::{normalize, parse_file, Declared, FileStats};
use crate::tree::ContentTree;
use crate::validation::ValidationResult;

/// The raw lines of one definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, lines: Vec<String>) -> Self {
        Self {
            path: path.into(),
            lines,
        }
    }

    /// Split in-memory source text into lines.
    pub fn from_source(path: impl Into<PathBuf>, source: &str) -> Self {
        Self::new(path, source.lines().map(str::to_string).collect())
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| DefError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::from_source(path, &source))
    }
}

/// A named, ordered group of definition files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub files: Vec<SourceFile>,
}

impl Package {
    pub fn new(name: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// Totals across a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub packages: usize,
    pub files: usize,
    /// References resolved.
    pub resolved: usize,
    pub parse: FileStats,
}

/// The result of a successful load.
#[derive(Debug)]
pub struct Loaded {
    pub tree: ContentTree,
    pub diagnostics: ValidationResult,
    pub stats: LoadStats,
}

/// Load `packages` in order into a fresh tree.
///
/// Any parse or reference error aborts the whole load.
pub fn load(packages: &[Package]) -> Result<Loaded> {
    let mut tree = ContentTree::new();
    let mut diagnostics = ValidationResult::new();
    let mut stats = LoadStats::default();

    for package in packages {
        let package_stats = load_package(&mut tree, package, &mut diagnostics)?;
        stats.packages += 1;
        stats.files += package_stats.files;
        stats.resolved += package_stats.resolved;
        stats.parse.merge(package_stats.parse);
    }

    Ok(Loaded {
        tree,
        diagnostics,
        stats,
    })
}

/// Parse every file of one package into `tree`, then resolve its references.
pub fn load_package(
    tree: &mut ContentTree,
    package: &Package,
    diagnostics: &mut ValidationResult,
) -> Result<LoadStats> {
    let mut queue = ReferenceQueue::new();
    let mut declared = Declared::new();
    let mut stats = LoadStats {
        packages: 1,
        ..Default::default()
    };

    for file in &package.files {
        let normalized = normalize(&file.lines);
        let file_stats = parse_file(
            tree,
            &file.path,
            &normalized,
            &mut queue,
            &mut declared,
            diagnostics,
        )?;
        stats.parse.merge(file_stats);
        stats.files += 1;
    }

    stats.resolved = resolve(tree, queue)?;
    info!(
        package = %package.name,
        files = stats.files,
        references = stats.resolved,
        "loaded package"
    );
    Ok(stats)
}
