//! Project manifest (moddef.yaml) parsing.
//!
//! The manifest says where packages live, which ones to load and in what
//! order, and how registries assign ids.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DefError, Result};
use crate::registry::SlotPolicy;
use crate::tree::DOCUMENT_ROOT;

/// Project manifest loaded from moddef.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Directory holding one subdirectory per package.
    pub mods_dir: PathBuf,

    /// Subdirectory of each package holding its definition files.
    pub data_dir: PathBuf,

    /// Extension of definition files, without the dot.
    pub extension: String,

    /// Packages in load order. Empty means every package directory, by name.
    pub packages: Vec<String>,

    /// Patterns to exclude, matched against paths relative to a package's
    /// data directory.
    pub excludes: Vec<String>,

    /// Content store handle the packages load into.
    pub root: String,

    /// What registries do when new names outnumber free ids.
    pub slot_policy: SlotPolicy,

    /// JSON file persisting registry ids between runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids_file: Option<PathBuf>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            mods_dir: PathBuf::from("Mods"),
            data_dir: PathBuf::from("Defines"),
            extension: "txt".to_string(),
            packages: vec![],
            excludes: vec![],
            root: DOCUMENT_ROOT.to_string(),
            slot_policy: SlotPolicy::default(),
            ids_file: None,
        }
    }
}

impl Manifest {
    /// Load manifest from a moddef.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DefError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| DefError::Manifest {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check moddef.yaml syntax".to_string()),
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| DefError::Manifest {
            message: format!("Failed to serialize manifest: {}", e),
            help: None,
        })
    }

    /// Whether `path` has the definition file extension.
    pub fn is_definition_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Check if a path should be excluded based on exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.excludes
            .iter()
            .any(|pattern| matches_pattern(&path_str, pattern))
    }
}

/// Simple glob matching: `*.ext`, `dir/*`, `**/dir/*`, or a plain substring.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("**/") {
        if let Some(dir) = suffix.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir));
        }
        return path.ends_with(suffix) || path.contains(&format!("/{}", suffix));
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if !suffix.contains('/') {
            return path.ends_with(suffix);
        }
    }

    if let Some(dir) = pattern.strip_suffix("/*") {
        return path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir));
    }

    path.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = Manifest::default();
        assert_eq!(manifest.mods_dir, PathBuf::from("Mods"));
        assert_eq!(manifest.data_dir, PathBuf::from("Defines"));
        assert_eq!(manifest.extension, "txt");
        assert_eq!(manifest.root, "definition_root");
        assert_eq!(manifest.slot_policy, SlotPolicy::Grow);
        assert!(manifest.packages.is_empty());
    }

    #[test]
    fn test_parse_partial_manifest() {
        let manifest = Manifest::parse("packages: [core, expansion]").unwrap();
        assert_eq!(manifest.packages, vec!["core", "expansion"]);
        assert_eq!(manifest.mods_dir, PathBuf::from("Mods"));
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
mods_dir: content
data_dir: data
extension: def
packages:
  - core
excludes:
  - "*.bak"
  - "**/drafts/*"
root: game
slot_policy: fail-fast
ids_file: ids.json
"#;
        let manifest = Manifest::parse(yaml).unwrap();
        assert_eq!(manifest.mods_dir, PathBuf::from("content"));
        assert_eq!(manifest.data_dir, PathBuf::from("data"));
        assert_eq!(manifest.extension, "def");
        assert_eq!(manifest.root, "game");
        assert_eq!(manifest.slot_policy, SlotPolicy::FailFast);
        assert_eq!(manifest.ids_file, Some(PathBuf::from("ids.json")));
    }

    #[test]
    fn test_parse_empty_manifest() {
        assert_eq!(Manifest::parse("").unwrap(), Manifest::default());
    }

    #[test]
    fn test_invalid_manifest() {
        let err = Manifest::parse("packages: 3").unwrap_err();
        assert!(matches!(err, DefError::Manifest { .. }));
    }

    #[test]
    fn test_yaml_round_trip() {
        let manifest = Manifest {
            packages: vec!["core".to_string()],
            ..Default::default()
        };
        let yaml = manifest.to_yaml().unwrap();
        assert!(!yaml.contains("ids_file"));
        assert_eq!(Manifest::parse(&yaml).unwrap(), manifest);
    }

    #[test]
    fn test_definition_extension() {
        let manifest = Manifest::default();
        assert!(manifest.is_definition_file(Path::new("units.txt")));
        assert!(manifest.is_definition_file(Path::new("a/UNITS.TXT")));
        assert!(!manifest.is_definition_file(Path::new("units.txt.bak")));
        assert!(!manifest.is_definition_file(Path::new("README")));
    }

    #[test]
    fn test_is_excluded() {
        let manifest = Manifest {
            excludes: vec!["*.bak".to_string(), "**/drafts/*".to_string(), "old/*".to_string()],
            ..Default::default()
        };

        assert!(manifest.is_excluded(Path::new("units.bak")));
        assert!(manifest.is_excluded(Path::new("drafts/units.txt")));
        assert!(manifest.is_excluded(Path::new("a/drafts/units.txt")));
        assert!(manifest.is_excluded(Path::new("old/units.txt")));
        assert!(!manifest.is_excluded(Path::new("units.txt")));
    }
}
