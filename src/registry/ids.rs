//! Registry ids and their assignment across rebuilds.
//!
//! Ids are dense indices into a registry. A name keeps its id for as long
//! as it stays in the tree; ids of removed names are reused by new names,
//! lowest first, so content appended later never shifts earlier ids.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DefError, Result};

/// The integer id of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId(pub u32);

impl DefId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a rebuild does when new names outnumber the free ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotPolicy {
    /// Append fresh ids past the end of the table.
    #[default]
    Grow,
    /// Refuse the rebuild with `DefError::SlotUnderflow`.
    FailFast,
}

/// The id-to-name mapping of one registry. `None` marks a vacant id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdTable {
    slots: Vec<Option<String>>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table assigning `0..n` in order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: names.into_iter().map(|n| Some(n.into())).collect(),
        }
    }

    /// Number of ids, vacant ones included.
    pub fn id_space(&self) -> usize {
        self.slots.len()
    }

    /// Number of ids holding a name.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn name_of(&self, id: DefId) -> Option<&str> {
        self.slots.get(id.index())?.as_deref()
    }

    pub fn id_of(&self, name: &str) -> Option<DefId> {
        self.slots
            .iter()
            .position(|s| s.as_deref() == Some(name))
            .map(|i| DefId(i as u32))
    }

    /// Name to id lookup over the live ids, for diffing a whole table.
    pub fn by_name(&self) -> HashMap<&str, DefId> {
        self.iter().map(|(id, name)| (name, id)).collect()
    }

    /// Live `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DefId, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_deref().map(|name| (DefId(i as u32), name)))
    }

    /// Vacant ids in ascending order.
    pub fn vacant(&self) -> impl Iterator<Item = DefId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| DefId(i as u32))
    }
}

/// Result of diffing a table against the names found in a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub table: IdTable,
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
}

/// Assign ids to `names` (scan order, no duplicates) given the previous
/// table.
///
/// Kept names reuse their id, removed names free theirs and added names
/// take free ids lowest first. When there are more added names than free
/// ids, `policy` decides: `Grow` appends, `FailFast` errors. A first build
/// from an empty table always assigns `0..n` in scan order.
pub fn assign_ids(
    category: &str,
    previous: &IdTable,
    names: &[&str],
    policy: SlotPolicy,
) -> Result<Assignment> {
    let present: HashSet<&str> = names.iter().copied().collect();

    let mut slots = previous.slots.clone();
    let mut removed = 0;
    for slot in slots.iter_mut() {
        if slot.as_deref().is_some_and(|name| !present.contains(name)) {
            removed += 1;
            *slot = None;
        }
    }

    let known = previous.by_name();
    let added: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !known.contains_key(name))
        .collect();
    let free: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_none())
        .map(|(i, _)| i)
        .collect();

    if added.len() > free.len() && !previous.is_empty() && policy == SlotPolicy::FailFast {
        return Err(DefError::SlotUnderflow {
            category: category.to_string(),
            added: added.len(),
            free: free.len(),
        });
    }

    let mut free = free.into_iter();
    for name in &added {
        let id = match free.next() {
            Some(i) => {
                slots[i] = Some(name.to_string());
                i
            }
            None => {
                slots.push(Some(name.to_string()));
                slots.len() - 1
            }
        };
        debug!(category, name, id, "assigned id");
    }

    Ok(Assignment {
        kept: names.len() - added.len(),
        added: added.len(),
        removed,
        table: IdTable { slots },
    })
}

/// Id tables of every registry, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdFile {
    #[serde(default)]
    pub registries: BTreeMap<String, IdTable>,
}

impl IdFile {
    /// Load from JSON. A missing file yields an empty set of tables.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| DefError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DefError::Manifest {
            message: format!("invalid id file {}: {}", path.display(), e),
            help: Some("Delete the file to start from fresh ids".to_string()),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| DefError::Manifest {
            message: format!("failed to serialize id file: {}", e),
            help: None,
        })?;
        std::fs::write(path, json + "\n").map_err(|e| DefError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn get(&self, category: &str) -> Option<&IdTable> {
        self.registries.get(category)
    }

    pub fn insert(&mut self, category: impl Into<String>, table: IdTable) {
        self.registries.insert(category.into(), table);
    }
}
