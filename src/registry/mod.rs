//! Typed definition registries.
//!
//! A `DefinitionRegistry<T>` compiles the top-level nodes of one category
//! into `T` values addressed by integer id or name. Registries are built
//! once and rebuilt in place on every reload; ids of names that survive a
//! reload do not change (see [`ids`]).
//!
//! # Example
//!
//! ```
//! use moddef::registry::{Definition, DefinitionRegistry};
//! use moddef::syntax::parse_source;
//! use moddef::tree::{ContentTree, NodeRef};
//!
//! #[derive(Debug)]
//! struct Unit {
//!     hp: i64,
//! }
//!
//! impl Definition for Unit {
//!     fn from_node(node: NodeRef<'_>) -> moddef::Result<Self> {
//!         Ok(Unit { hp: node.int("hp")? })
//!     }
//!
//!     fn fallback() -> Self {
//!         Unit { hp: 0 }
//!     }
//! }
//!
//! let mut tree = ContentTree::new();
//! parse_source(&mut tree, "unit:soldier{hp=10;}").unwrap();
//!
//! let mut units = DefinitionRegistry::<Unit>::new("unit");
//! units.rebuild(&tree).unwrap();
//! assert_eq!(units.get(0).hp, 10);
//! assert_eq!(units.get_named("dragon").hp, 0);
//! ```

pub mod ids;
mod record;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;

use tracing::{info, warn};

use crate::error::Result;
use crate::tree::{ContentTree, NodeRef};

pub use ids::{assign_ids, DefId, IdFile, IdTable, SlotPolicy};
pub use record::Record;

/// A typed definition built from one content node.
pub trait Definition: Sized {
    /// Build the definition from its node.
    fn from_node(node: NodeRef<'_>) -> Result<Self>;

    /// The value handed out for unknown ids and names.
    fn fallback() -> Self;
}

/// A registry entry: a definition with its id and name.
///
/// The fallback entry has no id and an empty name.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    id: Option<DefId>,
    name: String,
    def: T,
}

impl<T> Entry<T> {
    fn fallback(def: T) -> Self {
        Self {
            id: None,
            name: String::new(),
            def,
        }
    }

    pub fn id(&self) -> Option<DefId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn def(&self) -> &T {
        &self.def
    }

    pub fn is_fallback(&self) -> bool {
        self.id.is_none()
    }
}

impl<T> Deref for Entry<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.def
    }
}

/// Summary of one registry rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub category: String,
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
    /// Ids without a live entry after the rebuild.
    pub vacant: usize,
    pub id_space: usize,
}

impl fmt::Display for RebuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} kept, {} added, {} removed, {} vacant ({} ids)",
            self.category, self.kept, self.added, self.removed, self.vacant, self.id_space
        )
    }
}

/// A two-phase rebuild, object safe so registries of different types can
/// be rebuilt together with [`rebuild_all`].
pub trait Rebuild {
    fn category(&self) -> &str;

    /// Mark the registry as rebuilding. Reads keep seeing committed contents.
    fn unlock(&mut self);

    /// Build new contents from `tree` without publishing them.
    fn stage(&mut self, tree: &ContentTree) -> Result<RebuildReport>;

    /// Publish staged contents and lock.
    fn commit(&mut self);

    /// Drop staged contents, keeping the committed ones.
    fn discard(&mut self);
}

struct Staged<T> {
    table: IdTable,
    entries: Vec<Option<Entry<T>>>,
    by_name: HashMap<String, DefId>,
}

/// Definitions of one category, addressed by id or name.
pub struct DefinitionRegistry<T: Definition> {
    category: String,
    policy: SlotPolicy,
    table: IdTable,
    entries: Vec<Option<Entry<T>>>,
    by_name: HashMap<String, DefId>,
    fallback: Entry<T>,
    built: bool,
    locked: bool,
    staged: Option<Staged<T>>,
}

impl<T: Definition> DefinitionRegistry<T> {
    /// An empty registry for `category`. Every lookup returns the fallback
    /// until the first rebuild.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            policy: SlotPolicy::default(),
            table: IdTable::new(),
            entries: Vec::new(),
            by_name: HashMap::new(),
            fallback: Entry::fallback(T::fallback()),
            built: false,
            locked: false,
            staged: None,
        }
    }

    /// Seed the id table, e.g. from a previous run's `IdFile`.
    pub fn with_ids(mut self, table: IdTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_policy(mut self, policy: SlotPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Entry for `id`, or the fallback when `id` is negative, out of range
    /// or vacant.
    pub fn get(&self, id: i64) -> &Entry<T> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.entries.get(i))
            .and_then(Option::as_ref)
            .unwrap_or(&self.fallback)
    }

    /// Entry for `name`, or the fallback.
    pub fn get_named(&self, name: &str) -> &Entry<T> {
        self.by_name
            .get(name)
            .and_then(|id| self.by_id(*id))
            .unwrap_or(&self.fallback)
    }

    pub fn by_id(&self, id: DefId) -> Option<&Entry<T>> {
        self.entries.get(id.index())?.as_ref()
    }

    pub fn fallback(&self) -> &Entry<T> {
        &self.fallback
    }

    /// Live entries in id order.
    pub fn all(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter().flatten()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Number of ids, vacant ones included. Valid ids are `0..id_space`.
    pub fn id_space(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds a committed build and is not mid-rebuild.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn id_of(&self, name: &str) -> Option<DefId> {
        self.by_name.get(name).copied()
    }

    /// The current id table, for persisting.
    pub fn snapshot(&self) -> IdTable {
        self.table.clone()
    }

    /// Stage and commit in one step.
    pub fn rebuild(&mut self, tree: &ContentTree) -> Result<RebuildReport> {
        self.unlock();
        match self.stage(tree) {
            Ok(report) => {
                self.commit();
                Ok(report)
            }
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }

    fn build(&self, tree: &ContentTree) -> Result<(Staged<T>, RebuildReport)> {
        let mut seen = HashSet::new();
        let mut nodes: Vec<NodeRef<'_>> = Vec::new();
        for node in tree.all_of(&self.category) {
            if !seen.insert(node.name()) {
                warn!(category = %self.category, name = node.name(), "duplicate definition ignored");
                continue;
            }
            nodes.push(node);
        }

        let names: Vec<&str> = nodes.iter().map(|n| n.name()).collect();
        let assignment = assign_ids(&self.category, &self.table, &names, self.policy)?;

        let mut entries: Vec<Option<Entry<T>>> = std::iter::repeat_with(|| None)
            .take(assignment.table.id_space())
            .collect();
        let ids = assignment.table.by_name();
        let mut by_name = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let Some(&id) = ids.get(node.name()) else {
                continue;
            };
            let def = T::from_node(node)?;
            entries[id.index()] = Some(Entry {
                id: Some(id),
                name: node.name().to_string(),
                def,
            });
            by_name.insert(node.name().to_string(), id);
        }

        let report = RebuildReport {
            category: self.category.clone(),
            kept: assignment.kept,
            added: assignment.added,
            removed: assignment.removed,
            vacant: entries.iter().filter(|e| e.is_none()).count(),
            id_space: entries.len(),
        };
        let staged = Staged {
            table: assignment.table,
            entries,
            by_name,
        };
        Ok((staged, report))
    }
}

impl<T: Definition> Rebuild for DefinitionRegistry<T> {
    fn category(&self) -> &str {
        &self.category
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn stage(&mut self, tree: &ContentTree) -> Result<RebuildReport> {
        let (staged, report) = self.build(tree)?;
        self.staged = Some(staged);
        Ok(report)
    }

    fn commit(&mut self) {
        if let Some(staged) = self.staged.take() {
            self.table = staged.table;
            self.entries = staged.entries;
            self.by_name = staged.by_name;
            self.fallback = Entry::fallback(T::fallback());
            self.built = true;
            info!(category = %self.category, entries = self.by_name.len(), "registry rebuilt");
        }
        self.locked = self.built;
    }

    fn discard(&mut self) {
        self.staged = None;
        self.locked = self.built;
    }
}

impl<T: Definition + fmt::Debug> fmt::Debug for DefinitionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("category", &self.category)
            .field("policy", &self.policy)
            .field("entries", &self.entries)
            .field("locked", &self.locked)
            .finish()
    }
}

/// Rebuild several registries against one tree, committing all of them or
/// none.
pub fn rebuild_all(tree: &ContentTree, registries: &mut [&mut dyn Rebuild]) -> Result<Vec<RebuildReport>> {
    for registry in registries.iter_mut() {
        registry.unlock();
    }

    let mut reports = Vec::with_capacity(registries.len());
    for i in 0..registries.len() {
        match registries[i].stage(tree) {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!(category = registries[i].category(), "rebuild failed, keeping previous contents");
                for registry in registries.iter_mut() {
                    registry.discard();
                }
                return Err(e);
            }
        }
    }

    for registry in registries.iter_mut() {
        registry.commit();
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DefError;
    use crate::syntax::parse_source;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Unit {
        hp: i64,
    }

    impl Definition for Unit {
        fn from_node(node: NodeRef<'_>) -> Result<Self> {
            if node.has_property("broken") {
                return Err(DefError::Definition {
                    category: "unit".to_string(),
                    name: node.name().to_string(),
                    message: "marked broken".to_string(),
                });
            }
            Ok(Unit { hp: node.int("hp")? })
        }

        fn fallback() -> Self {
            Unit { hp: -1 }
        }
    }

    fn tree(source: &str) -> ContentTree {
        let mut tree = ContentTree::new();
        parse_source(&mut tree, source).unwrap();
        tree
    }

    fn ids(registry: &DefinitionRegistry<Unit>) -> Vec<(String, u32)> {
        registry
            .all()
            .map(|e| (e.name().to_string(), e.id().map(|id| id.0).unwrap_or(u32::MAX)))
            .collect()
    }

    #[test]
    fn test_first_build() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        assert!(!units.is_locked());

        let report = units
            .rebuild(&tree("unit:A{hp=1;}item:X{}unit:B{hp=2;}unit:C{hp=3;}"))
            .unwrap();
        assert_eq!(report.added, 3);
        assert!(units.is_locked());
        assert_eq!(units.len(), 3);
        assert_eq!(units.get(1).hp, 2);
        assert_eq!(units.get_named("C").id(), Some(DefId(2)));
        assert!(!units.contains("X"));
    }

    #[test]
    fn test_ids_stable_across_rebuilds() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        units.rebuild(&tree("unit:A{}unit:B{}unit:C{}")).unwrap();

        let report = units.rebuild(&tree("unit:A{}unit:C{}unit:D{}")).unwrap();
        assert_eq!(
            ids(&units),
            vec![("A".to_string(), 0), ("D".to_string(), 1), ("C".to_string(), 2)]
        );
        assert_eq!((report.kept, report.added, report.removed), (2, 1, 1));
    }

    #[test]
    fn test_removed_name_leaves_vacancy() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        units.rebuild(&tree("unit:A{hp=1;}unit:B{hp=2;}unit:C{hp=3;}")).unwrap();

        let report = units.rebuild(&tree("unit:A{hp=1;}unit:C{hp=3;}")).unwrap();
        assert_eq!(report.vacant, 1);
        assert_eq!(units.id_space(), 3);
        assert!(units.get(1).is_fallback());
        assert_eq!(units.get(2).hp, 3);
    }

    #[test]
    fn test_fallback_guarantee() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        assert_eq!(units.get(0).hp, -1);

        units.rebuild(&tree("unit:A{hp=5;}")).unwrap();
        assert_eq!(units.get(-1).hp, -1);
        assert_eq!(units.get(1).hp, -1);
        assert_eq!(units.get(i64::MAX).hp, -1);
        assert_eq!(units.get_named("nobody").hp, -1);
        assert_eq!(units.get_named("nobody").name(), "");
        assert_eq!(units.fallback().id(), None);
    }

    #[test]
    fn test_fail_fast_keeps_previous_contents() {
        let mut units = DefinitionRegistry::<Unit>::new("unit").with_policy(SlotPolicy::FailFast);
        units.rebuild(&tree("unit:A{hp=1;}unit:B{hp=2;}")).unwrap();

        let err = units
            .rebuild(&tree("unit:A{hp=1;}unit:B{hp=2;}unit:C{hp=3;}"))
            .unwrap_err();
        assert!(matches!(err, DefError::SlotUnderflow { added: 1, free: 0, .. }));
        assert!(units.is_locked());
        assert_eq!(units.len(), 2);
        assert!(!units.contains("C"));
    }

    #[test]
    fn test_fail_fast_fills_freed_ids() {
        let mut units = DefinitionRegistry::<Unit>::new("unit").with_policy(SlotPolicy::FailFast);
        units.rebuild(&tree("unit:A{}unit:B{}")).unwrap();
        units.rebuild(&tree("unit:B{}unit:C{}")).unwrap();
        assert_eq!(units.id_of("C"), Some(DefId(0)));
    }

    #[test]
    fn test_failed_definition_keeps_previous_contents() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        units.rebuild(&tree("unit:A{hp=1;}")).unwrap();

        assert!(units.rebuild(&tree("unit:A{hp=9;}unit:B{broken;}")).is_err());
        assert_eq!(units.get_named("A").hp, 1);
        assert!(units.is_locked());
    }

    #[test]
    fn test_with_ids_restores_previous_run() {
        let table = IdTable::from_names(["C", "B", "A"]);
        let mut units = DefinitionRegistry::<Unit>::new("unit").with_ids(table);
        units.rebuild(&tree("unit:A{}unit:B{}unit:C{}")).unwrap();
        assert_eq!(units.id_of("A"), Some(DefId(2)));
        assert_eq!(units.snapshot().name_of(DefId(0)), Some("C"));
    }

    #[test]
    fn test_rebuild_all_is_atomic() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        let mut heroes = DefinitionRegistry::<Unit>::new("hero");
        let good = tree("unit:A{hp=1;}hero:H{hp=2;}");
        rebuild_all(&good, &mut [&mut units, &mut heroes]).unwrap();

        let bad = tree("unit:A{hp=3;}unit:B{hp=4;}hero:H{broken;}");
        assert!(rebuild_all(&bad, &mut [&mut units, &mut heroes]).is_err());
        assert_eq!(units.get_named("A").hp, 1);
        assert!(!units.contains("B"));
        assert_eq!(heroes.get_named("H").hp, 2);
        assert!(units.is_locked() && heroes.is_locked());
    }

    #[test]
    fn test_report_display() {
        let mut units = DefinitionRegistry::<Unit>::new("unit");
        let report = units.rebuild(&tree("unit:A{}unit:B{}")).unwrap();
        assert_eq!(report.to_string(), "unit: 0 kept, 2 added, 0 removed, 0 vacant (2 ids)");
    }
}
