//! Named content trees.

use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::loader::{load, LoadStats, Package};
use crate::registry::{rebuild_all, Rebuild, RebuildReport};
use crate::validation::ValidationResult;

use super::{ContentTree, NodeRef};

/// What a successful reload did.
#[derive(Debug)]
pub struct ReloadReport {
    pub stats: LoadStats,
    pub diagnostics: ValidationResult,
    pub registries: Vec<RebuildReport>,
}

/// Content trees addressed by handle, e.g. `definition_root`.
#[derive(Debug, Default)]
pub struct ContentStore {
    trees: HashMap<String, ContentTree>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tree` under `handle`, returning the tree it replaces.
    pub fn register(&mut self, handle: impl Into<String>, tree: ContentTree) -> Option<ContentTree> {
        self.trees.insert(handle.into(), tree)
    }

    pub fn get(&self, handle: &str) -> Option<&ContentTree> {
        self.trees.get(handle)
    }

    /// Root node of the tree under `handle`.
    pub fn root(&self, handle: &str) -> Option<NodeRef<'_>> {
        self.trees.get(handle).map(ContentTree::root)
    }

    pub fn remove(&mut self, handle: &str) -> Option<ContentTree> {
        self.trees.remove(handle)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.trees.contains_key(handle)
    }

    /// Load `packages` into a scratch tree, rebuild `registries` against it
    /// and publish both.
    ///
    /// On any error nothing changes: the previous tree stays under `handle`
    /// and every registry keeps its committed contents.
    pub fn reload(
        &mut self,
        handle: &str,
        packages: &[Package],
        registries: &mut [&mut dyn Rebuild],
    ) -> Result<ReloadReport> {
        let loaded = load(packages)?;
        let reports = rebuild_all(&loaded.tree, registries)?;

        info!(
            handle,
            packages = loaded.stats.packages,
            nodes = loaded.tree.len(),
            "content reloaded"
        );
        self.trees.insert(handle.to_string(), loaded.tree);

        Ok(ReloadReport {
            stats: loaded.stats,
            diagnostics: loaded.diagnostics,
            registries: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceFile;
    use crate::registry::{DefinitionRegistry, Record};
    use crate::tree::DOCUMENT_ROOT;

    fn packages(source: &str) -> Vec<Package> {
        vec![Package::new("core", vec![SourceFile::from_source("units.txt", source)])]
    }

    #[test]
    fn test_register_and_lookup() {
        let mut store = ContentStore::new();
        assert!(store.root(DOCUMENT_ROOT).is_none());

        assert!(store.register(DOCUMENT_ROOT, ContentTree::new()).is_none());
        assert!(store.register(DOCUMENT_ROOT, ContentTree::new()).is_some());
        assert!(store.root(DOCUMENT_ROOT).unwrap().is_root());
        assert!(store.remove(DOCUMENT_ROOT).is_some());
        assert!(!store.contains(DOCUMENT_ROOT));
    }

    #[test]
    fn test_reload_publishes_tree_and_registries() {
        let mut store = ContentStore::new();
        let mut units = DefinitionRegistry::<Record>::new("unit");

        let report = store
            .reload(DOCUMENT_ROOT, &packages("unit:soldier { hp = 10 }"), &mut [&mut units])
            .unwrap();
        assert_eq!(report.registries.len(), 1);
        assert_eq!(report.stats.files, 1);
        assert_eq!(store.root(DOCUMENT_ROOT).unwrap().int("soldier.hp"), Ok(10));
        assert!(units.contains("soldier"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_state() {
        let mut store = ContentStore::new();
        let mut units = DefinitionRegistry::<Record>::new("unit");
        store
            .reload(DOCUMENT_ROOT, &packages("unit:soldier { hp = 10 }"), &mut [&mut units])
            .unwrap();

        let result = store.reload(
            DOCUMENT_ROOT,
            &packages("unit:soldier { hp = 12 }\nunit:archer { hp = @knight.hp }"),
            &mut [&mut units],
        );
        assert!(result.is_err());
        assert_eq!(store.root(DOCUMENT_ROOT).unwrap().int("soldier.hp"), Ok(10));
        assert!(store.get(DOCUMENT_ROOT).unwrap().get("archer").is_none());
        assert!(!units.contains("archer"));
        assert!(units.is_locked());
    }
}
