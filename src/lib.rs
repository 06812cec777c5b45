//! moddef - Runtime data-definition engine
//!
//! Loads mod-style text definitions into a tree of named nodes whose
//! properties carry string values with lazily derived integer, float and
//! colour readings. `@path` references are resolved once each package has
//! been parsed. Typed definition registries build from the tree and keep
//! their integer ids stable across reloads.
//!
//! ```
//! use moddef::{load, DefinitionRegistry, Package, Record, SourceFile};
//!
//! let source = "unit:soldier {\n  hp = 10\n}\nunit:archer {\n  hp = @soldier.hp\n}\n";
//! let packages = vec![Package::new("core", vec![SourceFile::from_source("units.txt", source)])];
//!
//! let loaded = load(&packages)?;
//! assert_eq!(loaded.tree.root().int("archer.hp")?, 10);
//!
//! let mut units = DefinitionRegistry::<Record>::new("unit");
//! units.rebuild(&loaded.tree)?;
//! assert_eq!(units.get_named("archer").get("hp"), Some(&["10".to_string()][..]));
//! # Ok::<(), moddef::DefError>(())
//! ```

pub mod cli;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod output;
pub mod registry;
pub mod resolve;
pub mod syntax;
pub mod tree;
pub mod validation;

pub use discovery::{discover, discover_paths, DiscoveryResult, Manifest};
pub use error::{DefError, Result, ValueError, ValueKind};
pub use loader::{load, load_package, LoadStats, Loaded, Package, SourceFile};
pub use registry::{
    rebuild_all, DefId, Definition, DefinitionRegistry, Entry, IdFile, IdTable, Rebuild,
    RebuildReport, Record, SlotPolicy,
};
pub use resolve::{resolve, Reference, ReferenceQueue};
pub use syntax::{normalize, parse_source, SourceLocation};
pub use tree::{
    Colour, ContentStore, ContentTree, Key, Node, NodeId, NodeRef, Property, ReloadReport,
    ValueState, DOCUMENT_ROOT,
};
pub use validation::{validate_tree, Diagnostic, Severity, ValidationResult};
