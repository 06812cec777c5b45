//! The content tree: nodes, properties and typed values.
//!
//! A `ContentTree` owns every node in an arena. Each node keeps an ordered
//! list of children and a back-reference to its parent; the tree keeps the
//! two consistent, so a node is always listed by exactly one parent.
//!
//! # Example
//!
//! ```
//! use moddef::tree::ContentTree;
//!
//! let mut tree = ContentTree::new();
//! let root = tree.root_id();
//! let soldier = tree.get_or_create_child(root, "soldier", Some("unit"));
//! tree.node_mut(soldier).unwrap().set_property("hp", ["10"]);
//!
//! assert_eq!(tree.root().int("soldier.hp").unwrap(), 10);
//! ```

mod colour;
mod key;
mod node;
mod property;
mod store;

use std::fmt;

use slotmap::SlotMap;

pub use colour::{Colour, ParseColourError};
pub use key::{is_valid_path, split_path, Key, PATH_SEPARATOR};
pub use node::{Node, NodeRef};
pub use property::{Property, ValueState};
pub use store::{ContentStore, ReloadReport};

slotmap::new_key_type! {
    /// Handle to a node inside a `ContentTree`.
    pub struct NodeId;
}

/// Store handle of the document root every package loads into.
pub const DOCUMENT_ROOT: &str = "definition_root";

/// A tree of nodes rooted at one unnamed document root.
#[derive(Debug, Clone)]
pub struct ContentTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// Create a tree holding only the document root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("", None));
        Self { nodes, root }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root, &self.nodes[self.root])
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id).map(|node| NodeRef::new(self, id, node))
    }

    /// Mutable access to a node's properties.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes, including the root and any detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root has no children and no properties.
    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[self.root];
        root.children.is_empty() && root.properties().is_empty()
    }

    /// Top-level node matching `key` (`name` or `category:name`).
    pub fn get<'k>(&self, key: impl Into<Key<'k>>) -> Option<NodeRef<'_>> {
        self.root().child(key)
    }

    /// Every top-level node in tree order.
    pub fn all(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.root().children()
    }

    /// Top-level nodes of exactly `category`, in tree order.
    pub fn all_of<'a>(&'a self, category: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.root().children_in(category)
    }

    /// Property at a dotted path from the document root.
    pub fn property(&self, path: &str) -> Option<&Property> {
        self.root().property_at(path)
    }

    /// Create a detached node. Attach it with `add_child`.
    pub fn create_node(&mut self, name: impl Into<String>, category: Option<String>) -> NodeId {
        self.nodes.insert(Node::new(name, category))
    }

    /// First child of `parent` matching `(name, category)`, created and
    /// attached when there is none.
    pub fn get_or_create_child(&mut self, parent: NodeId, name: &str, category: Option<&str>) -> NodeId {
        let key = Key::new(name, category);
        if let Some(existing) = self.find_child(parent, key) {
            return existing;
        }
        let child = self.create_node(name, category.map(str::to_string));
        self.add_child(parent, child);
        child
    }

    /// Walk a dotted path of child nodes from `parent`, creating missing ones.
    /// Returns `None` for a malformed path.
    pub fn get_or_create_path(&mut self, parent: NodeId, path: &str) -> Option<NodeId> {
        let (mut nodes, last) = split_path(path)?;
        nodes.push(last);
        let mut scope = parent;
        for key in nodes {
            scope = self.get_or_create_child(scope, key.name, key.category);
        }
        Some(scope)
    }

    /// Attach `child` as the last child of `parent`, removing it from its
    /// previous parent first.
    ///
    /// Returns `false` (and changes nothing) when either node is unknown,
    /// `child` is the root, or `child` is `parent` or one of its ancestors.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        if child == self.root || self.is_ancestor_or_self(child, parent) {
            return false;
        }

        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        true
    }

    /// Remove `node` from its parent's children. The node and its subtree
    /// stay in the arena until `remove` is called.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) else {
            return false;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        self.nodes[node].parent = None;
        true
    }

    /// Detach and drop `node` with its whole subtree. The root cannot be
    /// removed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.nodes.contains_key(node) {
            return false;
        }
        self.detach(node);

        let mut doomed = vec![node];
        while let Some(id) = doomed.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                doomed.extend(removed.children);
            }
        }
        true
    }

    pub(crate) fn find_child(&self, parent: NodeId, key: Key<'_>) -> Option<NodeId> {
        self.nodes.get(parent)?.children.iter().copied().find(|&id| {
            let child = &self.nodes[id];
            key.matches(child.name(), child.category())
        })
    }

    /// The node and slot of the property at a dotted path from the root.
    pub(crate) fn locate_property(&self, path: &str) -> Option<(NodeId, usize)> {
        let (nodes, last) = split_path(path)?;
        let mut scope = self.root;
        for key in nodes {
            scope = self.find_child(scope, key)?;
        }
        let slot = self.nodes[scope].property_slot(last)?;
        Some((scope, slot))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.nodes.get(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Dump one node in source syntax, header included. The root dumps as
    /// its bare contents, like the whole tree.
    pub fn dump(&self, node: NodeRef<'_>) -> String {
        let mut out = String::new();
        let _ = if node.is_root() {
            write_body(&mut out, node, 0)
        } else {
            write_block(&mut out, node, 0)
        };
        out
    }
}

fn write_block(out: &mut impl fmt::Write, node: NodeRef<'_>, depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    writeln!(out, "{}{} {{", indent, node.key())?;
    write_body(out, node, depth + 1)?;
    writeln!(out, "{}}}", indent)
}

fn write_body(out: &mut impl fmt::Write, node: NodeRef<'_>, depth: usize) -> fmt::Result {
    let indent = "    ".repeat(depth);
    // Every statement carries its own terminator, so values ending in `=`
    // or empty values never run into the next line.
    for property in node.properties() {
        writeln!(out, "{}{} = {};", indent, property.key(), property.values().join(","))?;
    }
    for child in node.children() {
        write_block(out, child, depth)?;
    }
    Ok(())
}

/// Dumps the tree in source syntax. Loading the dump again yields an
/// equivalent tree, with empty values dropped.
impl fmt::Display for ContentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_body(f, self.root(), 0)
    }
}
