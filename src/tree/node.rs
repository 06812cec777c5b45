//! Nodes and the read-only node view.

use super::colour::Colour;
use super::key::{split_path, Key};
use super::property::Property;
use super::{ContentTree, NodeId};
use crate::error::ValueError;

/// A named, optionally categorised container of child nodes and properties.
///
/// Structure (parent and children) is owned by the `ContentTree` and only
/// changes through its methods; properties can be edited directly.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    category: Option<String>,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    properties: Vec<Property>,
}

impl Node {
    pub(super) fn new(name: impl Into<String>, category: Option<String>) -> Self {
        Self {
            name: name.into(),
            category,
            parent: None,
            children: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// This node's exact `(name, category)` key.
    pub fn key(&self) -> Key<'_> {
        Key::new(&self.name, self.category.as_deref())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Properties whose category is exactly `category`.
    pub fn properties_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.category() == Some(category))
    }

    /// First property matching `key`.
    pub fn property<'k>(&self, key: impl Into<Key<'k>>) -> Option<&Property> {
        let key = key.into();
        self.properties.iter().find(|p| key.matches(p.name(), p.category()))
    }

    pub fn property_mut<'k>(&mut self, key: impl Into<Key<'k>>) -> Option<&mut Property> {
        let key = key.into();
        self.properties
            .iter_mut()
            .find(|p| key.matches(p.name(), p.category()))
    }

    pub fn has_property<'k>(&self, key: impl Into<Key<'k>>) -> bool {
        self.property(key).is_some()
    }

    /// Add a property, replacing one with the exact same `(name, category)`
    /// in place. Returns the replaced property.
    pub fn add_property(&mut self, property: Property) -> Option<Property> {
        self.insert_property(property).1
    }

    /// Like `add_property`, also returning the slot the property landed in.
    pub(crate) fn insert_property(&mut self, property: Property) -> (usize, Option<Property>) {
        let existing = self
            .properties
            .iter()
            .position(|p| p.name() == property.name() && p.category() == property.category());

        match existing {
            Some(slot) => {
                let previous = std::mem::replace(&mut self.properties[slot], property);
                (slot, Some(previous))
            }
            None => {
                self.properties.push(property);
                (self.properties.len() - 1, None)
            }
        }
    }

    pub(crate) fn property_slot(&self, key: Key<'_>) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| key.matches(p.name(), p.category()))
    }

    pub(crate) fn slot(&self, slot: usize) -> Option<&Property> {
        self.properties.get(slot)
    }

    pub(crate) fn slot_mut(&mut self, slot: usize) -> Option<&mut Property> {
        self.properties.get_mut(slot)
    }

    /// Set a property's values, creating it if absent. Derived forms are
    /// computed immediately.
    pub fn set_property<'k, I, S>(&mut self, key: impl Into<Key<'k>>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.property_mut(key) {
            Some(property) => property.assign(values),
            None => self.properties.push(Property::with_values(
                key.name,
                key.category.map(str::to_string),
                values,
            )),
        }
    }

    /// Append a value to a property, creating the property if absent.
    ///
    /// Derived forms of an existing property are invalidated; call
    /// `Property::recompute` before typed reads.
    pub fn append_value<'k>(&mut self, key: impl Into<Key<'k>>, value: impl Into<String>) {
        let key = key.into();
        let value: String = value.into();
        match self.property_mut(key) {
            Some(property) => property.push_value(value),
            None => self.properties.push(Property::with_values(
                key.name,
                key.category.map(str::to_string),
                [value],
            )),
        }
    }

    /// Remove every copy of `value` from a property. Returns how many were
    /// removed; a missing property removes nothing.
    pub fn remove_value<'k>(&mut self, key: impl Into<Key<'k>>, value: &str) -> usize {
        self.property_mut(key)
            .map(|p| p.remove_value(value))
            .unwrap_or(0)
    }

    /// Remove the first property matching `key`.
    pub fn remove_property<'k>(&mut self, key: impl Into<Key<'k>>) -> Option<Property> {
        let slot = self.property_slot(key.into())?;
        Some(self.properties.remove(slot))
    }
}

/// A borrowed view of a node inside its tree.
///
/// Lookups that find nothing return `None`, empty slices or the supplied
/// fallback. Typed reads only fail with `ValueError` when a property exists
/// but its derived forms are stale.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ContentTree,
    id: NodeId,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub(super) fn new(tree: &'a ContentTree, id: NodeId, node: &'a Node) -> Self {
        Self { tree, id, node }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn tree(&self) -> &'a ContentTree {
        self.tree
    }

    pub fn name(&self) -> &'a str {
        self.node.name()
    }

    pub fn category(&self) -> Option<&'a str> {
        self.node.category()
    }

    pub fn key(&self) -> Key<'a> {
        self.node.key()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|id| self.tree.node(id))
    }

    pub fn is_root(&self) -> bool {
        self.id == self.tree.root_id()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node.children.iter().filter_map(move |&id| tree.node(id))
    }

    /// Children whose category is exactly `category`, in tree order.
    pub fn children_in(&self, category: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children()
            .filter(move |child| child.category() == Some(category))
    }

    /// First child matching `key`.
    pub fn child<'k>(&self, key: impl Into<Key<'k>>) -> Option<NodeRef<'a>> {
        let key = key.into();
        self.children()
            .find(|child| key.matches(child.name(), child.category()))
    }

    /// Walk a dotted path of child nodes.
    pub fn find(&self, path: &str) -> Option<NodeRef<'a>> {
        let (nodes, last) = split_path(path)?;
        nodes
            .into_iter()
            .chain(std::iter::once(last))
            .try_fold(*self, |scope, key| scope.child(key))
    }

    pub fn properties(&self) -> &'a [Property] {
        self.node.properties()
    }

    pub fn properties_in(&self, category: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.node.properties_in(category)
    }

    /// First property on this node matching `key`.
    pub fn property<'k>(&self, key: impl Into<Key<'k>>) -> Option<&'a Property> {
        self.node.property(key)
    }

    /// Property at a dotted path relative to this node: every segment but
    /// the last names a child node, the last names the property.
    pub fn property_at(&self, path: &str) -> Option<&'a Property> {
        let (nodes, last) = split_path(path)?;
        let owner = nodes
            .into_iter()
            .try_fold(*self, |scope, key| scope.child(key))?;
        owner.property(last)
    }

    pub fn has_property(&self, path: &str) -> bool {
        self.property_at(path).is_some()
    }

    /// First value of the property at `path`, or `""`.
    pub fn string(&self, path: &str) -> &'a str {
        self.string_or(path, "")
    }

    pub fn string_or(&self, path: &str, fallback: &'a str) -> &'a str {
        self.property_at(path)
            .map(Property::as_str)
            .unwrap_or(fallback)
    }

    /// Every value of the property at `path`; empty when it does not exist.
    pub fn strings(&self, path: &str) -> &'a [String] {
        self.property_at(path)
            .map(Property::values)
            .unwrap_or(&[])
    }

    /// Integer at `path`, falling back to `0`.
    pub fn int(&self, path: &str) -> Result<i64, ValueError> {
        self.int_or(path, 0)
    }

    pub fn int_or(&self, path: &str, fallback: i64) -> Result<i64, ValueError> {
        self.property_at(path)
            .map_or(Ok(fallback), |p| p.int_or(fallback))
    }

    pub fn ints(&self, path: &str) -> Result<Vec<i64>, ValueError> {
        self.property_at(path).map_or(Ok(Vec::new()), Property::ints)
    }

    /// Float at `path`, falling back to `0.0`.
    pub fn float(&self, path: &str) -> Result<f64, ValueError> {
        self.float_or(path, 0.0)
    }

    pub fn float_or(&self, path: &str, fallback: f64) -> Result<f64, ValueError> {
        self.property_at(path)
            .map_or(Ok(fallback), |p| p.float_or(fallback))
    }

    pub fn floats(&self, path: &str) -> Result<Vec<f64>, ValueError> {
        self.property_at(path).map_or(Ok(Vec::new()), Property::floats)
    }

    /// Colour at `path`, falling back to opaque black.
    pub fn colour(&self, path: &str) -> Result<Colour, ValueError> {
        self.colour_or(path, Colour::default())
    }

    pub fn colour_or(&self, path: &str, fallback: Colour) -> Result<Colour, ValueError> {
        self.property_at(path)
            .map_or(Ok(fallback), |p| p.colour_or(fallback))
    }

    pub fn colours(&self, path: &str) -> Result<Vec<Colour>, ValueError> {
        self.property_at(path).map_or(Ok(Vec::new()), Property::colours)
    }
}
