//! Untyped definitions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::tree::NodeRef;

use super::Definition;

/// A definition that keeps a node's properties as strings.
///
/// Used where no typed definition exists for a category, such as the
/// command-line tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Property values keyed by `category:name` (or `name`).
    pub properties: BTreeMap<String, Vec<String>>,
    /// Number of direct child nodes.
    pub children: usize,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.properties.get(key).map(Vec::as_slice)
    }
}

impl Definition for Record {
    fn from_node(node: NodeRef<'_>) -> Result<Self> {
        Ok(Record {
            properties: node
                .properties()
                .iter()
                .map(|p| (p.key().to_string(), p.values().to_vec()))
                .collect(),
            children: node.children().count(),
        })
    }

    fn fallback() -> Self {
        Self::default()
    }
}
