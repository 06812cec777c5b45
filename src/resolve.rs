//! Deferred `@path` references.
//!
//! A statement whose value is `@path` leaves an empty property behind and
//! queues a `Reference`. Once every file of a package is parsed, `resolve`
//! copies the target property's values into each queued slot. Targets may
//! themselves be pending; chains resolve in dependency order regardless of
//! queue order.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{DefError, Result};
use crate::syntax::SourceLocation;
use crate::tree::{split_path, ContentTree, NodeId};

/// A property slot waiting on the values at `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub node: NodeId,
    /// Index into the node's properties.
    pub slot: usize,
    /// Dotted path from the document root.
    pub path: String,
    pub location: SourceLocation,
}

/// References queued while parsing one package.
#[derive(Debug, Clone, Default)]
pub struct ReferenceQueue {
    refs: Vec<Reference>,
}

impl ReferenceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reference: Reference) {
        self.refs.push(reference);
    }

    /// Drop the reference queued for a slot, if any. Used when a later
    /// declaration overwrites the slot.
    pub fn cancel(&mut self, node: NodeId, slot: usize) -> bool {
        let before = self.refs.len();
        self.refs.retain(|r| !(r.node == node && r.slot == slot));
        self.refs.len() != before
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.refs.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    Visiting,
    Done,
}

/// Resolve every queued reference against `tree`, consuming the queue.
///
/// Returns the number of references resolved. A missing target, a
/// self-reference or a cycle aborts with `DefError::Reference`; slots
/// resolved before the failure keep their copied values.
pub fn resolve(tree: &mut ContentTree, queue: ReferenceQueue) -> Result<usize> {
    let refs = queue.refs;
    let by_slot: HashMap<(NodeId, usize), usize> = refs
        .iter()
        .enumerate()
        .map(|(i, r)| ((r.node, r.slot), i))
        .collect();
    let mut state = vec![State::Pending; refs.len()];

    for start in 0..refs.len() {
        if state[start] == State::Done {
            continue;
        }

        // Follow the chain down to a target that is not itself pending.
        let mut chain = vec![start];
        state[start] = State::Visiting;
        let mut target = locate(tree, &refs[start])?;
        while let Some(&next) = by_slot.get(&target) {
            match state[next] {
                State::Done => break,
                State::Visiting => return Err(cycle_error(&refs, &chain, next)),
                State::Pending => {
                    state[next] = State::Visiting;
                    chain.push(next);
                    target = locate(tree, &refs[next])?;
                }
            }
        }

        // Unwind: the innermost link copies from the settled target, every
        // outer link from the link it points at.
        for &i in chain.iter().rev() {
            let reference = &refs[i];
            copy_values(tree, target, (reference.node, reference.slot));
            debug!(path = %reference.path, location = %reference.location, "resolved reference");
            state[i] = State::Done;
            target = (reference.node, reference.slot);
        }
    }

    Ok(refs.len())
}

fn locate(tree: &ContentTree, reference: &Reference) -> Result<(NodeId, usize)> {
    tree.locate_property(&reference.path)
        .ok_or_else(|| missing_error(tree, reference))
}

fn copy_values(tree: &mut ContentTree, from: (NodeId, usize), to: (NodeId, usize)) {
    let values = tree
        .node(from.0)
        .and_then(|n| n.node().slot(from.1))
        .map(|p| p.values().to_vec())
        .unwrap_or_default();
    if let Some(property) = tree.node_mut(to.0).and_then(|n| n.slot_mut(to.1)) {
        property.assign(values);
    }
}

fn missing_error(tree: &ContentTree, reference: &Reference) -> DefError {
    let message = match split_path(&reference.path) {
        None => "malformed path".to_string(),
        Some((nodes, last)) => {
            let mut scope = tree.root();
            let mut missing = None;
            for key in nodes {
                match scope.child(key) {
                    Some(child) => scope = child,
                    None => {
                        missing = Some(format!("no node '{}'", key));
                        break;
                    }
                }
            }
            missing.unwrap_or_else(|| {
                if scope.is_root() {
                    format!("no top-level property '{}'", last)
                } else {
                    format!("node '{}' has no property '{}'", scope.key(), last)
                }
            })
        }
    };

    DefError::Reference {
        location: reference.location.clone(),
        path: reference.path.clone(),
        message,
        help: Some(
            "References see everything in the same package and in packages loaded before it"
                .to_string(),
        ),
    }
}

fn cycle_error(refs: &[Reference], chain: &[usize], back_to: usize) -> DefError {
    let first = &refs[chain[0]];
    let message = if chain.len() == 1 && back_to == chain[0] {
        "the property refers to itself".to_string()
    } else {
        let start = chain.iter().position(|&i| i == back_to).unwrap_or(0);
        let path: Vec<String> = chain[start..]
            .iter()
            .chain(std::iter::once(&back_to))
            .map(|&i| format!("@{}", refs[i].path))
            .collect();
        format!("reference cycle {}", path.join(" -> "))
    };

    DefError::Reference {
        location: first.location.clone(),
        path: first.path.clone(),
        message,
        help: Some("Give one property in the cycle a literal value".to_string()),
    }
}
