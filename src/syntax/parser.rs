//! Block parser.
//!
//! Scans normalized text one character at a time with a stack of open
//! scopes (the document root at the bottom) and an accumulator holding the
//! text since the last delimiter:
//!
//! - `{` parses the accumulator as a header and opens that child;
//! - `}` flushes a pending statement and closes the innermost scope;
//! - `;` parses the accumulator as a statement on the innermost scope.
//!
//! References are queued, not resolved; see [`crate::resolve`].

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::{DefError, Result};
use crate::resolve::{resolve, Reference, ReferenceQueue};
use crate::tree::{ContentTree, NodeId, Property};
use crate::validation::{Diagnostic, ValidationResult};

use super::grammar::{parse_header, parse_statement, Statement, StatementValue, SyntaxError};
use super::normalize::{normalize_str, Normalized};
use super::span::SourceLocation;
use super::{BLOCK_CLOSE, BLOCK_OPEN, STATEMENT_END};

/// Code of the warning recorded when a property is declared twice in a node
/// within one package.
pub const REDECLARED: &str = "moddef::parse::redeclared";

/// Counts gathered while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Blocks opened, including repeated opens of the same node.
    pub blocks: usize,
    /// Statements and header parameters declared.
    pub properties: usize,
    /// References queued.
    pub references: usize,
    /// Deepest nesting reached; top-level blocks are depth 1.
    pub max_depth: usize,
}

impl FileStats {
    pub fn merge(&mut self, other: FileStats) {
        self.blocks += other.blocks;
        self.properties += other.properties;
        self.references += other.references;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

/// Property slots declared so far in one package. Overriding a slot filled
/// by an earlier package is layering, not a redeclaration.
pub type Declared = HashSet<(NodeId, usize)>;

struct Scope {
    node: NodeId,
    opened_at: usize,
}

struct BlockParser<'a> {
    tree: &'a mut ContentTree,
    file: &'a Path,
    source: &'a Normalized,
    queue: &'a mut ReferenceQueue,
    declared: &'a mut Declared,
    diagnostics: &'a mut ValidationResult,
    scopes: Vec<Scope>,
    acc: String,
    acc_start: usize,
    stats: FileStats,
}

/// Parse one normalized file into `tree`.
///
/// Blocks attach below the tree's root; references are pushed onto `queue`.
/// Slots are recorded in `declared`, and a slot declared twice is reported
/// into `diagnostics`.
pub fn parse_file(
    tree: &mut ContentTree,
    file: &Path,
    source: &Normalized,
    queue: &mut ReferenceQueue,
    declared: &mut Declared,
    diagnostics: &mut ValidationResult,
) -> Result<FileStats> {
    let root = tree.root_id();
    let mut parser = BlockParser {
        tree,
        file,
        source,
        queue,
        declared,
        diagnostics,
        scopes: vec![Scope {
            node: root,
            opened_at: 0,
        }],
        acc: String::new(),
        acc_start: 0,
        stats: FileStats::default(),
    };

    parser.run()?;
    debug!(
        file = %file.display(),
        blocks = parser.stats.blocks,
        properties = parser.stats.properties,
        "parsed file"
    );
    Ok(parser.stats)
}

/// Parse a source string and resolve its references.
pub fn parse_source(tree: &mut ContentTree, source: &str) -> Result<FileStats> {
    let mut queue = ReferenceQueue::new();
    let stats = parse_inline(tree, source, &mut queue)?;
    resolve(tree, queue)?;
    Ok(stats)
}

/// Parse a source string, returning its references unresolved.
pub fn parse_source_queued(tree: &mut ContentTree, source: &str) -> Result<ReferenceQueue> {
    let mut queue = ReferenceQueue::new();
    parse_inline(tree, source, &mut queue)?;
    Ok(queue)
}

fn parse_inline(tree: &mut ContentTree, source: &str, queue: &mut ReferenceQueue) -> Result<FileStats> {
    let normalized = normalize_str(source);
    let mut diagnostics = ValidationResult::new();
    let location = SourceLocation::inline(0);
    parse_file(
        tree,
        &location.file,
        &normalized,
        queue,
        &mut Declared::new(),
        &mut diagnostics,
    )
}

impl BlockParser<'_> {
    fn run(&mut self) -> Result<()> {
        let source = self.source;
        for (offset, c) in source.as_str().char_indices() {
            match c {
                BLOCK_OPEN => self.open_block()?,
                BLOCK_CLOSE => {
                    self.flush()?;
                    self.close_block(offset)?;
                }
                STATEMENT_END => self.flush()?,
                _ => {
                    if self.acc.is_empty() {
                        self.acc_start = offset;
                    }
                    self.acc.push(c);
                }
            }
        }

        self.flush()?;

        if self.scopes.len() > 1 {
            let depth = self.scopes.len() - 1;
            let Some(innermost) = self.scopes.last() else {
                return Ok(());
            };
            let name = self
                .tree
                .node(innermost.node)
                .map(|n| n.key().to_string())
                .unwrap_or_default();
            return Err(DefError::parse(
                self.locate(innermost.opened_at),
                format!("block '{}' is never closed ({} open at end of file)", name, depth),
            )
            .with_help("Add the missing '}'"));
        }
        Ok(())
    }

    fn current(&self) -> NodeId {
        self.scopes
            .last()
            .map(|s| s.node)
            .unwrap_or_else(|| self.tree.root_id())
    }

    fn locate(&self, offset: usize) -> SourceLocation {
        self.source.lines.locate(self.file, offset)
    }

    fn syntax_error(&self, err: SyntaxError) -> DefError {
        DefError::Parse {
            location: self.locate(self.acc_start),
            message: err.message,
            help: err.help,
        }
    }

    fn open_block(&mut self) -> Result<()> {
        let header = parse_header(&self.acc).map_err(|e| self.syntax_error(e))?;
        let location = self.locate(self.acc_start);

        let parent = self.current();
        let node = self
            .tree
            .get_or_create_child(parent, &header.name, header.category.as_deref());
        for param in header.params {
            self.attach(node, param, &location);
        }

        self.scopes.push(Scope {
            node,
            opened_at: self.acc_start,
        });
        self.stats.blocks += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.scopes.len() - 1);
        self.acc.clear();
        Ok(())
    }

    fn close_block(&mut self, offset: usize) -> Result<()> {
        if self.scopes.len() == 1 {
            return Err(DefError::parse(self.locate(offset), "unmatched '}'")
                .with_help("Remove it, or open a block before it"));
        }
        self.scopes.pop();
        Ok(())
    }

    /// Parse a non-empty accumulator as a statement on the innermost scope.
    fn flush(&mut self) -> Result<()> {
        if self.acc.is_empty() {
            return Ok(());
        }
        let statement = parse_statement(&self.acc, None).map_err(|e| self.syntax_error(e))?;
        let location = self.locate(self.acc_start);
        let scope = self.current();
        self.attach(scope, statement, &location);
        self.acc.clear();
        Ok(())
    }

    fn attach(&mut self, node: NodeId, statement: Statement, location: &SourceLocation) {
        let Statement {
            name,
            category,
            value,
        } = statement;
        let (property, path) = match value {
            StatementValue::Values(values) => (Property::with_values(name, category, values), None),
            StatementValue::Reference(path) => (Property::pending(name, category), Some(path)),
        };

        let owner = self
            .tree
            .node(node)
            .map(|n| n.key().to_string())
            .unwrap_or_default();
        let key = property.key().to_string();
        let Some(target) = self.tree.node_mut(node) else {
            return;
        };
        let (slot, previous) = target.insert_property(property);
        self.stats.properties += 1;

        let first = self.declared.insert((node, slot));
        if previous.is_some() {
            self.queue.cancel(node, slot);
        }
        if previous.is_some() && !first {
            self.diagnostics.push(
                Diagnostic::warning(
                    REDECLARED,
                    format!("'{}' is declared more than once in '{}'; the last declaration wins", key, owner),
                )
                .at(location.clone()),
            );
        }

        if let Some(path) = path {
            self.queue.push(Reference {
                node,
                slot,
                path,
                location: location.clone(),
            });
            self.stats.references += 1;
        }
    }
}
