//! Source syntax: normalization, header and statement grammar, block parser.
//!
//! Definition files are line oriented. After normalization a file is one
//! stream of statements (`name=value;`) and blocks (`category:name{ ... }`):
//!
//! ```text
//! # comment
//! unit:soldier(hp=10) {
//!     weapon:sword = iron, sharp
//!     speed = @defaults.speed
//! }
//! ```
//!
//! # Usage
//!
//! ```
//! use moddef::syntax::parse_source;
//! use moddef::tree::ContentTree;
//!
//! let mut tree = ContentTree::new();
//! parse_source(&mut tree, "unit:soldier{hp=10}").unwrap();
//! assert_eq!(tree.root().int("soldier.hp").unwrap(), 10);
//! ```

mod grammar;
pub mod normalize;
pub mod parser;
mod span;

pub use grammar::{parse_header, parse_statement, Header, Statement, StatementValue, SyntaxError};
pub use normalize::{normalize, normalize_str, Normalized};
pub use parser::{parse_file, parse_source, parse_source_queued, Declared, FileStats, REDECLARED};
pub use span::{LineIndex, SourceLocation};

/// Ends a statement.
pub const STATEMENT_END: char = ';';
/// Opens a block.
pub const BLOCK_OPEN: char = '{';
/// Closes a block.
pub const BLOCK_CLOSE: char = '}';
/// Opens a header's parameter list.
pub const PARAMS_OPEN: char = '(';
/// Closes a header's parameter list.
pub const PARAMS_CLOSE: char = ')';
/// Separates a name from its values.
pub const SET: char = '=';
/// Separates a category from a name.
pub const CATEGORY_SEPARATOR: char = ':';
/// Separates values and parameters.
pub const VALUE_SEPARATOR: char = ',';
/// Prefixes a reference path.
pub const REFERENCE: char = '@';
/// Starts a comment running to the end of the line.
pub const COMMENT: char = '#';

/// Category given to header parameters that do not name their own.
pub const PARAMETER_CATEGORY: &str = "parameter";
