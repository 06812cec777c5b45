//! Header and statement grammar.
//!
//! Both operate on one normalized, whitespace-free token string:
//!
//! - header: `[category ':'] name ['(' param (',' param)* ')']`
//! - statement: `[category ':'] name ['=' value (',' value)*]` or
//!   `[category ':'] name '=' '@' path`
//!
//! Header parameters use the statement grammar, so each carries at most one
//! value.

use thiserror::Error;

use crate::tree::is_valid_path;

use super::{CATEGORY_SEPARATOR, PARAMS_CLOSE, PARAMS_OPEN, REFERENCE, SET, VALUE_SEPARATOR};

/// A grammar failure without location. The parser attaches one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub help: Option<String>,
}

impl SyntaxError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help: None,
        }
    }

    fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }
}

type GrammarResult<T> = std::result::Result<T, SyntaxError>;

/// The right-hand side of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementValue {
    /// Literal values, possibly none.
    Values(Vec<String>),
    /// A dotted path whose target's values are copied in once resolved.
    Reference(String),
}

/// A parsed statement: one property assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub name: String,
    pub category: Option<String>,
    pub value: StatementValue,
}

/// A parsed block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub category: Option<String>,
    pub params: Vec<Statement>,
}

/// Split `category:name` and check both parts.
fn parse_name(text: &str) -> GrammarResult<(Option<String>, String)> {
    let (category, name) = match text.split_once(CATEGORY_SEPARATOR) {
        Some((category, name)) => (Some(category), name),
        None => (None, text),
    };

    if name.contains(CATEGORY_SEPARATOR) {
        return Err(SyntaxError::new(format!("'{}' has more than one ':'", text))
            .help("Write at most one category, as `category:name`"));
    }
    if name.is_empty() {
        return Err(SyntaxError::new(if text.is_empty() {
            "missing name".to_string()
        } else {
            format!("'{}' has an empty name", text)
        }));
    }
    if category == Some("") {
        return Err(SyntaxError::new(format!("'{}' has an empty category", text))
            .help("Drop the ':' or name the category before it"));
    }

    let forbidden = [PARAMS_OPEN, PARAMS_CLOSE, VALUE_SEPARATOR, REFERENCE, '.'];
    if let Some(c) = text.chars().find(|c| forbidden.contains(c)) {
        return Err(SyntaxError::new(format!(
            "'{}' contains '{}', which is not allowed in a name",
            text, c
        )));
    }

    Ok((category.map(str::to_string), name.to_string()))
}

/// Parse a statement. Statements without their own category get
/// `default_category`.
pub fn parse_statement(text: &str, default_category: Option<&str>) -> GrammarResult<Statement> {
    let (head, rest) = match text.split_once(SET) {
        Some((head, rest)) => (head, Some(rest)),
        None => (text, None),
    };

    let (category, name) = parse_name(head)?;
    let category = category.or_else(|| default_category.map(str::to_string));

    let value = match rest {
        None | Some("") => StatementValue::Values(Vec::new()),
        Some(rest) => match rest.strip_prefix(REFERENCE) {
            Some(path) => StatementValue::Reference(parse_reference_path(path)?),
            None => StatementValue::Values(
                rest.split(VALUE_SEPARATOR).map(str::to_string).collect(),
            ),
        },
    };

    Ok(Statement {
        name,
        category,
        value,
    })
}

fn parse_reference_path(path: &str) -> GrammarResult<String> {
    if path.is_empty() {
        return Err(SyntaxError::new("reference has an empty path")
            .help("Write the dotted path of the property to copy, e.g. `@defaults.hp`"));
    }
    if path.contains(VALUE_SEPARATOR) {
        return Err(SyntaxError::new(format!(
            "reference '@{}' lists more than one value",
            path
        ))
        .help("A reference replaces every value; write it on its own"));
    }
    if !is_valid_path(path) {
        return Err(SyntaxError::new(format!(
            "reference '@{}' has an empty path segment",
            path
        )));
    }
    Ok(path.to_string())
}

/// Parse a block header, including its inline parameters.
pub fn parse_header(text: &str) -> GrammarResult<Header> {
    let (head, params) = match text.split_once(PARAMS_OPEN) {
        Some((head, rest)) => {
            let Some((inner, trailing)) = rest.split_once(PARAMS_CLOSE) else {
                return Err(SyntaxError::new(format!("unclosed '(' in header '{}'", text)));
            };
            if inner.contains(PARAMS_OPEN) {
                return Err(SyntaxError::new(format!("nested '(' in header '{}'", text)));
            }
            if !trailing.is_empty() {
                return Err(SyntaxError::new(format!(
                    "unexpected '{}' after ')' in header '{}'",
                    trailing, text
                )));
            }
            (head, Some(inner))
        }
        None => (text, None),
    };

    if head.contains(SET) {
        return Err(SyntaxError::new(format!("'=' in block header '{}'", text))
            .help("Headers only name a block; put values inside it or in a parameter list"));
    }
    if head.contains(PARAMS_CLOSE) {
        return Err(SyntaxError::new(format!("unmatched ')' in header '{}'", text)));
    }

    let (category, name) = parse_name(head)?;

    let params = match params {
        None | Some("") => Vec::new(),
        Some(inner) => inner
            .split(VALUE_SEPARATOR)
            .map(|param| parse_statement(param, Some(super::PARAMETER_CATEGORY)))
            .collect::<GrammarResult<_>>()?,
    };

    Ok(Header {
        name,
        category,
        params,
    })
}
