//! Lookup keys and dotted paths.
//!
//! Nodes and properties are looked up by `(name, category)`. A key without a
//! category matches any category; a key with one matches only that category.
//! Keys can be written as `category:name` wherever a string is accepted.

use std::fmt;

/// A borrowed `(name, category)` lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key<'a> {
    pub name: &'a str,
    pub category: Option<&'a str>,
}

impl<'a> Key<'a> {
    pub fn new(name: &'a str, category: Option<&'a str>) -> Self {
        Self { name, category }
    }

    /// A key matching `name` in any category.
    pub fn named(name: &'a str) -> Self {
        Self::new(name, None)
    }

    /// A key matching `name` only within `category`.
    pub fn in_category(name: &'a str, category: &'a str) -> Self {
        Self::new(name, Some(category))
    }

    /// Unpack `category:name` or a bare `name`.
    pub fn parse(packed: &'a str) -> Self {
        match packed.split_once(':') {
            Some((category, name)) => Self::in_category(name, category),
            None => Self::named(packed),
        }
    }

    /// Whether an item with this name and category satisfies the key.
    pub fn matches(&self, name: &str, category: Option<&str>) -> bool {
        self.name == name
            && match self.category {
                None => true,
                Some(wanted) => category == Some(wanted),
            }
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(packed: &'a str) -> Self {
        Key::parse(packed)
    }
}

impl<'a> From<&'a String> for Key<'a> {
    fn from(packed: &'a String) -> Self {
        Key::parse(packed)
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(f, "{}:{}", category, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Split a dotted property path into its node keys and the final property key.
///
/// Returns `None` for an empty path or one with an empty segment.
pub fn split_path(path: &str) -> Option<(Vec<Key<'_>>, Key<'_>)> {
    let mut keys = Vec::new();
    for segment in path.split(PATH_SEPARATOR) {
        if segment.is_empty() {
            return None;
        }
        keys.push(Key::parse(segment));
    }
    let last = keys.pop()?;
    Some((keys, last))
}

/// Check that a path is well formed without allocating.
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.split(PATH_SEPARATOR).all(|s| !s.is_empty())
}
