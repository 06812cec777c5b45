//! Diagnostic types for non-fatal findings.

use std::fmt;

use crate::syntax::SourceLocation;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Machine-readable code (e.g. "moddef::parse::redeclared").
    pub code: String,
    pub message: String,
    /// Where in the sources the finding was made, when it has a place.
    pub location: Option<SourceLocation>,
    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add help text to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: ", self.severity, self.code)?;
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Collects diagnostics from loading and checks.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an error diagnostic.
    pub fn error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::error(code, message));
    }

    /// Add a warning diagnostic.
    pub fn warning(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::warning(code, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Check if there are no diagnostics at all.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Diagnostics with the given code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let result = ValidationResult::new();
        assert!(result.is_ok());
        assert!(!result.has_errors());
        assert!(!result.has_warnings());
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_error_diagnostic() {
        let mut result = ValidationResult::new();
        result.error("moddef::test", "something broke");

        assert!(result.has_errors());
        assert!(!result.has_warnings());
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_warning_diagnostic() {
        let mut result = ValidationResult::new();
        result.warning("moddef::test", "something looks off");

        assert!(!result.has_errors());
        assert!(result.has_warnings());
        assert_eq!(result.warning_count(), 1);
        assert_eq!(result.with_code("moddef::test").count(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = ValidationResult::new();
        a.error("moddef::a", "error a");

        let mut b = ValidationResult::new();
        b.warning("moddef::b", "warning b");

        a.merge(b);
        assert_eq!(a.error_count(), 1);
        assert_eq!(a.warning_count(), 1);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_display_with_location() {
        let d = Diagnostic::warning("moddef::parse::redeclared", "'hp' declared twice")
            .at(SourceLocation::new("units.txt", 4))
            .with_help("Remove one of them");
        assert_eq!(
            d.to_string(),
            "warning[moddef::parse::redeclared]: units.txt:4: 'hp' declared twice"
        );
        assert_eq!(d.help.as_deref(), Some("Remove one of them"));
    }
}
