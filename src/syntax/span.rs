//! Source location tracking for error messages.
//!
//! Normalization strips whitespace and comments, so offsets into the
//! normalized text no longer line up with the file. `LineIndex` remembers
//! where each source line's contribution starts so errors can still point
//! at `file:line`.

use std::fmt;
use std::path::{Path, PathBuf};

/// A line in a named source file (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// A location for text that did not come from a file.
    pub fn inline(line: u32) -> Self {
        Self::new("<inline>", line)
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::inline(0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Maps byte offsets of normalized text back to source lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    /// (offset in normalized text, source line), ascending by offset.
    starts: Vec<(usize, u32)>,
}

impl LineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that source `line` contributes text starting at `offset`.
    pub(crate) fn push(&mut self, offset: usize, line: u32) {
        self.starts.push((offset, line));
    }

    /// The source line that produced the byte at `offset`.
    ///
    /// Offsets past the end map to the last recorded line; an empty index
    /// maps everything to line 0.
    pub fn line_of(&self, offset: usize) -> u32 {
        let idx = self.starts.partition_point(|&(start, _)| start <= offset);
        if idx == 0 {
            self.starts.first().map(|&(_, line)| line).unwrap_or(0)
        } else {
            self.starts[idx - 1].1
        }
    }

    /// Resolve an offset to a full location in `file`.
    pub fn locate(&self, file: &Path, offset: usize) -> SourceLocation {
        SourceLocation::new(file, self.line_of(offset))
    }

    /// Number of source lines that contributed text.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of_simple() {
        let mut index = LineIndex::new();
        index.push(0, 1);
        index.push(5, 3);
        index.push(9, 4);

        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(4), 1);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(8), 3);
        assert_eq!(index.line_of(9), 4);
        assert_eq!(index.line_of(100), 4);
    }

    #[test]
    fn test_line_of_empty() {
        let index = LineIndex::new();
        assert_eq!(index.line_of(0), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("Mods/core/Defines/units.txt", 12);
        assert_eq!(loc.to_string(), "Mods/core/Defines/units.txt:12");
    }
}
