//! Line normalization.
//!
//! Turns the raw lines of one file into a single statement stream: comments
//! are cut, blank lines dropped, implicit statement terminators added and all
//! whitespace removed. No grammar checks happen here.

use super::span::LineIndex;
use super::{BLOCK_CLOSE, BLOCK_OPEN, COMMENT, SET, STATEMENT_END};

/// The normalized form of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// The token string handed to the parser.
    pub text: String,
    /// Offset to source line mapping for diagnostics.
    pub lines: LineIndex,
}

impl Normalized {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Characters that already end a line, so no terminator is appended.
fn ends_statement(c: char) -> bool {
    matches!(c, STATEMENT_END | BLOCK_OPEN | BLOCK_CLOSE | SET)
}

/// Normalize the lines of one file.
///
/// This is a pure function of its input: the same lines always produce the
/// same text and line index.
pub fn normalize<I, S>(lines: I) -> Normalized
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Normalized::default();

    for (i, raw) in lines.into_iter().enumerate() {
        let raw = raw.as_ref();
        let line = match raw.find(COMMENT) {
            Some(pos) => &raw[..pos],
            None => raw,
        };

        let Some(last) = line.trim_end().chars().last() else {
            continue;
        };

        out.lines.push(out.text.len(), i as u32 + 1);
        out.text.extend(line.chars().filter(|c| !c.is_whitespace()));
        if !ends_statement(last) {
            out.text.push(STATEMENT_END);
        }
    }

    out
}

/// Normalize a whole source string (split on line breaks).
pub fn normalize_str(source: &str) -> Normalized {
    normalize(source.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_terminators() {
        let n = normalize(["unit:soldier {", "  hp = 10", "  name = Soldier", "}"]);
        assert_eq!(n.text, "unit:soldier{hp=10;name=Soldier;}");
    }

    #[test]
    fn test_strips_comments_and_blank_lines() {
        let n = normalize([
            "# header comment",
            "",
            "   ",
            "speed = 4 # tiles per turn",
            "#",
        ]);
        assert_eq!(n.text, "speed=4;");
    }

    #[test]
    fn test_keeps_existing_delimiters() {
        let n = normalize(["a = 1;", "b {", "}", "tags ="]);
        assert_eq!(n.text, "a=1;b{}tags=");
    }

    #[test]
    fn test_assignment_continues_on_next_line() {
        let n = normalize(["weapons =", "  sword, axe"]);
        assert_eq!(n.text, "weapons=sword,axe;");
    }

    #[test]
    fn test_removes_inner_whitespace() {
        let n = normalize(["display name = Iron \t Sword"]);
        assert_eq!(n.text, "displayname=IronSword;");
    }

    #[test]
    fn test_idempotent() {
        let lines = vec![
            "unit:archer(cost = 3) {",
            "  hp = @soldier.hp  # inherit",
            "}",
        ];
        let first = normalize(&lines);
        let second = normalize(&lines);
        assert_eq!(first, second);
        assert_eq!(first.text, "unit:archer(cost=3){hp=@soldier.hp;}");
    }

    #[test]
    fn test_line_index_tracks_source_lines() {
        let n = normalize(["# comment", "a = 1", "", "b = 2"]);
        assert_eq!(n.text, "a=1;b=2;");
        assert_eq!(n.lines.line_of(0), 2);
        assert_eq!(n.lines.line_of(4), 4);
    }

    #[test]
    fn test_empty_input() {
        let n = normalize(Vec::<String>::new());
        assert!(n.is_empty());
        assert!(n.lines.is_empty());
    }

    #[test]
    fn test_normalize_str() {
        let n = normalize_str("a{\nb=1\n}\n");
        assert_eq!(n.as_str(), "a{b=1;}");
    }
}
