//! Source text and line ranges
//!
//! The lowering pass never looks at characters inside a definition; it only
//! needs line-level access to report (and slightly widen) the range a unit
//! covers in backtraces.

/// Inclusive, 0-based line range of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    /// First line of the definition
    pub start_line: usize,
    /// Last line of the definition
    pub end_line: usize,
}

impl SourceRange {
    /// Create a new range
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Number of lines covered
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start_line, self.end_line)
    }
}

/// A source file split into lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    lines: Vec<String>,
}

impl Source {
    /// Create a source from its full text.
    ///
    /// A trailing newline yields a final empty line, so `"end\n"` has two lines.
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self {
            name: name.into(),
            lines,
        }
    }

    /// Create a source from already split lines
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// File name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of a line, without its terminator
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

/// Widen `range` to cover the line closing the definition.
///
/// Parsers report a body range that stops at the last statement. When a
/// later line consists of exactly the start line's indentation followed by
/// `end` or `}`, the range is extended to that line so backtraces point at
/// the whole definition. Returns the range unchanged when no such line
/// exists.
pub fn extend_to_closing_line(range: SourceRange, source: &Source) -> SourceRange {
    if range.end_line + 1 >= source.line_count() {
        return range;
    }

    let indent = source.line(range.start_line).map(indentation).unwrap_or("");

    for line in range.end_line + 1..source.line_count() {
        let text = source.line(line).unwrap_or("").trim_end();
        let closes = text
            .strip_prefix(indent)
            .is_some_and(|rest| rest == "end" || rest == "}");
        if closes {
            return SourceRange::new(range.start_line, line);
        }
    }

    range
}

/// Leading whitespace of a line; blank lines have no indentation
fn indentation(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return "";
    }
    &line[..line.len() - trimmed.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_new_keeps_trailing_line() {
        let source = Source::new("t.gt", "def f(x)\n  x + 1\nend\n");
        assert_eq!(source.line_count(), 4);
        assert_eq!(source.line(2), Some("end"));
        assert_eq!(source.line(3), Some(""));
        assert_eq!(source.line(4), None);
    }

    #[test]
    fn test_source_strips_carriage_returns() {
        let source = Source::new("t.gt", "a\r\nb");
        assert_eq!(source.line(0), Some("a"));
        assert_eq!(source.line(1), Some("b"));
    }

    #[test]
    fn test_extend_to_end_keyword() {
        let source = Source::from_lines("t.gt", ["def f(x)", "  x + 1", "end", ""]);
        let range = extend_to_closing_line(SourceRange::new(0, 1), &source);
        assert_eq!(range, SourceRange::new(0, 2));
    }

    #[test]
    fn test_extend_to_closing_brace() {
        let source = Source::from_lines("t.gt", ["  list.each { |x|", "    p x", "  }", ""]);
        let range = extend_to_closing_line(SourceRange::new(0, 1), &source);
        assert_eq!(range, SourceRange::new(0, 2));
    }

    #[test]
    fn test_extend_skips_intermediate_lines() {
        let source = Source::from_lines(
            "t.gt",
            ["  def f", "    a", "    b", "  end", "x"],
        );
        let range = extend_to_closing_line(SourceRange::new(0, 1), &source);
        assert_eq!(range, SourceRange::new(0, 3));
    }

    #[test]
    fn test_mismatched_indentation_is_unchanged() {
        let source = Source::from_lines("t.gt", ["  def f", "    x", "end", ""]);
        let range = SourceRange::new(0, 1);
        assert_eq!(extend_to_closing_line(range, &source), range);
    }

    #[test]
    fn test_range_at_end_of_source_is_unchanged() {
        let source = Source::from_lines("t.gt", ["def f", "end"]);
        let range = SourceRange::new(0, 1);
        assert_eq!(extend_to_closing_line(range, &source), range);

        let past = SourceRange::new(0, 7);
        assert_eq!(extend_to_closing_line(past, &source), past);
    }

    #[test]
    fn test_trailing_whitespace_is_ignored() {
        let source = Source::from_lines("t.gt", ["def f", "  1", "end   ", ""]);
        let range = extend_to_closing_line(SourceRange::new(0, 1), &source);
        assert_eq!(range, SourceRange::new(0, 2));
    }
}
