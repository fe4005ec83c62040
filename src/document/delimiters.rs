//! Environment kinds, their delimiter patterns and the shared line scanner

use std::fmt;

use regex_lite::{Match, Regex};

use crate::errors::RegistryError;

/// The kind of a document segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
    /// Running text outside any environment
    Math,
    Verbatim,
    Print,
    /// A `pspicture` drawing
    Figure,
    Enumerate,
    Nicebox,
    Macros,
    /// A caller-registered environment
    Custom { name: String, literal: bool },
}

impl EnvironmentKind {
    /// Kind for an environment name; built-in names keep their own kind
    pub fn from_name(name: &str, literal: bool) -> Self {
        match name {
            "math" => EnvironmentKind::Math,
            "verbatim" => EnvironmentKind::Verbatim,
            "print" => EnvironmentKind::Print,
            "pspicture" => EnvironmentKind::Figure,
            "enumerate" => EnvironmentKind::Enumerate,
            "nicebox" => EnvironmentKind::Nicebox,
            "macros" => EnvironmentKind::Macros,
            _ => EnvironmentKind::Custom {
                name: name.to_string(),
                literal,
            },
        }
    }

    /// The string tag, which is also the environment name
    pub fn tag(&self) -> &str {
        match self {
            EnvironmentKind::Math => "math",
            EnvironmentKind::Verbatim => "verbatim",
            EnvironmentKind::Print => "print",
            EnvironmentKind::Figure => "pspicture",
            EnvironmentKind::Enumerate => "enumerate",
            EnvironmentKind::Nicebox => "nicebox",
            EnvironmentKind::Macros => "macros",
            EnvironmentKind::Custom { name, .. } => name,
        }
    }

    /// Literal regions are never reinterpreted or substituted
    pub fn is_literal(&self) -> bool {
        match self {
            EnvironmentKind::Verbatim | EnvironmentKind::Print => true,
            EnvironmentKind::Custom { literal, .. } => *literal,
            _ => false,
        }
    }

    pub fn is_figure(&self) -> bool {
        matches!(self, EnvironmentKind::Figure)
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Begin and end patterns of one environment
#[derive(Debug, Clone)]
pub struct Delimiter {
    pub kind: EnvironmentKind,
    begin: Regex,
    end: Regex,
}

impl Delimiter {
    pub fn new(kind: EnvironmentKind) -> Result<Self, RegistryError> {
        let name = kind.tag().to_string();
        if name.is_empty() || name.contains(['{', '}']) || name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName { name });
        }
        let escaped = regex_lite::escape(&name);
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| RegistryError::InvalidPattern {
                name: name.clone(),
                message: e.to_string(),
            })
        };
        // Trailing option and coordinate groups belong to the begin token
        let begin = compile(format!(
            r"\\begin\{{{escaped}\}}(?:\s*\[[^\]]*\])?(?:\s*\([^)]*\))*"
        ))?;
        let end = compile(format!(r"\\end\{{{escaped}\}}"))?;
        Ok(Self { kind, begin, end })
    }
}

/// Ordered environment delimiters
#[derive(Debug, Clone, Default)]
pub struct DelimiterTable {
    entries: Vec<Delimiter>,
}

/// Environments known to every registry, in matching order
pub const DEFAULT_ENVIRONMENTS: [&str; 6] =
    ["pspicture", "verbatim", "print", "enumerate", "nicebox", "macros"];

impl DelimiterTable {
    pub fn with_defaults() -> Self {
        let mut table = Self::default();
        for name in DEFAULT_ENVIRONMENTS {
            let kind = EnvironmentKind::from_name(name, false);
            if let Ok(delimiter) = Delimiter::new(kind) {
                table.insert(delimiter);
            }
        }
        table
    }

    /// Add an entry, replacing any entry with the same tag in place
    pub fn insert(&mut self, delimiter: Delimiter) {
        match self
            .entries
            .iter_mut()
            .find(|d| d.kind.tag() == delimiter.kind.tag())
        {
            Some(existing) => *existing = delimiter,
            None => self.entries.push(delimiter),
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &EnvironmentKind> {
        self.entries.iter().map(|d| &d.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One piece of a scanned line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Content, with whether it sits inside a literal region
    Text { text: &'a str, literal: bool },
    Begin { kind: EnvironmentKind, text: &'a str },
    End { kind: EnvironmentKind, text: &'a str },
}

/// The delimiter state machine shared by the segmentation and expansion passes
#[derive(Debug, Clone)]
pub struct Scanner<'t> {
    table: &'t DelimiterTable,
    current: EnvironmentKind,
}

impl<'t> Scanner<'t> {
    pub fn new(table: &'t DelimiterTable) -> Self {
        Self {
            table,
            current: EnvironmentKind::Math,
        }
    }

    pub fn current(&self) -> &EnvironmentKind {
        &self.current
    }

    /// Split a line into text and delimiter tokens, advancing the state.
    ///
    /// Inside a literal region only that region's own end delimiter is
    /// active; everything else is text.
    pub fn scan<'a>(&mut self, line: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos <= line.len() {
            let Some((m, delimiter, is_begin)) = self.next_delimiter(line, pos) else {
                break;
            };
            if m.start() > pos {
                tokens.push(Token::Text {
                    text: &line[pos..m.start()],
                    literal: self.current.is_literal(),
                });
            }
            let text = m.as_str();
            if is_begin {
                self.current = delimiter.kind.clone();
                tokens.push(Token::Begin {
                    kind: delimiter.kind.clone(),
                    text,
                });
            } else {
                self.current = EnvironmentKind::Math;
                tokens.push(Token::End {
                    kind: delimiter.kind.clone(),
                    text,
                });
            }
            // Delimiter patterns never match empty text, so this always advances
            pos = m.end().max(pos + 1);
        }
        if pos < line.len() {
            tokens.push(Token::Text {
                text: &line[pos..],
                literal: self.current.is_literal(),
            });
        }
        tokens
    }

    /// The leftmost active delimiter at or after `pos`; begins win ties.
    fn next_delimiter<'a>(
        &self,
        line: &'a str,
        pos: usize,
    ) -> Option<(Match<'a>, &'t Delimiter, bool)> {
        let table: &'t DelimiterTable = self.table;
        let mut best: Option<(Match<'a>, &'t Delimiter, bool)> = None;
        let literal = self.current.is_literal();
        for delimiter in &table.entries {
            let own = delimiter.kind == self.current;
            let candidates = [
                (&delimiter.begin, true, !literal),
                (&delimiter.end, false, !literal || own),
            ];
            for (pattern, is_begin, active) in candidates {
                if !active {
                    continue;
                }
                let Some(m) = pattern.find_at(line, pos) else {
                    continue;
                };
                let better = match &best {
                    None => true,
                    Some((b, _, b_begin)) => {
                        m.start() < b.start() || (m.start() == b.start() && is_begin && !b_begin)
                    }
                };
                if better {
                    best = Some((m, delimiter, is_begin));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str, literal: bool) -> Token<'_> {
        Token::Text { text, literal }
    }

    #[test]
    fn kinds_round_trip_names() {
        for name in DEFAULT_ENVIRONMENTS {
            assert_eq!(EnvironmentKind::from_name(name, false).tag(), name);
        }
        let custom = EnvironmentKind::from_name("listing", true);
        assert!(custom.is_literal());
        assert_eq!(custom.tag(), "listing");
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "a}b", "a b"] {
            let kind = EnvironmentKind::Custom {
                name: name.to_string(),
                literal: false,
            };
            assert_eq!(
                Delimiter::new(kind).map(|_| ()),
                Err(RegistryError::InvalidName { name: name.to_string() })
            );
        }
    }

    #[test]
    fn figure_header_is_one_token() {
        let table = DelimiterTable::with_defaults();
        let mut scanner = Scanner::new(&table);
        let tokens = scanner.scan(r"\begin{pspicture}(-5,-5)(5,5)");
        assert_eq!(
            tokens,
            vec![Token::Begin {
                kind: EnvironmentKind::Figure,
                text: r"\begin{pspicture}(-5,-5)(5,5)",
            }]
        );
        assert_eq!(scanner.current(), &EnvironmentKind::Figure);
    }

    #[test]
    fn literal_region_ignores_other_delimiters() {
        let table = DelimiterTable::with_defaults();
        let mut scanner = Scanner::new(&table);
        let tokens = scanner.scan(r"\begin{verbatim}\begin{pspicture}\end{print}\end{verbatim} after");
        assert_eq!(
            tokens,
            vec![
                Token::Begin {
                    kind: EnvironmentKind::Verbatim,
                    text: r"\begin{verbatim}",
                },
                text(r"\begin{pspicture}\end{print}", true),
                Token::End {
                    kind: EnvironmentKind::Verbatim,
                    text: r"\end{verbatim}",
                },
                text(" after", false),
            ]
        );
        assert_eq!(scanner.current(), &EnvironmentKind::Math);
    }

    #[test]
    fn state_carries_across_lines() {
        let table = DelimiterTable::with_defaults();
        let mut scanner = Scanner::new(&table);
        scanner.scan(r"\begin{print}");
        assert_eq!(scanner.scan(r"\end{nicebox} -- x"), vec![text(r"\end{nicebox} -- x", true)]);
        assert_eq!(
            scanner.scan(r"\end{print}"),
            vec![Token::End {
                kind: EnvironmentKind::Print,
                text: r"\end{print}",
            }]
        );
    }

    #[test]
    fn any_end_returns_to_math() {
        let table = DelimiterTable::with_defaults();
        let mut scanner = Scanner::new(&table);
        scanner.scan(r"\begin{nicebox}");
        scanner.scan(r"\end{enumerate}");
        assert_eq!(scanner.current(), &EnvironmentKind::Math);
    }
}
