//! Document classification: splitting text into typed environment segments
//!
//! Two passes walk the input with the same [`Scanner`]. [`Parser::parse`]
//! groups content into [`Segment`]s, and [`Parser::expand`] produces the
//! substituted text line by line. Since both use one state machine, they
//! always agree on which text sits inside a literal region.

pub mod delimiters;
pub mod text;

use std::sync::LazyLock;

use glam::{DVec2, dvec2};
use regex_lite::Regex;

pub use delimiters::{Delimiter, DelimiterTable, EnvironmentKind, Scanner, Token};
pub use text::{Replacement, TextRules};

use crate::errors::{ParseError, RegistryError, SourceContext};
use crate::pstricks::{Figure, FigureContext, interpret};
use crate::settings::{Settings, psset_body};

/// One contiguous block of the input attributed to a single environment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: EnvironmentKind,
    /// Raw content lines
    pub lines: Vec<String>,
    /// Substituted content, with blank input lines as `<br>`
    pub html: Vec<String>,
    /// Settings in effect when the segment closed
    pub settings: Settings,
    /// The interpreted drawing, for figure segments
    pub figure: Option<Figure>,
}

impl Segment {
    /// The string tag of the segment kind
    pub fn tag(&self) -> &str {
        self.kind.tag()
    }
}

/// Registry of environments and substitution rules
#[derive(Debug, Clone)]
pub struct Latex {
    delimiters: DelimiterTable,
    rules: TextRules,
}

impl Default for Latex {
    fn default() -> Self {
        Self {
            delimiters: DelimiterTable::with_defaults(),
            rules: TextRules::with_defaults(),
        }
    }
}

impl Latex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an environment whose content is classified normally
    pub fn add_environment(&mut self, name: &str) -> Result<(), RegistryError> {
        self.register(name, false)
    }

    /// Register an environment whose content is passed through untouched
    pub fn add_literal_environment(&mut self, name: &str) -> Result<(), RegistryError> {
        self.register(name, true)
    }

    fn register(&mut self, name: &str, literal: bool) -> Result<(), RegistryError> {
        let delimiter = Delimiter::new(EnvironmentKind::from_name(name, literal))?;
        self.delimiters.insert(delimiter);
        Ok(())
    }

    pub fn add_text(
        &mut self,
        name: &str,
        pattern: &str,
        replacement: Replacement,
    ) -> Result<(), RegistryError> {
        self.rules.add_text(name, pattern, replacement)
    }

    /// Replace `\begin{name}` with `begin` and `\end{name}` with `end`
    pub fn add_headers(&mut self, name: &str, begin: &str, end: &str) -> Result<(), RegistryError> {
        self.rules.add_headers(name, begin, end)
    }

    pub fn delimiters(&self) -> &DelimiterTable {
        &self.delimiters
    }

    pub fn rules(&self) -> &TextRules {
        &self.rules
    }

    pub fn parser(&self) -> Parser<'_> {
        Parser::new(&self.delimiters, &self.rules)
    }

    pub fn parse(&self, text: &str) -> Result<Vec<Segment>, ParseError> {
        self.parser().parse(text)
    }

    pub fn expand(&self, text: &str) -> Vec<String> {
        self.parser().expand(text)
    }
}

/// A segment being collected
struct Pending {
    kind: EnvironmentKind,
    lines: Vec<String>,
    html: Vec<String>,
    context: Option<FigureContext>,
}

impl Pending {
    fn new(kind: EnvironmentKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
            html: Vec::new(),
            context: None,
        }
    }
}

/// Classifies one document against a borrowed registry
pub struct Parser<'l> {
    delimiters: &'l DelimiterTable,
    rules: &'l TextRules,
    settings: Settings,
    name: String,
}

impl<'l> Parser<'l> {
    pub fn new(delimiters: &'l DelimiterTable, rules: &'l TextRules) -> Self {
        Self {
            delimiters,
            rules,
            settings: Settings::default(),
            name: "<input>".to_string(),
        }
    }

    /// Name used for the source in diagnostics
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Settings accumulated from document-level `\psset` declarations
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Split `text` into segments. Figures are interpreted as they close.
    pub fn parse(&mut self, text: &str) -> Result<Vec<Segment>, ParseError> {
        self.settings = Settings::default();
        let mut segments = Vec::new();
        let mut scanner = Scanner::new(self.delimiters);
        let mut pending = Pending::new(EnvironmentKind::Math);
        let mut offset = 0;

        for (index, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let line_offset = offset;
            offset += raw_line.len() + 1;

            if line.trim().is_empty() {
                pending.html.push("<br>".to_string());
                continue;
            }

            for token in scanner.scan(line) {
                match token {
                    Token::Text { text, literal } => self.push_text(&mut pending, text, literal),
                    Token::Begin { kind, text: header } => {
                        self.flush(&mut segments, pending);
                        pending = Pending::new(kind);
                        if pending.kind.is_figure() {
                            let (lower_left, upper_right) = canvas(header).ok_or_else(|| {
                                let source = SourceContext::new(&self.name, text);
                                ParseError::MalformedFigure {
                                    line: index + 1,
                                    src: source.named_source(),
                                    span: (line_offset, line.len()).into(),
                                }
                            })?;
                            pending.context = Some(FigureContext::new(
                                lower_left,
                                upper_right,
                                self.settings.clone(),
                            ));
                        }
                    }
                    Token::End { .. } => {
                        self.flush(&mut segments, pending);
                        pending = Pending::new(EnvironmentKind::Math);
                    }
                }
            }
        }

        self.flush(&mut segments, pending);
        Ok(segments)
    }

    /// Substitute every line of `text`, keeping literal regions and
    /// delimiters as they are. Returns one output line per input line.
    pub fn expand(&self, text: &str) -> Vec<String> {
        let mut scanner = Scanner::new(self.delimiters);
        text.split('\n')
            .map(|raw_line| {
                let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
                if line.trim().is_empty() {
                    return "<br>".to_string();
                }
                scanner
                    .scan(line)
                    .into_iter()
                    .map(|token| match token {
                        Token::Text { text, literal: true } => text.to_string(),
                        Token::Text { text, literal: false } => self.rules.apply(text),
                        Token::Begin { text, .. } | Token::End { text, .. } => text.to_string(),
                    })
                    .collect()
            })
            .collect()
    }

    fn push_text(&mut self, pending: &mut Pending, text: &str, literal: bool) {
        if text.trim().is_empty() {
            return;
        }
        if literal {
            pending.lines.push(text.to_string());
            pending.html.push(text.to_string());
            return;
        }
        if self.rules.is_ignored(text) {
            return;
        }
        if let Some(body) = psset_body(text) {
            self.settings.declare(body);
            // Inside a figure the interpreter applies it in order
            if !pending.kind.is_figure() {
                return;
            }
        }
        pending.lines.push(text.to_string());
        pending.html.push(self.rules.apply(text));
    }

    fn flush(&self, segments: &mut Vec<Segment>, pending: Pending) {
        if pending.lines.is_empty() {
            return;
        }
        let figure = pending.context.map(|mut context| {
            let plot = interpret(&pending.lines, &mut context);
            Figure::new(context, plot)
        });
        crate::log::debug!(
            "closing {} segment with {} lines",
            pending.kind,
            pending.lines.len()
        );
        segments.push(Segment {
            kind: pending.kind,
            lines: pending.lines,
            html: pending.html,
            settings: self.settings.clone(),
            figure,
        });
    }
}

static CANVAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*([^,)]*),([^)]*)\)(?:\s*\(\s*([^,)]*),([^)]*)\))?")
        .expect("valid canvas pattern")
});

/// Canvas corners from a figure header: `(x0,y0)(x1,y1)`, or `(x1,y1)` with
/// the lower-left corner at the origin
fn canvas(header: &str) -> Option<(DVec2, DVec2)> {
    let caps = CANVAS.captures(header)?;
    let number = |i: usize| -> Option<f64> {
        caps.get(i)?
            .as_str()
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    };
    let first = dvec2(number(1)?, number(2)?);
    match (caps.get(3), caps.get(4)) {
        (Some(_), Some(_)) => Some((first, dvec2(number(3)?, number(4)?))),
        _ => Some((DVec2::ZERO, first)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_forms() {
        assert_eq!(
            canvas(r"\begin{pspicture}(-5,-5)(5,5)"),
            Some((dvec2(-5.0, -5.0), dvec2(5.0, 5.0)))
        );
        assert_eq!(
            canvas(r"\begin{pspicture}(4, 3)"),
            Some((DVec2::ZERO, dvec2(4.0, 3.0)))
        );
        assert_eq!(canvas(r"\begin{pspicture}"), None);
        assert_eq!(canvas(r"\begin{pspicture}(a,b)"), None);
    }

    #[test]
    fn blank_lines_only_reach_html() {
        let latex = Latex::new();
        let segments = latex.parse("a\n\nb").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].lines, vec!["a", "b"]);
        assert_eq!(segments[0].html, vec!["a", "<br>", "b"]);
    }

    #[test]
    fn psset_outside_figures_updates_settings() {
        let latex = Latex::new();
        let mut parser = latex.parser();
        let segments = parser.parse("\\psset{unit=2cm}\ntext").unwrap();
        assert_eq!(segments[0].lines, vec!["text"]);
        assert_eq!(segments[0].settings.xunit.raw(), 100.0);
        assert_eq!(parser.settings().yunit.raw(), 100.0);
    }

    #[test]
    fn figure_inherits_document_units() {
        let latex = Latex::new();
        let text = "\\psset{unit=2cm}\n\\begin{pspicture}(0,0)(2,2)\n\\psline(1,1)\n\\end{pspicture}";
        let segments = latex.parse(text).unwrap();
        let figure = segments[0].figure.as_ref().unwrap();
        assert_eq!(figure.context.size, dvec2(200.0, 200.0));
    }

    #[test]
    fn empty_segments_are_dropped() {
        let latex = Latex::new();
        let segments = latex.parse("\\begin{nicebox}\n\\end{nicebox}\n% comment\n").unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn malformed_figure_is_fatal() {
        let latex = Latex::new();
        let err = latex.parse("intro\n\\begin{pspicture}\n\\end{pspicture}").unwrap_err();
        let ParseError::MalformedFigure { line, span, .. } = err;
        assert_eq!(line, 2);
        assert_eq!(span.offset(), 6);
    }
}
