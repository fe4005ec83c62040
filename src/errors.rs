//! Error types with rich diagnostics using miette
//!
//! Only structural errors reach the caller of `parse`. Evaluation errors are
//! recovered where they happen and only show up in the logs.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<input>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors that abort a whole parse
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("malformed figure header on line {line}")]
    #[diagnostic(
        code(texpict::parse::malformed_figure),
        help("a figure needs its canvas corners: \\begin{{pspicture}}(x0,y0)(x1,y1)")
    )]
    MalformedFigure {
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("cannot read the canvas here")]
        span: SourceSpan,
    },
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while registering environments and rules
#[derive(Error, Diagnostic, Debug, PartialEq)]
pub enum RegistryError {
    #[error("invalid environment name: {name:?}")]
    #[diagnostic(
        code(texpict::registry::invalid_name),
        help("names must be non-empty and must not contain braces")
    )]
    InvalidName { name: String },

    #[error("invalid pattern for rule {name}: {message}")]
    #[diagnostic(code(texpict::registry::invalid_pattern))]
    InvalidPattern { name: String, message: String },
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Errors that occur during expression evaluation
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error in {expr:?}: {message}")]
    #[diagnostic(code(texpict::eval::syntax))]
    Syntax { expr: String, message: String },

    #[error("unknown function: {name}")]
    #[diagnostic(code(texpict::eval::unknown_function))]
    UnknownFunction { name: String },

    #[error("{name} takes {expected} argument(s), got {got}")]
    #[diagnostic(code(texpict::eval::arity))]
    Arity {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("undefined variable: {name}")]
    #[diagnostic(code(texpict::eval::undefined_variable))]
    UndefinedVariable { name: String },

    #[error("result is not a finite number")]
    #[diagnostic(code(texpict::eval::non_finite))]
    NonFinite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_figure_reports_line() {
        let ctx = SourceContext::new("<input>", "\\begin{pspicture}\n");
        let err = ParseError::MalformedFigure {
            line: 1,
            src: ctx.named_source(),
            span: (0, 17).into(),
        };
        assert_eq!(err.to_string(), "malformed figure header on line 1");
    }

    #[test]
    fn eval_error_messages() {
        let err = EvalError::Arity {
            name: "atan2",
            expected: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "atan2 takes 2 argument(s), got 1");
        assert_eq!(
            EvalError::UndefinedVariable { name: "a".into() }.to_string(),
            "undefined variable: a"
        );
    }
}
