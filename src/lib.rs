//! texpict - a LaTeX subset with interactive PSTricks figures
//!
//! Text is split into typed segments by environment. Running text goes
//! through a table of substitution rules; literal environments pass through
//! untouched; `pspicture` environments are interpreted into geometry records
//! that can be recomputed when sliders, user variables or the pointer move.
//!
//! ```
//! let segments = texpict::parse("\\begin{pspicture}(0,0)(2,2)\n\\psline(1,1)\n\\end{pspicture}")?;
//! assert_eq!(segments[0].tag(), "pspicture");
//! # Ok::<(), miette::Report>(())
//! ```

pub mod document;
pub mod errors;
pub(crate) mod log;
pub mod pstricks;
pub mod sandbox;
pub mod settings;
pub mod types;

pub use document::{EnvironmentKind, Latex, Parser, Replacement, Segment};
pub use errors::{EvalError, ParseError, RegistryError};
pub use pstricks::{CommandKind, Figure, FigureContext, Geometry, GeometryRecord, Mode, Redraw};
pub use settings::Settings;

/// Parse `text` with the default environments and rules.
///
/// Returns the segments on success, or an error with diagnostics.
pub fn parse(text: &str) -> Result<Vec<Segment>, miette::Report> {
    Ok(Latex::default().parse(text)?)
}

/// Substitute `text` line by line with the default rules.
pub fn expand(text: &str) -> Vec<String> {
    Latex::default().expand(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_document() {
        let text = "Intro \\emph{x}\n\\begin{verbatim}\n\\emph{y}\n\\end{verbatim}\nOutro";
        let segments = parse(text).unwrap();
        let tags: Vec<_> = segments.iter().map(Segment::tag).collect();
        assert_eq!(tags, vec!["math", "verbatim", "math"]);
        assert_eq!(segments[0].html, vec!["Intro <i>x</i>"]);
        assert_eq!(segments[1].html, vec![r"\emph{y}"]);
    }

    #[test]
    fn malformed_figure_surfaces_as_report() {
        let err = parse("\\begin{pspicture}\n\\end{pspicture}").unwrap_err();
        assert!(err.to_string().contains("malformed figure header"));
    }
}
