//! Document-level behaviour: segmentation, literal regions, expansion and
//! caller registration
//!
//! Run with logs: RUST_LOG=debug cargo test --features tracing --test documents -- --nocapture

use texpict::{CommandKind, EnvironmentKind, Latex, RegistryError, Replacement, Segment, expand, parse};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const LECTURE: &str = r"\documentclass{article}
\begin{document}
% preamble comment
\section*{Limits} We say \emph{converges} -- or not.

\begin{theorem}
Every bounded monotone sequence converges.
\end{theorem}
\begin{verbatim}
\psline(0,0)(1,1) -- kept \emph{as is}
\end{verbatim}
\begin{pspicture}(-5,-5)(5,5)
\psaxes{->}(0,0)(-4,-4)(4,4)
\psline{->}(0,-3.75)(0,3.75)
\end{pspicture}
\begin{enumerate}
\item first
\end{enumerate}
\end{document}";

fn tags(segments: &[Segment]) -> Vec<&str> {
    segments.iter().map(Segment::tag).collect()
}

#[test]
fn lecture_segments() {
    init_tracing();
    let segments = parse(LECTURE).unwrap();
    assert_eq!(tags(&segments), vec!["math", "verbatim", "pspicture", "enumerate"]);
    assert_eq!(
        segments[0].lines,
        vec![
            r"\section*{Limits} We say \emph{converges} -- or not.",
            r"\begin{theorem}",
            "Every bounded monotone sequence converges.",
            r"\end{theorem}",
        ]
    );
    assert_eq!(
        segments[0].html,
        vec![
            r"\section*{Limits} We say <i>converges</i> &ndash; or not.",
            "<br>",
            "<h4>Theorem</h4>",
            "Every bounded monotone sequence converges.",
            "",
        ]
    );
    assert!(segments[2].figure.is_some());
    assert!(segments.iter().filter(|s| s.tag() != "pspicture").all(|s| s.figure.is_none()));
}

#[test]
fn parsing_is_idempotent() {
    let latex = Latex::default();
    let first = latex.parse(LECTURE).unwrap();
    let second = latex.parse(LECTURE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn content_lines_survive_segmentation() {
    let segments = parse(LECTURE).unwrap();
    let kept: Vec<&str> = segments
        .iter()
        .flat_map(|s| s.lines.iter().map(String::as_str))
        .collect();
    for line in [
        r"\section*{Limits} We say \emph{converges} -- or not.",
        "Every bounded monotone sequence converges.",
        r"\psline(0,0)(1,1) -- kept \emph{as is}",
        r"\psaxes{->}(0,0)(-4,-4)(4,4)",
        r"\psline{->}(0,-3.75)(0,3.75)",
        r"\item first",
    ] {
        assert!(kept.contains(&line), "missing {line:?}");
    }
    assert!(!kept.iter().any(|l| l.starts_with('%')));
}

#[test]
fn content_lines_keep_input_order() {
    let latex = Latex::default();
    let is_delimiter = |line: &str| {
        latex.delimiters().kinds().any(|kind| {
            line.starts_with(&format!("\\begin{{{kind}}}")) || line == format!("\\end{{{kind}}}")
        })
    };
    let expected: Vec<&str> = LECTURE
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !is_delimiter(line))
        .filter(|line| !latex.rules().is_ignored(line))
        .collect();

    let segments = latex.parse(LECTURE).unwrap();
    let kept: Vec<&str> = segments
        .iter()
        .flat_map(|s| s.lines.iter().map(String::as_str))
        .collect();
    assert_eq!(kept, expected);
}

#[test]
fn open_figure_is_flushed_at_end_of_input() {
    let segments = parse("intro\n\\begin{pspicture}(0,0)(4,4)\n\\psline(1,1)").unwrap();
    assert_eq!(tags(&segments), vec!["math", "pspicture"]);
    let figure = segments[1].figure.as_ref().unwrap();
    assert_eq!(figure.records(CommandKind::PsLine).len(), 1);
    assert_eq!(segments[1].lines, vec![r"\psline(1,1)"]);
}

#[test]
fn open_literal_region_is_flushed_at_end_of_input() {
    let segments = parse("\\begin{verbatim}\n\\end{print} -- x\n\\begin{nicebox}").unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].kind, EnvironmentKind::Verbatim);
    assert_eq!(segments[0].lines, vec![r"\end{print} -- x", r"\begin{nicebox}"]);
    assert_eq!(segments[0].html, segments[0].lines);
}

#[test]
fn verbatim_hides_nested_figure() {
    let segments = parse(r"\begin{verbatim}\begin{pspicture}\end{verbatim}").unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].kind, EnvironmentKind::Verbatim);
    assert_eq!(segments[0].lines, vec![r"\begin{pspicture}"]);
    assert!(segments[0].figure.is_none());
}

#[test]
fn literal_text_is_untouched() {
    let text = "\\begin{print}\n% not a comment here\n\\psset{unit=3cm}\n``x'' --- y\n\\end{print}";
    let latex = Latex::default();
    let mut parser = latex.parser();
    let segments = parser.parse(text).unwrap();
    assert_eq!(
        segments[0].lines,
        vec!["% not a comment here", r"\psset{unit=3cm}", "``x'' --- y"]
    );
    assert_eq!(segments[0].html, segments[0].lines);
    assert_eq!(parser.settings().xunit.raw(), 50.0);
}

#[test]
fn crlf_input_matches_lf_input() {
    let lf = parse("a\n\\begin{nicebox}\nb\n\\end{nicebox}").unwrap();
    let crlf = parse("a\r\n\\begin{nicebox}\r\nb\r\n\\end{nicebox}").unwrap();
    assert_eq!(lf, crlf);
}

#[test]
fn expand_keeps_one_line_per_input_line() {
    let text = "say \\emph{hi} -- there\n\n\\begin{verbatim}\n\\emph{raw} --\n\\end{verbatim} ``q''";
    let out = expand(text);
    assert_eq!(
        out,
        vec![
            "say <i>hi</i> &ndash; there",
            "<br>",
            r"\begin{verbatim}",
            r"\emph{raw} --",
            r"\end{verbatim} &ldquo;q&rdquo;",
        ]
    );
}

#[test]
fn expand_agrees_with_parse_on_literal_regions() {
    let text = "\\begin{verbatim}\n-- \\end{print} --\n\\end{verbatim}";
    let segments = parse(text).unwrap();
    let out = expand(text);
    assert_eq!(segments[0].html[0], out[1]);
}

#[test]
fn registered_environments() {
    let mut latex = Latex::default();
    latex.add_environment("remark").unwrap();
    latex.add_literal_environment("code").unwrap();
    let text = "\\begin{remark}\n\\emph{a}\n\\end{remark}\n\\begin{code}\n\\emph{b}\n\\end{code}";
    let segments = latex.parse(text).unwrap();
    assert_eq!(tags(&segments), vec!["remark", "code"]);
    assert_eq!(segments[0].html, vec!["<i>a</i>"]);
    assert_eq!(segments[1].html, vec![r"\emph{b}"]);

    assert_eq!(
        latex.add_environment("bad name"),
        Err(RegistryError::InvalidName {
            name: "bad name".to_string()
        })
    );
}

#[test]
fn registered_rules() {
    let mut latex = Latex::default();
    latex
        .add_text(
            "qed",
            r"\\qedhere",
            Replacement::Literal("&#8718;".to_string()),
        )
        .unwrap();
    latex.add_headers("lemma", "<h4>Lemma</h4>", "").unwrap();
    let segments = latex
        .parse("\\begin{lemma} x\ndone \\qedhere\n\\end{lemma}")
        .unwrap();
    assert_eq!(
        segments[0].html,
        vec!["<h4>Lemma</h4>", "done &#8718;", ""]
    );
    assert!(matches!(
        latex.add_text("broken", "[", Replacement::Literal(String::new())),
        Err(RegistryError::InvalidPattern { .. })
    ));
}
