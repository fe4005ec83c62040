//! PSTricks command interpreter
//!
//! Every content line of a figure is matched against the fixed command
//! vocabulary. Each match is parsed into a [`Command`] and built into a
//! [`GeometryRecord`] against the figure's [`FigureContext`].

pub mod commands;
pub mod context;
pub mod geometry;
pub mod interact;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;

pub use commands::{Build, Command};
pub use context::{AxesFrame, FigureContext};
pub use geometry::Geometry;
pub use interact::{Figure, Mode, Redraw};

use crate::settings::Settings;

// Shared pattern fragments
const OPTIONS: &str = r"(\[[^\]]*\])?";
const TYPE: &str = r"(\{[^}]*\})?";
const SQUIGGLE: &str = r"\{([^}]*)\}";
const SQUIGGLE_OPT: &str = r"(\{[^}]*\})?";
const COORDS_PAT: &str = r"\(\s*([^)]*),([^)]*)\s*\)";
const COORDS_OPT: &str = r"(\(\s*([^)]*),([^)]*)\s*\))?";

/// A single coordinate pair
pub(crate) static COORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COORDS_PAT).expect("valid coordinate pattern"));

/// The command vocabulary, in matching order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    PsFrame,
    PsCircle,
    PsArc,
    PsPolygon,
    PsAxes,
    PsLine,
    UserLine,
    PsPlot,
    UserVariable,
    RPut,
    Slider,
    PsSet,
}

impl CommandKind {
    pub const ALL: [CommandKind; 12] = [
        CommandKind::PsFrame,
        CommandKind::PsCircle,
        CommandKind::PsArc,
        CommandKind::PsPolygon,
        CommandKind::PsAxes,
        CommandKind::PsLine,
        CommandKind::UserLine,
        CommandKind::PsPlot,
        CommandKind::UserVariable,
        CommandKind::RPut,
        CommandKind::Slider,
        CommandKind::PsSet,
    ];

    /// The macro name without the backslash
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::PsFrame => "psframe",
            CommandKind::PsCircle => "pscircle",
            CommandKind::PsArc => "psarc",
            CommandKind::PsPolygon => "pspolygon",
            CommandKind::PsAxes => "psaxes",
            CommandKind::PsLine => "psline",
            CommandKind::UserLine => "userline",
            CommandKind::PsPlot => "psplot",
            CommandKind::UserVariable => "uservariable",
            CommandKind::RPut => "rput",
            CommandKind::Slider => "slider",
            CommandKind::PsSet => "psset",
        }
    }

    /// Whether records of this kind read variables or the pointer
    pub fn is_dependent(self) -> bool {
        matches!(
            self,
            CommandKind::UserVariable | CommandKind::PsPlot | CommandKind::UserLine
        )
    }

    pub fn pattern(self) -> &'static Regex {
        static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
            CommandKind::ALL
                .iter()
                .map(|kind| {
                    Regex::new(&kind.pattern_source()).expect("valid command pattern")
                })
                .collect()
        });
        &PATTERNS[self as usize]
    }

    fn pattern_source(self) -> String {
        let args: &[&str] = match self {
            CommandKind::PsFrame => &[OPTIONS, COORDS_PAT, COORDS_PAT],
            CommandKind::PsCircle => &[OPTIONS, COORDS_PAT, SQUIGGLE],
            CommandKind::PsArc => &[OPTIONS, TYPE, COORDS_OPT, SQUIGGLE, SQUIGGLE, SQUIGGLE],
            CommandKind::PsPolygon => &[OPTIONS, "(.*)"],
            CommandKind::PsAxes => &[OPTIONS, TYPE, COORDS_PAT, COORDS_OPT, COORDS_OPT],
            CommandKind::PsLine => &[OPTIONS, TYPE, COORDS_PAT, COORDS_OPT],
            CommandKind::UserLine => &[
                OPTIONS,
                TYPE,
                COORDS_PAT,
                COORDS_PAT,
                SQUIGGLE_OPT,
                SQUIGGLE_OPT,
                SQUIGGLE_OPT,
                SQUIGGLE_OPT,
            ],
            CommandKind::PsPlot => &[OPTIONS, SQUIGGLE, SQUIGGLE, SQUIGGLE],
            CommandKind::UserVariable => &[OPTIONS, SQUIGGLE, COORDS_PAT, SQUIGGLE],
            // The label runs to the last closing brace so nested groups survive
            CommandKind::RPut => &[OPTIONS, TYPE, COORDS_PAT, r"\{(.*)\}"],
            CommandKind::Slider => &[OPTIONS, SQUIGGLE, SQUIGGLE, SQUIGGLE, SQUIGGLE, SQUIGGLE],
            CommandKind::PsSet => &[SQUIGGLE],
        };
        format!(r"\\{}", self.name()) + &args.concat()
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One command occurrence with everything needed to rebuild it
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub kind: CommandKind,
    /// The matched text
    pub source: String,
    pub command: Command,
    /// Settings in effect when the record was first built
    pub settings: Settings,
    pub data: Geometry,
}

impl GeometryRecord {
    /// Rebuild under the record's own settings snapshot
    pub fn rebuild(&mut self, ctx: &mut FigureContext) {
        let current = std::mem::replace(&mut ctx.settings, self.settings.clone());
        self.data = self.command.build(ctx);
        ctx.settings = current;
    }
}

/// Records of one figure grouped by kind, each group in line order
pub type Plot = BTreeMap<CommandKind, Vec<GeometryRecord>>;

/// Interpret the content lines of one figure.
pub fn interpret<S: AsRef<str>>(lines: &[S], ctx: &mut FigureContext) -> Plot {
    let mut plot = Plot::new();
    for line in lines {
        let line = line.as_ref();
        for kind in CommandKind::ALL {
            let Some(caps) = kind.pattern().captures(line) else {
                continue;
            };
            let source = caps.get(0).map_or("", |m| m.as_str()).to_string();
            let command = Command::parse(kind, &caps);
            let settings = ctx.settings.clone();
            let data = command.build(ctx);
            crate::log::debug!("built {} record from {:?}", kind, source);
            plot.entry(kind).or_default().push(GeometryRecord {
                kind,
                source,
                command,
                settings,
                data,
            });
        }
    }
    plot
}

#[cfg(test)]
mod tests {
    use glam::dvec2;

    use super::*;

    fn ctx() -> FigureContext {
        FigureContext::new(dvec2(-5.0, -5.0), dvec2(5.0, 5.0), Settings::default())
    }

    #[test]
    fn kind_order_matches_vocabulary() {
        for (i, kind) in CommandKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
        assert!(CommandKind::PsFrame < CommandKind::PsSet);
    }

    #[test]
    fn names_do_not_overlap() {
        assert!(CommandKind::PsLine.pattern().captures(r"\userline(0,0)(1,1)").is_none());
        assert!(CommandKind::PsLine.pattern().captures(r"\pslinewidth(1,1)").is_none());
        assert!(CommandKind::PsPlot.pattern().captures(r"\psline(1,1)").is_none());
    }

    #[test]
    fn interpret_groups_by_kind() {
        let mut ctx = ctx();
        let lines = [
            r"\psline{->}(0,-3.75)(0,3.75)",
            r"\pscircle(0,0){1}",
            "plain text",
            r"\psline(1,1)",
        ];
        let plot = interpret(&lines, &mut ctx);
        assert_eq!(plot.len(), 2);
        assert_eq!(plot[&CommandKind::PsLine].len(), 2);
        assert_eq!(plot[&CommandKind::PsCircle].len(), 1);
        assert_eq!(plot[&CommandKind::PsLine][0].source, r"\psline{->}(0,-3.75)(0,3.75)");
    }

    #[test]
    fn psset_applies_to_later_records() {
        let mut ctx = ctx();
        let lines = [r"\psline(1,0)", r"\psset{xunit=2cm}", r"\psline(1,0)"];
        let plot = interpret(&lines, &mut ctx);
        let ends: Vec<_> = plot[&CommandKind::PsLine]
            .iter()
            .map(|r| match &r.data {
                Geometry::Line(line) => line.to.x,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ends, vec![300.0, 600.0]);
        assert_eq!(plot[&CommandKind::PsLine][1].settings.xunit.raw(), 100.0);
    }

    #[test]
    fn bad_record_does_not_affect_siblings() {
        let mut ctx = ctx();
        let lines = [r"\psline(nope,1/0)", r"\psline(1,1)"];
        let plot = interpret(&lines, &mut ctx);
        let records = &plot[&CommandKind::PsLine];
        assert_eq!(records.len(), 2);
        let Geometry::Line(bad) = &records[0].data else {
            panic!("expected a line");
        };
        assert_eq!(bad.to, dvec2(250.0, 250.0));
        let Geometry::Line(good) = &records[1].data else {
            panic!("expected a line");
        };
        assert_eq!(good.to, dvec2(300.0, 200.0));
    }
}
