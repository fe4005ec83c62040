//! Resolved geometry handed to the painting layer
//!
//! All coordinates are in output units with the vertical axis pointing down.

use std::collections::BTreeMap;

use glam::DVec2;

use crate::settings::{FillStyle, LineStyle, Settings};

/// Width used when none is given or the given one is unreadable
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// `[key=value,...]` option block of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    /// Parse an option block. Entries without exactly one `=` are skipped.
    pub fn parse(block: Option<&str>) -> Self {
        let mut map = BTreeMap::new();
        let Some(block) = block else {
            return Options(map);
        };
        let inner = block.trim().trim_start_matches('[').trim_end_matches(']');
        for entry in inner.split(',') {
            let mut kv = entry.split('=');
            if let (Some(k), Some(v), None) = (kv.next(), kv.next(), kv.next()) {
                map.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
        Options(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Arrow and dot decorations of the two ends of a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ends {
    pub arrows: [bool; 2],
    pub dots: [bool; 2],
}

impl Ends {
    /// Read a `{a-b}` annotation: `*` puts a dot at that end, `<` an arrow at
    /// the start and `>` an arrow at the end. A dot wins over an arrow.
    pub fn parse(annotation: Option<&str>) -> Self {
        let mut ends = Ends::default();
        let Some(annotation) = annotation else {
            return ends;
        };
        let inner = annotation.trim().trim_start_matches('{').trim_end_matches('}');
        let Some((start, end)) = inner.split_once('-') else {
            return ends;
        };
        // A second dash makes the annotation unreadable
        if end.contains('-') {
            return ends;
        }
        if start.contains('*') {
            ends.dots[0] = true;
        } else if start.contains('<') {
            ends.arrows[0] = true;
        }
        if end.contains('*') {
            ends.dots[1] = true;
        } else if end.contains('>') {
            ends.arrows[1] = true;
        }
        ends
    }
}

/// Stroke and fill of one record
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub linecolor: String,
    pub linestyle: LineStyle,
    pub linewidth: f64,
    pub fillcolor: String,
    pub fillstyle: FillStyle,
}

impl Style {
    /// Per-kind defaults; only the fill differs between kinds.
    pub fn new(fillstyle: FillStyle, fillcolor: &str) -> Self {
        Self {
            linecolor: "black".to_string(),
            linestyle: LineStyle::Solid,
            linewidth: DEFAULT_LINE_WIDTH,
            fillcolor: fillcolor.to_string(),
            fillstyle,
        }
    }

    /// Layer figure settings, then the record's own options, over the defaults.
    pub fn resolve(mut self, settings: &Settings, options: &Options) -> Self {
        if let Some(color) = &settings.linecolor {
            self.linecolor = color.clone();
        }
        if let Some(style) = settings.linestyle {
            self.linestyle = style;
        }
        if let Some(width) = settings.linewidth {
            self.linewidth = width;
        }
        if let Some(color) = &settings.fillcolor {
            self.fillcolor = color.clone();
        }
        if let Some(style) = settings.fillstyle {
            self.fillstyle = style;
        }

        if let Some(color) = options.get("linecolor") {
            self.linecolor = color.to_string();
        }
        if let Some(style) = options.get("linestyle").and_then(|s| s.parse().ok()) {
            self.linestyle = style;
        }
        if let Some(width) = options.get("linewidth") {
            self.linewidth = match width.parse::<f64>() {
                Ok(w) if w.is_finite() => w,
                _ => DEFAULT_LINE_WIDTH,
            };
        }
        if let Some(color) = options.get("fillcolor") {
            self.fillcolor = color.to_string();
        }
        if let Some(style) = options.get("fillstyle").and_then(|s| s.parse().ok()) {
            self.fillstyle = style;
        }
        self
    }
}

/// Which axes carry tick marks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ticks {
    #[default]
    All,
    X,
    Y,
    None,
}

impl Ticks {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("x") => Ticks::X,
            Some("y") => Ticks::Y,
            Some("none") => Ticks::None,
            _ => Ticks::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub p1: DVec2,
    pub p2: DVec2,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub center: DVec2,
    pub radius: f64,
    /// Angles in radians, counter-clockwise in document orientation
    pub angle_a: f64,
    pub angle_b: f64,
    pub start: DVec2,
    pub end: DVec2,
    pub ends: Ends,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<DVec2>,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub origin: DVec2,
    pub bottom_left: DVec2,
    pub top_right: DVec2,
    /// Tick spacing in output units
    pub dx: f64,
    pub dy: f64,
    pub ticks: Ticks,
    pub ends: Ends,
    pub style: Style,
}

/// A straight segment, also produced by `\userline`
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub from: DVec2,
    pub to: DVec2,
    pub ends: Ends,
    pub style: Style,
}

/// A sampled function plot
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub points: Vec<DVec2>,
    /// Output y of the horizontal axis when the curve is filled down to it
    pub baseline: Option<f64>,
    pub style: Style,
}

/// A variable computed from the pointer position
#[derive(Debug, Clone, PartialEq)]
pub struct UserBinding {
    pub name: String,
    pub anchor: DVec2,
    pub expression: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub at: DVec2,
    pub text: String,
    pub refpoint: Option<String>,
    /// Rotation in degrees
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    pub variable: String,
    pub label: String,
    pub value: f64,
    /// Input values are divided by this to get the variable value
    pub scalar: f64,
}

/// The resolved payload of one record
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Frame(Frame),
    Circle(Circle),
    Arc(Arc),
    Polygon(Polygon),
    Axes(Axes),
    Line(Line),
    Curve(Curve),
    Variable(UserBinding),
    Label(Label),
    Slider(Slider),
    /// Settings in effect after a `\psset`
    Units(Settings),
}
