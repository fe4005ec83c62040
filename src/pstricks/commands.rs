//! Drawing commands and their builders
//!
//! Each command keeps the argument groups it was parsed from, so it can be
//! rebuilt against a changed [`FigureContext`] without touching the text.

use enum_dispatch::enum_dispatch;
use glam::{DVec2, dvec2};
use regex_lite::Captures;

use super::context::{AxesFrame, FigureContext};
use super::geometry::*;
use super::{COORDS, CommandKind};
use crate::sandbox;
use crate::settings::FillStyle;
use crate::types::finite;

/// Sampling step of `\psplot`, in document units
pub const PLOT_STEP: f64 = 0.005;

/// Upper bound on samples per plot
const MAX_SAMPLES: usize = 200_000;

/// Produce the geometry of one command under the given context
#[enum_dispatch]
pub trait Build {
    fn build(&self, ctx: &mut FigureContext) -> Geometry;
}

/// A recognised drawing command with its argument groups
#[enum_dispatch(Build)]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PsFrame(PsFrame),
    PsCircle(PsCircle),
    PsArc(PsArc),
    PsPolygon(PsPolygon),
    PsAxes(PsAxes),
    PsLine(PsLine),
    UserLine(UserLine),
    PsPlot(PsPlot),
    UserVariable(UserVariable),
    RPut(RPut),
    SliderDecl(SliderDecl),
    PsSet(PsSet),
}

fn group(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i).map(|m| m.as_str().to_string())
}

fn text(caps: &Captures<'_>, i: usize) -> String {
    group(caps, i).unwrap_or_default()
}

/// Contents of an optional `{...}` group without the braces
fn unbraced(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i).map(|m| {
        let s = m.as_str();
        s.strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(s)
            .to_string()
    })
}

/// An unevaluated coordinate pair
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub x: String,
    pub y: String,
}

impl Pair {
    fn capture(caps: &Captures<'_>, x: usize, y: usize) -> Option<Self> {
        Some(Pair {
            x: caps.get(x)?.as_str().trim().to_string(),
            y: caps.get(y)?.as_str().trim().to_string(),
        })
    }

    fn origin() -> Self {
        Pair {
            x: "0".to_string(),
            y: "0".to_string(),
        }
    }

    /// Evaluate in document units
    fn eval(&self, ctx: &FigureContext) -> DVec2 {
        dvec2(ctx.eval(&self.x), ctx.eval(&self.y))
    }

    /// Evaluate and transform to output units
    fn resolve(&self, ctx: &FigureContext) -> DVec2 {
        ctx.coords(&self.x, &self.y)
    }
}

impl Command {
    /// Build the command for `kind` from a match of its pattern
    pub fn parse(kind: CommandKind, caps: &Captures<'_>) -> Command {
        match kind {
            CommandKind::PsFrame => PsFrame {
                options: group(caps, 1),
                p1: Pair::capture(caps, 2, 3).unwrap_or_else(Pair::origin),
                p2: Pair::capture(caps, 4, 5).unwrap_or_else(Pair::origin),
            }
            .into(),
            CommandKind::PsCircle => PsCircle {
                options: group(caps, 1),
                center: Pair::capture(caps, 2, 3).unwrap_or_else(Pair::origin),
                radius: text(caps, 4),
            }
            .into(),
            CommandKind::PsArc => PsArc {
                options: group(caps, 1),
                arrows: group(caps, 2),
                center: Pair::capture(caps, 4, 5),
                radius: text(caps, 6),
                angle_a: text(caps, 7),
                angle_b: text(caps, 8),
            }
            .into(),
            CommandKind::PsPolygon => {
                let rest = text(caps, 2);
                let points = COORDS
                    .captures_iter(&rest)
                    .filter_map(|c| Pair::capture(&c, 1, 2))
                    .collect();
                PsPolygon {
                    options: group(caps, 1),
                    points,
                }
                .into()
            }
            CommandKind::PsAxes => PsAxes {
                options: group(caps, 1),
                arrows: group(caps, 2),
                pairs: [
                    Pair::capture(caps, 3, 4),
                    Pair::capture(caps, 6, 7),
                    Pair::capture(caps, 9, 10),
                ]
                .into_iter()
                .flatten()
                .collect(),
            }
            .into(),
            CommandKind::PsLine => PsLine {
                options: group(caps, 1),
                arrows: group(caps, 2),
                first: Pair::capture(caps, 3, 4).unwrap_or_else(Pair::origin),
                second: Pair::capture(caps, 6, 7),
            }
            .into(),
            CommandKind::UserLine => UserLine {
                options: group(caps, 1),
                arrows: group(caps, 2),
                p1: Pair::capture(caps, 3, 4).unwrap_or_else(Pair::origin),
                p2: Pair::capture(caps, 5, 6).unwrap_or_else(Pair::origin),
                x_exp: unbraced(caps, 7),
                y_exp: unbraced(caps, 8),
                x_exp2: unbraced(caps, 9),
                y_exp2: unbraced(caps, 10),
            }
            .into(),
            CommandKind::PsPlot => PsPlot {
                options: group(caps, 1),
                start: text(caps, 2),
                end: text(caps, 3),
                function: text(caps, 4),
            }
            .into(),
            CommandKind::UserVariable => UserVariable {
                options: group(caps, 1),
                name: text(caps, 2).trim().to_string(),
                anchor: Pair::capture(caps, 3, 4).unwrap_or_else(Pair::origin),
                expression: text(caps, 5),
            }
            .into(),
            CommandKind::RPut => RPut {
                refpoint: unbraced_options(caps, 1),
                rotation: unbraced(caps, 2),
                at: Pair::capture(caps, 3, 4).unwrap_or_else(Pair::origin),
                text: text(caps, 5),
            }
            .into(),
            CommandKind::Slider => SliderDecl {
                options: group(caps, 1),
                min: text(caps, 2),
                max: text(caps, 3),
                variable: text(caps, 4).trim().to_string(),
                label: text(caps, 5),
                value: text(caps, 6),
            }
            .into(),
            CommandKind::PsSet => PsSet {
                body: text(caps, 1),
            }
            .into(),
        }
    }
}

fn unbraced_options(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i).map(|m| {
        m.as_str()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string()
    })
}

/// Scale a document length to output units, 0 when the result is not finite
fn length(value: f64, unit: f64) -> f64 {
    finite(value * unit).unwrap_or_else(|err| {
        crate::log::warn!("length {} x {}: {}", value, unit, err);
        0.0
    })
}

fn style(options: &Option<String>, fill: FillStyle, fillcolor: &str, ctx: &FigureContext) -> Style {
    Style::new(fill, fillcolor).resolve(&ctx.settings, &Options::parse(options.as_deref()))
}

/// `\psframe[opts](x1,y1)(x2,y2)`
#[derive(Debug, Clone, PartialEq)]
pub struct PsFrame {
    pub options: Option<String>,
    pub p1: Pair,
    pub p2: Pair,
}

impl Build for PsFrame {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        Geometry::Frame(Frame {
            p1: self.p1.resolve(ctx),
            p2: self.p2.resolve(ctx),
            style: style(&self.options, FillStyle::None, "none", ctx),
        })
    }
}

/// `\pscircle[opts](x,y){r}`
#[derive(Debug, Clone, PartialEq)]
pub struct PsCircle {
    pub options: Option<String>,
    pub center: Pair,
    pub radius: String,
}

impl Build for PsCircle {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        Geometry::Circle(Circle {
            center: self.center.resolve(ctx),
            radius: length(ctx.eval(&self.radius), ctx.settings.xunit.raw()),
            style: style(&self.options, FillStyle::None, "none", ctx),
        })
    }
}

/// `\psarc[opts]{arrows}(x,y){r}{angleA}{angleB}`
#[derive(Debug, Clone, PartialEq)]
pub struct PsArc {
    pub options: Option<String>,
    pub arrows: Option<String>,
    pub center: Option<Pair>,
    pub radius: String,
    pub angle_a: String,
    pub angle_b: String,
}

impl Build for PsArc {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let center = self
            .center
            .as_ref()
            .map(|c| c.eval(ctx))
            .unwrap_or(DVec2::ZERO);
        let r = ctx.eval(&self.radius);
        let angle_a = ctx.eval(&self.angle_a).to_radians();
        let angle_b = ctx.eval(&self.angle_b).to_radians();
        let around = |angle: f64| ctx.point(center + r * dvec2(angle.cos(), angle.sin()));

        Geometry::Arc(Arc {
            center: ctx.point(center),
            radius: length(r, ctx.settings.xunit.raw()),
            angle_a,
            angle_b,
            start: around(angle_a),
            end: around(angle_b),
            ends: Ends::parse(self.arrows.as_deref()),
            style: style(&self.options, FillStyle::Solid, "black", ctx),
        })
    }
}

/// `\pspolygon[opts](x1,y1)(x2,y2)...`
#[derive(Debug, Clone, PartialEq)]
pub struct PsPolygon {
    pub options: Option<String>,
    pub points: Vec<Pair>,
}

impl Build for PsPolygon {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        Geometry::Polygon(Polygon {
            points: self.points.iter().map(|p| p.resolve(ctx)).collect(),
            style: style(&self.options, FillStyle::None, "black", ctx),
        })
    }
}

/// `\psaxes[opts]{arrows}(x0,y0)(x1,y1)(x2,y2)`, trailing pairs optional
#[derive(Debug, Clone, PartialEq)]
pub struct PsAxes {
    pub options: Option<String>,
    pub arrows: Option<String>,
    pub pairs: Vec<Pair>,
}

impl Build for PsAxes {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let options = Options::parse(self.options.as_deref());
        let xunit = ctx.settings.xunit.raw();
        let yunit = ctx.settings.yunit.raw();
        let dx = length(options.get("Dx").map_or(1.0, |v| ctx.eval(v)), xunit);
        let dy = length(options.get("Dy").map_or(1.0, |v| ctx.eval(v)), yunit);

        let zero = ctx.point(DVec2::ZERO);
        let (origin, bottom_left, top_right) = match self.pairs.as_slice() {
            [] => (zero, zero, zero),
            [top_right] => (zero, zero, top_right.resolve(ctx)),
            [corner, top_right] => {
                let corner = corner.resolve(ctx);
                (corner, corner, top_right.resolve(ctx))
            }
            [origin, bottom_left, top_right, ..] => (
                origin.resolve(ctx),
                bottom_left.resolve(ctx),
                top_right.resolve(ctx),
            ),
        };

        ctx.axes = Some(AxesFrame { dx, dy, origin });

        Geometry::Axes(Axes {
            origin,
            bottom_left,
            top_right,
            dx,
            dy,
            ticks: Ticks::parse(options.get("ticks")),
            ends: Ends::parse(self.arrows.as_deref()),
            style: Style::new(FillStyle::None, "none").resolve(&ctx.settings, &options),
        })
    }
}

/// `\psline[opts]{arrows}(x1,y1)(x2,y2)`; one pair draws from the origin
#[derive(Debug, Clone, PartialEq)]
pub struct PsLine {
    pub options: Option<String>,
    pub arrows: Option<String>,
    pub first: Pair,
    pub second: Option<Pair>,
}

impl Build for PsLine {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let (from, to) = match &self.second {
            Some(second) => (self.first.resolve(ctx), second.resolve(ctx)),
            None => (ctx.point(DVec2::ZERO), self.first.resolve(ctx)),
        };
        Geometry::Line(Line {
            from,
            to,
            ends: Ends::parse(self.arrows.as_deref()),
            style: style(&self.options, FillStyle::Solid, "black", ctx),
        })
    }
}

/// `\userline[opts]{arrows}(x1,y1)(x2,y2){xExp}{yExp}{xExp2}{yExp2}`
///
/// With a pointer position the second end follows the pointer, unless the
/// expressions say otherwise. Expressions see the pointer as `x` and `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLine {
    pub options: Option<String>,
    pub arrows: Option<String>,
    pub p1: Pair,
    pub p2: Pair,
    pub x_exp: Option<String>,
    pub y_exp: Option<String>,
    pub x_exp2: Option<String>,
    pub y_exp2: Option<String>,
}

impl Build for UserLine {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let mut from = self.p1.resolve(ctx);
        let mut to = self.p2.resolve(ctx);

        if let Some(pointer) = ctx.pointer {
            let doc = ctx.point_inv(pointer);
            let locals = [("x", doc.x), ("y", doc.y)];
            let eval = |exp: &Option<String>| {
                exp.as_deref().map_or(0.0, |e| ctx.eval_with(e, &locals))
            };

            to = pointer;
            if self.x_exp2.is_some() {
                to.x = ctx.x(eval(&self.x_exp2));
                from.x = ctx.x(eval(&self.x_exp));
            } else if self.x_exp.is_some() {
                to.x = ctx.x(eval(&self.x_exp));
            }
            if self.y_exp2.is_some() {
                to.y = ctx.y(eval(&self.y_exp2));
                from.y = ctx.y(eval(&self.y_exp));
            } else if self.y_exp.is_some() {
                to.y = ctx.y(eval(&self.y_exp));
            }
        }

        Geometry::Line(Line {
            from,
            to,
            ends: Ends::parse(self.arrows.as_deref()),
            style: style(&self.options, FillStyle::Solid, "black", ctx),
        })
    }
}

/// `\psplot[opts]{start}{end}{f(x)}`
#[derive(Debug, Clone, PartialEq)]
pub struct PsPlot {
    pub options: Option<String>,
    pub start: String,
    pub end: String,
    pub function: String,
}

impl Build for PsPlot {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let start = ctx.eval(&self.start);
        let end = ctx.eval(&self.end);
        let style = style(&self.options, FillStyle::None, "none", ctx);

        let function = sandbox::compile(&self.function)
            .inspect_err(|err| crate::log::warn!("psplot {:?}: {}", self.function, err))
            .ok();

        // Clamped in f64 before the integer cast
        let steps = ((end - start) / PLOT_STEP + 1e-9).floor();
        let count = if end >= start && steps >= 0.0 {
            steps + 1.0
        } else {
            0.0
        };
        if count > MAX_SAMPLES as f64 {
            crate::log::warn!(
                "psplot domain {}..{} truncated to {} samples",
                start,
                end,
                MAX_SAMPLES
            );
        }
        let count = count.min(MAX_SAMPLES as f64) as usize;

        let mut failed = 0usize;
        let points = (0..count)
            .map(|i| {
                let x = start + i as f64 * PLOT_STEP;
                let locals = [("x", x)];
                let scope = sandbox::Scope::new(&ctx.variables).with_locals(&locals);
                let y = match function.as_ref().map(|f| f.eval(&scope)) {
                    Some(Ok(y)) => y,
                    _ => {
                        failed += 1;
                        0.0
                    }
                };
                dvec2(ctx.x(x), ctx.y(y))
            })
            .collect::<Vec<_>>();
        if failed > 0 {
            crate::log::debug!("psplot {:?}: {} samples fell back to 0", self.function, failed);
        }

        let baseline = (style.fillstyle == FillStyle::Solid).then(|| ctx.y(0.0));
        Geometry::Curve(Curve {
            points,
            baseline,
            style,
        })
    }
}

/// `\uservariable[opts]{name}(x,y){expression}`
#[derive(Debug, Clone, PartialEq)]
pub struct UserVariable {
    pub options: Option<String>,
    pub name: String,
    pub anchor: Pair,
    pub expression: String,
}

impl Build for UserVariable {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let anchor = self.anchor.resolve(ctx);
        let doc = ctx.point_inv(ctx.pointer.unwrap_or(anchor));
        let value = ctx.eval_with(&self.expression, &[("x", doc.x), ("y", doc.y)]);
        ctx.variables.insert(self.name.clone(), value);

        Geometry::Variable(UserBinding {
            name: self.name.clone(),
            anchor,
            expression: self.expression.clone(),
            value,
        })
    }
}

/// `\rput[refpoint]{rotation}(x,y){text}`
#[derive(Debug, Clone, PartialEq)]
pub struct RPut {
    pub refpoint: Option<String>,
    pub rotation: Option<String>,
    pub at: Pair,
    pub text: String,
}

impl Build for RPut {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        Geometry::Label(Label {
            at: self.at.resolve(ctx),
            text: self.text.clone(),
            refpoint: self.refpoint.clone(),
            rotation: self.rotation.as_deref().map_or(0.0, |r| ctx.eval(r)),
        })
    }
}

/// `\slider[opts]{min}{max}{variable}{label}{value}`
#[derive(Debug, Clone, PartialEq)]
pub struct SliderDecl {
    pub options: Option<String>,
    pub min: String,
    pub max: String,
    pub variable: String,
    pub label: String,
    pub value: String,
}

impl Build for SliderDecl {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        let options = Options::parse(self.options.as_deref());
        let scalar = match options.get("scalar").map(|s| ctx.eval(s)) {
            Some(s) if s != 0.0 => s,
            Some(_) => {
                crate::log::warn!("slider {}: scalar must be non-zero", self.variable);
                1.0
            }
            None => 1.0,
        };
        let slider = Slider {
            min: ctx.eval(&self.min),
            max: ctx.eval(&self.max),
            variable: self.variable.clone(),
            label: self.label.clone(),
            value: ctx.eval(&self.value),
            scalar,
        };
        ctx.variables.insert(slider.variable.clone(), slider.value);
        ctx.sliders.push(slider.clone());
        Geometry::Slider(slider)
    }
}

/// `\psset{key=value,...}` inside a figure
#[derive(Debug, Clone, PartialEq)]
pub struct PsSet {
    pub body: String,
}

impl Build for PsSet {
    fn build(&self, ctx: &mut FigureContext) -> Geometry {
        ctx.settings.declare(&self.body);
        Geometry::Units(ctx.settings.clone())
    }
}
