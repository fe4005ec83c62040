//! Figure context - numeric state of one figure while it is interpreted

use std::collections::BTreeMap;

use glam::{DVec2, dvec2};

use crate::sandbox::{self, Scope};
use crate::settings::Settings;
use crate::types::{finite, round2};

use super::geometry::Slider;

/// Tick spacing and origin published by the last `\psaxes` of a figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesFrame {
    pub dx: f64,
    pub dy: f64,
    pub origin: DVec2,
}

/// Per-figure state threaded through every builder
#[derive(Debug, Clone, PartialEq)]
pub struct FigureContext {
    /// Lower-left canvas corner in document units
    pub x0: f64,
    pub y0: f64,
    /// Upper-right canvas corner in document units
    pub x1: f64,
    pub y1: f64,
    pub w: f64,
    pub h: f64,
    /// Canvas size in output units, fixed when the figure opens
    pub size: DVec2,
    /// Units and style in effect for the next record
    pub settings: Settings,
    /// Variable bindings written by sliders and user variables
    pub variables: BTreeMap<String, f64>,
    pub sliders: Vec<Slider>,
    /// Last pointer position in output units
    pub pointer: Option<DVec2>,
    pub axes: Option<AxesFrame>,
}

impl FigureContext {
    pub fn new(lower_left: DVec2, upper_right: DVec2, settings: Settings) -> Self {
        let (w, h) = (upper_right.x - lower_left.x, upper_right.y - lower_left.y);
        let size = dvec2(w * settings.xunit.raw(), h * settings.yunit.raw());
        Self {
            x0: lower_left.x,
            y0: lower_left.y,
            x1: upper_right.x,
            y1: upper_right.y,
            w,
            h,
            size,
            settings,
            variables: BTreeMap::new(),
            sliders: Vec::new(),
            pointer: None,
            axes: None,
        }
    }

    /// Horizontal document coordinate to output units
    pub fn x(&self, v: f64) -> f64 {
        transform("x", v, |v| (v - self.x0) * self.settings.xunit.raw())
    }

    /// Vertical document coordinate to output units (the output axis points down)
    pub fn y(&self, v: f64) -> f64 {
        transform("y", v, |v| (self.y1 - v) * self.settings.yunit.raw())
    }

    pub fn x_inv(&self, p: f64) -> f64 {
        p / self.settings.xunit.raw() + self.x0
    }

    pub fn y_inv(&self, p: f64) -> f64 {
        self.y1 - p / self.settings.yunit.raw()
    }

    pub fn point(&self, p: DVec2) -> DVec2 {
        dvec2(self.x(p.x), self.y(p.y))
    }

    pub fn point_inv(&self, p: DVec2) -> DVec2 {
        dvec2(self.x_inv(p.x), self.y_inv(p.y))
    }

    /// Evaluate an expression over the variable bindings, 0 on failure
    pub fn eval(&self, expr: &str) -> f64 {
        sandbox::evaluate_or(expr, &Scope::new(&self.variables), 0.0)
    }

    /// Evaluate with extra local bindings such as the pointer `x` and `y`
    pub fn eval_with(&self, expr: &str, locals: &[(&str, f64)]) -> f64 {
        let scope = Scope::new(&self.variables).with_locals(locals);
        sandbox::evaluate_or(expr, &scope, 0.0)
    }

    /// Evaluate a coordinate pair and transform it to output units
    pub fn coords(&self, x: &str, y: &str) -> DVec2 {
        dvec2(self.x(self.eval(x)), self.y(self.eval(y)))
    }
}

fn transform(axis: &str, v: f64, f: impl Fn(f64) -> f64) -> f64 {
    let Ok(v) = finite(v) else {
        crate::log::warn!("{} transform: invalid input {}", axis, v);
        return 0.0;
    };
    match finite(f(v)) {
        Ok(out) => round2(out),
        Err(err) => {
            crate::log::warn!("{} transform of {}: {}", axis, v, err);
            0.0
        }
    }
}
