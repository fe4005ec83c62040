//! Recomputing dependent records when bindings or the pointer change

use glam::dvec2;

use super::{CommandKind, FigureContext, GeometryRecord, Plot};

/// Whether a figure reacts to input at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Static,
    Reactive,
}

/// Records rebuilt by one event, in recompute order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Redraw {
    pub records: Vec<GeometryRecord>,
}

impl Redraw {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An interpreted figure: its context plus its records
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub context: FigureContext,
    pub plot: Plot,
}

/// Kinds rebuilt on every event; user variables first since the others read them
const RECOMPUTE_ORDER: [CommandKind; 3] = [
    CommandKind::UserVariable,
    CommandKind::PsPlot,
    CommandKind::UserLine,
];

impl Figure {
    pub fn new(context: FigureContext, plot: Plot) -> Self {
        Self { context, plot }
    }

    pub fn mode(&self) -> Mode {
        let reactive = [CommandKind::Slider, CommandKind::UserVariable, CommandKind::UserLine]
            .iter()
            .any(|kind| self.plot.get(kind).is_some_and(|records| !records.is_empty()));
        if reactive { Mode::Reactive } else { Mode::Static }
    }

    /// Records of one kind, in line order
    pub fn records(&self, kind: CommandKind) -> &[GeometryRecord] {
        self.plot.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Bind `name` to `value` and rebuild the dependent records
    pub fn set_variable(&mut self, name: &str, value: f64) -> Redraw {
        if self.mode() == Mode::Static {
            return Redraw::default();
        }
        self.context.variables.insert(name.to_string(), value);
        self.recompute()
    }

    /// Feed a raw slider value; the variable receives `raw / scalar`
    pub fn slider_input(&mut self, index: usize, raw: f64) -> Redraw {
        if self.mode() == Mode::Static {
            return Redraw::default();
        }
        let Some(slider) = self.context.sliders.get_mut(index) else {
            crate::log::warn!("no slider at index {}", index);
            return Redraw::default();
        };
        slider.value = raw / slider.scalar;
        let (name, value) = (slider.variable.clone(), slider.value);
        self.context.variables.insert(name, value);
        self.recompute()
    }

    /// Move the pointer to `(x, y)` in output units
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Redraw {
        if self.mode() == Mode::Static {
            return Redraw::default();
        }
        self.context.pointer = Some(dvec2(x, y));
        self.recompute()
    }

    /// Rebuild every dependent record and return fresh copies of them
    pub fn recompute(&mut self) -> Redraw {
        let mut redraw = Redraw::default();
        for kind in RECOMPUTE_ORDER {
            debug_assert!(kind.is_dependent());
            let Some(records) = self.plot.get_mut(&kind) else {
                continue;
            };
            for record in records.iter_mut() {
                record.rebuild(&mut self.context);
                redraw.records.push(record.clone());
            }
        }
        crate::log::debug!("recomputed {} records", redraw.records.len());
        redraw
    }
}
