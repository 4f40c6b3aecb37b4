//! Reactive recompute graph for derived calibration tables.
//!
//! A small fixed set of named bindings, each a pure function over
//! currently published inputs (selected canonical tables, reference
//! axes, measured series). A binding recomputes exactly when at least
//! one of its declared inputs changes and publishes its result on a
//! retained-latest watch channel; a binding that loses a required input
//! publishes `None`, never a stale table.
//!
//! # Architecture
//!
//! ```text
//! [TableRegistry] ──► selection resolution ──► [RecomputeGraph]
//! [log parser]    ──► measured series      ──►       │
//!                                                    ├──► watch: derived table A
//!                                                    └──► watch: derived table B
//! ```
//!
//! # Design
//!
//! - **Explicit dependency edges** — an input key maps to the bindings
//!   that declared it; a change marks only that closure stale.
//! - **Canonical sources** — bindings read the originally decoded
//!   tables held in the input store and never write back into them, so
//!   repeated recomputes with the same measured maximum produce the
//!   same rescaled axis.
//! - **Serialized recompute** — the runtime thread applies one command
//!   at a time; partial recomputes never interleave.

pub mod binding;
pub mod bindings;
pub mod runtime;
pub mod scheduler;

pub use binding::{BindingState, BuiltinBinding, DerivedTable};
pub use bindings::{AxisResampleBinding, SeriesTableBinding};
pub use runtime::{GraphCommand, GraphHandle, GraphRuntime};
pub use scheduler::RecomputeGraph;

use crate::error::{MapTuneError, Result};
use crate::types::{CalibrationTable, MeasuredSeries};
use std::collections::HashMap;
use std::sync::Arc;

/// Key identifying one published input of the recompute graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// The selected table of a category, resolved by the externally
    /// owned selection store after each decode
    Selection(String),

    /// A standalone axis input
    Axis(String),

    /// A named measured-series set from the log parser
    Series(String),

    /// The retained output of another binding
    Derived(String),
}

impl std::fmt::Display for InputKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKey::Selection(category) => write!(f, "selection '{}'", category),
            InputKey::Axis(name) => write!(f, "axis '{}'", name),
            InputKey::Series(name) => write!(f, "series '{}'", name),
            InputKey::Derived(name) => write!(f, "derived table '{}'", name),
        }
    }
}

/// A currently published input value
#[derive(Debug, Clone)]
pub enum InputValue {
    /// A decoded (or derived) table snapshot
    Table(Arc<CalibrationTable>),
    /// A bare axis
    Axis(Arc<Vec<f64>>),
    /// Measured log channels
    Series(Arc<MeasuredSeries>),
}

/// Read-only view of the input store handed to a binding's recompute
pub struct InputSet<'a> {
    values: &'a HashMap<InputKey, InputValue>,
}

impl<'a> InputSet<'a> {
    pub(crate) fn new(values: &'a HashMap<InputKey, InputValue>) -> Self {
        Self { values }
    }

    /// Fetch a table input
    pub fn table(&self, key: &InputKey) -> Result<&'a Arc<CalibrationTable>> {
        match self.values.get(key) {
            Some(InputValue::Table(table)) => Ok(table),
            Some(_) => Err(MapTuneError::MissingInput(format!(
                "{} is not a table",
                key
            ))),
            None => Err(MapTuneError::MissingInput(key.to_string())),
        }
    }

    /// Fetch an axis input: either a bare axis or the X-axis of a table
    pub fn axis(&self, key: &InputKey) -> Result<&'a [f64]> {
        match self.values.get(key) {
            Some(InputValue::Axis(axis)) => Ok(axis),
            Some(InputValue::Table(table)) => Ok(&table.x_axis),
            Some(_) => Err(MapTuneError::MissingInput(format!(
                "{} is not an axis",
                key
            ))),
            None => Err(MapTuneError::MissingInput(key.to_string())),
        }
    }

    /// Fetch a measured-series input
    pub fn series(&self, key: &InputKey) -> Result<&'a Arc<MeasuredSeries>> {
        match self.values.get(key) {
            Some(InputValue::Series(series)) => Ok(series),
            Some(_) => Err(MapTuneError::MissingInput(format!(
                "{} is not a measured series",
                key
            ))),
            None => Err(MapTuneError::MissingInput(key.to_string())),
        }
    }
}
