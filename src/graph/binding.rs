//! Binding abstraction for the recompute graph.
//!
//! Built-in bindings live behind an enum so the scheduler dispatches
//! without trait objects; each variant declares its inputs and exposes a
//! pure recompute function.

use crate::error::Result;
use crate::graph::bindings::{AxisResampleBinding, SeriesTableBinding};
use crate::graph::{InputKey, InputSet};
use crate::types::CalibrationTable;
use std::sync::Arc;

/// A published derived table
pub type DerivedTable = Arc<CalibrationTable>;

/// Lifecycle state of one binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No declared input has been published yet
    Uninitialized,
    /// An input changed; recompute pending
    Stale,
    /// Recomputed against current inputs (value or explicit no-value)
    Computed,
}

/// Enum dispatch for built-in bindings
pub enum BuiltinBinding {
    /// Source table resampled onto a rescaled copy of a reference axis
    AxisResample(AxisResampleBinding),
    /// Table regenerated from a measured series and a rescaled axis
    SeriesTable(SeriesTableBinding),
}

impl BuiltinBinding {
    /// Unique binding name; also the key of its published output
    pub fn name(&self) -> &str {
        match self {
            BuiltinBinding::AxisResample(b) => b.name(),
            BuiltinBinding::SeriesTable(b) => b.name(),
        }
    }

    /// The inputs this binding declares
    pub fn inputs(&self) -> &[InputKey] {
        match self {
            BuiltinBinding::AxisResample(b) => b.inputs(),
            BuiltinBinding::SeriesTable(b) => b.inputs(),
        }
    }

    /// Recompute the derived table from current inputs.
    ///
    /// Pure and deterministic: the same inputs always produce the same
    /// table, and the inputs are never mutated.
    pub fn recompute(&self, inputs: &InputSet) -> Result<CalibrationTable> {
        match self {
            BuiltinBinding::AxisResample(b) => b.recompute(inputs),
            BuiltinBinding::SeriesTable(b) => b.recompute(inputs),
        }
    }
}

impl std::fmt::Debug for BuiltinBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinBinding")
            .field("name", &self.name())
            .field("inputs", &self.inputs())
            .finish()
    }
}
