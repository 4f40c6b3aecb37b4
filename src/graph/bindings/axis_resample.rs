//! AxisResample binding — resamples a source table onto a rescaled axis.
//!
//! Mirrors the "output map" workflow: a dependent map must cover the
//! same domain as a reference map whose axis was retuned, so the source
//! X-axis is proportionally rescaled to the reference axis maximum and
//! the grid is interpolated onto the rescaled axis. The Y-axis passes
//! through unchanged.

use crate::error::{MapTuneError, Result};
use crate::graph::{InputKey, InputSet};
use crate::resample::{rescale_axis, resample_grid};
use crate::types::CalibrationTable;

/// Binding producing `source` resampled onto `reference`'s axis maximum
pub struct AxisResampleBinding {
    name: String,
    inputs: [InputKey; 2],
}

impl AxisResampleBinding {
    /// Create a binding reading a source table and a reference axis.
    ///
    /// `reference` may be a bare axis input or a table input, in which
    /// case its X-axis is used.
    pub fn new(name: impl Into<String>, source: InputKey, reference: InputKey) -> Self {
        Self {
            name: name.into(),
            inputs: [source, reference],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[InputKey] {
        &self.inputs
    }

    pub fn recompute(&self, inputs: &InputSet) -> Result<CalibrationTable> {
        let source = inputs.table(&self.inputs[0])?;
        let reference_axis = inputs.axis(&self.inputs[1])?;

        let target_max = reference_axis.last().copied().ok_or_else(|| {
            MapTuneError::MissingInput(format!("{} is empty", self.inputs[1]))
        })?;

        let new_x = rescale_axis(&source.x_axis, target_max)?;
        let grid = resample_grid(&source.x_axis, &source.grid, &new_x);

        Ok(CalibrationTable::new(new_x, source.y_axis.clone(), grid))
    }
}
