//! SeriesTable binding — regenerates a table from measured log channels.
//!
//! The motivating map caps boost pressure per gear: a key channel (gear)
//! assigns each sample of a value channel (boost pressure, millibar) to
//! the nearest Y-axis row, the per-row maxima become the new grid, and
//! the X-axis (a pressure ratio) is stretched so the map covers the
//! measured peak.

use crate::error::{MapTuneError, Result};
use crate::graph::{InputKey, InputSet};
use crate::resample::rescale_axis;
use crate::types::CalibrationTable;

/// Binding producing a pressure-cap table from a measured series
pub struct SeriesTableBinding {
    name: String,
    inputs: [InputKey; 2],
    key_channel: String,
    value_channel: String,
}

impl SeriesTableBinding {
    /// Create a binding reading a source table and a measured series.
    ///
    /// `key_channel` selects the Y-axis row for each sample;
    /// `value_channel` carries the measured values.
    pub fn new(
        name: impl Into<String>,
        source: InputKey,
        series: InputKey,
        key_channel: impl Into<String>,
        value_channel: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: [source, series],
            key_channel: key_channel.into(),
            value_channel: value_channel.into(),
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
        let series = inputs.series(&self.inputs[1])?;

        let keys = series.channel(&self.key_channel).ok_or_else(|| {
            MapTuneError::MissingInput(format!("series channel '{}'", self.key_channel))
        })?;
        let values = series.channel(&self.value_channel).ok_or_else(|| {
            MapTuneError::MissingInput(format!("series channel '{}'", self.value_channel))
        })?;
        if values.is_empty() {
            return Err(MapTuneError::MissingInput(format!(
                "series channel '{}' has no samples",
                self.value_channel
            )));
        }
        if source.y_axis.is_empty() {
            return Err(MapTuneError::MissingInput(format!(
                "{} has no rows",
                self.inputs[0]
            )));
        }

        if source.x_axis.is_empty() {
            return Err(MapTuneError::MissingInput(format!(
                "{} has no columns",
                self.inputs[0]
            )));
        }

        let overall_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let row_max = per_row_maxima(&source.y_axis, keys, values, overall_max);

        // The measured peak in millibar maps to the pressure ratio the
        // axis must end at
        let target_ratio = (1000.0 + overall_max) / 1000.0;
        let new_x = rescale_axis(&source.x_axis, target_ratio)?;

        // Each cell holds the row's measured cap, limited by the
        // pressure the column's ratio can reach
        let grid = row_max
            .iter()
            .map(|&cap| new_x.iter().map(|&ratio| cap.min(ratio * 1000.0)).collect())
            .collect();

        Ok(CalibrationTable::new(new_x, source.y_axis.clone(), grid))
    }
}

/// Maximum of `values` per Y-axis row, assigning each sample to the row
/// whose axis value is nearest its key. Rows that receive no samples
/// fall back to `fallback`.
fn per_row_maxima(y_axis: &[f64], keys: &[f64], values: &[f64], fallback: f64) -> Vec<f64> {
    let mut maxima = vec![f64::NEG_INFINITY; y_axis.len()];

    for (&key, &value) in keys.iter().zip(values) {
        let row = nearest_row(y_axis, key);
        if value > maxima[row] {
            maxima[row] = value;
        }
    }

    for max in &mut maxima {
        if !max.is_finite() {
            *max = fallback;
        }
    }
    maxima
}

fn nearest_row(y_axis: &[f64], key: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, &row_value) in y_axis.iter().enumerate() {
        let distance = (row_value - key).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}
