//! Binary image decoder
//!
//! Turns a [`BinaryImage`] plus declarative axis recipes into
//! physical-unit axes and grids. Raw samples are fixed-width little-endian
//! integers; each one passes through the axis's compiled conversion
//! formula.
//!
//! Decoding is pure: the same image and definitions always produce the
//! same table set, and no prior state is consulted. Per-axis failures
//! (bad formula, out-of-bounds span) are logged and yield an empty axis;
//! they never abort the rest of the image.

use crate::error::{MapTuneError, Result, ResultExt};
use crate::formula::FormulaEngine;
use crate::types::{AxisDefinition, BinaryImage, CalibrationTable, TableDefinition};

/// Decoder for calibration tables embedded in a binary image
#[derive(Debug, Default)]
pub struct ImageDecoder {
    formulas: FormulaEngine,
}

impl ImageDecoder {
    /// Create a decoder with its own formula cache
    pub fn new() -> Self {
        Self {
            formulas: FormulaEngine::new(),
        }
    }

    /// Create a decoder around an existing formula engine
    pub fn with_engine(formulas: FormulaEngine) -> Self {
        Self { formulas }
    }

    /// Decode a 1-D axis.
    ///
    /// - `address == 0` with static values: returns the first
    ///   `index_count` fallback values ordered by index (already
    ///   physical units, no formula).
    /// - `address != 0`: reads `index_count` consecutive samples starting
    ///   at the address, converting each through the compiled formula.
    /// - otherwise: an empty axis.
    pub fn decode_axis(&self, image: &BinaryImage, def: &AxisDefinition) -> Result<Vec<f64>> {
        if def.address == 0 {
            if def.index_count > 0 && !def.static_values.is_empty() {
                let mut pairs = def.static_values.clone();
                pairs.sort_by_key(|(index, _)| *index);
                // The axis keeps its declared length even if the
                // definition carries surplus pairs
                pairs.truncate(def.index_count);
                return Ok(pairs.into_iter().map(|(_, value)| value).collect());
            }
            return Ok(Vec::new());
        }

        let raw = self.read_raw_samples(image, def, def.index_count)?;
        let formula = self
            .formulas
            .compile(&def.formula, &def.variable)
            .with_context(|| format!("compiling formula for axis at 0x{:08X}", def.address))?;

        let mut axis = Vec::with_capacity(raw.len());
        for sample in raw {
            axis.push(self.formulas.eval(&formula, sample)?);
        }
        Ok(axis)
    }

    /// Decode a 2-D grid in row-major order.
    ///
    /// Reads `row_count * max(1, column_count)` samples and reshapes them
    /// into `row_count` rows. An address of 0 yields an empty grid.
    pub fn decode_grid(&self, image: &BinaryImage, def: &AxisDefinition) -> Result<Vec<Vec<f64>>> {
        if def.address == 0 {
            return Ok(Vec::new());
        }

        let rows = def.row_count;
        let columns = def.column_count.max(1);

        let raw = self.read_raw_samples(image, def, rows * columns)?;
        let formula = self
            .formulas
            .compile(&def.formula, &def.variable)
            .with_context(|| format!("compiling formula for grid at 0x{:08X}", def.address))?;

        let mut grid = Vec::with_capacity(rows);
        for row in raw.chunks(columns) {
            let mut values = Vec::with_capacity(columns);
            for &sample in row {
                values.push(self.formulas.eval(&formula, sample)?);
            }
            grid.push(values);
        }
        Ok(grid)
    }

    /// Decode one table, tolerating per-axis failures.
    ///
    /// Any axis that fails decodes as empty; partial tables are valid.
    pub fn decode_table(&self, image: &BinaryImage, def: &TableDefinition) -> CalibrationTable {
        let x_axis = self.decode_axis_or_empty(image, &def.name, "x", def.x_axis.as_ref());
        let y_axis = self.decode_axis_or_empty(image, &def.name, "y", def.y_axis.as_ref());

        let grid = match &def.z_axis {
            Some(axis_def) => match self.decode_grid(image, axis_def) {
                Ok(grid) => grid,
                Err(e) => {
                    tracing::warn!("Failed to decode grid of '{}': {}", def.name, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        CalibrationTable::new(x_axis, y_axis, grid)
    }

    /// Decode the full table set for an image.
    ///
    /// This is a pure function of its inputs; the registry calls it on
    /// every image reload, definition-set change and post-write refresh.
    pub fn decode_all(
        &self,
        image: &BinaryImage,
        definitions: &[TableDefinition],
    ) -> Vec<(TableDefinition, CalibrationTable)> {
        definitions
            .iter()
            .map(|def| (def.clone(), self.decode_table(image, def)))
            .collect()
    }

    fn decode_axis_or_empty(
        &self,
        image: &BinaryImage,
        table: &str,
        which: &str,
        def: Option<&AxisDefinition>,
    ) -> Vec<f64> {
        match def {
            Some(axis_def) => match self.decode_axis(image, axis_def) {
                Ok(axis) => axis,
                Err(e) => {
                    tracing::warn!("Failed to decode {}-axis of '{}': {}", which, table, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Read `count` consecutive raw samples starting at the axis address
    fn read_raw_samples(
        &self,
        image: &BinaryImage,
        def: &AxisDefinition,
        count: usize,
    ) -> Result<Vec<i64>> {
        let stride = def.width.size_bytes();
        let required = stride * count;
        let end = def.address.checked_add(required).ok_or_else(|| {
            MapTuneError::OutOfBounds {
                address: def.address,
                required,
                image_len: image.len(),
            }
        })?;

        if end > image.len() {
            return Err(MapTuneError::OutOfBounds {
                address: def.address,
                required,
                image_len: image.len(),
            });
        }

        let signed = def.is_signed();
        let bytes = &image.as_bytes()[def.address..end];
        let samples = bytes
            .chunks_exact(stride)
            .filter_map(|chunk| def.width.parse_raw(chunk, signed))
            .collect();
        Ok(samples)
    }
}
