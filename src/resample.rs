//! Resampling primitives for derived tables
//!
//! Two operations cover everything the recompute graph needs: a
//! proportional axis rescale and piecewise-linear interpolation of a
//! grid's rows onto a new axis. Query coordinates outside the source
//! axis clamp to the nearest boundary sample; interpolation never
//! overshoots the source row's value range.

use crate::error::{MapTuneError, Result};

/// Proportionally rescale an axis so its last element equals `target_max`.
///
/// Preserves element count and relative spacing. Fails with
/// [`MapTuneError::DegenerateAxis`] when the last element is zero (the
/// scale factor would divide by zero).
pub fn rescale_axis(axis: &[f64], target_max: f64) -> Result<Vec<f64>> {
    let last = match axis.last() {
        Some(&last) => last,
        None => return Ok(Vec::new()),
    };

    if last == 0.0 {
        return Err(MapTuneError::DegenerateAxis(
            "cannot rescale axis whose last element is zero".to_string(),
        ));
    }

    let factor = target_max / last;
    Ok(axis.iter().map(|value| value * factor).collect())
}

/// Piecewise-linear interpolation of `row` (sampled at `old_axis`) onto
/// `new_axis`, which may be finer or coarser.
///
/// Queries inside `[old_axis[0], old_axis[last]]` interpolate between the
/// bracketing samples; queries outside clamp to the boundary sample.
pub fn resample_row(old_axis: &[f64], row: &[f64], new_axis: &[f64]) -> Vec<f64> {
    if old_axis.is_empty() || row.is_empty() {
        return Vec::new();
    }

    let len = old_axis.len().min(row.len());
    new_axis
        .iter()
        .map(|&coord| interpolate(&old_axis[..len], &row[..len], coord))
        .collect()
}

/// Apply [`resample_row`] to every row of a grid.
///
/// Row count is unchanged; every output row has `new_axis.len()` columns.
pub fn resample_grid(old_axis: &[f64], grid: &[Vec<f64>], new_axis: &[f64]) -> Vec<Vec<f64>> {
    grid.iter()
        .map(|row| resample_row(old_axis, row, new_axis))
        .collect()
}

fn interpolate(axis: &[f64], values: &[f64], coord: f64) -> f64 {
    let last = axis.len() - 1;

    // Clamp outside the sampled domain
    if coord <= axis[0] {
        return values[0];
    }
    if coord >= axis[last] {
        return values[last];
    }

    // Find the bracketing segment
    let upper = axis.partition_point(|&a| a < coord).min(last);
    let lower = upper - 1;

    let span = axis[upper] - axis[lower];
    if span == 0.0 {
        return values[lower];
    }

    let t = (coord - axis[lower]) / span;
    values[lower] + t * (values[upper] - values[lower])
}
