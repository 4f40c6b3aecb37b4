//! Built-in binding implementations.

mod axis_resample;
mod series_table;

pub use axis_resample::AxisResampleBinding;
pub use series_table::SeriesTableBinding;
