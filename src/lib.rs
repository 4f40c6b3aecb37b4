//! # MapTune-RS: ECU calibration table decoder and recompute graph
//!
//! Decodes calibration tables (ignition, fueling, boost maps) out of a raw
//! ECU memory image and keeps derived tables consistent as inputs change.
//! Table layouts come from an externally parsed definition catalogue; raw
//! samples pass through per-axis conversion formulas into physical units.
//!
//! ## Architecture
//!
//! - **Decoder**: Reads little-endian samples at definition addresses and
//!   applies compiled conversion formulas
//! - **Registry**: Owns the decoded snapshot; every reload replaces it
//!   wholesale and publishes on a retained-latest channel
//! - **Graph**: Named bindings recompute derived tables when their declared
//!   inputs change, each publishing on its own channel
//! - **Formula**: `evalexpr`-based single-variable arithmetic expressions,
//!   compiled once and cached
//!
//! ## Example
//!
//! ```ignore
//! use maptune_rs::{
//!     config::ProjectConfig,
//!     graph::{AxisResampleBinding, BuiltinBinding, InputKey, RecomputeGraph},
//!     registry::TableRegistry,
//!     types::BinaryImage,
//! };
//!
//! fn main() -> maptune_rs::Result<()> {
//!     let project = ProjectConfig::load("tune.maptune.toml")?;
//!     let image = BinaryImage::new(std::fs::read("stock.bin")?);
//!
//!     let mut registry = TableRegistry::new();
//!     let snapshot = registry.reload(&image, &project.definitions);
//!
//!     let mut graph = RecomputeGraph::new();
//!     let outputs = graph.add_binding(BuiltinBinding::AxisResample(
//!         AxisResampleBinding::new(
//!             "ignition_output",
//!             InputKey::Selection("ignition".to_string()),
//!             InputKey::Selection("load".to_string()),
//!         ),
//!     ))?;
//!
//!     graph.apply_selections(&snapshot, &project.selections);
//!     if let Some(table) = outputs.borrow().as_ref() {
//!         println!("{} x {}", table.row_count(), table.column_count());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod formula;
pub mod graph;
pub mod registry;
pub mod resample;
pub mod types;

// Re-export commonly used types
pub use config::ProjectConfig;
pub use decoder::ImageDecoder;
pub use error::{MapTuneError, Result, ResultExt};
pub use formula::{CompiledFormula, FormulaCache, FormulaEngine, SharedFormulaCache};
pub use graph::{
    AxisResampleBinding, BuiltinBinding, GraphHandle, GraphRuntime, InputKey, InputValue,
    RecomputeGraph, SeriesTableBinding,
};
pub use registry::{TableRegistry, TableSnapshot};
pub use types::{
    AxisDefinition, BinaryImage, CalibrationTable, MeasuredSeries, SampleWidth, TableDefinition,
};
