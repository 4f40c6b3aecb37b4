//! Core data types for maptune-rs
//!
//! This module contains the fundamental data structures for describing and
//! holding decoded calibration tables.
//!
//! # Main Types
//!
//! - [`SampleWidth`] - Fixed sample width of a stored axis value (8 or 16 bit)
//! - [`AxisDefinition`] - Declarative decode recipe for one axis or grid
//! - [`TableDefinition`] - Identifies one calibration table and its axes
//! - [`CalibrationTable`] - The decoded result: physical-unit axes plus grid
//! - [`BinaryImage`] - Immutable snapshot of the raw ECU memory image
//! - [`MeasuredSeries`] - Named channels of measured values from a log parser
//!
//! # Encoding codes
//!
//! The axis encoding code nominally distinguishes four byte-order/signedness
//! variants (0..=3). Only signedness is observable: even codes decode as
//! unsigned, odd codes as signed, and samples are always read little-endian.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Fixed width of one stored sample in an axis or grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum SampleWidth {
    /// One byte per sample
    #[default]
    Bits8,
    /// Two bytes per sample, little-endian
    Bits16,
}

impl SampleWidth {
    /// Returns the stride in bytes of one sample
    pub fn size_bytes(&self) -> usize {
        match self {
            SampleWidth::Bits8 => 1,
            SampleWidth::Bits16 => 2,
        }
    }

    /// Parse one raw sample from little-endian bytes.
    ///
    /// Returns `None` if `bytes` is shorter than the sample stride.
    pub fn parse_raw(&self, bytes: &[u8], signed: bool) -> Option<i64> {
        if bytes.len() < self.size_bytes() {
            return None;
        }

        Some(match (self, signed) {
            (SampleWidth::Bits8, false) => bytes[0] as i64,
            (SampleWidth::Bits8, true) => bytes[0] as i8 as i64,
            (SampleWidth::Bits16, false) => u16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            (SampleWidth::Bits16, true) => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
        })
    }
}

impl TryFrom<u8> for SampleWidth {
    type Error = String;

    fn try_from(bits: u8) -> std::result::Result<Self, Self::Error> {
        match bits {
            8 => Ok(SampleWidth::Bits8),
            16 => Ok(SampleWidth::Bits16),
            other => Err(format!("unsupported sample width: {} bits", other)),
        }
    }
}

impl From<SampleWidth> for u8 {
    fn from(width: SampleWidth) -> u8 {
        match width {
            SampleWidth::Bits8 => 8,
            SampleWidth::Bits16 => 16,
        }
    }
}

impl std::fmt::Display for SampleWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleWidth::Bits8 => write!(f, "8-bit"),
            SampleWidth::Bits16 => write!(f, "16-bit"),
        }
    }
}

/// Decode recipe for one axis or grid of a calibration table.
///
/// An address of 0 means the axis has no binary backing; the ordered
/// `static_values` pairs are used verbatim instead (already physical units,
/// no formula applied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AxisDefinition {
    /// Byte address of the first sample in the image; 0 = no binary backing
    pub address: usize,

    /// Sample width (8 or 16 bits)
    #[serde(default)]
    pub width: SampleWidth,

    /// Encoding code in 0..=3; parity selects signedness, byte order bit is
    /// nominal only (decode is always little-endian)
    #[serde(default)]
    pub encoding: u8,

    /// Number of samples along the axis
    #[serde(default)]
    pub index_count: usize,

    /// Grid rows (grids only)
    #[serde(default)]
    pub row_count: usize,

    /// Grid columns (grids only)
    #[serde(default)]
    pub column_count: usize,

    /// Conversion formula from raw integer to physical units, e.g. "x / 2"
    #[serde(default)]
    pub formula: String,

    /// Name of the single free variable bound in `formula`
    #[serde(default)]
    pub variable: String,

    /// Fallback (index, value) pairs when `address == 0`
    #[serde(default)]
    pub static_values: Vec<(usize, f64)>,
}

impl AxisDefinition {
    /// Whether samples decode as signed two's-complement
    pub fn is_signed(&self) -> bool {
        self.encoding % 2 == 1
    }
}

/// Identifies one calibration table: a name, a selection category and up to
/// three axis recipes. Supplied by an external definition-file parser and
/// immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TableDefinition {
    /// Unique table name, e.g. "KFZW (stock)"
    pub name: String,

    /// Selection category this table belongs to, e.g. "ignition"
    #[serde(default)]
    pub category: String,

    /// X-axis recipe (columns)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<AxisDefinition>,

    /// Y-axis recipe (rows)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisDefinition>,

    /// Grid recipe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_axis: Option<AxisDefinition>,
}

/// The decoded result for one [`TableDefinition`].
///
/// Invariant: `grid.len()` equals the Y-axis length (or 1 if the table has
/// no Y-axis) and every row has X-axis length columns (or 1 if no X-axis).
/// A missing axis definition yields an empty sequence/grid, never a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalibrationTable {
    /// X-axis in physical units (columns)
    pub x_axis: Vec<f64>,

    /// Y-axis in physical units (rows)
    pub y_axis: Vec<f64>,

    /// Row-major grid in physical units
    pub grid: Vec<Vec<f64>>,
}

impl CalibrationTable {
    /// Create a table from its parts
    pub fn new(x_axis: Vec<f64>, y_axis: Vec<f64>, grid: Vec<Vec<f64>>) -> Self {
        Self {
            x_axis,
            y_axis,
            grid,
        }
    }

    /// Number of grid rows
    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    /// Number of grid columns (0 for an empty grid)
    pub fn column_count(&self) -> usize {
        self.grid.first().map(|row| row.len()).unwrap_or(0)
    }

    /// Whether the table decoded to nothing at all
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty() && self.y_axis.is_empty() && self.grid.is_empty()
    }
}

/// Immutable byte buffer snapshot of the ECU memory image.
///
/// Every reload produces a new snapshot that fully replaces the previous
/// one; decoding never mutates the image. Cloning is cheap (shared buffer).
#[derive(Debug, Clone)]
pub struct BinaryImage {
    bytes: Arc<[u8]>,
}

impl BinaryImage {
    /// Take ownership of a raw byte buffer
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Length of the image in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the image is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw bytes of the image
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for BinaryImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Named series of measured values, as produced by an external log parser.
///
/// Each channel is an ordered sequence of doubles; channels recorded
/// together share sample indices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasuredSeries {
    channels: HashMap<String, Vec<f64>>,
}

impl MeasuredSeries {
    /// Create an empty series set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a channel
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.channels.insert(name.into(), values);
    }

    /// Look up a channel by name
    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(|v| v.as_slice())
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are present
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
