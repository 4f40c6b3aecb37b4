//! Arithmetic formula engine for axis conversion equations
//!
//! Every axis definition carries a conversion formula that maps a raw
//! integer sample to physical units, e.g. `"x / 2"` or `"x * 0.75 - 48"`.
//! This module compiles those formulas once per axis definition and
//! evaluates them once per sample, so a decode costs O(samples)
//! evaluations rather than O(samples) compilations.
//!
//! The grammar is deliberately small: `+ - * / ^`, parentheses, numeric
//! literals and exactly one free variable whose name the axis definition
//! declares. Function calls and foreign identifiers are rejected at
//! compile time; a formula that evaluates to a non-numeric value fails at
//! evaluation time. There is no scripting runtime behind this.
//!
//! ## Example formulas
//!
//! Half-scale axis (raw byte to physical value):
//! ```text
//! x / 2
//! ```
//!
//! Temperature sensor with offset and scale:
//! ```text
//! x * 0.75 - 48
//! ```

mod engine;

pub use engine::FormulaEngine;

use crate::error::{MapTuneError, Result};
use evalexpr::Node;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled conversion formula that can be evaluated efficiently
#[derive(Clone)]
pub struct CompiledFormula {
    /// The compiled operator tree
    node: Node,
    /// The original formula text
    source: String,
    /// The bound variable name
    variable: String,
}

impl CompiledFormula {
    /// Get the formula text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the bound variable name
    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub(crate) fn node(&self) -> &Node {
        &self.node
    }
}

impl std::fmt::Debug for CompiledFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFormula")
            .field("source", &self.source)
            .field("variable", &self.variable)
            .finish()
    }
}

/// Cache of compiled formulas to avoid recompilation
#[derive(Debug, Default)]
pub struct FormulaCache {
    /// Map from (formula text, variable name) to compiled formula
    cache: HashMap<(String, String), CompiledFormula>,
}

impl FormulaCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get a cached formula or compile and cache it
    pub fn get_or_compile(&mut self, source: &str, variable: &str) -> Result<CompiledFormula> {
        let key = (source.to_string(), variable.to_string());
        if let Some(formula) = self.cache.get(&key) {
            return Ok(formula.clone());
        }

        let formula = engine::compile(source, variable)?;
        self.cache.insert(key, formula.clone());
        Ok(formula)
    }

    /// Number of cached formulas
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Thread-safe formula cache wrapper
pub type SharedFormulaCache = Arc<RwLock<FormulaCache>>;

/// Create a new shared formula cache
pub fn create_shared_cache() -> SharedFormulaCache {
    Arc::new(RwLock::new(FormulaCache::new()))
}

pub(crate) fn cache_poisoned() -> MapTuneError {
    MapTuneError::Formula("formula cache lock poisoned".to_string())
}

/// Conversion formulas commonly found in table definition files.
///
/// All of these bind the variable `x`.
pub mod builtins {
    /// Identity - raw value is already physical units
    pub const IDENTITY: &str = "x";

    /// Half scale, e.g. load axes stored at double resolution
    pub const HALF: &str = "x / 2";

    /// Percent from a byte (0-255 to 0-100)
    pub const BYTE_TO_PERCENT: &str = "x * 100 / 255";

    /// Ignition angle in degrees (signed byte at 0.75 deg/bit)
    pub const IGNITION_ANGLE: &str = "x * 0.75";

    /// Coolant/intake temperature with offset and scale
    pub const TEMPERATURE: &str = "x * 0.75 - 48";

    /// Pressure ratio from a 16-bit sample (1/1024 per bit)
    pub const PRESSURE_RATIO: &str = "x / 1024";

    /// Engine speed axis (40 rpm per bit)
    pub const ENGINE_SPEED: &str = "x * 40";

    /// Injector constant scaled quadratically
    pub const QUADRATIC: &str = "x ^ 2 / 65536";

    /// List of all built-in formulas with names
    pub fn all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Identity", IDENTITY),
            ("Half", HALF),
            ("Byte to Percent", BYTE_TO_PERCENT),
            ("Ignition Angle", IGNITION_ANGLE),
            ("Temperature", TEMPERATURE),
            ("Pressure Ratio", PRESSURE_RATIO),
            ("Engine Speed", ENGINE_SPEED),
            ("Quadratic", QUADRATIC),
        ]
    }
}
