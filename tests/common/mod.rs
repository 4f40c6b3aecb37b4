//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use maptune_rs::types::{AxisDefinition, SampleWidth, TableDefinition};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing once for the whole test binary.
///
/// Respects `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// An 8-bit unsigned axis recipe with an identity formula
pub fn axis(address: usize, count: usize) -> AxisDefinition {
    AxisDefinition {
        address,
        width: SampleWidth::Bits8,
        encoding: 0,
        index_count: count,
        formula: "x".to_string(),
        variable: "x".to_string(),
        ..Default::default()
    }
}

/// A full two-axis table recipe with identity formulas
pub fn table_definition(
    name: &str,
    category: &str,
    x_address: usize,
    columns: usize,
    y_address: usize,
    rows: usize,
    grid_address: usize,
) -> TableDefinition {
    TableDefinition {
        name: name.to_string(),
        category: category.to_string(),
        x_axis: Some(axis(x_address, columns)),
        y_axis: Some(axis(y_address, rows)),
        z_axis: Some(AxisDefinition {
            address: grid_address,
            row_count: rows,
            column_count: columns,
            formula: "x".to_string(),
            variable: "x".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
