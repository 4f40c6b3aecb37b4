//! Integration tests for the recompute graph
//!
//! These tests validate derived-table maintenance end to end:
//! - Selection changes propagating into derived tables
//! - Retraction publishing no-value instead of stale tables
//! - The series binding leaving canonical tables untouched
//! - The runtime thread serializing input publishes

mod common;

use maptune_rs::graph::{
    AxisResampleBinding, BuiltinBinding, GraphRuntime, InputKey, InputValue, RecomputeGraph,
    SeriesTableBinding,
};
use maptune_rs::registry::TableRegistry;
use maptune_rs::types::{BinaryImage, MeasuredSeries};
use std::collections::HashMap;
use std::sync::Arc;

fn decode_snapshot() -> maptune_rs::registry::TableSnapshot {
    // Two ignition variants and a reference load map
    let mut image = vec![0u8; 0x20];
    image[0x01..0x05].copy_from_slice(&[1, 2, 3, 4]); // stock x-axis
    image[0x05..0x06].copy_from_slice(&[1]); // shared y-axis
    image[0x06..0x0A].copy_from_slice(&[10, 20, 30, 40]); // stock grid
    image[0x0A..0x0E].copy_from_slice(&[2, 4, 6, 8]); // race x-axis
    image[0x0E..0x12].copy_from_slice(&[11, 22, 33, 44]); // race grid
    image[0x12..0x16].copy_from_slice(&[1, 2, 4, 8]); // load x-axis

    let definitions = vec![
        common::table_definition("Ignition (stock)", "ignition", 0x01, 4, 0x05, 1, 0x06),
        common::table_definition("Ignition (race)", "ignition", 0x0A, 4, 0x05, 1, 0x0E),
        common::table_definition("Load", "load", 0x12, 4, 0x05, 1, 0),
    ];

    TableRegistry::new().reload(&BinaryImage::new(image), &definitions)
}

#[test]
fn test_selection_switch_recomputes_derived_table() {
    common::init_tracing();

    let snapshot = decode_snapshot();
    let mut graph = RecomputeGraph::new();
    let rx = graph
        .add_binding(BuiltinBinding::AxisResample(AxisResampleBinding::new(
            "ignition_output",
            InputKey::Selection("ignition".to_string()),
            InputKey::Selection("load".to_string()),
        )))
        .unwrap();

    let mut selections = HashMap::new();
    selections.insert("ignition".to_string(), "Ignition (stock)".to_string());
    selections.insert("load".to_string(), "Load".to_string());
    graph.apply_selections(&snapshot, &selections);

    // Stock axis [1..4] stretched to the load map's max of 8
    let derived = rx.borrow().clone().unwrap();
    assert_eq!(derived.x_axis, vec![2.0, 4.0, 6.0, 8.0]);

    // Switching the selection swaps the source table
    selections.insert("ignition".to_string(), "Ignition (race)".to_string());
    graph.apply_selections(&snapshot, &selections);
    let derived = rx.borrow().clone().unwrap();
    assert_eq!(derived.grid[0], vec![11.0, 22.0, 33.0, 44.0]);
}

#[test]
fn test_clearing_selection_retracts_derived_table() {
    common::init_tracing();

    let snapshot = decode_snapshot();
    let mut graph = RecomputeGraph::new();
    let rx = graph
        .add_binding(BuiltinBinding::AxisResample(AxisResampleBinding::new(
            "ignition_output",
            InputKey::Selection("ignition".to_string()),
            InputKey::Selection("load".to_string()),
        )))
        .unwrap();

    let mut selections = HashMap::new();
    selections.insert("ignition".to_string(), "Ignition (stock)".to_string());
    selections.insert("load".to_string(), "Load".to_string());
    graph.apply_selections(&snapshot, &selections);
    assert!(rx.borrow().is_some());

    graph.clear_input(&InputKey::Selection("ignition".to_string()));
    assert!(rx.borrow().is_none(), "retracted input must not leave a stale table");
}

#[test]
fn test_series_binding_does_not_mutate_canonical_table() {
    common::init_tracing();

    let snapshot = decode_snapshot();
    let source = snapshot.table_arc("Ignition (stock)").unwrap();

    let mut graph = RecomputeGraph::new();
    let rx = graph
        .add_binding(BuiltinBinding::SeriesTable(SeriesTableBinding::new(
            "pressure_cap",
            InputKey::Selection("boost".to_string()),
            InputKey::Series("log".to_string()),
            "gear",
            "boost_pressure",
        )))
        .unwrap();

    graph.set_input(
        InputKey::Selection("boost".to_string()),
        InputValue::Table(source.clone()),
    );

    let mut series = MeasuredSeries::new();
    series.insert("gear", vec![1.0, 1.0]);
    series.insert("boost_pressure", vec![1000.0, 1400.0]);
    let series = Arc::new(series);

    graph.set_input(
        InputKey::Series("log".to_string()),
        InputValue::Series(series.clone()),
    );
    let first = rx.borrow().clone().unwrap();

    // Publishing the identical series again must not compound the
    // rescale: the binding always starts from the canonical axis
    graph.set_input(
        InputKey::Series("log".to_string()),
        InputValue::Series(series),
    );
    let second = rx.borrow().clone().unwrap();
    assert_eq!(*first, *second);

    // The decoded source is untouched
    assert_eq!(source.x_axis, vec![1.0, 2.0, 3.0, 4.0]);
    // Peak 1400 mbar is ratio (1000 + 1400) / 1000; the axis ends there
    common::assert_float_eq(*second.x_axis.last().unwrap(), 2.4, 1e-9);
}

#[test]
fn test_runtime_thread_applies_selections() {
    common::init_tracing();

    let snapshot = decode_snapshot();
    let mut graph = RecomputeGraph::new();
    let rx = graph
        .add_binding(BuiltinBinding::AxisResample(AxisResampleBinding::new(
            "ignition_output",
            InputKey::Selection("ignition".to_string()),
            InputKey::Selection("load".to_string()),
        )))
        .unwrap();

    let (handle, join) = GraphRuntime::spawn(graph);

    let mut selections = HashMap::new();
    selections.insert("ignition".to_string(), "Ignition (stock)".to_string());
    selections.insert("load".to_string(), "Load".to_string());
    handle.apply_selections(snapshot, selections).unwrap();
    handle.sync().unwrap();

    let derived = rx.borrow().clone().unwrap();
    assert_eq!(derived.x_axis, vec![2.0, 4.0, 6.0, 8.0]);

    handle.shutdown().unwrap();
    join.join().expect("recompute thread panicked");
}
