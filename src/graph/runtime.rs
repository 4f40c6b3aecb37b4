//! Dedicated recompute thread.
//!
//! The graph itself is single-writer; the runtime owns it on a worker
//! thread and serializes all mutation through a command channel, so
//! input publishes from several producers never interleave mid-pass.

use crate::error::{MapTuneError, Result};
use crate::graph::scheduler::RecomputeGraph;
use crate::graph::{InputKey, InputValue};
use crate::registry::TableSnapshot;
use crossbeam_channel::{unbounded, Sender};
use std::collections::HashMap;
use std::thread::JoinHandle;

/// Commands accepted by the recompute thread
pub enum GraphCommand {
    /// Publish or replace an input
    SetInput(InputKey, InputValue),
    /// Retract an input
    ClearInput(InputKey),
    /// Resolve selections against a snapshot and publish them
    ApplySelections(TableSnapshot, HashMap<String, String>),
    /// Reply once every previously queued command has been applied
    Sync(Sender<()>),
    /// Stop the thread, returning the graph from its join handle
    Shutdown,
}

/// Cloneable handle for publishing inputs to the recompute thread
#[derive(Clone)]
pub struct GraphHandle {
    tx: Sender<GraphCommand>,
}

impl GraphHandle {
    pub fn set_input(&self, key: InputKey, value: InputValue) -> Result<()> {
        self.send(GraphCommand::SetInput(key, value))
    }

    pub fn clear_input(&self, key: InputKey) -> Result<()> {
        self.send(GraphCommand::ClearInput(key))
    }

    pub fn apply_selections(
        &self,
        snapshot: TableSnapshot,
        selections: HashMap<String, String>,
    ) -> Result<()> {
        self.send(GraphCommand::ApplySelections(snapshot, selections))
    }

    /// Block until every command sent before this call has been applied
    pub fn sync(&self) -> Result<()> {
        let (tx, rx) = unbounded();
        self.send(GraphCommand::Sync(tx))?;
        rx.recv()
            .map_err(|_| MapTuneError::Channel("recompute thread exited".to_string()))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(GraphCommand::Shutdown)
    }

    fn send(&self, command: GraphCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| MapTuneError::Channel("recompute thread exited".to_string()))
    }
}

/// Owns the worker thread running a [`RecomputeGraph`]
pub struct GraphRuntime;

impl GraphRuntime {
    /// Move `graph` onto a worker thread.
    ///
    /// Subscribe to binding outputs before spawning, or via a snapshot
    /// of receivers kept by the caller; the returned join handle yields
    /// the graph back after [`GraphHandle::shutdown`].
    pub fn spawn(mut graph: RecomputeGraph) -> (GraphHandle, JoinHandle<RecomputeGraph>) {
        let (tx, rx) = unbounded::<GraphCommand>();

        let handle = std::thread::spawn(move || {
            tracing::debug!("Recompute thread started");
            while let Ok(command) = rx.recv() {
                match command {
                    GraphCommand::SetInput(key, value) => graph.set_input(key, value),
                    GraphCommand::ClearInput(key) => graph.clear_input(&key),
                    GraphCommand::ApplySelections(snapshot, selections) => {
                        graph.apply_selections(&snapshot, &selections)
                    }
                    GraphCommand::Sync(reply) => {
                        let _ = reply.send(());
                    }
                    GraphCommand::Shutdown => break,
                }
            }
            tracing::debug!("Recompute thread stopped");
            graph
        });

        (GraphHandle { tx }, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AxisResampleBinding, BuiltinBinding};
    use crate::types::CalibrationTable;
    use std::sync::Arc;

    #[test]
    fn test_commands_apply_in_order() {
        let mut graph = RecomputeGraph::new();
        let rx = graph
            .add_binding(BuiltinBinding::AxisResample(AxisResampleBinding::new(
                "out",
                InputKey::Selection("src".to_string()),
                InputKey::Axis("ref".to_string()),
            )))
            .unwrap();

        let (handle, join) = GraphRuntime::spawn(graph);
        handle
            .set_input(
                InputKey::Selection("src".to_string()),
                InputValue::Table(Arc::new(CalibrationTable::new(
                    vec![1.0, 2.0],
                    vec![0.0],
                    vec![vec![10.0, 20.0]],
                ))),
            )
            .unwrap();
        handle
            .set_input(
                InputKey::Axis("ref".to_string()),
                InputValue::Axis(Arc::new(vec![4.0])),
            )
            .unwrap();
        handle.sync().unwrap();

        assert_eq!(rx.borrow().clone().unwrap().x_axis, vec![2.0, 4.0]);

        handle.clear_input(InputKey::Axis("ref".to_string())).unwrap();
        handle.sync().unwrap();
        assert!(rx.borrow().is_none());

        handle.shutdown().unwrap();
        let graph = join.join().expect("recompute thread panicked");
        assert!(graph.subscribe("out").is_some());
    }

    #[test]
    fn test_send_after_shutdown_is_channel_error() {
        let (handle, join) = GraphRuntime::spawn(RecomputeGraph::new());
        handle.shutdown().unwrap();
        join.join().expect("recompute thread panicked");

        let err = handle
            .clear_input(InputKey::Axis("ref".to_string()))
            .unwrap_err();
        assert!(matches!(err, MapTuneError::Channel(_)));
    }
}
