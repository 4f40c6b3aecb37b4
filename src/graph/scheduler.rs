//! Recompute scheduling over the binding dependency graph.
//!
//! Inputs are published into a keyed store; each binding declares the
//! keys it reads, so an input change marks exactly the dependent
//! bindings stale. Stale bindings recompute in topological order over
//! derived-output edges, and a recomputed value only propagates further
//! when it actually differs from the retained one.

use crate::error::{MapTuneError, Result};
use crate::graph::binding::{BindingState, BuiltinBinding, DerivedTable};
use crate::graph::{InputKey, InputSet, InputValue};
use crate::registry::TableSnapshot;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

struct BindingSlot {
    binding: BuiltinBinding,
    state: BindingState,
    tx: watch::Sender<Option<DerivedTable>>,
}

/// The dependency graph of derived-table bindings.
///
/// Single-writer: all mutation goes through one owner (directly or via
/// the runtime thread), so a recompute pass never interleaves with an
/// input change.
pub struct RecomputeGraph {
    slots: Vec<BindingSlot>,
    by_name: HashMap<String, usize>,
    inputs: HashMap<InputKey, InputValue>,
}

impl RecomputeGraph {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            by_name: HashMap::new(),
            inputs: HashMap::new(),
        }
    }

    /// Register a binding and return the receiver for its output.
    ///
    /// The channel starts at `None`; if the binding's inputs are already
    /// published it recomputes immediately.
    pub fn add_binding(
        &mut self,
        binding: BuiltinBinding,
    ) -> Result<watch::Receiver<Option<DerivedTable>>> {
        let name = binding.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(MapTuneError::Config(format!(
                "duplicate binding name '{}'",
                name
            )));
        }

        let has_input = binding
            .inputs()
            .iter()
            .any(|key| self.inputs.contains_key(key));
        let state = if has_input {
            BindingState::Stale
        } else {
            BindingState::Uninitialized
        };

        let (tx, rx) = watch::channel(None);
        self.by_name.insert(name, self.slots.len());
        self.slots.push(BindingSlot { binding, state, tx });

        self.recompute_stale();
        Ok(rx)
    }

    /// Publish or replace an input, recomputing dependents
    pub fn set_input(&mut self, key: InputKey, value: InputValue) {
        self.inputs.insert(key.clone(), value);
        self.mark_dependents_stale(&key);
        self.recompute_stale();
    }

    /// Retract an input; dependents publish `None` rather than keeping a
    /// stale table
    pub fn clear_input(&mut self, key: &InputKey) {
        if self.inputs.remove(key).is_none() {
            return;
        }
        self.mark_dependents_stale(key);
        self.recompute_stale();
    }

    /// Resolve category selections against a decoded snapshot and
    /// publish each as a `Selection` input.
    ///
    /// A selection naming a table absent from the snapshot is cleared.
    pub fn apply_selections(
        &mut self,
        snapshot: &TableSnapshot,
        selections: &HashMap<String, String>,
    ) {
        for (category, table_name) in selections {
            let key = InputKey::Selection(category.clone());
            match snapshot.table_arc(table_name) {
                Some(table) => self.set_input(key, InputValue::Table(table)),
                None => {
                    tracing::warn!(
                        category = category.as_str(),
                        table = table_name.as_str(),
                        "Selected table missing from snapshot, clearing input"
                    );
                    self.clear_input(&key);
                }
            }
        }
    }

    /// Subscribe to a binding's output channel
    pub fn subscribe(&self, name: &str) -> Option<watch::Receiver<Option<DerivedTable>>> {
        self.by_name
            .get(name)
            .map(|&index| self.slots[index].tx.subscribe())
    }

    /// Current lifecycle state of a binding
    pub fn binding_state(&self, name: &str) -> Option<BindingState> {
        self.by_name.get(name).map(|&index| self.slots[index].state)
    }

    /// Currently published value of an input key
    pub fn input(&self, key: &InputKey) -> Option<&InputValue> {
        self.inputs.get(key)
    }

    fn mark_dependents_stale(&mut self, key: &InputKey) {
        for slot in &mut self.slots {
            if slot.binding.inputs().contains(key) {
                slot.state = BindingState::Stale;
            }
        }
    }

    /// Recompute every stale binding in dependency order.
    ///
    /// Kahn's algorithm over derived-output edges; a recomputed value
    /// propagates to downstream bindings only when it changed.
    fn recompute_stale(&mut self) {
        for index in self.topological_order() {
            if self.slots[index].state != BindingState::Stale {
                continue;
            }
            self.recompute_slot(index);
        }
    }

    fn recompute_slot(&mut self, index: usize) {
        let slot = &self.slots[index];
        let result = slot.binding.recompute(&InputSet::new(&self.inputs));
        let name = slot.binding.name().to_string();
        let derived_key = InputKey::Derived(name.clone());

        match result {
            Ok(table) => {
                let table = Arc::new(table);
                let changed = match slot.tx.borrow().as_ref() {
                    Some(current) => **current != *table,
                    None => true,
                };
                self.slots[index].state = BindingState::Computed;
                if !changed {
                    return;
                }

                tracing::debug!(binding = name.as_str(), "Recomputed derived table");
                self.slots[index].tx.send_replace(Some(table.clone()));
                self.inputs
                    .insert(derived_key.clone(), InputValue::Table(table));
                self.mark_dependents_stale(&derived_key);
            }
            Err(err) => {
                match &err {
                    MapTuneError::MissingInput(_) => {
                        tracing::debug!(
                            binding = name.as_str(),
                            "Binding inputs incomplete: {err}"
                        );
                    }
                    _ => {
                        tracing::warn!(binding = name.as_str(), "Binding recompute failed: {err}");
                    }
                }

                let had_value = slot.tx.borrow().is_some();
                self.slots[index].state = BindingState::Computed;
                if had_value {
                    self.slots[index].tx.send_replace(None);
                }
                if self.inputs.remove(&derived_key).is_some() || had_value {
                    self.mark_dependents_stale(&derived_key);
                }
            }
        }
    }

    /// Topological order of all bindings over derived-output edges
    fn topological_order(&self) -> Vec<usize> {
        let n = self.slots.len();
        let mut adj = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];

        for (to, slot) in self.slots.iter().enumerate() {
            for key in slot.binding.inputs() {
                if let InputKey::Derived(name) = key {
                    if let Some(&from) = self.by_name.get(name) {
                        adj[from].push(to);
                        in_degree[to] += 1;
                    }
                }
            }
        }

        let mut queue: VecDeque<usize> =
            (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &adj[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        // A cycle between bindings leaves the remainder unscheduled
        if order.len() < n {
            tracing::warn!(
                scheduled = order.len(),
                total = n,
                "Binding dependency cycle detected, skipping unreachable bindings"
            );
        }
        order
    }
}

impl Default for RecomputeGraph {
    fn default() -> Self {
        Self::new()
    }
}
