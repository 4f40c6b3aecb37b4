//! Table registry
//!
//! Sole owner of the decoded table set for the current image. Every
//! reload decodes the full definition set from scratch and replaces the
//! held snapshot wholesale; there is no incremental-update path. The
//! latest snapshot is published on a retained-latest watch channel so a
//! late subscriber immediately observes current state.

use crate::decoder::ImageDecoder;
use crate::types::{BinaryImage, CalibrationTable, TableDefinition};
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable published view of the decoded table set.
///
/// Cloning is cheap; downstream consumers only ever read snapshots,
/// never the live registry.
#[derive(Debug, Clone, Default)]
pub struct TableSnapshot {
    tables: Arc<Vec<(TableDefinition, CalibrationTable)>>,
    generation: u64,
}

impl TableSnapshot {
    /// All decoded tables in definition order
    pub fn tables(&self) -> &[(TableDefinition, CalibrationTable)] {
        &self.tables
    }

    /// Look up a table by definition name
    pub fn table(&self, name: &str) -> Option<&CalibrationTable> {
        self.tables
            .iter()
            .find(|(def, _)| def.name == name)
            .map(|(_, table)| table)
    }

    /// Look up a table by name, cheaply sharable with the graph
    pub fn table_arc(&self, name: &str) -> Option<Arc<CalibrationTable>> {
        self.table(name).cloned().map(Arc::new)
    }

    /// Names of all tables in a selection category
    pub fn names_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a str> {
        self.tables
            .iter()
            .filter(move |(def, _)| def.category == category)
            .map(|(def, _)| def.name.as_str())
    }

    /// Monotonic counter bumped on every publish
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of decoded tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no tables are held
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Owns the decoded-table snapshot and publishes replacements.
///
/// The registry is the single writer; everything downstream subscribes.
#[derive(Debug)]
pub struct TableRegistry {
    decoder: ImageDecoder,
    tx: watch::Sender<TableSnapshot>,
    generation: u64,
}

impl TableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TableSnapshot::default());
        Self {
            decoder: ImageDecoder::new(),
            tx,
            generation: 0,
        }
    }

    /// Create a registry around an existing decoder
    pub fn with_decoder(decoder: ImageDecoder) -> Self {
        let (tx, _) = watch::channel(TableSnapshot::default());
        Self {
            decoder,
            tx,
            generation: 0,
        }
    }

    /// Decode the full definition set against an image and publish the
    /// result, replacing any previous snapshot.
    ///
    /// Called on every binary reload, definition-set change and
    /// post-write refresh.
    pub fn reload(
        &mut self,
        image: &BinaryImage,
        definitions: &[TableDefinition],
    ) -> TableSnapshot {
        let tables = self.decoder.decode_all(image, definitions);
        self.generation += 1;

        let snapshot = TableSnapshot {
            tables: Arc::new(tables),
            generation: self.generation,
        };

        tracing::debug!(
            generation = snapshot.generation,
            tables = snapshot.len(),
            "Published decoded table snapshot"
        );
        self.tx.send_replace(snapshot.clone());
        snapshot
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> TableSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot publishes; the receiver starts at the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
