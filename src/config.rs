//! Project configuration.
//!
//! A project file carries the table definition set (the map catalogue
//! normally parsed from an XDF) and the per-category table selections.
//! Stored as TOML so hand-edited definition sets stay diffable; `.json`
//! files are accepted for catalogues exported from other tools.

use crate::error::{MapTuneError, Result};
use crate::types::TableDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Project file extension
pub const PROJECT_FILE_EXTENSION: &str = "maptune.toml";

/// A loaded project: definitions plus the current selections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// All table definitions, in catalogue order
    #[serde(default)]
    pub definitions: Vec<TableDefinition>,

    /// Selected table name per category
    #[serde(default)]
    pub selections: HashMap<String, String>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a project file from disk.
    ///
    /// The format follows the extension: `.json` parses as JSON,
    /// everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MapTuneError::Config(format!("Failed to read project file {:?}: {}", path, e))
        })?;

        let parsed = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|e| {
            MapTuneError::Config(format!("Failed to parse project file {:?}: {}", path, e))
        })
    }

    /// Load a project file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load project, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the project to disk, in the format its extension implies
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MapTuneError::Config(format!("Failed to create project directory: {}", e))
            })?;
        }

        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| e.to_string())
        } else {
            toml::to_string_pretty(self).map_err(|e| e.to_string())
        };
        let content = content
            .map_err(|e| MapTuneError::Config(format!("Failed to serialize project: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            MapTuneError::Config(format!("Failed to write project file {:?}: {}", path, e))
        })
    }

    /// The selected table name for a category, if any
    pub fn selection_for(&self, category: &str) -> Option<&str> {
        self.selections.get(category).map(|s| s.as_str())
    }

    /// Select a table for a category
    pub fn select(&mut self, category: impl Into<String>, table: impl Into<String>) {
        self.selections.insert(category.into(), table.into());
    }

    /// Clear a category's selection; returns whether one was present
    pub fn clear_selection(&mut self, category: &str) -> bool {
        self.selections.remove(category).is_some()
    }

    /// Definitions belonging to a category
    pub fn definitions_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a TableDefinition> {
        self.definitions
            .iter()
            .filter(move |def| def.category == category)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
