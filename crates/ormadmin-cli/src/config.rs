//! Config and dataset loading.
//!
//! The config file holds the schema and admin registrations:
//!
//! ```json
//! {
//!   "models": [
//!     {"name": "User", "primary_key": "id", "fields": [
//!       {"name": "id", "kind": "scalar", "type": "int"},
//!       {"name": "username", "kind": "scalar", "type": "string"}
//!     ]}
//!   ],
//!   "admins": [{"model": "User", "options": {"paginate_by": 50}}]
//! }
//! ```
//!
//! The data file maps model names to row arrays. When `admins` is omitted,
//! every model is registered with default options.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use ormadmin_core::{AdminOptions, AdminRegistry, MemoryStore, Row, Schema};

use crate::error::{Error, Result};

/// One admin registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminEntry {
    /// Model to register.
    pub model: String,
    /// Options; defaults when omitted.
    #[serde(default)]
    pub options: AdminOptions,
}

/// Contents of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Schema of every model.
    pub models: Schema,
    /// Registered admins.
    #[serde(default)]
    pub admins: Vec<AdminEntry>,
}

impl AdminConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = read(path)?;
        let config: AdminConfig = serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            models = config.models.model_names().len(),
            "loaded admin config"
        );
        Ok(config)
    }

    /// Build the registry described by the config.
    pub fn build_registry(&self) -> Result<AdminRegistry> {
        let mut registry = AdminRegistry::new(Arc::new(self.models.clone()));
        if self.admins.is_empty() {
            for name in self.models.model_names() {
                registry.register(name, AdminOptions::default())?;
            }
        } else {
            for entry in &self.admins {
                registry.register(&entry.model, entry.options.clone())?;
            }
        }
        Ok(registry)
    }
}

/// Load a dataset file into a store.
pub fn load_data(path: &Path, schema: &Schema) -> Result<MemoryStore> {
    let text = read(path)?;
    let data: BTreeMap<String, Vec<Row>> =
        serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let rows: usize = data.values().map(Vec::len).sum();
    let store = MemoryStore::load(schema, data)?;
    info!(path = %path.display(), rows, "loaded dataset");
    Ok(store)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}
