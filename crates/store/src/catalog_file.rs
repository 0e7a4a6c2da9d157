//! Flat-file store catalog.
//!
//! Reads the store reference list from a JSON file on every call, so
//! external edits show up on the next request without a restart. A
//! missing file is an empty catalog, not an error.

use std::path::PathBuf;

use async_trait::async_trait;
use shopclerk_core::{Store, StoreCatalog, StoreError};
use tracing::{debug, warn};

/// A store catalog backed by a JSON array file.
pub struct JsonStoreCatalog {
    path: PathBuf,
}

impl JsonStoreCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreCatalog for JsonStoreCatalog {
    async fn load_stores(&self) -> Result<Vec<Store>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stores file, empty catalog");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Storage(format!(
                    "read {:?}: {e}",
                    self.path
                )));
            }
        };

        let stores: Vec<Store> = serde_json::from_str(&content).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "malformed stores file");
            StoreError::Storage(format!("parse {:?}: {e}", self.path))
        })?;

        debug!(count = stores.len(), "store catalog loaded");
        Ok(stores)
    }
}
