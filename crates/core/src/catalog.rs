//! Retail store reference data and the catalog capability.
//!
//! Stores are read-only reference records loaded from a flat file. The
//! geo ranker attaches a computed distance by producing new `RankedStore`
//! values — the canonical `Store` list is never mutated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A promotional offer attached to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promo {
    /// Human-readable promo description
    pub desc: String,
}

/// A retail store with its coordinate and current promos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    pub lat: f64,
    pub lng: f64,

    #[serde(default)]
    pub promos: Vec<Promo>,
}

/// A store augmented with its distance from a query point.
///
/// Produced by the geo ranker; serializes with the store fields inline so
/// API consumers see one flat record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStore {
    #[serde(flatten)]
    pub store: Store,

    /// Great-circle distance from the query point, truncated to meters
    pub distance_m: u64,
}

/// The store catalog capability.
///
/// Loads the store reference list from an external flat resource. An
/// absent resource is not an error — callers get an empty list.
#[async_trait]
pub trait StoreCatalog: Send + Sync {
    async fn load_stores(&self) -> std::result::Result<Vec<Store>, StoreError>;
}
