//! # Shopclerk Core
//!
//! Domain types, capability traits, and error definitions for the shopclerk
//! retrieval-augmented chat backend. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (embedding provider, generator, purchase
//! store, store catalog) is defined as a trait here. Implementations live
//! in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod catalog;
pub mod document;
pub mod error;
pub mod geo;
pub mod provider;
pub mod purchase;

// Re-export key types at crate root for ergonomics
pub use catalog::{Promo, RankedStore, Store, StoreCatalog};
pub use document::{Document, Hit};
pub use error::{Error, GeoError, IndexError, ProviderError, Result, StoreError};
pub use geo::GeoPoint;
pub use provider::{EmbeddingProvider, Generator};
pub use purchase::{NewPurchase, Purchase, PurchaseStore, User};
