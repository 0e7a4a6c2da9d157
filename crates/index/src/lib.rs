//! Semantic document index for shopclerk.
//!
//! A small, rebuild-wholesale vector index over a seed corpus:
//! - [`FlatIndex`] — the exhaustive inner-product search structure
//! - [`SemanticIndex`] — owns the embedding provider, the in-memory
//!   index+metadata pair, and their on-disk persistence
//! - [`load_seed_docs`] — turns a directory of `.txt` files into documents

pub mod corpus;
pub mod flat;
pub mod semantic;

pub use corpus::load_seed_docs;
pub use flat::{FlatIndex, l2_normalize};
pub use semantic::SemanticIndex;
