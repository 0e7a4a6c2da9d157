//! Error types for the shopclerk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all shopclerk operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Semantic index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Geo ranking errors ---
    #[error("Geo error: {0}")]
    Geo(#[from] GeoError),

    // --- Record store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors from the semantic index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("index not loaded — call build() or load() first")]
    NotLoaded,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index persistence failed: {0}")]
    Persist(String),

    #[error("corpus read failed: {0}")]
    Corpus(String),

    #[error("embedding provider failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Errors from geospatial ranking.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid coordinate: lat={lat}, lng={lng} (must be finite, within ±90/±180)")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// Errors from the purchase/user record store and the store catalog.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Errors from external providers (embedding or generation calls).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_displays_correctly() {
        let err = Error::Index(IndexError::DimensionMismatch {
            expected: 384,
            actual: 768,
        });
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn geo_error_displays_coordinates() {
        let err = Error::Geo(GeoError::InvalidCoordinate {
            lat: 91.0,
            lng: 0.0,
        });
        assert!(err.to_string().contains("91"));
    }

    #[test]
    fn provider_error_converts_into_index_error() {
        let provider = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        let err: IndexError = provider.into();
        assert!(err.to_string().contains("429"));
    }
}
