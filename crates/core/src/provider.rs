//! Provider traits — the abstractions over external model services.
//!
//! The embedding provider turns text into fixed-dimension vectors; the
//! generator turns a composed prompt into a reply. Both are network
//! services behind trait objects so the core never depends on a concrete
//! API. Implementations live in `shopclerk-providers`.

use async_trait::async_trait;

use crate::error::ProviderError;

/// The embedding capability.
///
/// `encode` is deterministic for a fixed model/version: the same text
/// always yields the same vector, which is what makes persisted indexes
/// reusable across restarts.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "groq").
    fn name(&self) -> &str;

    /// Embed each input text into a fixed-dimension vector.
    ///
    /// Returns one vector per input, in input order.
    async fn encode(
        &self,
        texts: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, ProviderError>;
}

/// The text-generation capability.
///
/// Failures are surfaced to the caller, never retried here — the request
/// boundary decides how to present them.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Generate a reply for the composed prompt.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn encode(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn trait_object_dispatch_works() {
        let provider: Box<dyn EmbeddingProvider> = Box::new(FixedEmbedder);
        let out = provider.encode(&["hello".to_string()]).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 2);
    }
}
