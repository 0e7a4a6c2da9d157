pub mod index;
pub mod serve;

use std::sync::Arc;

use shopclerk_config::AppConfig;
use shopclerk_core::EmbeddingProvider;
use shopclerk_index::SemanticIndex;
use shopclerk_providers::OpenAiCompatClient;
use tracing::warn;

/// Build the provider client from config.
pub(crate) fn build_client(config: &AppConfig) -> Arc<OpenAiCompatClient> {
    let api_key = config.provider.api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        warn!("no API key configured — provider calls will fail (set SHOPCLERK_API_KEY)");
    }

    Arc::new(
        OpenAiCompatClient::new(
            "openai-compat",
            config.provider.api_url.as_str(),
            api_key,
            config.provider.chat_model.as_str(),
            config.provider.embedding_model.as_str(),
        )
        .with_generation_params(config.provider.temperature, config.provider.max_tokens),
    )
}

/// Build the semantic index handle over the configured file pair.
pub(crate) fn build_index(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Arc<SemanticIndex> {
    Arc::new(SemanticIndex::new(
        embedder,
        &config.data.index_file,
        &config.data.meta_file,
    ))
}
