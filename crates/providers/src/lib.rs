//! Provider implementations for shopclerk.
//!
//! One HTTP client covers both external capabilities: most hosted model
//! services (OpenAI, Groq, Together, vLLM, Ollama) expose OpenAI-compatible
//! `/embeddings` and `/chat/completions` endpoints.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;
