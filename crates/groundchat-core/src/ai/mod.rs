pub mod gemini;
mod sse;

pub use gemini::{GeminiClient, GeminiConnector};
pub use sse::SseDecoder;

use std::sync::Arc;

use futures_util::stream::BoxStream;

use crate::config::Temperature;
use crate::error::ChatError;

/// Per-call generation settings, rebuilt from front-end state on every submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub model_id: String,
    pub temperature: Temperature,
    pub system_instruction: String,
    pub web_search: bool,
}

/// A complete (non-streamed) model answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    /// Rendered search entry point from the grounding metadata, when present.
    pub search_entry_point: Option<String>,
}

/// Text fragments in arrival order.
pub type TextStream = BoxStream<'static, Result<String, ChatError>>;

/// A hosted generative model.
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, prompt: &str, config: &QueryConfig) -> Result<ModelResponse, ChatError>;

    async fn generate_stream(&self, prompt: &str, config: &QueryConfig) -> Result<TextStream, ChatError>;
}

/// Builds a backend for a single request. Credentials are checked here, before
/// any network traffic.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn ModelBackend>, ChatError>;
}
