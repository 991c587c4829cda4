//! Collaborator traits the pipeline calls through

use crate::error::ScoutResult;
use crate::types::{ChatMessage, RawSearchResponse, StreamToken};
use async_trait::async_trait;
use std::sync::Arc;

/// Callback receiving streamed completion tokens
pub type StreamCallback = Arc<dyn Fn(StreamToken) + Send + Sync>;

/// Web search API
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Issue one query and return the raw, unfiltered response
    async fn search(&self, query: &str, max_results: usize) -> ScoutResult<RawSearchResponse>;

    /// Check the configured key against the provider
    async fn validate_key(&self) -> ScoutResult<()>;

    fn name(&self) -> &str;
}

/// Navigate to a URL and return its HTML
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> ScoutResult<String>;

    /// Upper bound on a single page load
    fn page_load_timeout_ms(&self) -> u64;
}

/// HTML to Markdown conversion
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, html: &str) -> ScoutResult<String>;
}

/// Chat-completion model
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> ScoutResult<String>;

    /// Stream the completion through `on_token`, returning the full text
    ///
    /// Implementations must deliver [`StreamToken::End`] last. The default
    /// emits the whole completion as one delta.
    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        on_token: StreamCallback,
    ) -> ScoutResult<String> {
        let text = self.complete(messages).await?;
        on_token(StreamToken::Delta(text.clone()));
        on_token(StreamToken::End);
        Ok(text)
    }

    fn model_name(&self) -> &str;
}

/// Text embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch, returning one vector per input in order
    async fn embed(&self, texts: Vec<String>) -> ScoutResult<Vec<Vec<f32>>>;

    fn model_name(&self) -> &str;
}
