//! Embedding generation through siumai
//!
//! [`SiumaiEmbedder`] is the default [`Embedder`]; the knowledge engine only
//! sees the trait.

use scout_core::{async_trait, config_error, upstream_error, EmbeddingConfig, Embedder, ScoutResult};
use siumai::prelude::*;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

/// Embedder backed by a siumai provider client
///
/// The provider client is built on the first embedding call, so runs that
/// never embed need no embedding credentials.
pub struct SiumaiEmbedder {
    config: EmbeddingConfig,
    client: OnceCell<Box<dyn LlmClient>>,
}

impl SiumaiEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Build the provider client now instead of on first use
    pub async fn connect(config: EmbeddingConfig) -> ScoutResult<Self> {
        let embedder = Self::new(config);
        embedder.client().await?;
        Ok(embedder)
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> ScoutResult<&dyn LlmClient> {
        let client = self
            .client
            .get_or_try_init(|| Self::build_client(&self.config))
            .await?;
        Ok(&**client)
    }

    async fn build_client(config: &EmbeddingConfig) -> ScoutResult<Box<dyn LlmClient>> {
        let client: Box<dyn LlmClient> = match config.provider.as_str() {
            "openai" => {
                let api_key = config
                    .api_key
                    .clone()
                    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                    .ok_or_else(|| config_error!("OpenAI API key not found", "embeddings"))?;

                let client = LlmBuilder::new()
                    .openai()
                    .api_key(&api_key)
                    .model(&config.model)
                    .build()
                    .await
                    .map_err(|e| {
                        upstream_error!(
                            "embedding",
                            format!("Failed to create OpenAI client: {}", e),
                            "embeddings"
                        )
                    })?;

                Box::new(client)
            }
            provider => {
                return Err(config_error!(
                    format!("Unsupported embedding provider: {}", provider),
                    "embeddings"
                ));
            }
        };

        info!(
            "Initialized embedding client - Provider: {}, Model: {}, Batch Size: {}",
            config.provider, config.model, config.batch_size
        );

        Ok(client)
    }
}

#[async_trait]
impl Embedder for SiumaiEmbedder {
    async fn embed(&self, texts: Vec<String>) -> ScoutResult<Vec<Vec<f32>>> {
        let Some(embedding_client) = self.client().await?.as_embedding_capability() else {
            return Err(config_error!(
                format!("Provider {} does not support embeddings", self.config.provider),
                "embeddings"
            ));
        };

        let start_time = Instant::now();
        let count = texts.len();

        debug!(
            "Calling embedding API - Provider: {}, Model: {}, Texts: {}",
            self.config.provider, self.config.model, count
        );

        let response = embedding_client.embed(texts).await.map_err(|e| {
            error!(
                "Embedding API call failed - Provider: {}, Model: {}, Error: {}",
                self.config.provider, self.config.model, e
            );
            upstream_error!(
                "embedding",
                format!("Embedding API call failed: {}", e),
                "embeddings"
            )
        })?;

        if response.embeddings.len() != count {
            return Err(upstream_error!(
                "embedding",
                format!(
                    "Expected {} embeddings, provider returned {}",
                    count,
                    response.embeddings.len()
                ),
                "embeddings"
            ));
        }

        debug!(
            "Embeddings generated - Count: {}, Duration: {:?}",
            count,
            start_time.elapsed()
        );

        Ok(response.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
