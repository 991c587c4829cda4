//! API key checks run before any search

use scout_core::{
    credential_error, ChatMessage, LanguageModel, ScoutError, ScoutResult, SearchProvider,
};
use tracing::{info, warn};

/// Check the search API key against the provider's usage endpoint
pub async fn validate_search_key(provider: &dyn SearchProvider) -> ScoutResult<()> {
    match provider.validate_key().await {
        Ok(()) => {
            info!("Search API key accepted by {}", provider.name());
            Ok(())
        }
        Err(e) => {
            warn!("Search API key rejected by {}: {}", provider.name(), e);
            Err(e)
        }
    }
}

/// Check the chat-completion key with a one-message completion
///
/// Authentication failures and transport errors become `InvalidCredential`;
/// other upstream failures are returned unchanged.
pub async fn validate_llm_key(llm: &dyn LanguageModel) -> ScoutResult<()> {
    match llm.complete(vec![ChatMessage::user("Hello")]).await {
        Ok(_) => {
            info!("LLM API key accepted for model {}", llm.model_name());
            Ok(())
        }
        Err(e) if is_rejection(&e) => {
            warn!("LLM API key rejected: {}", e);
            Err(credential_error!("llm", e.to_string(), "credentials"))
        }
        Err(e) => Err(e),
    }
}

pub async fn validate_keys(
    provider: &dyn SearchProvider,
    llm: &dyn LanguageModel,
) -> ScoutResult<()> {
    validate_search_key(provider).await?;
    validate_llm_key(llm).await
}

fn is_rejection(error: &ScoutError) -> bool {
    match error {
        ScoutError::InvalidCredential { .. } | ScoutError::Config { .. } => true,
        ScoutError::Upstream { status, .. } => matches!(status, None | Some(401) | Some(403)),
        _ => false,
    }
}
