//! Chat completion client using siumai
//!
//! DeepSeek speaks the OpenAI protocol, so the siumai OpenAI client is built
//! with its `base_url` pointed at the DeepSeek API root.

use futures::StreamExt;
use scout_core::{
    async_trait, config_error, credential_error, ChatMessage, ChatRole, ErrorContext,
    LanguageModel, LlmConfig, ScoutError, ScoutResult, StreamCallback, StreamToken,
};
use siumai::prelude::{ChatCapability, ChatStreamEvent, LlmBuilder, LlmError};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};

type SiumaiMessage = siumai::prelude::ChatMessage;

/// Chat completion client for DeepSeek and other OpenAI-compatible endpoints
pub struct ChatCompletionClient {
    client: Box<dyn ChatCapability + Send + Sync>,
    config: LlmConfig,
}

impl ChatCompletionClient {
    /// Build the siumai client described by `config`
    pub async fn connect(config: LlmConfig) -> ScoutResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| config_error!("Chat completion API key not found", "llm_client"))?;

        let client = LlmBuilder::new()
            .openai()
            .api_key(&api_key)
            .base_url(&config.base_url)
            .model(&config.model)
            .build()
            .await
            .map_err(|e| ScoutError::Config {
                message: format!("Failed to build chat completion client: {}", e),
                source: None,
                context: ErrorContext::new("llm_client").with_operation("connect"),
            })?;

        info!(
            "Created chat completion client for {} with model: {}",
            config.base_url, config.model
        );

        Ok(Self::with_client(config, Box::new(client)))
    }

    /// Wrap an already-built siumai chat client
    pub fn with_client(config: LlmConfig, client: Box<dyn ChatCapability + Send + Sync>) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Bound a whole request, streaming included, by the configured timeout
    async fn bounded<F, T>(&self, operation: &str, future: F) -> ScoutResult<T>
    where
        F: Future<Output = Result<T, LlmError>>,
    {
        match tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), future).await {
            Ok(result) => result.map_err(|e| map_llm_error(e, operation, &self.config.model)),
            Err(_) => Err(ScoutError::Upstream {
                service: "llm".to_string(),
                message: format!("Request timed out after {}s", self.config.timeout_secs),
                status: None,
                source: None,
                context: ErrorContext::new("llm_client").with_operation(operation),
            }),
        }
    }
}

fn to_siumai_messages(messages: &[ChatMessage]) -> Vec<SiumaiMessage> {
    messages
        .iter()
        .map(|message| match message.role {
            ChatRole::System => SiumaiMessage::system(message.content.as_str()).build(),
            ChatRole::User => SiumaiMessage::user(message.content.as_str()).build(),
            ChatRole::Assistant => SiumaiMessage::assistant(message.content.as_str()).build(),
        })
        .collect()
}

/// Authentication failures become `InvalidCredential`; HTTP errors keep their status
fn map_llm_error(error: LlmError, operation: &str, model: &str) -> ScoutError {
    match error {
        LlmError::AuthenticationError(message) => credential_error!("llm", message, "llm_client"),
        LlmError::ApiError { code, message, .. } => ScoutError::Upstream {
            service: "llm".to_string(),
            message: format!("HTTP {}: {}", code, message),
            status: Some(code),
            source: None,
            context: ErrorContext::new("llm_client")
                .with_operation(operation)
                .with_metadata("model", model),
        },
        other => ScoutError::Upstream {
            service: "llm".to_string(),
            message: other.to_string(),
            status: None,
            source: None,
            context: ErrorContext::new("llm_client")
                .with_operation(operation)
                .with_metadata("model", model),
        },
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> ScoutResult<String> {
        let start_time = Instant::now();
        debug!("Sending chat completion ({} messages)", messages.len());

        let response = self
            .bounded(
                "chat",
                self.client.chat_with_tools(to_siumai_messages(&messages), None),
            )
            .await?;

        let content = response.content_text().ok_or_else(|| ScoutError::Upstream {
            service: "llm".to_string(),
            message: "Completion has no text content".to_string(),
            status: None,
            source: None,
            context: ErrorContext::new("llm_client").with_operation("chat"),
        })?;

        debug!(
            "Chat completion finished - Model: {}, Length: {}, Duration: {:?}",
            self.config.model,
            content.len(),
            start_time.elapsed()
        );

        Ok(content.to_string())
    }

    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        on_token: StreamCallback,
    ) -> ScoutResult<String> {
        let siumai_messages = to_siumai_messages(&messages);
        let content = self
            .bounded("chat_stream", async {
                let mut stream = self.client.chat_stream(siumai_messages, None).await?;
                let mut content = String::new();

                while let Some(event) = stream.next().await {
                    match event? {
                        ChatStreamEvent::ContentDelta { delta, .. } => {
                            if !delta.is_empty() {
                                content.push_str(&delta);
                                on_token(StreamToken::Delta(delta));
                            }
                        }
                        ChatStreamEvent::StreamEnd { .. } => break,
                        other => debug!("Ignoring stream event {:?}", other),
                    }
                }

                Ok::<String, LlmError>(content)
            })
            .await?;

        on_token(StreamToken::End);
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siumai::prelude::{ChatResponse, ChatStream, FinishReason, MessageContent, Tool};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Replays a fixed answer, one word per stream event
    struct ScriptedChat {
        answer: String,
        fail_with: Option<u16>,
    }

    fn response(text: &str) -> ChatResponse {
        ChatResponse {
            id: Some("scripted".to_string()),
            content: MessageContent::Text(text.to_string()),
            model: Some("deepseek-chat".to_string()),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
            tool_calls: None,
            thinking: None,
            metadata: HashMap::new(),
        }
    }

    #[async_trait]
    impl ChatCapability for ScriptedChat {
        async fn chat_with_tools(
            &self,
            _messages: Vec<SiumaiMessage>,
            _tools: Option<Vec<Tool>>,
        ) -> Result<ChatResponse, LlmError> {
            match self.fail_with {
                Some(401) => Err(LlmError::AuthenticationError("bad key".to_string())),
                Some(code) => Err(LlmError::ApiError {
                    code,
                    message: "upstream down".to_string(),
                    details: None,
                }),
                None => Ok(response(&self.answer)),
            }
        }

        async fn chat_stream(
            &self,
            _messages: Vec<SiumaiMessage>,
            _tools: Option<Vec<Tool>>,
        ) -> Result<ChatStream, LlmError> {
            let mut events: Vec<Result<ChatStreamEvent, LlmError>> = self
                .answer
                .split_inclusive(' ')
                .map(|word| {
                    Ok(ChatStreamEvent::ContentDelta {
                        delta: word.to_string(),
                        index: None,
                    })
                })
                .collect();
            events.push(Ok(ChatStreamEvent::StreamEnd {
                response: response(&self.answer),
            }));
            Ok(Box::pin(futures::stream::iter(events)))
        }
    }

    fn client(answer: &str, fail_with: Option<u16>) -> ChatCompletionClient {
        ChatCompletionClient::with_client(
            LlmConfig::default(),
            Box::new(ScriptedChat {
                answer: answer.to_string(),
                fail_with,
            }),
        )
    }

    #[tokio::test]
    async fn test_complete_returns_text() {
        let answer = client("Trigonometry studies triangles.", None)
            .complete(vec![ChatMessage::user("What is trigonometry?")])
            .await
            .unwrap();
        assert_eq!(answer, "Trigonometry studies triangles.");
    }

    #[tokio::test]
    async fn test_stream_emits_deltas_then_end() {
        let tokens = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&tokens);
        let callback: StreamCallback =
            Arc::new(move |token: StreamToken| sink.lock().unwrap().push(token));

        let answer = client("IVE has six members", None)
            .complete_stream(vec![ChatMessage::user("IVE?")], callback)
            .await
            .unwrap();

        let tokens = tokens.lock().unwrap();
        assert_eq!(answer, "IVE has six members");
        assert_eq!(tokens.last(), Some(&StreamToken::End));
        assert_eq!(tokens.iter().filter(|t| **t == StreamToken::End).count(), 1);
        let streamed: String = tokens
            .iter()
            .filter_map(|t| match t {
                StreamToken::Delta(delta) => Some(delta.as_str()),
                StreamToken::End => None,
            })
            .collect();
        assert_eq!(streamed, answer);
    }

    #[tokio::test]
    async fn test_errors_keep_their_class() {
        let rejected = client("", Some(401))
            .complete(vec![ChatMessage::user("Hello")])
            .await;
        assert!(matches!(rejected, Err(ScoutError::InvalidCredential { .. })));

        let failed = client("", Some(502))
            .complete(vec![ChatMessage::user("Hello")])
            .await;
        assert!(matches!(
            failed,
            Err(ScoutError::Upstream {
                status: Some(502),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let result = ChatCompletionClient::connect(LlmConfig::default()).await;
        assert!(matches!(result, Err(ScoutError::Config { .. })));
    }
}
