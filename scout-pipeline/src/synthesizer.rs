//! Synthesis stage: the final answer from the prompt and gathered evidence

use crate::error::PipelineResult;
use crate::prompts::{PromptLibrary, DATETIME_FORMAT};
use chrono::Local;
use scout_core::{ChatMessage, LanguageModel, StreamCallback};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct Synthesizer {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<PromptLibrary>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<PromptLibrary>) -> Self {
        Self { llm, prompts }
    }

    /// Answer `prompt` from `evidence`, streaming tokens to `on_token` when given
    pub async fn summarize(
        &self,
        prompt: &str,
        evidence: &str,
        on_token: Option<StreamCallback>,
    ) -> PipelineResult<String> {
        let start_time = Instant::now();
        let datetime = Local::now().format(DATETIME_FORMAT).to_string();
        let instruction = self.prompts.summarize(prompt, evidence, &datetime)?;
        let messages = vec![ChatMessage::user(instruction)];

        let answer = match on_token {
            Some(callback) => self.llm.complete_stream(messages, callback).await?,
            None => self.llm.complete(messages).await?,
        };

        info!(
            "Synthesized answer - Evidence: {} chars, Answer: {} chars, Model: {}, Duration: {:?}",
            evidence.len(),
            answer.len(),
            self.llm.model_name(),
            start_time.elapsed()
        );
        Ok(answer)
    }
}
