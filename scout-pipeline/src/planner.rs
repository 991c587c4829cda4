//! Query planning: task decomposition, query generation and expansion

use crate::error::PipelineResult;
use crate::prompts::{PromptLibrary, TASK_SEPARATOR};
use scout_core::{upstream_error, ChatMessage, LanguageModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Most auxiliary queries kept from one model answer
pub const MAX_AUXILIARY_QUERIES: usize = 3;

/// Main query plus the auxiliary queries narrowing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub main_query: String,
    pub auxiliary_queries: Vec<String>,
}

/// Split a decomposition answer into task prompts
pub fn split_tasks(response: &str) -> Vec<String> {
    response
        .split(TASK_SEPARATOR)
        .map(str::trim)
        .filter(|task| !task.is_empty())
        .map(String::from)
        .collect()
}

/// Split a keyword answer into queries; multi-word keywords arrive `+`-joined
pub fn split_queries(response: &str) -> Vec<String> {
    response.split_whitespace().map(String::from).collect()
}

pub struct QueryPlanner {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<PromptLibrary>,
}

impl QueryPlanner {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<PromptLibrary>) -> Self {
        Self { llm, prompts }
    }

    async fn ask(&self, instruction: String) -> PipelineResult<String> {
        Ok(self.llm.complete(vec![ChatMessage::user(instruction)]).await?)
    }

    /// Independent task prompts contained in `prompt`
    ///
    /// An answer with no usable task falls back to the prompt itself.
    pub async fn decompose(&self, prompt: &str) -> PipelineResult<Vec<String>> {
        let response = self.ask(self.prompts.decompose(prompt)?).await?;
        let mut tasks = split_tasks(&response);
        if tasks.is_empty() {
            debug!("Decomposition returned no tasks, using the prompt as the only task");
            tasks.push(prompt.trim().to_string());
        }

        info!("Decomposed prompt into {} task(s)", tasks.len());
        Ok(tasks)
    }

    /// Main query and up to three auxiliary queries for one task
    pub async fn plan(&self, task: &str) -> PipelineResult<QueryPlan> {
        let response = self.ask(self.prompts.plan(task)?).await?;
        let mut queries = split_queries(&response).into_iter();

        let Some(main_query) = queries.next() else {
            return Err(upstream_error!(
                "llm",
                format!("Empty query plan for task '{}'", task),
                "planner"
            )
            .into());
        };
        let auxiliary_queries: Vec<String> = queries.take(MAX_AUXILIARY_QUERIES).collect();

        info!(
            "Planned main query '{}' with {} auxiliary queries",
            main_query,
            auxiliary_queries.len()
        );
        Ok(QueryPlan {
            main_query,
            auxiliary_queries,
        })
    }

    /// Further auxiliary queries derived from an interim summary; may be empty
    pub async fn expand(&self, task: &str, summary: &str) -> PipelineResult<Vec<String>> {
        let response = self.ask(self.prompts.expand(task, summary)?).await?;
        let mut queries = split_queries(&response);
        queries.truncate(MAX_AUXILIARY_QUERIES);

        debug!("Expanded task '{}' into {:?}", task, queries);
        Ok(queries)
    }
}
