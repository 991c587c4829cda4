//! Pipeline controller
//!
//! Sequences planning, searching, knowledge building and synthesis for the
//! two search strategies and drives the controller's progress broadcaster.
//! Orchestrator events are forwarded while a run is active.

use crate::credentials;
use crate::debug::{write_debug_file, DebugRecord, SearchMode};
use crate::error::PipelineResult;
use crate::planner::{QueryPlan, QueryPlanner};
use crate::prompts::PromptLibrary;
use crate::synthesizer::Synthesizer;
use chrono::Local;
use scout_core::performance::measure_async;
use scout_core::{log_operation_start, log_operation_success};
use scout_core::{
    Embedder, LanguageModel, ListenerId, MarkdownConverter, Match, PageRenderer,
    PipelineConfig, ProgressBroadcaster, ProgressEvent, ProgressStatus, ScoutConfig, ScoutResult,
    SearchProvider, SearchResultBundle, StreamCallback, Task,
};
use scout_rag::{BuildProgress, ChatCompletionClient, KnowledgeEngine, SiumaiEmbedder};
use scout_search::{
    FetchWorker, Html2MdConverter, HttpRenderer, ResultsContainer, SearchOrchestrator,
    TavilyClient,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// External services the pipeline calls through
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn SearchProvider>,
    pub renderer: Arc<dyn PageRenderer>,
    pub converter: Arc<dyn MarkdownConverter>,
    pub llm: Arc<dyn LanguageModel>,
    pub embedder: Arc<dyn Embedder>,
}

impl Collaborators {
    /// Default network-backed implementations
    pub async fn from_config(config: &ScoutConfig) -> ScoutResult<Self> {
        Ok(Self {
            provider: Arc::new(TavilyClient::new(&config.search)?),
            renderer: Arc::new(HttpRenderer::new(&config.search)?),
            converter: Arc::new(Html2MdConverter),
            llm: Arc::new(ChatCompletionClient::connect(config.llm.clone()).await?),
            embedder: Arc::new(SiumaiEmbedder::new(config.embedding.clone())),
        })
    }
}

/// Removes a forwarding listener when the run ends, however it ends
struct Forwarding<'a> {
    source: &'a ProgressBroadcaster,
    id: ListenerId,
}

impl Drop for Forwarding<'_> {
    fn drop(&mut self) {
        self.source.remove_listener(self.id);
    }
}

pub struct PipelineController {
    provider: Arc<dyn SearchProvider>,
    llm: Arc<dyn LanguageModel>,
    planner: QueryPlanner,
    synthesizer: Synthesizer,
    orchestrator: SearchOrchestrator,
    engine: KnowledgeEngine,
    config: PipelineConfig,
    shallow_max_results: usize,
    progress: Arc<ProgressBroadcaster>,
}

impl PipelineController {
    pub fn new(collaborators: Collaborators, config: &ScoutConfig) -> PipelineResult<Self> {
        let prompts = Arc::new(PromptLibrary::new()?);
        let worker = FetchWorker::new(
            collaborators.renderer,
            collaborators.converter,
            config.search.max_content_chars,
        );
        let orchestrator = SearchOrchestrator::new(Arc::clone(&collaborators.provider), Arc::new(worker))
            .with_skip_low_importance(config.pipeline.options.skip_low_importance);
        let engine = KnowledgeEngine::new(
            collaborators.embedder,
            config.rag.clone(),
            config.embedding.batch_size,
        );

        Ok(Self {
            provider: collaborators.provider,
            planner: QueryPlanner::new(Arc::clone(&collaborators.llm), Arc::clone(&prompts)),
            synthesizer: Synthesizer::new(Arc::clone(&collaborators.llm), prompts),
            llm: collaborators.llm,
            orchestrator,
            engine,
            config: config.pipeline.clone(),
            shallow_max_results: config.search.max_results,
            progress: Arc::new(ProgressBroadcaster::new()),
        })
    }

    pub async fn from_config(config: &ScoutConfig) -> PipelineResult<Self> {
        let collaborators = Collaborators::from_config(config).await?;
        Self::new(collaborators, config)
    }

    /// Broadcaster carrying every pipeline event
    pub fn progress(&self) -> &Arc<ProgressBroadcaster> {
        &self.progress
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check both API keys; rejections surface as `InvalidCredential`
    pub async fn validate_keys(&self) -> PipelineResult<()> {
        credentials::validate_keys(self.provider.as_ref(), self.llm.as_ref()).await?;
        Ok(())
    }

    /// Shallow search: plan, search without page content, answer from the search summaries
    pub async fn search(
        &self,
        prompt: &str,
        on_token: Option<StreamCallback>,
    ) -> PipelineResult<String> {
        let _forwarding = self.forward_orchestrator_events(SearchMode::Search);
        let result = self.timed("search", self.run_search(prompt, on_token)).await;
        self.finish(result)
    }

    /// Deep search: decompose into tasks, gather page content, rank it and answer from the best passages
    pub async fn deepsearch(
        &self,
        prompt: &str,
        on_token: Option<StreamCallback>,
    ) -> PipelineResult<String> {
        let _forwarding = self.forward_orchestrator_events(SearchMode::Deepsearch);
        let result = self.timed("deepsearch", self.run_deepsearch(prompt, on_token)).await;
        self.finish(result)
    }

    async fn run_search(
        &self,
        prompt: &str,
        on_token: Option<StreamCallback>,
    ) -> PipelineResult<String> {
        log_operation_start!("search", prompt = prompt);
        let plan = self.plan_queries(prompt).await?;

        let bundles: Vec<SearchResultBundle> = if plan.auxiliary_queries.is_empty() {
            vec![
                self.orchestrator
                    .search(&plan.main_query, self.shallow_max_results, false)
                    .await?,
            ]
        } else {
            self.orchestrator
                .search_many(
                    &plan.main_query,
                    &plan.auxiliary_queries,
                    false,
                    true,
                    self.shallow_max_results,
                )
                .await?
        };

        let summaries: Vec<String> = bundles.iter().map(|b| b.summary.clone()).collect();
        let evidence = summaries.join("\n");

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Concluding)
                .with_message(format!("Concluding the content for the prompt '{}'", prompt))
                .with_data(json!({ "prompt": prompt, "summaries": summaries })),
        );

        let conclusion = self.synthesizer.summarize(prompt, &evidence, on_token).await?;
        let data = json!({ "prompt": prompt, "summaries": summaries, "conclusion": conclusion });

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Concluded)
                .with_message(format!("Concluded the content for the prompt '{}'", prompt))
                .with_data(data.clone()),
        );
        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Completed)
                .with_message(format!("Search completed for the prompt '{}'", prompt))
                .with_data(data),
        );

        self.write_debug(DebugRecord {
            mode: SearchMode::Search,
            prompt: prompt.to_string(),
            summaries,
            matches: Vec::new(),
            evidence,
            conclusion: conclusion.clone(),
            finished_at: Local::now(),
        });

        log_operation_success!("search", answer_chars = conclusion.len());
        Ok(conclusion)
    }

    async fn run_deepsearch(
        &self,
        prompt: &str,
        on_token: Option<StreamCallback>,
    ) -> PipelineResult<String> {
        log_operation_start!("deepsearch", prompt = prompt);

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Storming)
                .with_message(format!("Decomposing the prompt '{}' into tasks", prompt)),
        );
        let task_prompts = self.planner.decompose(prompt).await?;
        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Stormed)
                .with_message(format!("Decomposed the prompt '{}' into tasks", prompt))
                .with_data(json!({ "tasks": task_prompts })),
        );

        let mut container = ResultsContainer::new();
        let mut tasks = Vec::with_capacity(task_prompts.len());
        for task_prompt in &task_prompts {
            tasks.push(self.gather_task(task_prompt, &mut container).await?);
        }

        let matches = self.match_tasks(&container, &tasks).await?;

        let summaries = container.summaries();
        let evidence = summaries
            .iter()
            .map(String::as_str)
            .chain(matches.iter().map(|m| m.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Concluding)
                .with_message(format!(
                    "Concluding the summaries and matches for the prompt '{}'",
                    prompt
                ))
                .with_data(json!({ "prompt": prompt, "summaries": summaries, "matches": matches })),
        );

        let conclusion = self.synthesizer.summarize(prompt, &evidence, on_token).await?;
        let data = json!({
            "prompt": prompt,
            "summaries": summaries,
            "matches": matches,
            "conclusion": conclusion,
        });

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Concluded)
                .with_message(format!(
                    "Concluded the summaries and matches for the prompt '{}'",
                    prompt
                ))
                .with_data(data.clone()),
        );
        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Completed)
                .with_message(format!("Search completed for the prompt '{}'", prompt))
                .with_data(data),
        );

        self.write_debug(DebugRecord {
            mode: SearchMode::Deepsearch,
            prompt: prompt.to_string(),
            summaries,
            matches,
            evidence,
            conclusion: conclusion.clone(),
            finished_at: Local::now(),
        });

        log_operation_success!(
            "deepsearch",
            tasks = tasks.len(),
            answer_chars = conclusion.len()
        );
        Ok(conclusion)
    }

    async fn plan_queries(&self, task_prompt: &str) -> PipelineResult<QueryPlan> {
        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Storming).with_message(format!(
                "Storming the main query and auxiliary queries for '{}'",
                task_prompt
            )),
        );

        let plan = self.planner.plan(task_prompt).await?;

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Stormed)
                .with_message(format!(
                    "Stormed the main query and auxiliary queries for '{}'",
                    task_prompt
                ))
                .with_data(json!({
                    "main_query": plan.main_query,
                    "auxiliary_queries": plan.auxiliary_queries,
                })),
        );

        Ok(plan)
    }

    /// Search one task with page content, expanding it while the corpus is under budget
    async fn gather_task(
        &self,
        task_prompt: &str,
        container: &mut ResultsContainer,
    ) -> PipelineResult<Task> {
        let plan = self.plan_queries(task_prompt).await?;
        let mut task = Task::new(task_prompt, plan.main_query.as_str());

        let main_bundle = self
            .orchestrator
            .search(&plan.main_query, self.config.main_max_results, true)
            .await?;
        let mut summary = main_bundle.summary.clone();
        container.append(main_bundle);

        if !plan.auxiliary_queries.is_empty() {
            let bundles = self
                .orchestrator
                .search_many(
                    &plan.main_query,
                    &plan.auxiliary_queries,
                    true,
                    false,
                    self.config.auxiliary_max_results,
                )
                .await?;
            for bundle in &bundles {
                summary.push('\n');
                summary.push_str(&bundle.summary);
            }
            container.extend(bundles);
        }
        task.auxiliary_query_sets.push(plan.auxiliary_queries);

        let corpus_chars = container.to_text(false).chars().count();
        if corpus_chars < self.config.corpus_budget_chars {
            debug!(
                "Corpus at {} of {} chars, expanding task '{}'",
                corpus_chars, self.config.corpus_budget_chars, task_prompt
            );
            let expanded = self.planner.expand(task_prompt, &summary).await?;
            if expanded.is_empty() {
                warn!("No expansion queries for task '{}'", task_prompt);
            } else {
                let bundles = self
                    .orchestrator
                    .search_many(
                        &plan.main_query,
                        &expanded,
                        true,
                        false,
                        self.config.expansion_max_results,
                    )
                    .await?;
                container.extend(bundles);
                task.auxiliary_query_sets.push(expanded);
            }
        }

        Ok(task)
    }

    /// Build one knowledge base over the whole corpus and match every task against it
    async fn match_tasks(
        &self,
        container: &ResultsContainer,
        tasks: &[Task],
    ) -> PipelineResult<Vec<Match>> {
        self.progress.publish(
            ProgressEvent::new(ProgressStatus::KlBaseCreating)
                .with_message("Creating the knowledge base")
                .with_progress(0.0),
        );

        let on_group: BuildProgress<'_> = &|done, total| {
            self.progress.publish(
                ProgressEvent::new(ProgressStatus::KlBaseCreating)
                    .with_message(format!("Embedded group {}/{}", done, total))
                    .with_data(json!({ "current": done, "total": total }))
                    .with_progress(done as f64 / total as f64),
            );
        };
        let knowledge = self
            .timed(
                "build_knowledge",
                container.to_knowledge_base_with_progress(&self.engine, false, Some(on_group)),
            )
            .await?;

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::KlBaseCreated)
                .with_message(format!(
                    "Created the knowledge base with {} chunks",
                    knowledge.chunk_count()
                ))
                .with_data(json!({
                    "chunks": knowledge.chunk_count(),
                    "groups": knowledge.bases().len(),
                })),
        );

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::KlBaseMatching)
                .with_message("Matching the task queries against the knowledge base"),
        );

        let rag = self.engine.config();
        let mut matches = Vec::new();
        for task in tasks {
            for query in task.match_queries() {
                matches.extend(
                    self.engine
                        .match_knowledge(&knowledge, &query, rag.top_k, rag.score_threshold)
                        .await?,
                );
            }
        }

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::KlBaseMatched)
                .with_message(format!("Matched {} passages", matches.len()))
                .with_data(json!({ "matches": matches.len() })),
        );

        Ok(matches)
    }

    /// Republish orchestrator events on the controller's broadcaster for the current run
    fn forward_orchestrator_events(&self, mode: SearchMode) -> Forwarding<'_> {
        let target = Arc::clone(&self.progress);
        let id = self.orchestrator.progress().add_listener(move |event| {
            let status = match event.status() {
                status @ (ProgressStatus::Searching
                | ProgressStatus::Searched
                | ProgressStatus::Parsing
                | ProgressStatus::Parsed
                | ProgressStatus::RequestTimeout) => status,
                ProgressStatus::Completed if mode == SearchMode::Deepsearch => {
                    ProgressStatus::PartCompleted
                }
                _ => return,
            };
            target.publish(event.restatus(status));
        });

        Forwarding {
            source: self.orchestrator.progress(),
            id,
        }
    }

    async fn timed<F, T>(&self, operation: &str, future: F) -> T
    where
        F: Future<Output = T>,
    {
        if self.config.options.debug_enabled {
            measure_async(operation, future).await
        } else {
            future.await
        }
    }

    /// Return to IDLE whatever the outcome
    fn finish(&self, result: PipelineResult<String>) -> PipelineResult<String> {
        if let Err(e) = &result {
            e.log();
        }
        self.progress
            .publish(ProgressEvent::new(ProgressStatus::Idle).with_message("Idle"));
        result
    }

    fn write_debug(&self, record: DebugRecord) {
        if !self.config.options.create_debug_files {
            return;
        }
        if let Err(e) = write_debug_file(&self.config.debug_dir, &record) {
            warn!("Failed to write debug file: {}", e);
        }
    }
}
