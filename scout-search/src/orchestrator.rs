//! Search & fetch orchestration
//!
//! One search call: query the provider, drop denylisted URLs, then fetch
//! every surviving page concurrently and wait for all of them before the
//! bundle is returned.

use crate::denylist::is_denylisted;
use crate::fetch::FetchWorker;
use futures::future::join_all;
use scout_core::{
    invalid_parameter, PageContent, ProgressBroadcaster, ProgressEvent, ProgressStatus,
    ScoutResult, SearchProvider, SearchResult, SearchResultBundle,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Replace spaces with `+`, the keyword joiner understood by the search API
pub fn format_query(query: &str) -> String {
    query.trim().replace(' ', "+")
}

/// Main query narrowed by one auxiliary query
pub fn auxiliary_query(main: &str, aux: &str) -> String {
    format!("{}+{}", format_query(main), format_query(aux))
}

/// Rescale a provider score in `[0, 1]` to `[0, 100]` with two decimals
pub fn rescale_score(score: f64) -> f64 {
    (score * 100.0 * 100.0).round() / 100.0
}

pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
    worker: Arc<FetchWorker>,
    progress: Arc<ProgressBroadcaster>,
    skip_low_importance: bool,
}

impl SearchOrchestrator {
    pub fn new(provider: Arc<dyn SearchProvider>, worker: Arc<FetchWorker>) -> Self {
        Self {
            provider,
            worker,
            progress: Arc::new(ProgressBroadcaster::new()),
            skip_low_importance: false,
        }
    }

    /// Suppress the per-page PARSING events
    pub fn with_skip_low_importance(mut self, skip: bool) -> Self {
        self.skip_low_importance = skip;
        self
    }

    /// Broadcaster carrying this orchestrator's events
    pub fn progress(&self) -> &Arc<ProgressBroadcaster> {
        &self.progress
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        include_content: bool,
    ) -> ScoutResult<SearchResultBundle> {
        let start_time = Instant::now();
        let query = format_query(query);

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Searching)
                .with_message(format!("Searching for query '{}'", query))
                .with_data(json!({ "query": query })),
        );

        let raw = self.provider.search(&query, max_results).await?;
        let returned = raw.results.len();

        let mut results: Vec<SearchResult> = raw
            .results
            .into_iter()
            .filter(|hit| !is_denylisted(&hit.url))
            .enumerate()
            .map(|(index, hit)| SearchResult {
                id: index + 1,
                title: hit.title,
                url: hit.url,
                snippet: hit.content,
                score: rescale_score(hit.score),
                page_content: None,
            })
            .collect();

        info!(
            "{} results found for query '{}' ({} denylisted)",
            results.len(),
            query,
            returned - results.len()
        );

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Searched)
                .with_message(format!("{} results found for query '{}'", results.len(), query))
                .with_data(json!({
                    "query": query,
                    "results": results
                        .iter()
                        .map(|r| json!({ "id": r.id, "title": r.title, "url": r.url, "score": r.score }))
                        .collect::<Vec<_>>(),
                })),
        );

        if include_content && !results.is_empty() {
            self.progress.publish(
                ProgressEvent::new(ProgressStatus::Parsing)
                    .with_message(format!("Parsing {} pages for query '{}'", results.len(), query))
                    .with_progress(0.0),
            );

            let pages = self.fetch_all(&results).await;
            for (result, page) in results.iter_mut().zip(pages) {
                result.page_content = Some(page);
            }

            self.progress.publish(
                ProgressEvent::new(ProgressStatus::Parsed)
                    .with_message(format!("Parsed pages for query '{}'", query))
                    .with_data(json!({ "query": query })),
            );
        }

        let bundle = SearchResultBundle {
            query: query.clone(),
            summary: raw.answer,
            results,
        };

        debug!(
            "Search for '{}' completed in {:?}",
            query,
            start_time.elapsed()
        );

        self.progress.publish(
            ProgressEvent::new(ProgressStatus::Completed)
                .with_message(format!("Search completed for query '{}'", query))
                .with_data(json!({ "query": query, "summary": bundle.summary })),
        );

        Ok(bundle)
    }

    /// Search each auxiliary query appended to `query`, optionally `query` itself first
    pub async fn search_many(
        &self,
        query: &str,
        aux_queries: &[String],
        include_content: bool,
        include_main: bool,
        max_results_each: usize,
    ) -> ScoutResult<Vec<SearchResultBundle>> {
        if aux_queries.is_empty() {
            return Err(invalid_parameter!(
                "An empty list of auxiliary queries provided",
                "aux_queries",
                "orchestrator"
            ));
        }

        let mut bundles = Vec::with_capacity(aux_queries.len() + 1);

        if include_main {
            bundles.push(self.search(query, max_results_each, include_content).await?);
        }

        for aux in aux_queries {
            let combined = auxiliary_query(query, aux);
            bundles.push(self.search(&combined, max_results_each, include_content).await?);
        }

        Ok(bundles)
    }

    /// Fetch every result concurrently; output order matches `results`
    async fn fetch_all(&self, results: &[SearchResult]) -> Vec<PageContent> {
        let total = results.len();
        let completed = AtomicUsize::new(0);

        let workers = results.iter().map(|result| {
            let completed = &completed;
            async move {
                let report = self.worker.fetch(&result.url).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                if report.timed_out {
                    self.progress.publish(
                        ProgressEvent::new(ProgressStatus::RequestTimeout)
                            .with_message(format!("Request timed out: {}", result.url))
                            .with_data(json!({ "url": result.url })),
                    );
                }

                if !self.skip_low_importance {
                    self.progress.publish(
                        ProgressEvent::new(ProgressStatus::Parsing)
                            .with_message(format!("Parsed page {}/{}: {}", done, total, result.url))
                            .with_data(json!({
                                "url": result.url,
                                "length": report.page.content.len(),
                            }))
                            .with_progress(done as f64 / total as f64),
                    );
                }

                report.page
            }
        });

        join_all(workers).await
    }
}
