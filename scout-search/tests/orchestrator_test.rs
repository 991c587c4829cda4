//! Orchestrator behaviour against in-process mocks

use scout_core::{
    async_trait, ErrorContext, MarkdownConverter, PageRenderer, ProgressStatus, RawSearchHit,
    RawSearchResponse, ScoutError, ScoutResult, SearchProvider,
};
use scout_search::{is_denylisted, FetchWorker, SearchOrchestrator};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Returns a fixed hit list and records every query it sees
struct MockProvider {
    hits: Vec<RawSearchHit>,
    queries: Mutex<Vec<(String, usize)>>,
    fail: bool,
}

impl MockProvider {
    fn new(urls: &[&str]) -> Self {
        Self {
            hits: urls
                .iter()
                .map(|url| RawSearchHit {
                    title: format!("Title for {}", url),
                    url: url.to_string(),
                    content: format!("Snippet for {}", url),
                    score: 0.876543,
                })
                .collect(),
            queries: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    async fn search(&self, query: &str, max_results: usize) -> ScoutResult<RawSearchResponse> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        if self.fail {
            return Err(ScoutError::Upstream {
                service: "mock".to_string(),
                message: "HTTP 500".to_string(),
                status: Some(500),
                source: None,
                context: ErrorContext::new("mock"),
            });
        }
        Ok(RawSearchResponse {
            answer: format!("Answer for {}", query),
            results: self.hits.clone(),
        })
    }

    async fn validate_key(&self) -> ScoutResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Serves a long article, except for URLs containing "broken" or "slow"
struct MockRenderer {
    delay_ms: u64,
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, url: &str) -> ScoutResult<String> {
        if url.contains("slow") {
            tokio::time::sleep(Duration::from_millis(1_000)).await;
        } else {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        if url.contains("broken") {
            return Err(ScoutError::RenderFailure {
                url: url.to_string(),
                message: "navigation failed".to_string(),
                source: None,
                context: ErrorContext::new("mock"),
            });
        }
        let paragraphs: String = (0..15)
            .map(|i| format!("<p>Section {} of the page at {} with real content.</p>", i, url))
            .collect();
        Ok(format!("<html><body>{}</body></html>", paragraphs))
    }

    fn page_load_timeout_ms(&self) -> u64 {
        300
    }
}

struct Passthrough;

impl MarkdownConverter for Passthrough {
    fn convert(&self, html: &str) -> ScoutResult<String> {
        Ok(html.to_string())
    }
}

fn orchestrator(provider: Arc<MockProvider>, delay_ms: u64) -> SearchOrchestrator {
    let worker = FetchWorker::new(
        Arc::new(MockRenderer { delay_ms }),
        Arc::new(Passthrough),
        150_000,
    );
    SearchOrchestrator::new(provider, Arc::new(worker))
}

fn record_statuses(orchestrator: &SearchOrchestrator) -> Arc<Mutex<Vec<ProgressStatus>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    orchestrator
        .progress()
        .add_listener(move |event| sink.lock().unwrap().push(event.status()));
    seen
}

#[tokio::test]
async fn test_denylisted_urls_are_excluded() {
    let urls = [
        "https://en.wikipedia.org/wiki/Sine",
        "https://www.youtube.com/watch?v=abc",
        "https://example.org/login",
        "https://mathworld.wolfram.com/Cosine.html",
        "https://bit.ly/xyz",
    ];
    let provider = Arc::new(MockProvider::new(&urls));
    let bundle = orchestrator(Arc::clone(&provider), 0)
        .search("trigonometric functions", 10, false)
        .await
        .unwrap();

    assert_eq!(bundle.results.len(), 2);
    assert!(bundle.results.iter().all(|r| !is_denylisted(&r.url)));
    assert_eq!(
        bundle.results.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(bundle.results[0].score, 87.65);
    assert!(bundle.results.iter().all(|r| r.page_content.is_none()));
    assert_eq!(bundle.query, "trigonometric+functions");
    assert_eq!(bundle.summary, "Answer for trigonometric+functions");
}

#[tokio::test]
async fn test_failed_fetch_stays_in_bundle() {
    let urls = [
        "https://good.example.com/a",
        "https://broken.example.com/b",
        "https://slow.example.com/c",
    ];
    let provider = Arc::new(MockProvider::new(&urls));
    let orchestrator = orchestrator(provider, 0);
    let statuses = record_statuses(&orchestrator);

    let bundle = orchestrator.search("query", 10, true).await.unwrap();

    assert_eq!(bundle.results.len(), 3);
    let content = |i: usize| bundle.results[i].page_content.as_ref().unwrap();
    assert!(content(0).content.contains("Section 14"));
    assert!(content(1).is_empty());
    assert!(content(2).is_empty());

    let statuses = statuses.lock().unwrap();
    assert!(statuses.contains(&ProgressStatus::RequestTimeout));
    assert_eq!(statuses.last(), Some(&ProgressStatus::Completed));
}

#[tokio::test]
async fn test_pages_are_fetched_concurrently() {
    let urls: Vec<String> = (0..6).map(|i| format!("https://site{}.example.com/", i)).collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let provider = Arc::new(MockProvider::new(&url_refs));

    let start = Instant::now();
    let bundle = orchestrator(provider, 150)
        .search("query", 10, true)
        .await
        .unwrap();

    assert_eq!(bundle.results.len(), 6);
    assert!(bundle
        .results
        .iter()
        .all(|r| !r.page_content.as_ref().unwrap().is_empty()));
    // Sequential fetching would need at least 900ms
    assert!(start.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_progress_sequence_with_content() {
    let provider = Arc::new(MockProvider::new(&["https://a.example.com", "https://b.example.com"]));
    let orchestrator = orchestrator(provider, 0);
    let statuses = record_statuses(&orchestrator);

    orchestrator.search("query", 10, true).await.unwrap();

    assert_eq!(
        *statuses.lock().unwrap(),
        vec![
            ProgressStatus::Searching,
            ProgressStatus::Searched,
            ProgressStatus::Parsing,
            ProgressStatus::Parsing,
            ProgressStatus::Parsing,
            ProgressStatus::Parsed,
            ProgressStatus::Completed,
        ]
    );
    assert_eq!(orchestrator.progress().current().status(), ProgressStatus::Completed);
}

#[tokio::test]
async fn test_skip_low_importance_hides_per_page_events() {
    let provider = Arc::new(MockProvider::new(&["https://a.example.com", "https://b.example.com"]));
    let orchestrator = orchestrator(provider, 0).with_skip_low_importance(true);
    let statuses = record_statuses(&orchestrator);

    orchestrator.search("query", 10, true).await.unwrap();

    let parsing = statuses
        .lock()
        .unwrap()
        .iter()
        .filter(|s| **s == ProgressStatus::Parsing)
        .count();
    assert_eq!(parsing, 1);
}

#[tokio::test]
async fn test_search_many_builds_combined_queries() {
    let provider = Arc::new(MockProvider::new(&["https://a.example.com"]));
    let orchestrator = orchestrator(Arc::clone(&provider), 0);

    let aux = vec!["members list".to_string(), " debut ".to_string()];
    let bundles = orchestrator
        .search_many("IVE kpop", &aux, false, true, 15)
        .await
        .unwrap();

    assert_eq!(bundles.len(), 3);
    assert_eq!(
        *provider.queries.lock().unwrap(),
        vec![
            ("IVE+kpop".to_string(), 15),
            ("IVE+kpop+members+list".to_string(), 15),
            ("IVE+kpop+debut".to_string(), 15),
        ]
    );

    let without_main = orchestrator
        .search_many("IVE", &aux, false, false, 5)
        .await
        .unwrap();
    assert_eq!(without_main.len(), 2);
}

#[tokio::test]
async fn test_search_many_rejects_empty_aux_queries() {
    let provider = Arc::new(MockProvider::new(&[]));
    let result = orchestrator(Arc::clone(&provider), 0)
        .search_many("query", &[], true, true, 10)
        .await;

    assert!(matches!(result, Err(ScoutError::InvalidParameter { .. })));
    assert!(provider.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_failure_aborts() {
    let result = orchestrator(Arc::new(MockProvider::failing()), 0)
        .search("query", 10, true)
        .await;

    assert!(matches!(
        result,
        Err(ScoutError::Upstream {
            status: Some(500),
            ..
        })
    ));
}
