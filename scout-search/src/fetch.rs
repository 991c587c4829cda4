//! Fetch & filter worker
//!
//! Rendering or cleaning failures never escape a worker: they are logged and
//! turned into the empty-content sentinel so the result stays in its bundle.

use crate::html::{clean_html, normalize_markdown, quality_gate, truncate_chars};
use scout_core::{
    async_trait, with_fetch_timeout, ErrorContext, MarkdownConverter, PageContent, PageRenderer,
    ScoutError, ScoutResult, SearchConfig,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Renders pages with a plain HTTP GET
pub struct HttpRenderer {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpRenderer {
    pub fn new(config: &SearchConfig) -> ScoutResult<Self> {
        let timeout_ms = config.page_load_timeout_secs * 1000;
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ScoutError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("renderer").with_operation("create_client"),
            })?;

        Ok(Self { client, timeout_ms })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> ScoutResult<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScoutError::FetchTimeout {
                    url: url.to_string(),
                    duration_ms: self.timeout_ms,
                    context: ErrorContext::new("renderer").with_operation("get"),
                }
            } else {
                ScoutError::RenderFailure {
                    url: url.to_string(),
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("renderer").with_operation("get"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::RenderFailure {
                url: url.to_string(),
                message: format!("HTTP {}", status),
                source: None,
                context: ErrorContext::new("renderer").with_operation("get"),
            });
        }

        response.text().await.map_err(|e| ScoutError::RenderFailure {
            url: url.to_string(),
            message: format!("Failed to read body: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("renderer").with_operation("read_body"),
        })
    }

    fn page_load_timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

/// What a worker produced for one URL
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub page: PageContent,
    /// The page load hit its timeout
    pub timed_out: bool,
}

/// Turns a URL into cleaned Markdown or the empty sentinel
pub struct FetchWorker {
    renderer: Arc<dyn PageRenderer>,
    converter: Arc<dyn MarkdownConverter>,
    max_chars: usize,
}

impl FetchWorker {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        converter: Arc<dyn MarkdownConverter>,
        max_chars: usize,
    ) -> Self {
        Self {
            renderer,
            converter,
            max_chars,
        }
    }

    /// Cleaned content for `url`, empty on any failure
    pub async fn fetch_and_filter(&self, url: &str) -> PageContent {
        self.fetch(url).await.page
    }

    pub async fn fetch(&self, url: &str) -> FetchReport {
        let start_time = Instant::now();
        let timeout_ms = self.renderer.page_load_timeout_ms();

        let html = match with_fetch_timeout(self.renderer.render(url), timeout_ms, url).await {
            Ok(html) => html,
            Err(e) => {
                e.log();
                return FetchReport {
                    page: PageContent::empty(url),
                    timed_out: matches!(e, ScoutError::FetchTimeout { .. }),
                };
            }
        };

        let content = match self.filter(&html) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to clean {}: {}", url, e);
                String::new()
            }
        };

        debug!(
            "Parsed content from {} - Length: {}, Duration: {:?}",
            url,
            content.len(),
            start_time.elapsed()
        );

        FetchReport {
            page: PageContent::new(url, content),
            timed_out: false,
        }
    }

    /// Clean, convert, normalize, gate and cap one HTML document
    pub fn filter(&self, html: &str) -> ScoutResult<String> {
        let body = clean_html(html)?;
        let markdown = self.converter.convert(&body)?;
        let content = quality_gate(normalize_markdown(&markdown));
        Ok(truncate_chars(content, self.max_chars))
    }
}
