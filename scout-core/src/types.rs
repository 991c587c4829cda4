//! Core data type definitions

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Cleaned content of a fetched page
///
/// An empty `content` is the sentinel for "no usable content".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub url: String,
    pub content: String,
}

impl PageContent {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }

    /// Page that produced no usable content
    pub fn empty(url: impl Into<String>) -> Self {
        Self::new(url, String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based position inside its bundle
    pub id: usize,
    pub title: String,
    /// Deduplication key
    pub url: String,
    pub snippet: String,
    /// Relevance on a 0-100 scale
    pub score: f64,
    pub page_content: Option<PageContent>,
}

impl SearchResult {
    /// Text form: title, snippet and the page content when there is any
    pub fn to_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.snippet);
        if let Some(page) = self.page_content.as_ref().filter(|p| !p.is_empty()) {
            text.push('\n');
            text.push_str(&page.content);
        }
        text
    }
}

/// Output of one search API call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultBundle {
    pub query: String,
    /// The search API's own synthesized answer
    pub summary: String,
    pub results: Vec<SearchResult>,
}

impl SearchResultBundle {
    pub fn to_text(&self, include_summary: bool) -> String {
        let body = self
            .results
            .iter()
            .map(SearchResult::to_text)
            .collect::<Vec<_>>()
            .join("\n");

        if include_summary {
            format!("{}\n{}", self.summary, body)
        } else {
            body
        }
    }
}

/// An entry accumulated by the result aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultItem {
    Single(SearchResult),
    Bundle(SearchResultBundle),
}

impl From<SearchResult> for ResultItem {
    fn from(result: SearchResult) -> Self {
        ResultItem::Single(result)
    }
}

impl From<SearchResultBundle> for ResultItem {
    fn from(bundle: SearchResultBundle) -> Self {
        ResultItem::Bundle(bundle)
    }
}

/// An independently searchable sub-intent of the user's prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub prompt: String,
    pub main_query: String,
    /// Planned auxiliary queries followed by any sets regenerated from interim summaries
    pub auxiliary_query_sets: Vec<Vec<String>>,
}

impl Task {
    pub fn new(prompt: impl Into<String>, main_query: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            main_query: main_query.into(),
            auxiliary_query_sets: Vec::new(),
        }
    }

    /// Relevance queries used against the knowledge base, one per auxiliary set
    pub fn match_queries(&self) -> Vec<String> {
        self.auxiliary_query_sets
            .iter()
            .map(|set| format!("{} {}", self.main_query, set.join(" ")).trim().to_string())
            .collect()
    }
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Raw scorer output; see [`Scorer`] for its range
    pub score: f32,
    pub text: String,
}

/// Scoring function used by the knowledge engine
///
/// `DotProduct` is unnormalized: its magnitude follows the embedding norm, so a
/// threshold is only meaningful for the model it was tuned against. `Cosine`
/// is bounded to `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    #[default]
    DotProduct,
    Cosine,
}

impl Scorer {
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        match self {
            Scorer::DotProduct => dot,
            Scorer::Cosine => {
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0
                } else {
                    dot / (norm_a * norm_b)
                }
            }
        }
    }
}

/// Pipeline stage reported through progress events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    #[default]
    Idle,
    Storming,
    Stormed,
    Searching,
    Searched,
    Parsing,
    Parsed,
    KlBaseCreating,
    KlBaseCreated,
    KlBaseMatching,
    KlBaseMatched,
    Concluding,
    Concluded,
    PartCompleted,
    Completed,
    RequestTimeout,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Idle => "IDLE",
            ProgressStatus::Storming => "STORMING",
            ProgressStatus::Stormed => "STORMED",
            ProgressStatus::Searching => "SEARCHING",
            ProgressStatus::Searched => "SEARCHED",
            ProgressStatus::Parsing => "PARSING",
            ProgressStatus::Parsed => "PARSED",
            ProgressStatus::KlBaseCreating => "KL_BASE_CREATING",
            ProgressStatus::KlBaseCreated => "KL_BASE_CREATED",
            ProgressStatus::KlBaseMatching => "KL_BASE_MATCHING",
            ProgressStatus::KlBaseMatched => "KL_BASE_MATCHED",
            ProgressStatus::Concluding => "CONCLUDING",
            ProgressStatus::Concluded => "CONCLUDED",
            ProgressStatus::PartCompleted => "PART_COMPLETED",
            ProgressStatus::Completed => "COMPLETED",
            ProgressStatus::RequestTimeout => "REQUEST_TIMEOUT",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of a stage transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    status: ProgressStatus,
    message: Option<String>,
    data: Option<serde_json::Value>,
    progress: Option<f64>,
    timestamp: DateTime<Local>,
}

impl ProgressEvent {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            message: None,
            data: None,
            progress: None,
            timestamp: Local::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Fraction of the current stage, clamped to `[0, 1]`
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress.clamp(0.0, 1.0));
        self
    }

    /// Copy of this event under a different status, keeping everything else
    pub fn restatus(&self, status: ProgressStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn progress(&self) -> Option<f64> {
        self.progress
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

impl Default for ProgressEvent {
    fn default() -> Self {
        Self::new(ProgressStatus::Idle)
    }
}

/// One increment of a streamed completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamToken {
    Delta(String),
    /// Delivered exactly once, after the last delta
    End,
}

/// Chat message role for the completion collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// Raw hit as returned by a search provider, before denylisting and rescaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    /// Provider-native score, expected in `[0, 1]`
    pub score: f64,
}

/// Raw provider response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResponse {
    pub answer: String,
    pub results: Vec<RawSearchHit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, content: Option<&str>) -> SearchResult {
        SearchResult {
            id: 1,
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            snippet: format!("{} snippet", title),
            score: 50.0,
            page_content: content.map(|c| PageContent::new("https://example.com", c)),
        }
    }

    #[test]
    fn test_search_result_text_skips_empty_content() {
        assert_eq!(result("a", None).to_text(), "a\na snippet");
        assert_eq!(result("a", Some("")).to_text(), "a\na snippet");
        assert_eq!(result("a", Some("body")).to_text(), "a\na snippet\nbody");
    }

    #[test]
    fn test_bundle_text_with_summary() {
        let bundle = SearchResultBundle {
            query: "q".to_string(),
            summary: "answer".to_string(),
            results: vec![result("a", None), result("b", None)],
        };

        assert_eq!(bundle.to_text(false), "a\na snippet\nb\nb snippet");
        assert_eq!(bundle.to_text(true), "answer\na\na snippet\nb\nb snippet");
    }

    #[test]
    fn test_task_match_queries() {
        let mut task = Task::new("prompt", "rust+async");
        task.auxiliary_query_sets.push(vec!["tokio".into(), "futures".into()]);
        task.auxiliary_query_sets.push(vec![]);

        assert_eq!(
            task.match_queries(),
            vec!["rust+async tokio futures".to_string(), "rust+async".to_string()]
        );
    }

    #[test]
    fn test_scorers() {
        let a = [2.0, 0.0];
        let b = [3.0, 0.0];
        assert_eq!(Scorer::DotProduct.score(&a, &b), 6.0);
        assert!((Scorer::Cosine.score(&a, &b) - 1.0).abs() < 1e-6);
        assert_eq!(Scorer::Cosine.score(&a, &[0.0, 0.0]), 0.0);
        assert_eq!(Scorer::DotProduct.score(&a, &[1.0]), 0.0);
    }

    #[test]
    fn test_progress_status_serialization() {
        let json = serde_json::to_string(&ProgressStatus::KlBaseCreating).unwrap();
        assert_eq!(json, "\"KL_BASE_CREATING\"");
        assert_eq!(ProgressStatus::PartCompleted.to_string(), "PART_COMPLETED");
    }

    #[test]
    fn test_progress_fraction_clamped() {
        let event = ProgressEvent::new(ProgressStatus::Parsing).with_progress(1.5);
        assert_eq!(event.progress(), Some(1.0));
        assert_eq!(event.restatus(ProgressStatus::Parsed).progress(), Some(1.0));
    }
}
