//! Result aggregation across searches and tasks

use scout_core::{ResultItem, ScoutResult, SearchResult, SearchResultBundle};
use scout_rag::{BuildProgress, KnowledgeBaseSet, KnowledgeEngine};
use serde::Serialize;

/// Ordered accumulation of single results and bundles
///
/// URL is the identity of a result for the lifetime of the container.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultsContainer {
    items: Vec<ResultItem>,
}

impl ResultsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, item: impl Into<ResultItem>) {
        self.items.push(item.into());
    }

    pub fn extend<I, T>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<ResultItem>,
    {
        self.items.extend(items.into_iter().map(Into::into));
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every result in insertion order, keeping the first occurrence of each URL
    pub fn flatten(&self) -> Vec<SearchResult> {
        let mut flattened: Vec<SearchResult> = Vec::new();

        let all = self.items.iter().flat_map(|item| match item {
            ResultItem::Single(result) => std::slice::from_ref(result).iter(),
            ResultItem::Bundle(bundle) => bundle.results.iter(),
        });

        for result in all {
            if !flattened.iter().any(|seen| seen.url == result.url) {
                flattened.push(result.clone());
            }
        }

        flattened
    }

    /// All items rendered as text, joined by newlines
    pub fn to_text(&self, include_summaries: bool) -> String {
        self.items
            .iter()
            .map(|item| match item {
                ResultItem::Single(result) => result.to_text(),
                ResultItem::Bundle(bundle) => bundle.to_text(include_summaries),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The search API answers of every bundle, in insertion order
    pub fn summaries(&self) -> Vec<String> {
        self.bundles().map(|bundle| bundle.summary.clone()).collect()
    }

    pub fn bundles(&self) -> impl Iterator<Item = &SearchResultBundle> {
        self.items.iter().filter_map(|item| match item {
            ResultItem::Bundle(bundle) => Some(bundle),
            ResultItem::Single(_) => None,
        })
    }

    pub async fn to_knowledge_base(
        &self,
        engine: &KnowledgeEngine,
        include_summaries: bool,
    ) -> ScoutResult<KnowledgeBaseSet> {
        self.to_knowledge_base_with_progress(engine, include_summaries, None)
            .await
    }

    /// Build a knowledge base over [`to_text`](Self::to_text), reporting each embedded group
    pub async fn to_knowledge_base_with_progress(
        &self,
        engine: &KnowledgeEngine,
        include_summaries: bool,
        progress: Option<BuildProgress<'_>>,
    ) -> ScoutResult<KnowledgeBaseSet> {
        engine
            .build_with_progress(&self.to_text(include_summaries), progress)
            .await
    }
}
