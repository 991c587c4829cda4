//! Ephemeral knowledge engine
//!
//! A knowledge base is rebuilt for every pipeline run: the aggregated corpus is
//! split, cleaned, embedded in fixed-size groups and then queried by
//! similarity. Nothing is persisted.

use crate::splitter::RecursiveTextSplitter;
use scout_core::{upstream_error, Embedder, Match, RagConfig, Scorer, ScoutResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Phrase pairs that mark bot-check and consent boilerplate
const BOILERPLATE_PAIRS: [(&str, &str); 3] = [
    ("enable", "javascript"),
    ("enable", "cookie"),
    ("verify", "human"),
];

/// Called after each embedded group with `(groups_done, groups_total)`
pub type BuildProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// One embedded group of chunks
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

/// All groups built from one corpus
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseSet {
    bases: Vec<KnowledgeBase>,
}

/// Something that can be ranked against a query vector
pub trait KnowledgeIndex {
    fn rank(&self, query: &[f32], scorer: Scorer, top_k: usize, threshold: f32) -> Vec<Match>;
}

impl KnowledgeBase {
    pub fn new(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Self {
        Self { chunks, vectors }
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl KnowledgeIndex for KnowledgeBase {
    /// Take the `top_k` best chunks, then keep those strictly above `threshold`
    fn rank(&self, query: &[f32], scorer: Scorer, top_k: usize, threshold: f32) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .chunks
            .iter()
            .zip(self.vectors.iter())
            .map(|(chunk, vector)| Match {
                score: scorer.score(vector, query),
                text: chunk.trim().to_string(),
            })
            .collect();

        sort_descending(&mut matches);
        matches.truncate(top_k);
        matches.retain(|m| m.score > threshold);
        matches
    }
}

impl KnowledgeBaseSet {
    pub fn new(bases: Vec<KnowledgeBase>) -> Self {
        Self { bases }
    }

    pub fn bases(&self) -> &[KnowledgeBase] {
        &self.bases
    }

    pub fn chunk_count(&self) -> usize {
        self.bases.iter().map(KnowledgeBase::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count() == 0
    }
}

impl KnowledgeIndex for KnowledgeBaseSet {
    /// Merge every group's matches, leaving five extra slots of headroom
    fn rank(&self, query: &[f32], scorer: Scorer, top_k: usize, threshold: f32) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .bases
            .iter()
            .flat_map(|base| base.rank(query, scorer, top_k, threshold))
            .collect();

        sort_descending(&mut matches);
        matches.truncate(top_k + 5);
        matches
    }
}

fn sort_descending(matches: &mut [Match]) {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Builds and queries knowledge bases over an [`Embedder`]
pub struct KnowledgeEngine {
    embedder: Arc<dyn Embedder>,
    splitter: RecursiveTextSplitter,
    config: RagConfig,
    batch_size: usize,
}

impl KnowledgeEngine {
    pub fn new(embedder: Arc<dyn Embedder>, config: RagConfig, batch_size: usize) -> Self {
        Self {
            embedder,
            splitter: RecursiveTextSplitter::new(config.chunk_size, config.chunk_overlap),
            config,
            batch_size: batch_size.max(1),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Split, normalize and filter a corpus into embeddable chunks
    pub fn prepare_chunks(&self, text: &str) -> Vec<String> {
        self.splitter
            .split_text(text)
            .into_iter()
            .map(|chunk| normalize_whitespace(&chunk))
            .filter(|chunk| chunk.chars().count() > self.config.min_chunk_chars)
            .filter(|chunk| !is_boilerplate(chunk))
            .collect()
    }

    pub async fn build(&self, text: &str) -> ScoutResult<KnowledgeBaseSet> {
        self.build_with_progress(text, None).await
    }

    /// Build a knowledge base set, embedding one group per call
    pub async fn build_with_progress(
        &self,
        text: &str,
        progress: Option<BuildProgress<'_>>,
    ) -> ScoutResult<KnowledgeBaseSet> {
        let start_time = Instant::now();
        let chunks = self.prepare_chunks(text);
        let total_groups = chunks.len().div_ceil(self.batch_size);

        info!(
            "Building knowledge base - Corpus: {} chars, Chunks: {}, Groups: {}, Model: {}",
            text.len(),
            chunks.len(),
            total_groups,
            self.embedder.model_name()
        );

        let mut bases = Vec::with_capacity(total_groups);
        for (index, group) in chunks.chunks(self.batch_size).enumerate() {
            debug!("Embedding group {}/{}", index + 1, total_groups);

            let vectors = self.embedder.embed(group.to_vec()).await?;
            if vectors.len() != group.len() {
                return Err(upstream_error!(
                    "embedding",
                    format!(
                        "Embedder returned {} vectors for {} chunks",
                        vectors.len(),
                        group.len()
                    ),
                    "knowledge"
                ));
            }
            bases.push(KnowledgeBase::new(group.to_vec(), vectors));

            if let Some(callback) = progress {
                callback(index + 1, total_groups);
            }
        }

        info!(
            "Knowledge base created - Chunks: {}, Duration: {:?}",
            chunks.len(),
            start_time.elapsed()
        );

        Ok(KnowledgeBaseSet::new(bases))
    }

    /// Embed `query` once and rank `index` against it
    pub async fn match_knowledge<K: KnowledgeIndex + ?Sized>(
        &self,
        index: &K,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> ScoutResult<Vec<Match>> {
        let vectors = self.embedder.embed(vec![query.to_string()]).await?;
        let Some(query_vector) = vectors.into_iter().next() else {
            return Err(upstream_error!(
                "embedding",
                "No embedding returned for query",
                "knowledge"
            ));
        };

        let matches = index.rank(&query_vector, self.config.scorer, top_k, threshold);
        debug!(
            "Matched query '{}' - Matches: {}, Best: {:?}",
            query,
            matches.len(),
            matches.first().map(|m| m.score)
        );

        Ok(matches)
    }
}

/// Collapse double spaces, space after newline and blank lines until stable
fn normalize_whitespace(chunk: &str) -> String {
    let mut text = chunk.to_string();
    for (from, to) in [("  ", " "), ("\n ", "\n"), ("\n\n", "\n")] {
        while text.contains(from) {
            text = text.replace(from, to);
        }
    }
    text
}

fn is_boilerplate(chunk: &str) -> bool {
    let lower = chunk.to_lowercase();
    BOILERPLATE_PAIRS
        .iter()
        .any(|(a, b)| lower.contains(a) && lower.contains(b))
}
