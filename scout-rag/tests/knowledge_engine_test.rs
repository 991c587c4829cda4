//! Knowledge engine tests against a deterministic bag-of-words embedder

use scout_core::{async_trait, Embedder, RagConfig, Scorer, ScoutResult};
use scout_rag::{KnowledgeEngine, KnowledgeIndex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const DIMENSIONS: usize = 512;

/// Hashes lowercase words into a normalized count vector
struct HashingEmbedder {
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl HashingEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: Vec<String>) -> ScoutResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

fn filler_paragraph(seed: usize) -> String {
    (0..90)
        .map(|i| format!("filler{}x{}", seed, i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn engine(embedder: Arc<HashingEmbedder>) -> KnowledgeEngine {
    KnowledgeEngine::new(embedder, RagConfig::default(), 30)
}

#[tokio::test]
async fn test_marker_sentence_ranks_first() {
    let marker = "Quokka orchestras perform zymurgy ballads beneath violet lighthouses";
    let mut paragraphs: Vec<String> = (0..12).map(filler_paragraph).collect();
    paragraphs.insert(7, format!("{} {}", filler_paragraph(99), marker));
    let corpus = paragraphs.join("\n\n");

    let embedder = Arc::new(HashingEmbedder::new());
    let engine = engine(Arc::clone(&embedder));
    let knowledge = engine.build(&corpus).await.unwrap();
    assert!(knowledge.chunk_count() > 10);

    let matches = engine
        .match_knowledge(&knowledge, marker, 10, -1.0)
        .await
        .unwrap();

    assert!(!matches.is_empty());
    assert!(matches[0].text.contains("zymurgy"));
    assert!(matches.iter().skip(1).all(|m| m.score < matches[0].score));
}

#[tokio::test]
async fn test_threshold_filters_unrelated_chunks() {
    let corpus = (0..6).map(filler_paragraph).collect::<Vec<_>>().join("\n\n");
    let embedder = Arc::new(HashingEmbedder::new());
    let engine = engine(Arc::clone(&embedder));
    let knowledge = engine.build(&corpus).await.unwrap();

    let matches = engine
        .match_knowledge(
            &knowledge,
            "completely unrelated question",
            10,
            RagConfig::default().score_threshold,
        )
        .await
        .unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_default_threshold_keeps_related_passages_for_unit_vectors() {
    let related = "Trigonometry studies sine cosine tangent angles triangles \
        and their ratios, which surveyors, astronomers and engineers apply \
        when measuring distances they cannot reach directly.";
    let corpus = [filler_paragraph(1), related.to_string(), filler_paragraph(2)].join("\n\n");
    let embedder = Arc::new(HashingEmbedder::new());
    let engine = engine(Arc::clone(&embedder));
    let knowledge = engine.build(&corpus).await.unwrap();

    let threshold = RagConfig::default().score_threshold;
    let matches = engine
        .match_knowledge(
            &knowledge,
            "trigonometry sine cosine tangent angles triangles",
            10,
            threshold,
        )
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert!(matches[0].text.contains("Trigonometry studies"));
    assert!(matches[0].score > threshold && matches[0].score < 0.81);
}

#[tokio::test]
async fn test_groups_of_thirty_with_progress() {
    let corpus = (0..80).map(filler_paragraph).collect::<Vec<_>>().join("\n\n");
    let embedder = Arc::new(HashingEmbedder::new());
    let engine = engine(Arc::clone(&embedder));

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let callback = move |done: usize, total: usize| sink.lock().unwrap().push((done, total));

    let knowledge = engine
        .build_with_progress(&corpus, Some(&callback))
        .await
        .unwrap();

    let sizes = embedder.batch_sizes.lock().unwrap().clone();
    assert!(sizes.len() > 1);
    assert!(sizes.iter().all(|&n| n <= 30));
    assert_eq!(sizes.iter().sum::<usize>(), knowledge.chunk_count());
    assert_eq!(knowledge.bases().len(), sizes.len());

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), sizes.len());
    assert_eq!(reported.last(), Some(&(sizes.len(), sizes.len())));
}

#[tokio::test]
async fn test_short_and_boilerplate_chunks_are_dropped() {
    let embedder = Arc::new(HashingEmbedder::new());
    let engine = engine(Arc::clone(&embedder));

    let boilerplate = format!(
        "Please enable JavaScript and reload. {}",
        "This site requires scripts to render its article listing. ".repeat(3)
    );
    let corpus = format!("tiny\n\n{}\n\n{}", boilerplate, filler_paragraph(1));

    let chunks = engine.prepare_chunks(&corpus);
    assert!(chunks.iter().all(|c| c.chars().count() > 100));
    assert!(chunks.iter().all(|c| !c.to_lowercase().contains("enable javascript")));
    assert!(chunks.iter().any(|c| c.contains("filler1x0")));
}

#[tokio::test]
async fn test_empty_corpus_builds_empty_set() {
    let embedder = Arc::new(HashingEmbedder::new());
    let engine = engine(Arc::clone(&embedder));

    let knowledge = engine.build("").await.unwrap();
    assert!(knowledge.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);

    let ranked = knowledge.rank(&[1.0], Scorer::DotProduct, 10, 0.0);
    assert!(ranked.is_empty());
}
