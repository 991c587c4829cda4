//! Scout RAG - text splitting, embeddings and the in-memory knowledge engine
//!
//! Also hosts the chat-completion client used by planning and synthesis.

pub mod embeddings;
pub mod knowledge;
pub mod llm_client;
pub mod splitter;

pub use embeddings::SiumaiEmbedder;
pub use knowledge::{BuildProgress, KnowledgeBase, KnowledgeBaseSet, KnowledgeEngine, KnowledgeIndex};
pub use llm_client::ChatCompletionClient;
pub use splitter::RecursiveTextSplitter;
