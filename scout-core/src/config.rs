//! Configuration management

use crate::error::{ErrorContext, ScoutError, ScoutResult};
use crate::logging::LoggingConfig;
use crate::types::Scorer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for a scout process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Search API and page fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search API
    pub api_base_url: String,
    /// Search API key
    pub api_key: Option<String>,
    /// Results requested by a shallow search
    pub max_results: usize,
    /// Page-load bound for each fetch worker
    pub page_load_timeout_secs: u64,
    /// Hard cap on cleaned page content
    pub max_content_chars: usize,
    /// User agent sent when rendering pages
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.tavily.com".to_string(),
            api_key: None,
            max_results: 10,
            page_load_timeout_secs: 10,
            max_content_chars: 150_000,
            user_agent: "Mozilla/5.0 (compatible; scout/0.1)".to_string(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API root; `/chat/completions` is appended
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Whole-request bound, streaming included
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Embedding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name (openai)
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Chunks embedded per call
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            batch_size: 30,
        }
    }
}

/// Default match threshold, tuned for `text-embedding-3-small`
///
/// That model returns unit-norm vectors, so the dot product equals cosine
/// similarity: passages on the query's topic score roughly 0.4 to 0.7 and
/// unrelated text 0.1 to 0.3. Retune when switching `embedding.model`;
/// `BAAI/bge-m3` for instance needs about 0.81.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.4;

/// Knowledge engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Target chunk length in characters
    pub chunk_size: usize,
    /// Characters shared with the neighbouring chunk
    pub chunk_overlap: usize,
    /// Chunks at or below this length are dropped
    pub min_chunk_chars: usize,
    /// Matches kept per knowledge base
    pub top_k: usize,
    /// Minimum score, interpreted against `scorer` and the embedding model
    /// (see [`DEFAULT_SCORE_THRESHOLD`])
    pub score_threshold: f32,
    pub scorer: Scorer,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 600,
            chunk_overlap: 80,
            min_chunk_chars: 100,
            top_k: 10,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            scorer: Scorer::DotProduct,
        }
    }
}

/// Debug and progress switches handed to the pipeline controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Time each stage and log at debug level
    pub debug_enabled: bool,
    /// Suppress per-page progress events
    pub skip_low_importance: bool,
    /// Write each run's evidence and answer to `debug_dir`
    pub create_debug_files: bool,
}

/// Pipeline controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub options: PipelineOptions,
    /// Below this corpus length a deep search expands its queries once more
    pub corpus_budget_chars: usize,
    /// Results per main-query search in a deep search
    pub main_max_results: usize,
    /// Results per auxiliary query in a deep search
    pub auxiliary_max_results: usize,
    /// Results per expanded query in a deep search
    pub expansion_max_results: usize,
    /// Directory for debug files
    pub debug_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            options: PipelineOptions::default(),
            corpus_budget_chars: 600_000,
            main_max_results: 15,
            auxiliary_max_results: 15,
            expansion_max_results: 10,
            debug_dir: PathBuf::from("scout-debug"),
        }
    }
}

impl ScoutConfig {
    /// Default location, `<config dir>/scout/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scout")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScoutResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScoutError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ScoutConfig = toml::from_str(&content).map_err(|e| ScoutError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ScoutResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ScoutResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ScoutError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content).map_err(|e| ScoutError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Fill keys and model names from the environment
    ///
    /// Values already present in the file win over the environment.
    pub fn apply_env_overrides(&mut self) {
        fn env(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        if self.search.api_key.is_none() {
            self.search.api_key = env("TAVILY_API_KEY");
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = env("DEEPSEEK_API_KEY");
        }
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = env("OPENAI_API_KEY");
        }
        if let Some(model) = env("SCOUT_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = env("SCOUT_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ScoutResult<()> {
        let invalid = |message: &str, suggestion: &str| ScoutError::Config {
            message: message.to_string(),
            source: None,
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion(suggestion),
        };

        if self.rag.chunk_size == 0 {
            return Err(invalid(
                "RAG chunk_size must be greater than 0",
                "Set rag.chunk_size to a positive value",
            ));
        }

        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(invalid(
                "RAG chunk_overlap must be smaller than chunk_size",
                "Lower rag.chunk_overlap",
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(invalid(
                "Embedding batch_size must be greater than 0",
                "Set embedding.batch_size to a positive value",
            ));
        }

        if self.search.page_load_timeout_secs == 0 {
            return Err(invalid(
                "Page load timeout must be greater than 0",
                "Set search.page_load_timeout_secs to a positive value",
            ));
        }

        if self.search.max_results == 0 || self.pipeline.main_max_results == 0 {
            return Err(invalid(
                "Result limits must be greater than 0",
                "Check search.max_results and pipeline.*_max_results",
            ));
        }

        if self.rag.scorer == crate::types::Scorer::Cosine
            && !(-1.0..=1.0).contains(&self.rag.score_threshold)
        {
            return Err(invalid(
                "Cosine score_threshold must lie in [-1, 1]",
                "Lower rag.score_threshold or switch rag.scorer to dot_product",
            ));
        }

        Ok(())
    }
}
