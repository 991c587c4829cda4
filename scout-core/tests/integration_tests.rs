//! Integration tests for scout-core infrastructure

use scout_core::{
    config_error, credential_error, init_logging, invalid_parameter, upstream_error, ErrorContext,
    LogFormat, LoggingConfig, ProgressBroadcaster, ProgressEvent, ProgressStatus, Scorer,
    ScoutConfig, ScoutError,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[tokio::test]
async fn test_error_handling() {
    let error = invalid_parameter!("auxiliary queries are empty", "aux_queries", "orchestrator");

    match &error {
        ScoutError::InvalidParameter {
            message,
            parameter,
            context,
        } => {
            assert_eq!(message, "auxiliary queries are empty");
            assert_eq!(parameter.as_deref(), Some("aux_queries"));
            assert_eq!(context.component, "orchestrator");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected InvalidParameter error"),
    }

    // Should not panic
    error.log();
    assert!(error.is_fatal());

    let timeout = ScoutError::FetchTimeout {
        url: "https://example.com".to_string(),
        duration_ms: 10_000,
        context: ErrorContext::new("fetch"),
    };
    assert!(timeout.is_recoverable());

    assert!(!config_error!("bad", "test").is_recoverable());
    assert!(credential_error!("tavily", "rejected", "keys").is_fatal());
    assert!(upstream_error!("llm", "status 500", "client").is_fatal());
}

#[tokio::test]
async fn test_config_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = ScoutConfig::default();
    config.rag.score_threshold = 0.6;
    config.rag.scorer = Scorer::Cosine;
    config.pipeline.options.create_debug_files = true;
    config.logging.format = LogFormat::Json;
    config.save_to_file(&path).unwrap();

    let loaded = ScoutConfig::from_file(&path).unwrap();
    assert_eq!(loaded.rag.score_threshold, 0.6);
    assert_eq!(loaded.rag.scorer, Scorer::Cosine);
    assert!(loaded.pipeline.options.create_debug_files);
    assert_eq!(loaded.logging.format, LogFormat::Json);
    assert_eq!(loaded.search.max_content_chars, 150_000);
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[llm]\nmodel = \"deepseek-reasoner\"\n").unwrap();

    let config = ScoutConfig::from_file(&path).unwrap();
    assert_eq!(config.llm.model, "deepseek-reasoner");
    assert_eq!(config.llm.base_url, "https://api.deepseek.com/v1");
    assert_eq!(config.rag.chunk_size, 600);
    assert_eq!(config.pipeline.corpus_budget_chars, 600_000);
    config.validate().unwrap();
}

#[tokio::test]
async fn test_config_errors() {
    let missing = ScoutConfig::from_file("/definitely/not/here.toml");
    assert!(matches!(missing, Err(ScoutError::Config { .. })));

    let fallback = ScoutConfig::load_or_default("/definitely/not/here.toml").unwrap();
    assert_eq!(fallback.embedding.batch_size, 30);

    let mut config = ScoutConfig::default();
    config.rag.chunk_overlap = config.rag.chunk_size;
    assert!(matches!(config.validate(), Err(ScoutError::Config { .. })));

    let mut config = ScoutConfig::default();
    config.rag.scorer = Scorer::Cosine;
    config.rag.score_threshold = 6.0;
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        include_thread: false,
        enable_performance_monitoring: false,
        filter_directives: vec!["scout_core=debug".to_string()],
    };

    // A subscriber may already be installed by another test in this process
    let _ = init_logging(&config);
}

#[tokio::test]
async fn test_broadcaster_shared_across_tasks() {
    let broadcaster = Arc::new(ProgressBroadcaster::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    broadcaster.add_listener(move |event: &ProgressEvent| {
        sink.lock().unwrap().push((event.status(), event.progress()))
    });

    let publisher = Arc::clone(&broadcaster);
    tokio::spawn(async move {
        publisher.publish(ProgressEvent::new(ProgressStatus::Parsing).with_progress(0.5));
    })
    .await
    .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(ProgressStatus::Parsing, Some(0.5))]
    );
}
