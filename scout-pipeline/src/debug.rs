//! Per-run debug records written as JSON files

use crate::error::PipelineResult;
use chrono::{DateTime, Local};
use scout_core::Match;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which pipeline strategy produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Search,
    Deepsearch,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Deepsearch => "deepsearch",
        }
    }
}

/// Evidence and answer of one finished run
#[derive(Debug, Clone, Serialize)]
pub struct DebugRecord {
    pub mode: SearchMode,
    pub prompt: String,
    pub summaries: Vec<String>,
    pub matches: Vec<Match>,
    pub evidence: String,
    pub conclusion: String,
    pub finished_at: DateTime<Local>,
}

/// Write `record` to `<dir>/<timestamp>_<mode>.json`, creating `dir` if needed
pub fn write_debug_file(dir: &Path, record: &DebugRecord) -> PipelineResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let file_name = format!(
        "{}_{}.json",
        record.finished_at.format("%Y%m%d-%H%M%S%3f"),
        record.mode.as_str()
    );
    let path = dir.join(file_name);
    std::fs::write(&path, serde_json::to_string_pretty(record)?)?;

    debug!("Wrote debug file {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_debug_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested");
        let record = DebugRecord {
            mode: SearchMode::Deepsearch,
            prompt: "What is Rust?".to_string(),
            summaries: vec!["Rust is a language".to_string()],
            matches: vec![Match {
                score: 0.9,
                text: "Rust is fast".to_string(),
            }],
            evidence: "Rust is a language\nRust is fast".to_string(),
            conclusion: "Rust is a fast language".to_string(),
            finished_at: Local::now(),
        };

        let path = write_debug_file(&dir, &record).unwrap();
        assert!(path.to_string_lossy().ends_with("_deepsearch.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["mode"], "deepsearch");
        assert_eq!(written["matches"][0]["text"], "Rust is fast");
    }
}
