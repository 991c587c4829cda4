//! Pipeline-level error type

use scout_core::ScoutError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Core error: {0}")]
    Core(#[from] ScoutError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// The underlying core error, if this wraps one
    pub fn core(&self) -> Option<&ScoutError> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, Self::Core(ScoutError::InvalidCredential { .. }))
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::Core(ScoutError::InvalidParameter { .. }))
    }

    /// Log through the core error's structured logger when possible
    pub fn log(&self) {
        match self {
            Self::Core(e) => e.log(),
            other => tracing::error!(error = %other, "Pipeline error"),
        }
    }
}
