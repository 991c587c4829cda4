//! Unified error handling system
//!
//! Structured error types with context and recovery hints. Only per-URL fetch
//! failures are recovered locally; everything else terminates the pipeline call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type ScoutResult<T> = Result<T, ScoutError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the scout pipeline
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Invalid credential for {service}: {message}")]
    InvalidCredential {
        service: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        message: String,
        parameter: Option<String>,
        context: ErrorContext,
    },

    #[error("Fetch timed out after {duration_ms}ms: {url}")]
    FetchTimeout {
        url: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Failed to render {url}: {message}")]
    RenderFailure {
        url: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Upstream {service} failure: {message}")]
    Upstream {
        service: String,
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl ScoutError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ScoutError::InvalidCredential { context, .. } => Some(context),
            ScoutError::InvalidParameter { context, .. } => Some(context),
            ScoutError::FetchTimeout { context, .. } => Some(context),
            ScoutError::RenderFailure { context, .. } => Some(context),
            ScoutError::Upstream { context, .. } => Some(context),
            ScoutError::Config { context, .. } => Some(context),
            ScoutError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Per-URL failures that the orchestrator downgrades to empty content
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScoutError::FetchTimeout { .. } | ScoutError::RenderFailure { .. }
        )
    }

    /// Whether the error should abort the running pipeline call
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ScoutError::InvalidCredential { .. } | ScoutError::InvalidParameter { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Rejected request"
                );
            }
            ScoutError::FetchTimeout { .. } | ScoutError::RenderFailure { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Page fetch failed (recovered as empty content)"
                );
            }
            ScoutError::Upstream { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Upstream service failure"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::ScoutError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'scout config init' to create a default config"),
        }
    };
}

#[macro_export]
macro_rules! invalid_parameter {
    ($msg:expr, $param:expr, $component:expr) => {
        $crate::ScoutError::InvalidParameter {
            message: $msg.to_string(),
            parameter: Some($param.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the argument before calling"),
        }
    };
}

#[macro_export]
macro_rules! upstream_error {
    ($service:expr, $msg:expr, $component:expr) => {
        $crate::ScoutError::Upstream {
            service: $service.to_string(),
            message: $msg.to_string(),
            status: None,
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($service:expr, $msg:expr, $component:expr, $source:expr) => {
        $crate::ScoutError::Upstream {
            service: $service.to_string(),
            message: $msg.to_string(),
            status: None,
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! credential_error {
    ($service:expr, $msg:expr, $component:expr) => {
        $crate::ScoutError::InvalidCredential {
            service: $service.to_string(),
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the API key and that the account is active"),
        }
    };
}
