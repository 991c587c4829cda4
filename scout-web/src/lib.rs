//! Scout Web Server
//!
//! JSON front end over the search pipeline. One search runs at a time per
//! process; concurrent requests are rejected rather than queued.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{ScoutServer, ScoutServerBuilder};
pub use state::{AppState, ConfiguredFactory, ControllerFactory};

use axum::{
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use scout_pipeline::PipelineError;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .merge(routes::search_routes())
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("SCOUT_HOST").unwrap_or(defaults.host),
            port: std::env::var("SCOUT_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    #[error("Search in progress")]
    Busy,

    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedContentType
            | Self::Busy
            | Self::MissingParameters
            | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline(e) if e.is_invalid_credential() => StatusCode::UNAUTHORIZED,
            Self::Pipeline(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
