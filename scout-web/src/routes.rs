//! Route definitions for the Scout web server

use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Search endpoints at the root
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(handlers::search))
        .route("/deepsearch", post(handlers::deepsearch))
}

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use scout_core::ScoutConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_route() {
        let state = AppState::new(ScoutConfig::default());
        let app = api_routes().with_state(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
