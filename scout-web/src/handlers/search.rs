//! Search and deep search handlers

use crate::{AppState, WebError, WebResult};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use scout_pipeline::SearchMode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request body; every field is required and must be non-empty
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    pub prompt: Option<String>,
    /// Search API key
    pub ts_key: Option<String>,
    /// Chat-completion API key
    pub ds_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub summary: String,
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<Json<SearchResponse>> {
    run(state, SearchMode::Search, &headers, &body).await
}

pub async fn deepsearch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<Json<SearchResponse>> {
    run(state, SearchMode::Deepsearch, &headers, &body).await
}

async fn run(
    state: AppState,
    mode: SearchMode,
    headers: &HeaderMap,
    body: &[u8],
) -> WebResult<Json<SearchResponse>> {
    if !is_json(headers) {
        return Err(WebError::UnsupportedContentType);
    }

    let _slot = state.try_begin_search().ok_or(WebError::Busy)?;

    let request: SearchRequest = serde_json::from_slice(body)?;
    let (Some(prompt), Some(search_key), Some(llm_key)) = (
        non_empty(request.prompt),
        non_empty(request.ts_key),
        non_empty(request.ds_key),
    ) else {
        return Err(WebError::MissingParameters);
    };

    info!("Starting {} for prompt '{}'", mode.as_str(), prompt);

    let controller = state.factory.create(&search_key, &llm_key).await?;
    controller.validate_keys().await?;
    controller.progress().add_listener(|event| {
        debug!(status = %event.status(), "{}", event.message().unwrap_or_default());
    });

    let summary = match mode {
        SearchMode::Search => controller.search(&prompt, None).await?,
        SearchMode::Deepsearch => controller.deepsearch(&prompt, None).await?,
    };

    Ok(Json(SearchResponse { summary }))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(is_json(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }
}
