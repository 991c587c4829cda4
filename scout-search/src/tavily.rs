//! Tavily search API client

use scout_core::{
    async_trait, config_error, credential_error, ErrorContext, RawSearchHit, RawSearchResponse,
    ScoutError, ScoutResult, SearchConfig, SearchProvider,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    include_answer: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

impl From<TavilySearchResponse> for RawSearchResponse {
    fn from(response: TavilySearchResponse) -> Self {
        RawSearchResponse {
            answer: response.answer.unwrap_or_default(),
            results: response
                .results
                .into_iter()
                .map(|r| RawSearchHit {
                    title: r.title,
                    url: r.url,
                    content: r.content,
                    score: r.score,
                })
                .collect(),
        }
    }
}

/// Client for `POST /search` and `GET /usage`
pub struct TavilyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TavilyClient {
    pub fn new(config: &SearchConfig) -> ScoutResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| config_error!("Tavily API key not found", "tavily"))?;

        Self::with_key(config, api_key)
    }

    /// Build a client for an explicit key, ignoring the configured one
    pub fn with_key(config: &SearchConfig, api_key: impl Into<String>) -> ScoutResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ScoutError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("tavily").with_operation("create_client"),
            })?;

        info!("Created Tavily client for {}", config.api_base_url);

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn upstream(&self, operation: &str, message: String, status: Option<u16>) -> ScoutError {
        ScoutError::Upstream {
            service: "tavily".to_string(),
            message,
            status,
            source: None,
            context: ErrorContext::new("tavily").with_operation(operation),
        }
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> ScoutResult<RawSearchResponse> {
        debug!("Tavily search: '{}' (max {})", query, max_results);

        let request = TavilySearchRequest {
            query,
            max_results,
            include_answer: "advanced",
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScoutError::Upstream {
                service: "tavily".to_string(),
                message: format!("Search request failed: {}", e),
                status: None,
                source: Some(Box::new(e)),
                context: ErrorContext::new("tavily").with_operation("search"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.upstream(
                "search",
                format!("HTTP {}: {}", status, body),
                Some(status.as_u16()),
            ));
        }

        let parsed: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| self.upstream("search", format!("Invalid response body: {}", e), None))?;

        debug!("Tavily returned {} results", parsed.results.len());
        Ok(parsed.into())
    }

    async fn validate_key(&self) -> ScoutResult<()> {
        let response = self
            .client
            .get(format!("{}/usage", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| credential_error!("tavily", format!("Key check failed: {}", e), "tavily"))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(credential_error!(
                "tavily",
                format!("Key rejected with HTTP {}", response.status()),
                "tavily"
            ))
        }
    }

    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = TavilySearchRequest {
            query: "rust+async",
            max_results: 15,
            include_answer: "advanced",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["query"], "rust+async");
        assert_eq!(json["max_results"], 15);
        assert_eq!(json["include_answer"], "advanced");
    }

    #[test]
    fn test_response_conversion_tolerates_missing_fields() {
        let body = r#"{
            "answer": null,
            "results": [
                {"title": "Tokio", "url": "https://tokio.rs", "content": "runtime", "score": 0.91234},
                {"url": "https://example.com"}
            ]
        }"#;
        let parsed: TavilySearchResponse = serde_json::from_str(body).unwrap();
        let raw: RawSearchResponse = parsed.into();

        assert_eq!(raw.answer, "");
        assert_eq!(raw.results.len(), 2);
        assert_eq!(raw.results[0].score, 0.91234);
        assert_eq!(raw.results[1].title, "");
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            TavilyClient::new(&SearchConfig::default()),
            Err(ScoutError::Config { .. })
        ));
        assert!(TavilyClient::with_key(&SearchConfig::default(), "tvly-test").is_ok());
    }
}
