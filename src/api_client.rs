use reqwest::StatusCode;
use std::error::Error;
use std::time::Duration;

use crate::models::{AnswerResult, HealthStatus, QueryOutcome, QueryRequest};

pub const HEALTH_ROUTE: &str = "/api/health";
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin HTTP wrapper around the answer service routes.
///
/// Every call is independent and at-most-once: no retries, no caching.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    query_timeout: Duration,
    health_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Override the fixed 60s/10s timeouts. Only tests use this, to exercise
    /// the timeout path without waiting a full minute.
    pub fn with_timeouts(mut self, query_timeout: Duration, health_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self.health_timeout = health_timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// POST the request to its mode's route and decode the answer
    pub async fn answer(&self, request: &QueryRequest) -> QueryOutcome {
        if request.is_empty() {
            tracing::debug!(target: "api", "Skipping empty query");
            return QueryOutcome::Skipped;
        }

        let url = self.url(request.route());
        let payload = request.payload();
        tracing::info!(target: "api", "POST {} ({})", url, request.mode);
        tracing::debug!(target: "api", "Sending request: {}", payload);

        let response = match self
            .client
            .post(&url)
            .timeout(self.query_timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = describe_error(&e, self.query_timeout);
                tracing::warn!(target: "api", "Transport failure: {}", message);
                return QueryOutcome::TransportError(message);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let message = describe_error(&e, self.query_timeout);
                tracing::warn!(target: "api", "Failed reading response body: {}", message);
                return QueryOutcome::TransportError(message);
            }
        };

        if status != StatusCode::OK {
            tracing::warn!(target: "api", "Backend returned {}: {}", status, body);
            return QueryOutcome::BackendError(body);
        }

        match AnswerResult::from_json(&body) {
            Ok(result) => {
                tracing::info!(
                    target: "api",
                    "Answer received (confidence {}, {} citations, {} risks)",
                    result.confidence,
                    result.citations.len(),
                    result.risks.len()
                );
                QueryOutcome::Success(result)
            }
            Err(e) => {
                tracing::warn!(target: "api", "Malformed response body: {}", e);
                QueryOutcome::TransportError(format!("invalid response from backend: {}", e))
            }
        }
    }

    /// GET the health route; purely informational
    pub async fn health(&self) -> HealthStatus {
        let url = self.url(HEALTH_ROUTE);
        tracing::info!(target: "api", "GET {}", url);

        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => HealthStatus::Online,
            Ok(response) => {
                tracing::warn!(target: "api", "Health check returned {}", response.status());
                HealthStatus::Offline(response.status().as_u16())
            }
            Err(e) => {
                let message = describe_error(&e, self.health_timeout);
                tracing::warn!(target: "api", "Health check failed: {}", message);
                HealthStatus::Unreachable(message)
            }
        }
    }
}

/// Flatten a reqwest error and its source chain into one line
fn describe_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        return format!("request timed out after {:?}", timeout);
    }

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url(HEALTH_ROUTE), "http://localhost:8000/api/health");
    }

    #[test]
    fn test_default_timeouts() {
        let client = ApiClient::new("http://example.test");
        assert_eq!(client.query_timeout, Duration::from_secs(60));
        assert_eq!(client.health_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_empty_query_is_not_sent() {
        // Nothing listens here, so any request would fail rather than return Skipped
        let client = ApiClient::new("http://127.0.0.1:9");
        let request = QueryRequest::general("   ", crate::models::QuerySubtype::Both);
        assert_eq!(client.answer(&request).await, QueryOutcome::Skipped);
    }
}
