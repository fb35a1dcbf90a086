use crate::api_client::ApiClient;
use crate::config::config::Config;
use crate::history::{HistoryEntry, SessionHistory};
use crate::models::{HealthStatus, QueryOutcome, QueryRequest};

/// Session-level client: the API wrapper plus the history it exclusively owns
pub struct QueryClient {
    api: ApiClient,
    history: SessionHistory,
}

impl QueryClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            history: SessionHistory::new(),
        }
    }

    /// Session client for the configured backend. Only the URL comes from the
    /// config; timeouts and the history bound are fixed.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ApiClient::new(&config.api.base_url))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Send one query. Only a successful answer is recorded in history.
    pub async fn submit_query(&mut self, request: QueryRequest) -> QueryOutcome {
        let outcome = self.api.answer(&request).await;

        if let QueryOutcome::Success(result) = &outcome {
            self.history.push(HistoryEntry::new(&request, result.clone()));
            tracing::debug!(
                target: "history",
                "Recorded query, {} of {} slots used",
                self.history.len(),
                self.history.capacity()
            );
        }

        outcome
    }

    pub async fn check_health(&self) -> HealthStatus {
        self.api.health().await
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }
}
