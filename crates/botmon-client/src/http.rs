use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

use botmon_types::LogPage;

use crate::error::{Result, SourceError};
use crate::source::{LogQuery, LogSource};
use crate::wire::{ClearResponse, ErrorBody, LogsResponse};

/// Path of the monitor endpoint relative to the service base URL
const MONITOR_PATH: &str = "api/monitor";

/// Longest error body echoed back in a `Server` error
const MAX_ERROR_BODY: usize = 200;

/// Log source backed by the agent service's HTTP monitor endpoint
#[derive(Clone, Debug)]
pub struct HttpLogSource {
    http: Client,
    endpoint: Url,
}

impl HttpLogSource {
    /// Create a client for the service at `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = monitor_endpoint(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::from_reqwest)?;

        Ok(Self { http, endpoint })
    }

    /// The resolved monitor endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn query_params(query: &LogQuery) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(level) = query.level {
            params.push(("level", level.as_query().to_string()));
        }
        match query.since.as_str() {
            Some(since) => params.push(("since", since.to_string())),
            None => {
                if let Some(limit) = query.limit {
                    params.push(("limit", limit.to_string()));
                }
            }
        }
        params
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn query_logs(&self, query: &LogQuery) -> Result<LogPage> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(SourceError::from_reqwest)?;
        if !status.is_success() {
            return Err(server_error(status, &body));
        }

        let parsed: LogsResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Protocol(e.to_string()))?;
        let page = parsed.into_page(query.is_full())?;

        debug!(
            full = query.is_full(),
            records = page.records.len(),
            cursor = %page.next_cursor,
            "queried logs"
        );

        Ok(page)
    }

    async fn clear_logs(&self) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint.clone())
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(SourceError::from_reqwest)?;
        if !status.is_success() {
            return Err(server_error(status, &body));
        }

        let parsed: ClearResponse =
            serde_json::from_str(&body).map_err(|e| SourceError::Protocol(e.to_string()))?;
        if !parsed.success {
            return Err(SourceError::Rejected(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        info!(message = parsed.message.as_deref().unwrap_or(""), "service cleared logs");
        Ok(())
    }
}

/// Resolve `{base_url}/api/monitor`, keeping any path prefix on the base
fn monitor_endpoint(base_url: &str) -> Result<Url> {
    let invalid = |reason: String| SourceError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("not a hierarchical url".to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(MONITOR_PATH).map_err(|e| invalid(e.to_string()))
}

fn server_error(status: StatusCode, body: &str) -> SourceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());

    SourceError::Server {
        status: status.as_u16(),
        message,
    }
}
