use std::time::Duration;

use anyhow::{bail, Result};

use taskscope_api::{ActivityResponse, HealthResponse};

/// Typed HTTP client for the taskscope activity API.
///
/// Every request carries the client-wide timeout, so a hung fetch cannot
/// stall the next scheduled poll tick.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/health")).send().await?;
        parse_response(resp).await
    }

    /// Fetch the activity delta for a task since the given cursor.
    ///
    /// Safe to repeat with an unchanged cursor; the server returns no new
    /// messages in that case.
    pub async fn task_activity(&self, task_id: &str, since: u64) -> Result<ActivityResponse> {
        let resp = self
            .client
            .get(self.url(&format!("/tasks/{task_id}/activity")))
            .query(&[("since", since)])
            .send()
            .await?;
        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("{status}: {body}");
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::ApiClient;
    use std::time::Duration;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.url("/tasks/abc/activity"),
            "http://localhost:8080/api/tasks/abc/activity"
        );
    }
}
