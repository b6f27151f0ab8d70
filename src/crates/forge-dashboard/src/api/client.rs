//! reqwest implementation of [`TaskApi`]

use super::TaskApi;
use crate::config::BackendConfig;
use crate::error::{ForgeError, Result};
use crate::models::{ExecutionState, Task, TaskCreate, TaskSummary};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// HTTP client for the Forge backend
#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    origin: Url,
    api_base: Url,
    client: Client,
}

impl HttpTaskClient {
    /// Build a client from the `[backend]` configuration section
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let origin = Url::parse(&config.base_url)
            .map_err(|e| ForgeError::Config(format!("Invalid backend URL '{}': {}", config.base_url, e)))?;
        let api_base = directory(&origin)
            .join(config.api_path.trim_start_matches('/'))
            .map_err(|e| ForgeError::Config(format!("Invalid API path '{}': {}", config.api_path, e)))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self { origin, api_base, client })
    }

    /// Build a client for `base_url` with the default API path
    pub fn from_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(&BackendConfig {
            base_url: base_url.into(),
            ..BackendConfig::default()
        })
    }

    /// Origin the screenshots are served from
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Base of every task endpoint, e.g. `http://localhost:8000/api/v1`
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// `GET /health` on the backend origin
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = directory(&self.origin)
            .join("health")
            .map_err(|e| ForgeError::Other(e.to_string()))?;
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ForgeError::Config(format!("Backend URL cannot be a base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// `url` with a trailing slash, so relative joins keep any path prefix
fn directory(url: &Url) -> Url {
    let mut dir = url.clone();
    if !dir.path().ends_with('/') {
        let path = format!("{}/", dir.path());
        dir.set_path(&path);
    }
    dir
}

/// Turn non-2xx responses into [`ForgeError::Http`]
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ForgeError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TaskApi for HttpTaskClient {
    async fn list(&self) -> Result<Vec<TaskSummary>> {
        let url = self.endpoint(&["tasks"])?;
        debug!(%url, "GET task list");
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn create(&self, task: &TaskCreate) -> Result<Task> {
        let url = self.endpoint(&["tasks"])?;
        debug!(%url, name = %task.name, "POST task");
        let response = self.client.post(url).json(task).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get(&self, id: &str) -> Result<Task> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(%url, "GET task");
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(%url, "DELETE task");
        let response = self.client.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn start(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["tasks", id, "start"])?;
        debug!(%url, "POST start");
        let response = self.client.post(url).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn get_execution(&self, id: &str) -> Result<ExecutionState> {
        let url = self.endpoint(&["tasks", id, "execution"])?;
        debug!(%url, "GET execution");
        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_building() {
        let client = HttpTaskClient::from_base_url("http://10.0.0.5:9000").unwrap();
        assert_eq!(client.api_base().as_str(), "http://10.0.0.5:9000/api/v1");
        assert_eq!(
            client.endpoint(&["tasks", "abc", "execution"]).unwrap().as_str(),
            "http://10.0.0.5:9000/api/v1/tasks/abc/execution"
        );
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let client = HttpTaskClient::from_base_url("http://localhost:8000").unwrap();
        let url = client.endpoint(&["tasks", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/tasks/a%2Fb");
    }

    #[test]
    fn test_trailing_slash_on_api_path() {
        let client = HttpTaskClient::new(&BackendConfig {
            base_url: "http://localhost:8000/".into(),
            api_path: "/api/v1/".into(),
            timeout_secs: Some(5),
        })
        .unwrap();
        assert_eq!(
            client.endpoint(&["tasks"]).unwrap().as_str(),
            "http://localhost:8000/api/v1/tasks"
        );
    }

    #[test]
    fn test_base_url_path_prefix_is_kept() {
        let client = HttpTaskClient::from_base_url("http://proxy.local/forge").unwrap();
        assert_eq!(client.api_base().as_str(), "http://proxy.local/forge/api/v1");
        assert_eq!(
            client.endpoint(&["tasks", "7"]).unwrap().as_str(),
            "http://proxy.local/forge/api/v1/tasks/7"
        );
        assert_eq!(
            directory(client.origin()).join("health").unwrap().as_str(),
            "http://proxy.local/forge/health"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTaskClient::from_base_url("not a url").unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }
}
