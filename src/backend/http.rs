use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{parse_ack, parse_tree_response, OrderRequest, TreeBackend, ORDER_ENDPOINT, TREE_ENDPOINT};
use crate::error::{AppError, Result};
use crate::tree::Node;

/// HTTP client for the editor backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-2xx response into a backend error, keeping the envelope's
/// message when there is one.
fn status_error(status: reqwest::StatusCode, body: &str) -> AppError {
    match parse_ack(body) {
        Err(AppError::Backend(msg)) => AppError::Backend(format!("HTTP {}: {}", status, msg)),
        _ => AppError::Backend(format!("HTTP {}", status)),
    }
}

#[async_trait]
impl TreeBackend for HttpBackend {
    async fn fetch_tree(&self) -> Result<Node> {
        let url = self.endpoint(TREE_ENDPOINT);
        tracing::info!(url = %url, "fetching tree");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        let root = parse_tree_response(&body)?;
        tracing::info!(nodes = root.count(), "tree fetched");
        Ok(root)
    }

    async fn save_order(&self, request: &OrderRequest) -> Result<()> {
        let url = self.endpoint(ORDER_ENDPOINT);
        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        parse_ack(&body)
    }
}
