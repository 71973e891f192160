//! HTTP gateway abstraction
//!
//! Trait-based seam over raw HTTP so the authentication and query flows can
//! be exercised in tests without a live Xero connection.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A raw HTTP reply: status line pieces plus the unparsed body.
///
/// Upstream error bodies are surfaced to the user verbatim, so the gateway
/// never interprets the payload itself.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Outbound HTTP operations used by the query pipeline.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// POST a form-encoded body.
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<HttpReply>;

    /// GET with arbitrary headers.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply>;
}

/// Production gateway backed by reqwest.
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn into_reply(response: reqwest::Response) -> Result<HttpReply> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = response.text().await?;
        Ok(HttpReply {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<HttpReply> {
        let response = self.client.post(url).form(fields).send().await?;
        Self::into_reply(response).await
    }

    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpReply> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?;
        Self::into_reply(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        let reply = |status| HttpReply {
            status,
            reason: String::new(),
            body: String::new(),
        };
        assert!(reply(200).is_success());
        assert!(reply(204).is_success());
        assert!(!reply(301).is_success());
        assert!(!reply(403).is_success());
        assert!(!reply(500).is_success());
    }
}
