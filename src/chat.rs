use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// The one failure the conversation knows about.
///
/// Connection errors, timeouts, non-success statuses and unusable bodies all
/// end up here. `detail` is for logs; nothing branches on it.
#[derive(Debug, Error)]
#[error("reply unavailable: {detail}")]
pub struct ReplyUnavailable {
    detail: String,
}

impl ReplyUnavailable {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

impl From<reqwest::Error> for ReplyUnavailable {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// One request/response exchange with a chat backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &str) -> Result<String, ReplyUnavailable>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: Option<String>,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for ChatClient {
    async fn send(&self, message: &str) -> Result<String, ReplyUnavailable> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReplyUnavailable::new(format!(
                "chat endpoint returned status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await?;
        body.reply
            .ok_or_else(|| ReplyUnavailable::new("response has no reply field"))
    }
}
