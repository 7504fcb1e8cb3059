use std::time::Duration;

use async_trait::async_trait;
use env_feature_core::contract::CustomResourceResponse;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("failed to serialize custom resource response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build response client: {0}")]
    Client(reqwest::Error),
    #[error("failed to send custom resource response: {0}")]
    Transport(reqwest::Error),
    #[error("Error {status}: {reason}")]
    Rejected { status: u16, reason: String },
}

#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ResponseError>;
}

/// Uploads the response document to the presigned S3 URL.
#[derive(Debug, Clone)]
pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(timeout: Duration) -> Result<Self, ResponseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ResponseError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ResponseError> {
        let body = serde_json::to_vec(response)?;

        // The presigned URL is signed without a content type.
        let reply = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(ResponseError::Transport)?;

        let status = reply.status();
        if status.as_u16() >= 400 {
            return Err(ResponseError::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(())
    }
}
