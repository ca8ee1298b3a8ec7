use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while talking to an external nutrition API.
/// Adapters turn these into an empty contribution; they never reach the caller
/// of a food search.
#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("credential not configured: {0}")]
    MissingApiKey(&'static str),
    #[error("network error: {0}")]
    NetworkError(#[source] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiConnectionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiConnectionError::Timeout
        } else {
            ApiConnectionError::NetworkError(err)
        }
    }
}

/// Builds a client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration, user_agent: Option<&str>) -> Client {
    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout);
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent.to_string());
    }
    builder.build().unwrap_or_else(|_| Client::new())
}

/// Sends `request` and decodes a successful JSON body. Non-2xx statuses and
/// undecodable bodies are errors.
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiConnectionError> {
    let response = request.send().await?;

    if response.status().is_success() {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    } else {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(ApiConnectionError::ApiError { status, error_body })
    }
}
