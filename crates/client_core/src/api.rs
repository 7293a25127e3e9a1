use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use shared::{
    domain::{NewSubmission, Submission, SubmissionId},
    protocol::HealthResponse,
};
use tracing::debug;

use crate::{config::ClientSettings, error::ApiCallError, error::ConfigError};

/// Operations the page needs from the submissions service.
#[async_trait]
pub trait SubmissionsApi: Send + Sync {
    async fn submit(&self, submission: &NewSubmission) -> Result<SubmitReceipt, ApiCallError>;
    async fn list_submissions(&self) -> Result<Vec<Submission>, ApiCallError>;
    async fn get_submission(&self, id: SubmissionId) -> Result<Submission, ApiCallError>;
    async fn health(&self) -> Result<HealthResponse, ApiCallError>;
}

/// A successful submit response. The body only has to be JSON; the fields the
/// reference service sends are exposed when present.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub status: u16,
    pub body: Value,
}

impl SubmitReceipt {
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    pub fn submission(&self) -> Option<Submission> {
        self.body
            .get("submission")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpSubmissionsClient {
    http: Client,
    base_url: String,
}

impl HttpSubmissionsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl SubmissionsApi for HttpSubmissionsClient {
    async fn submit(&self, submission: &NewSubmission) -> Result<SubmitReceipt, ApiCallError> {
        let response = self
            .http
            .post(self.endpoint("submit"))
            .json(submission)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }
        let body: Value = read_json(response).await?;
        debug!(status = status.as_u16(), "submit accepted");
        Ok(SubmitReceipt {
            status: status.as_u16(),
            body,
        })
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, ApiCallError> {
        let response = self.http.get(self.endpoint("submissions")).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        read_json(response).await
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Submission, ApiCallError> {
        let response = self
            .http
            .get(self.endpoint(&format!("submission/{}", id.0)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        read_json(response).await
    }

    async fn health(&self) -> Result<HealthResponse, ApiCallError> {
        let response = self.http.get(self.endpoint("health")).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiCallError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ApiCallError::Decode(err.to_string()))
}

/// Builds the error for a non-success response, preferring the body's `error`
/// field and falling back to the bare status.
async fn rejection(response: Response) -> ApiCallError {
    let status = response.status().as_u16();
    let message = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
        .and_then(|body| body.error)
        .unwrap_or_else(|| format!("HTTP {status}"));
    ApiCallError::Rejected { status, message }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
