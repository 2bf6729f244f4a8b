//! External collaborators: the image host and the completion service.
//!
//! Both are plain HTTP calls bounded by a 30 second client timeout, with
//! no automatic retries — a failed call surfaces as an error to the
//! caller and never partially applies local state.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::UpstreamConfig;
use crate::error::ApiError;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

fn client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(UPSTREAM_TIMEOUT).build()
}

// ----- completion service ---------------------------------------------------

#[derive(Clone)]
pub struct Advisor {
    client: Client,
    url: String,
    api_key: String,
}

impl Advisor {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: client()?,
            url: cfg.url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    /// Send a prompt to the completion service and return the generated
    /// text. Transport or status failures map to 502; a success payload
    /// with no usable text maps to 500.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, ApiError> {
        let body = json!({
            "system_instruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "maxOutputTokens": 1500,
                "temperature": 0.7,
                "topP": 0.9,
            },
        });

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::Upstream(format!("completion service error: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "completion service request failed");
            return Err(ApiError::Upstream(format!(
                "completion service returned {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|_| ApiError::Internal("malformed completion service response".into()))?;

        completion_text(&payload)
            .ok_or_else(|| ApiError::Internal("completion service returned an empty response".into()))
    }
}

/// Extract the first candidate's text from a completion payload.
fn completion_text(payload: &Value) -> Option<String> {
    let text = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?
        .trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

// ----- image host -----------------------------------------------------------

#[derive(Clone)]
pub struct ImageHost {
    client: Client,
    url: String,
    api_key: String,
}

impl ImageHost {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: client()?,
            url: cfg.url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    /// Upload image bytes and return the hosted URL.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(content_type)
            .map_err(|err| ApiError::Internal(format!("invalid upload content type: {err}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| ApiError::Upstream(format!("image host error: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "image host upload failed");
            return Err(ApiError::Upstream(format!("image host returned {status}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|_| ApiError::Internal("malformed image host response".into()))?;

        payload
            .get("secure_url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Internal("image host response missing secure_url".into()))
    }
}
