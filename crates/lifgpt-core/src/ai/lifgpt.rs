use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ClientError, InferenceClient};

/// Path appended to the configured route.
pub const ENDPOINT_PATH: &str = "ai";

#[derive(Serialize)]
struct LifGptRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct LifGptResponse {
    response: String,
}

#[derive(Clone)]
pub struct LifGptClient {
    client: Client,
    base_url: String,
}

impl LifGptClient {
    /// `base_url` is used as a plain prefix: `"http://host/"` posts to
    /// `http://host/ai`, `"http://host/api-"` posts to `http://host/api-ai`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ENDPOINT_PATH)
    }

    pub async fn query(&self, prompt: &str) -> Result<String, ClientError> {
        let url = self.endpoint();
        tracing::debug!(%url, prompt_len = prompt.len(), "sending inference request");

        let response = self
            .client
            .post(&url)
            .json(&LifGptRequest { prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let parsed: LifGptResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedBody(e.to_string()))?;

        tracing::debug!(response_len = parsed.response.len(), "inference request succeeded");
        Ok(parsed.response)
    }
}

#[async_trait]
impl InferenceClient for LifGptClient {
    async fn ask(&self, prompt: &str) -> Result<String, ClientError> {
        self.query(prompt).await
    }
}
