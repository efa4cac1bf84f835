pub mod lifgpt;

pub use lifgpt::LifGptClient;

use async_trait::async_trait;

/// Errors from a single inference request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference request failed with status: {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// Anything that can answer a prompt.
///
/// The session controller only talks to the backend through this trait, so
/// tests and alternative transports can stand in for [`LifGptClient`].
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, ClientError>;
}
