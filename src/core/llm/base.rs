use std::time::Duration;

use async_trait::async_trait;

use crate::core::session::DialogueTurn;

/// Failures of a single reply generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Generator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed generator payload: {0}")]
    MalformedPayload(String),
    #[error("Generator timed out after {0:?}")]
    Timeout(Duration),
    #[error("Generator network error: {0}")]
    Network(String),
}

/// Produces the assistant's next line from the transcript so far.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// `transcript` ends with the caller turn being answered.
    async fn generate(&self, transcript: &[DialogueTurn]) -> Result<String, GeneratorError>;
}
