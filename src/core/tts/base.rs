use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

/// Errors raised while proxying synthesized audio.
#[derive(Debug, thiserror::Error)]
pub enum TTSError {
    #[error("Vendor connection failed: {0}")]
    VendorConnectionFailure(String),
    #[error("Vendor returned status {status}: {body}")]
    VendorStatus { status: u16, body: String },
    #[error("Audio stream interrupted: {0}")]
    StreamInterrupted(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("No reply pending for {0}")]
    NoPendingReply(String),
}

/// Audio chunks as they arrive from the vendor.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, TTSError>> + Send>>;
