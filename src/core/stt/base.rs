/// Errors raised by the speech-to-text side of the relay.
#[derive(Debug, thiserror::Error)]
pub enum STTError {
    #[error("Vendor connection failed: {0}")]
    VendorConnectionFailure(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Recognition event decoded from a vendor frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Partial hypothesis, may still change.
    Interim(String),
    /// End of utterance.
    Final(String),
    /// The vendor closed the stream.
    Closed,
}
