//! Speech-to-text: the RTZR streaming recognizer and the per-call relay.

mod base;
pub mod relay;
pub mod rtzr;

pub use base::{STTError, TranscriptEvent};
pub use relay::{RelaySummary, SttRelay};
pub use rtzr::{RTZR_AUTH_URL, RTZR_STT_URL, RtzrAuthClient, RtzrEncoding, RtzrSTTConfig};
