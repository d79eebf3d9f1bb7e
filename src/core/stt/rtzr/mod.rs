//! RTZR (VITO) streaming speech recognition.
//!
//! Audio is sent as raw binary websocket frames in the encoding named in the
//! connection URL; the vendor answers with JSON recognition frames. Sending
//! the text frame `EOS` asks the vendor to flush and close the stream.

mod auth;
mod config;
mod messages;


pub use auth::{RtzrAuthClient, RtzrToken};
pub use config::{RTZR_AUTH_URL, RTZR_STT_URL, RtzrEncoding, RtzrSTTConfig};
pub use messages::{END_OF_STREAM, RtzrAlternative, RtzrMessage};
