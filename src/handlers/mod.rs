//! HTTP and WebSocket request handlers
//!
//! This module organizes all handlers into logical groups:
//! - `api` - Health check endpoint
//! - `twilio` - TwiML webhooks (call start and continuation long-poll)
//! - `media` - Media stream WebSocket
//! - `tts` - Streaming audio for pending replies

pub mod api;
pub mod media;
pub mod tts;
pub mod twilio;

// Re-export commonly used handlers for convenient access
pub use media::media_stream_handler;
pub use twilio::{twiml_continue, twiml_start};
