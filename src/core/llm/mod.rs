//! Reply generation for the dialogue loop.

mod base;
mod openai;

pub use base::{GeneratorError, ReplyGenerator};
pub use openai::{OPENAI_CHAT_URL, OpenAIChatConfig, OpenAIChatGenerator};
