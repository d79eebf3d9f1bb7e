pub mod continuation;
pub mod llm;
pub mod media;
pub mod session;
pub mod stt;
pub mod tts;
pub mod turn;
pub mod twiml;

// Re-export commonly used types for convenience
pub use continuation::{ContinuationResponder, Instruction};
pub use llm::{GeneratorError, OpenAIChatConfig, OpenAIChatGenerator, ReplyGenerator};
pub use media::{AudioChunk, AudioIngest, IngestExit, IngestSummary, MediaError, MediaEvent};
pub use session::{
    CallSession, DialogueTurn, RegistryStats, ResponseItem, Role, SessionError, SessionRegistry,
    SessionResult,
};
pub use stt::{RelaySummary, RtzrSTTConfig, STTError, SttRelay, TranscriptEvent};
pub use tts::{AudioStream, ElevenLabsTTS, ElevenLabsTTSConfig, TTSError};
pub use turn::{ContentGuard, TurnOrchestrator};
pub use twiml::{SayOptions, VoiceResponse};
