//! Telephony media stream handling: the wire codec and the ingest loop.

pub mod ingest;
pub mod messages;

pub use ingest::{AudioIngest, IngestExit, IngestSummary};
pub use messages::{
    AudioChunk, InboundFrame, MULAW_ENCODING, MediaError, MediaEvent, MediaFormat, MediaPayload,
    StartMetadata, TELEPHONY_SAMPLE_RATE,
};
