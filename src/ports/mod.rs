/// Port trait definitions (interfaces)
///
/// These traits define the contracts for adapters to implement.
/// Following the ports-and-adapters (hexagonal) architecture pattern.
pub mod storage;
pub mod transcription;

#[cfg(test)]
pub mod mocks;

pub use storage::StoragePort;
pub use transcription::{
    format_transcript, ListingPage, TranscriptResult, TranscriptionPort, Utterance,
};
