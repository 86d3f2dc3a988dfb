/// Transcription service port trait
///
/// Defines the interface for the external transcription/Q&A provider.
/// Implementation: AssemblyAI
use crate::domain::models::RemoteMeeting;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A completed transcription: provider id, raw text and speaker-attributed
/// utterances in provider order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Provider-assigned transcript id (doubles as the meeting id)
    pub id: String,

    /// Full transcript text
    pub text: String,

    /// Speaker-attributed spans, in the order the provider returned them
    pub utterances: Vec<Utterance>,
}

/// One speaker-attributed span of transcribed speech
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Speaker label as reported by the provider ("A", "1", ...)
    pub speaker: String,

    /// The transcribed text for this span
    pub text: String,
}

/// One page of the provider's transcript listing
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Listed transcripts, already stripped of user-deleted entries
    pub meetings: Vec<RemoteMeeting>,

    /// Cursor for the page before this one; `None` means the listing is
    /// exhausted
    pub before_id: Option<String>,
}

/// Port trait for the transcription provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Submit audio and block until the provider finishes transcribing it.
    /// A result without an id or without text is a `Transcription` error.
    async fn submit(&self, audio: &[u8]) -> Result<TranscriptResult>;

    /// Fetch a stored remote transcript by id
    async fn fetch(&self, transcript_id: &str) -> Result<TranscriptResult>;

    /// Run a free-text question against a stored transcript and return the
    /// textual answer
    async fn ask(&self, transcript_id: &str, prompt: &str) -> Result<String>;

    /// One backward page of the remote listing; `before_id = None` starts
    /// from the most recent transcripts
    async fn list_page(&self, before_id: Option<String>) -> Result<ListingPage>;

    /// Delete the remote transcript. Callers treat failures as best-effort.
    async fn delete_remote(&self, transcript_id: &str) -> Result<()>;
}

/// Render utterances as `"[Speaker {speaker}] {text}"` lines, one per
/// utterance, in provider order. Pure, so formatting is testable on its own.
pub fn format_transcript(utterances: &[Utterance]) -> String {
    utterances
        .iter()
        .map(|u| format!("[Speaker {}] {}", u.speaker, u.text))
        .collect::<Vec<_>>()
        .join("\n")
}
