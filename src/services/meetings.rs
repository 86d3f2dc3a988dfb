//! Meeting orchestration service
//!
//! The façade the presentation layer talks to: submit audio, sync against
//! the provider, ask questions, delete meetings. Drives the transcription
//! gateway and writes through to the entity store.

use crate::domain::models::{Meeting, Transcript};
use crate::error::Result;
use crate::ports::storage::StoragePort;
use crate::ports::transcription::{format_transcript, TranscriptionPort};
use crate::services::sync;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// Orchestration façade over the store and the transcription gateway
pub struct MeetingService {
    storage: Arc<dyn StoragePort>,
    gateway: Arc<dyn TranscriptionPort>,
}

impl MeetingService {
    pub fn new(storage: Arc<dyn StoragePort>, gateway: Arc<dyn TranscriptionPort>) -> Self {
        Self { storage, gateway }
    }

    /// Transcribe an audio submission and persist the resulting meeting and
    /// transcript as one unit, keyed by the provider's transcript id.
    ///
    /// On transcription failure nothing is written; there are no orphan
    /// meeting rows for failed submissions.
    pub async fn create_from_audio(
        &self,
        audio: &[u8],
        name: &str,
        date: Option<NaiveDate>,
    ) -> Result<String> {
        let result = self.gateway.submit(audio).await?;
        let meeting_id = result.id.clone();

        let meeting = Meeting::new(meeting_id.clone(), name.to_string(), date);
        let transcript = Transcript::new(
            meeting_id.clone(),
            result.text,
            format_transcript(&result.utterances),
        );
        self.storage
            .apply_sync_batch(&[meeting], &[transcript])
            .await?;

        log::info!("Created meeting {meeting_id} ({name})");
        Ok(meeting_id)
    }

    /// Return the local meeting state, optionally reconciling it against
    /// the provider's remote listing first.
    pub async fn sync(&self, include_remote: bool) -> Result<HashMap<String, Meeting>> {
        if include_remote {
            let remote = sync::fetch_remote(self.gateway.as_ref()).await?;
            sync::merge(self.storage.as_ref(), self.gateway.as_ref(), &remote).await?;
        }
        self.storage.meetings(false).await
    }

    /// Ask a free-form question against a meeting's stored transcript and
    /// persist the Q&A pair. Nothing is persisted if the provider call fails.
    pub async fn ask(&self, meeting_id: &str, prompt: &str) -> Result<String> {
        let answer = self.gateway.ask(meeting_id, prompt).await?;
        self.storage.store_query(meeting_id, prompt, &answer).await?;
        Ok(answer)
    }

    /// Soft-delete a meeting locally (cascading to its transcript and
    /// queries) and delete the remote transcript best-effort. A remote
    /// failure is logged but never undoes the local delete.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<()> {
        self.storage.soft_delete_meeting(meeting_id).await?;

        if let Err(e) = self.gateway.delete_remote(meeting_id).await {
            log::warn!("Remote delete of {meeting_id} failed: {e}");
        }
        Ok(())
    }
}
