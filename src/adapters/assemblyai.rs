//! AssemblyAI transcription service adapter
//!
//! Implements the TranscriptionPort for AssemblyAI's API.
//! API flow for a submission:
//! 1. Upload audio bytes to AssemblyAI
//! 2. Submit transcription request with diarization + language detection
//! 3. Poll for completion (bounded)
//! 4. Parse results with speaker labels
//!
//! Also covers the stored-transcript endpoints: fetch by id, LeMUR Q&A,
//! backward cursor-paged listing and remote deletion.

use crate::config::AssemblyAiConfig;
use crate::domain::models::RemoteMeeting;
use crate::error::{AppError, Result};
use crate::ports::transcription::{ListingPage, TranscriptResult, TranscriptionPort, Utterance};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Listing entries with this audio_url were deleted by the user on the
/// provider side and must never reach the reconciliation engine.
const DELETED_BY_USER_MARKER: &str = "http://deleted_by_user";

/// Model used for LeMUR question answering
const LEMUR_FINAL_MODEL: &str = "anthropic/claude-3-5-sonnet";

/// AssemblyAI service implementation
pub struct AssemblyAi {
    client: Client,
    config: AssemblyAiConfig,
}

impl AssemblyAi {
    /// Create a new AssemblyAI client from configuration
    pub fn new(config: AssemblyAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Upload audio bytes and get back the provider-side audio URL
    async fn upload(&self, audio: &[u8]) -> Result<String> {
        log::info!("Uploading {} bytes of audio to AssemblyAI", audio.len());

        let response = self
            .client
            .post(self.url("/v2/upload"))
            .header("authorization", &self.config.api_key)
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("Upload request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "Upload failed: {error_text}"
            )));
        }

        let upload_response: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to parse upload response: {e}")))?;

        Ok(upload_response.upload_url)
    }

    /// Submit a transcription job for an uploaded audio URL
    async fn submit_job(&self, audio_url: &str) -> Result<String> {
        log::info!("Submitting transcription request to AssemblyAI");

        let request_body = TranscriptRequest {
            audio_url: audio_url.to_string(),
            speaker_labels: true,
            language_detection: true,
            speech_model: "best".to_string(),
        };

        let response = self
            .client
            .post(self.url("/v2/transcript"))
            .header("authorization", &self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("Submit request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "Submit failed: {error_text}"
            )));
        }

        let submit_response: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to parse submit response: {e}")))?;

        log::info!("Transcription submitted with id: {}", submit_response.id);
        Ok(submit_response.id)
    }

    async fn get_transcript(&self, transcript_id: &str) -> Result<TranscriptResponse> {
        let response = self
            .client
            .get(self.url(&format!("/v2/transcript/{transcript_id}")))
            .header("authorization", &self.config.api_key)
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("Fetch request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "Fetch failed: {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to parse transcript: {e}")))
    }

    /// Poll until the job leaves the queued/processing states. The loop is
    /// bounded; running out of attempts is a Transcription error.
    async fn poll_until_done(&self, transcript_id: &str) -> Result<TranscriptResponse> {
        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;

            let transcript = self.get_transcript(transcript_id).await?;
            match transcript.status.as_str() {
                "completed" => {
                    log::info!("Transcription {transcript_id} completed");
                    return Ok(transcript);
                }
                "error" => {
                    return Err(AppError::Transcription(format!(
                        "Transcription failed: {}",
                        transcript.error.unwrap_or_default()
                    )));
                }
                status => {
                    log::debug!(
                        "Transcription status: {status} (attempt {attempt}/{})",
                        self.config.max_poll_attempts
                    );
                }
            }
        }

        Err(AppError::Transcription(
            "Transcription timeout: exceeded maximum polling attempts".to_string(),
        ))
    }
}

/// Turn a provider transcript payload into a TranscriptResult. A payload
/// without an id is rejected; text may still be absent for in-flight jobs
/// (submission additionally requires text, see `require_text`).
fn parse_transcript(response: TranscriptResponse) -> Result<TranscriptResult> {
    if response.id.is_empty() {
        return Err(AppError::Transcription(
            "Provider returned no transcript id".to_string(),
        ));
    }
    let text = response.text.unwrap_or_default();

    let utterances = response
        .utterances
        .unwrap_or_default()
        .into_iter()
        .map(|u| Utterance {
            speaker: u.speaker,
            text: u.text,
        })
        .collect();

    Ok(TranscriptResult {
        id: response.id,
        text,
        utterances,
    })
}

/// Submission contract: a completed job must carry text
fn require_text(result: TranscriptResult) -> Result<TranscriptResult> {
    if result.text.is_empty() {
        return Err(AppError::Transcription(format!(
            "Transcript {} has no text",
            result.id
        )));
    }
    Ok(result)
}

/// Parse a listing `created` value. The listing reports either an
/// offset-bearing timestamp or a naive ISO-8601 one (assumed UTC); anything
/// else is a provider error and must abort the listing, not degrade to
/// "no timestamp" and wipe local created values on the next merge.
fn parse_created(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(created) = DateTime::parse_from_rfc3339(raw) {
        return Ok(created.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|created| created.and_utc())
        .map_err(|e| AppError::Transcription(format!("Invalid created timestamp {raw:?}: {e}")))
}

/// Turn one listing page into remote meetings, dropping user-deleted entries
fn parse_listing(response: ListResponse) -> Result<ListingPage> {
    let mut meetings = Vec::new();
    for transcript in response.transcripts {
        if transcript.audio_url.as_deref() == Some(DELETED_BY_USER_MARKER) {
            continue;
        }
        let created = transcript
            .created
            .as_deref()
            .map(parse_created)
            .transpose()?;
        meetings.push(RemoteMeeting {
            id: transcript.id,
            created,
            status: transcript.status,
        });
    }

    Ok(ListingPage {
        meetings,
        before_id: response.page_details.before_id_of_prev_url,
    })
}

#[async_trait]
impl TranscriptionPort for AssemblyAi {
    async fn submit(&self, audio: &[u8]) -> Result<TranscriptResult> {
        let audio_url = self.upload(audio).await?;
        let transcript_id = self.submit_job(&audio_url).await?;
        let transcript = self.poll_until_done(&transcript_id).await?;
        let result = require_text(parse_transcript(transcript)?)?;

        log::info!(
            "AssemblyAI transcription complete: {} utterances, {} chars",
            result.utterances.len(),
            result.text.len()
        );
        Ok(result)
    }

    async fn fetch(&self, transcript_id: &str) -> Result<TranscriptResult> {
        parse_transcript(self.get_transcript(transcript_id).await?)
    }

    async fn ask(&self, transcript_id: &str, prompt: &str) -> Result<String> {
        log::info!("Running LeMUR task against transcript {transcript_id}");

        let request_body = LemurTaskRequest {
            transcript_ids: vec![transcript_id.to_string()],
            prompt: prompt.to_string(),
            final_model: LEMUR_FINAL_MODEL.to_string(),
        };

        let response = self
            .client
            .post(self.url("/lemur/v3/generate/task"))
            .header("authorization", &self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("LeMUR request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "LeMUR task failed: {error_text}"
            )));
        }

        let task_response: LemurTaskResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to parse LeMUR response: {e}")))?;

        Ok(task_response.response)
    }

    async fn list_page(&self, before_id: Option<String>) -> Result<ListingPage> {
        let mut request = self
            .client
            .get(self.url("/v2/transcript"))
            .header("authorization", &self.config.api_key);
        if let Some(before_id) = before_id {
            request = request.query(&[("before_id", before_id.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("Listing request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "Listing failed: {error_text}"
            )));
        }

        let list_response: ListResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to parse listing: {e}")))?;

        parse_listing(list_response)
    }

    async fn delete_remote(&self, transcript_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v2/transcript/{transcript_id}")))
            .header("authorization", &self.config.api_key)
            .send()
            .await
            .map_err(|e| AppError::RemoteDelete(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteDelete(format!(
                "Delete of {transcript_id} failed: {error_text}"
            )));
        }
        Ok(())
    }
}

// ===== API Request/Response Types =====

#[derive(Debug, Serialize)]
struct TranscriptRequest {
    audio_url: String,
    speaker_labels: bool,
    language_detection: bool,
    speech_model: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    id: String,
    status: String,
    text: Option<String>,
    utterances: Option<Vec<ApiUtterance>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUtterance {
    speaker: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct LemurTaskRequest {
    transcript_ids: Vec<String>,
    prompt: String,
    final_model: String,
}

#[derive(Debug, Deserialize)]
struct LemurTaskResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    page_details: PageDetails,
    transcripts: Vec<ListedTranscript>,
}

#[derive(Debug, Deserialize)]
struct PageDetails {
    before_id_of_prev_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedTranscript {
    id: String,
    created: Option<String>,
    status: String,
    audio_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;

    #[test]
    fn client_creation_uses_configured_base_url() {
        let service = AssemblyAi::new(AssemblyAiConfig::new("test_api_key".to_string())).unwrap();
        assert_eq!(
            service.url("/v2/transcript"),
            format!("{DEFAULT_BASE_URL}/v2/transcript")
        );
    }

    #[test]
    fn submission_rejects_missing_text() {
        let response: TranscriptResponse = serde_json::from_str(
            r#"{"id": "t1", "status": "completed", "text": null}"#,
        )
        .unwrap();
        // fetch tolerates the absent text, a submission result may not
        let parsed = parse_transcript(response).unwrap();
        assert_eq!(parsed.text, "");
        let err = require_text(parsed).unwrap_err();
        assert!(matches!(err, AppError::Transcription(_)));
    }

    #[test]
    fn parse_transcript_rejects_missing_id() {
        let response: TranscriptResponse =
            serde_json::from_str(r#"{"status": "completed", "text": "hi"}"#).unwrap();
        let err = parse_transcript(response).unwrap_err();
        assert!(matches!(err, AppError::Transcription(_)));
    }

    #[test]
    fn parse_transcript_keeps_utterance_order() {
        let response: TranscriptResponse = serde_json::from_str(
            r#"{
                "id": "t1",
                "status": "completed",
                "text": "hi yo",
                "utterances": [
                    {"speaker": "1", "text": "hi"},
                    {"speaker": "2", "text": "yo"}
                ]
            }"#,
        )
        .unwrap();
        let result = parse_transcript(response).unwrap();
        assert_eq!(result.utterances.len(), 2);
        assert_eq!(result.utterances[0].speaker, "1");
        assert_eq!(result.utterances[1].text, "yo");
    }

    #[test]
    fn listing_filters_user_deleted_entries() {
        let response: ListResponse = serde_json::from_str(
            r#"{
                "page_details": {"before_id_of_prev_url": "t0"},
                "transcripts": [
                    {"id": "t1", "created": "2024-01-15T10:00:00+00:00", "status": "completed",
                     "audio_url": "https://cdn.assemblyai.com/upload/abc"},
                    {"id": "t2", "created": null, "status": "completed",
                     "audio_url": "http://deleted_by_user"}
                ]
            }"#,
        )
        .unwrap();
        let page = parse_listing(response).unwrap();
        assert_eq!(page.before_id.as_deref(), Some("t0"));
        assert_eq!(page.meetings.len(), 1);
        assert_eq!(page.meetings[0].id, "t1");
        assert!(page.meetings[0].created.is_some());
    }

    #[test]
    fn listing_handles_absent_created_and_cursor() {
        let response: ListResponse = serde_json::from_str(
            r#"{
                "page_details": {"before_id_of_prev_url": null},
                "transcripts": [
                    {"id": "t3", "created": null, "status": "processing", "audio_url": null}
                ]
            }"#,
        )
        .unwrap();
        let page = parse_listing(response).unwrap();
        assert!(page.before_id.is_none());
        assert!(page.meetings[0].created.is_none());
    }

    #[test]
    fn listing_accepts_naive_iso_created() {
        use chrono::{Duration, TimeZone};

        // The listing endpoint reports created without a UTC offset
        let response: ListResponse = serde_json::from_str(
            r#"{
                "page_details": {"before_id_of_prev_url": null},
                "transcripts": [
                    {"id": "t1", "created": "2024-01-15T10:00:00.700983",
                     "status": "completed", "audio_url": "https://cdn.assemblyai.com/upload/abc"}
                ]
            }"#,
        )
        .unwrap();
        let page = parse_listing(response).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
            + Duration::microseconds(700_983);
        assert_eq!(page.meetings[0].created, Some(expected));
    }

    #[test]
    fn listing_rejects_malformed_created() {
        let response: ListResponse = serde_json::from_str(
            r#"{
                "page_details": {"before_id_of_prev_url": null},
                "transcripts": [
                    {"id": "t1", "created": "yesterday", "status": "completed",
                     "audio_url": "https://cdn.assemblyai.com/upload/abc"}
                ]
            }"#,
        )
        .unwrap();
        let err = parse_listing(response).unwrap_err();
        assert!(matches!(err, AppError::Transcription(_)));
    }
}
