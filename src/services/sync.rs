//! Local/remote reconciliation
//!
//! The provider's listing is the source of truth for provider-managed fields
//! (created, status, transcript existence); the local store owns the
//! user-curated fields (name, date). A merge overwrites the former, never
//! the latter, so re-syncing cannot clobber user edits.
//!
//! The merge is computed as a pure plan first and persisted as one batch,
//! so a failure anywhere leaves the local store exactly as it was.

use crate::domain::models::{Meeting, RemoteMeeting, Transcript};
use crate::error::{AppError, Result};
use crate::ports::storage::StoragePort;
use crate::ports::transcription::{format_transcript, TranscriptionPort};
use std::collections::{HashMap, HashSet};

/// The writes one merge run wants to perform
#[derive(Debug, Default)]
pub struct MergePlan {
    /// Meetings to upsert (existing rows with refreshed created/status,
    /// plus placeholders for newly discovered remote meetings)
    pub meetings: Vec<Meeting>,
    /// Meeting ids whose transcript must be fetched from the provider
    pub missing_transcripts: Vec<String>,
}

/// Walk the provider's listing backward and collect every live remote
/// meeting. Terminates when a page comes back empty, carries no "before"
/// cursor, or repeats a cursor (cycle guard against a misbehaving paging
/// backend that keeps handing out fresh cursors).
pub async fn fetch_remote(
    gateway: &dyn TranscriptionPort,
) -> Result<HashMap<String, RemoteMeeting>> {
    let mut remote = HashMap::new();
    let mut seen_cursors = HashSet::new();
    let mut before_id: Option<String> = None;

    loop {
        let page = gateway
            .list_page(before_id.clone())
            .await
            .map_err(AppError::reconciliation)?;

        if page.meetings.is_empty() {
            break;
        }
        for meeting in page.meetings {
            remote.insert(meeting.id.clone(), meeting);
        }

        match page.before_id {
            Some(cursor) if seen_cursors.insert(cursor.clone()) => before_id = Some(cursor),
            _ => break,
        }
    }

    log::info!("Fetched {} remote meetings", remote.len());
    Ok(remote)
}

/// Pure merge step: decide which rows a merge would write, without touching
/// the store or the network.
pub fn plan_merge(
    local: &HashMap<String, Meeting>,
    local_transcripts: &HashMap<String, Transcript>,
    remote: &HashMap<String, RemoteMeeting>,
) -> MergePlan {
    let mut plan = MergePlan::default();

    for (id, remote_meeting) in remote {
        let meeting = match local.get(id) {
            Some(local_meeting) => {
                // name and date are user-curated, leave them alone
                let mut updated = local_meeting.clone();
                updated.created = remote_meeting.created;
                updated.status = remote_meeting.status.clone();
                updated
            }
            None => Meeting::from_remote(remote_meeting),
        };
        plan.meetings.push(meeting);

        if !local_transcripts.contains_key(id) {
            plan.missing_transcripts.push(id.clone());
        }
    }

    plan
}

/// Merge a remote snapshot into the local store. All writes land in a
/// single transaction; any failure (fetch or write) wraps as a
/// reconciliation error and nothing is persisted.
pub async fn merge(
    store: &dyn StoragePort,
    gateway: &dyn TranscriptionPort,
    remote: &HashMap<String, RemoteMeeting>,
) -> Result<()> {
    let local = store.meetings(false).await.map_err(AppError::reconciliation)?;
    let local_transcripts = store
        .transcripts(false)
        .await
        .map_err(AppError::reconciliation)?;

    let plan = plan_merge(&local, &local_transcripts, remote);

    let mut transcripts = Vec::with_capacity(plan.missing_transcripts.len());
    for meeting_id in &plan.missing_transcripts {
        let fetched = gateway
            .fetch(meeting_id)
            .await
            .map_err(AppError::reconciliation)?;
        transcripts.push(Transcript::new(
            meeting_id.clone(),
            fetched.text,
            format_transcript(&fetched.utterances),
        ));
    }

    log::info!(
        "Merging {} meetings ({} new transcripts)",
        plan.meetings.len(),
        transcripts.len()
    );

    store
        .apply_sync_batch(&plan.meetings, &transcripts)
        .await
        .map_err(AppError::reconciliation)
}
