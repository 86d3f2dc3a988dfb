/// Storage port trait
///
/// Defines the interface for the entity store. All reads exclude
/// soft-deleted rows unless `include_deleted` says otherwise; all mutations
/// commit before returning, and roll back wholesale on failure.
/// Implementation: SQLite adapter
use crate::domain::models::{Meeting, Prompt, Query, Transcript};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Port trait for storage operations
#[async_trait]
pub trait StoragePort: Send + Sync {
    // Meeting operations
    /// All meetings keyed by id
    async fn meetings(&self, include_deleted: bool) -> Result<HashMap<String, Meeting>>;

    /// Upsert by meeting id; every supplied field overwrites the stored row
    async fn upsert_meeting(&self, meeting: &Meeting) -> Result<Meeting>;

    /// Soft-delete a meeting together with its transcript and queries, as
    /// one atomic operation. Idempotent: deleting twice re-stamps the time.
    async fn soft_delete_meeting(&self, id: &str) -> Result<()>;

    // Transcript operations
    /// All transcripts keyed by meeting id
    async fn transcripts(&self, include_deleted: bool) -> Result<HashMap<String, Transcript>>;

    /// Get the transcript for one meeting, tombstoned or not
    async fn transcript(&self, meeting_id: &str) -> Result<Option<Transcript>>;

    /// Upsert by meeting id (at most one transcript per meeting)
    async fn upsert_transcript(&self, transcript: &Transcript) -> Result<Transcript>;

    // Prompt operations
    /// All prompts keyed by id
    async fn prompts(&self, include_deleted: bool) -> Result<HashMap<i64, Prompt>>;

    /// Get a single prompt by id
    async fn prompt(&self, id: i64) -> Result<Option<Prompt>>;

    /// Find a prompt by name; names are not unique, the lowest-id match wins
    async fn prompt_by_name(&self, name: &str) -> Result<Option<Prompt>>;

    /// Create a new prompt
    async fn create_prompt(&self, name: &str, prompt_text: &str) -> Result<Prompt>;

    /// Update an existing prompt; `NotFound` if the id does not exist
    async fn update_prompt(&self, id: i64, name: &str, prompt_text: &str) -> Result<Prompt>;

    /// Mark a prompt as deleted
    async fn soft_delete_prompt(&self, id: i64) -> Result<()>;

    // Query operations
    /// Live queries for a meeting, newest first (created descending, id as
    /// the tie-break)
    async fn queries_for_meeting(&self, meeting_id: &str) -> Result<Vec<Query>>;

    /// Full query history for a meeting including tombstones, newest first
    async fn query_history(&self, meeting_id: &str) -> Result<Vec<Query>>;

    /// Persist a new question/answer pair
    async fn store_query(&self, meeting_id: &str, question: &str, answer: &str) -> Result<Query>;

    /// Partial update: `None` (or empty) leaves the stored field untouched;
    /// `NotFound` if the id does not exist
    async fn update_query(
        &self,
        id: i64,
        question: Option<&str>,
        answer: Option<&str>,
    ) -> Result<Query>;

    /// Mark a query as deleted
    async fn soft_delete_query(&self, id: i64) -> Result<()>;

    // Reconciliation support
    /// Write a batch of meeting and transcript upserts in one transaction;
    /// any failure rolls back the entire batch.
    async fn apply_sync_batch(
        &self,
        meetings: &[Meeting],
        transcripts: &[Transcript],
    ) -> Result<()>;
}
