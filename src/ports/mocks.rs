//! Mock implementations for testing

use crate::domain::models::{Meeting, Prompt, Query, Transcript};
use crate::error::{AppError, Result};
use crate::ports::storage::StoragePort;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory storage implementation for testing service logic without SQLite
#[derive(Clone, Default)]
pub struct MemoryStorage {
    meetings: Arc<Mutex<HashMap<String, Meeting>>>,
    transcripts: Arc<Mutex<HashMap<String, Transcript>>>,
    prompts: Arc<Mutex<HashMap<i64, Prompt>>>,
    queries: Arc<Mutex<HashMap<i64, Query>>>,
    next_id: Arc<Mutex<i64>>,
    /// When set, `apply_sync_batch` fails without writing anything
    pub fail_sync_batch: Arc<Mutex<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }
}

#[async_trait]
impl StoragePort for MemoryStorage {
    async fn meetings(&self, include_deleted: bool) -> Result<HashMap<String, Meeting>> {
        Ok(self
            .meetings
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| include_deleted || m.deleted.is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn upsert_meeting(&self, meeting: &Meeting) -> Result<Meeting> {
        self.meetings
            .lock()
            .unwrap()
            .insert(meeting.id.clone(), meeting.clone());
        Ok(meeting.clone())
    }

    async fn soft_delete_meeting(&self, id: &str) -> Result<()> {
        let now = Utc::now();
        if let Some(meeting) = self.meetings.lock().unwrap().get_mut(id) {
            meeting.deleted = Some(now);
        }
        if let Some(transcript) = self.transcripts.lock().unwrap().get_mut(id) {
            transcript.deleted = Some(now);
        }
        for query in self.queries.lock().unwrap().values_mut() {
            if query.meeting_id == id {
                query.deleted = Some(now);
            }
        }
        Ok(())
    }

    async fn transcripts(&self, include_deleted: bool) -> Result<HashMap<String, Transcript>> {
        Ok(self
            .transcripts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| include_deleted || t.deleted.is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn transcript(&self, meeting_id: &str) -> Result<Option<Transcript>> {
        Ok(self.transcripts.lock().unwrap().get(meeting_id).cloned())
    }

    async fn upsert_transcript(&self, transcript: &Transcript) -> Result<Transcript> {
        self.transcripts
            .lock()
            .unwrap()
            .insert(transcript.meeting_id.clone(), transcript.clone());
        Ok(transcript.clone())
    }

    async fn prompts(&self, include_deleted: bool) -> Result<HashMap<i64, Prompt>> {
        Ok(self
            .prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p)| include_deleted || p.deleted.is_none())
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    async fn prompt(&self, id: i64) -> Result<Option<Prompt>> {
        Ok(self.prompts.lock().unwrap().get(&id).cloned())
    }

    async fn prompt_by_name(&self, name: &str) -> Result<Option<Prompt>> {
        let prompts = self.prompts.lock().unwrap();
        let mut matches: Vec<_> = prompts.values().filter(|p| p.name == name).collect();
        matches.sort_by_key(|p| p.id);
        Ok(matches.first().map(|p| (*p).clone()))
    }

    async fn create_prompt(&self, name: &str, prompt_text: &str) -> Result<Prompt> {
        let prompt = Prompt {
            id: self.next_id(),
            name: name.to_string(),
            prompt: prompt_text.to_string(),
            deleted: None,
        };
        self.prompts.lock().unwrap().insert(prompt.id, prompt.clone());
        Ok(prompt)
    }

    async fn update_prompt(&self, id: i64, name: &str, prompt_text: &str) -> Result<Prompt> {
        let mut prompts = self.prompts.lock().unwrap();
        let prompt = prompts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {id}")))?;
        prompt.name = name.to_string();
        prompt.prompt = prompt_text.to_string();
        Ok(prompt.clone())
    }

    async fn soft_delete_prompt(&self, id: i64) -> Result<()> {
        if let Some(prompt) = self.prompts.lock().unwrap().get_mut(&id) {
            prompt.deleted = Some(Utc::now());
        }
        Ok(())
    }

    async fn queries_for_meeting(&self, meeting_id: &str) -> Result<Vec<Query>> {
        let mut queries: Vec<_> = self
            .queries
            .lock()
            .unwrap()
            .values()
            .filter(|q| q.meeting_id == meeting_id && q.deleted.is_none())
            .cloned()
            .collect();
        queries.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(queries)
    }

    async fn query_history(&self, meeting_id: &str) -> Result<Vec<Query>> {
        let mut queries: Vec<_> = self
            .queries
            .lock()
            .unwrap()
            .values()
            .filter(|q| q.meeting_id == meeting_id)
            .cloned()
            .collect();
        queries.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(queries)
    }

    async fn store_query(&self, meeting_id: &str, question: &str, answer: &str) -> Result<Query> {
        let query = Query {
            id: self.next_id(),
            meeting_id: meeting_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            created: Utc::now(),
            deleted: None,
        };
        self.queries.lock().unwrap().insert(query.id, query.clone());
        Ok(query)
    }

    async fn update_query(
        &self,
        id: i64,
        question: Option<&str>,
        answer: Option<&str>,
    ) -> Result<Query> {
        let mut queries = self.queries.lock().unwrap();
        let query = queries
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Query with id {id}")))?;
        if let Some(question) = question.filter(|q| !q.is_empty()) {
            query.question = question.to_string();
        }
        if let Some(answer) = answer.filter(|a| !a.is_empty()) {
            query.answer = answer.to_string();
        }
        Ok(query.clone())
    }

    async fn soft_delete_query(&self, id: i64) -> Result<()> {
        if let Some(query) = self.queries.lock().unwrap().get_mut(&id) {
            query.deleted = Some(Utc::now());
        }
        Ok(())
    }

    async fn apply_sync_batch(
        &self,
        meetings: &[Meeting],
        transcripts: &[Transcript],
    ) -> Result<()> {
        if *self.fail_sync_batch.lock().unwrap() {
            return Err(AppError::Database(rusqlite::Error::InvalidQuery));
        }
        for meeting in meetings {
            self.upsert_meeting(meeting).await?;
        }
        for transcript in transcripts {
            self.upsert_transcript(transcript).await?;
        }
        Ok(())
    }
}
