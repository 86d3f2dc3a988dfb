/// SQLite storage adapter
///
/// Implements StoragePort for SQLite. Every mutating call runs inside an
/// explicit transaction that commits before the call returns; dropping the
/// transaction on an error path rolls everything back, so partial writes
/// (including partial delete cascades) are never visible to readers.
use crate::domain::models::{Meeting, Prompt, Query, Transcript};
use crate::error::{AppError, Result};
use crate::ports::storage::StoragePort;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// SQLite storage implementation
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path
    pub fn new(db_path: PathBuf) -> Result<Self> {
        Self::from_connection(Connection::open(db_path)?)
    }

    /// Create an in-memory storage (tests, scratch sessions)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Enforce the meeting/transcript/query relationships
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<()> {
        use rusqlite_migration::{Migrations, M};

        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../../migrations/001_initial.sql"
        ))]);

        let mut conn = self.conn.lock().unwrap();
        migrations
            .to_latest(&mut conn)
            .map_err(|e| AppError::Database(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?;

        Ok(())
    }

    fn upsert_meeting_tx(tx: &Transaction<'_>, meeting: &Meeting) -> Result<()> {
        tx.execute(
            "INSERT INTO meetings (id, name, date, created, status, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               date = excluded.date,
               created = excluded.created,
               status = excluded.status,
               deleted = excluded.deleted",
            params![
                meeting.id,
                meeting.name,
                meeting.date,
                meeting.created,
                meeting.status,
                meeting.deleted,
            ],
        )?;
        Ok(())
    }

    fn upsert_transcript_tx(tx: &Transaction<'_>, transcript: &Transcript) -> Result<()> {
        tx.execute(
            "INSERT INTO transcripts (meeting_id, text, formatted, deleted)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(meeting_id) DO UPDATE SET
               text = excluded.text,
               formatted = excluded.formatted,
               deleted = excluded.deleted",
            params![
                transcript.meeting_id,
                transcript.text,
                transcript.formatted,
                transcript.deleted,
            ],
        )?;
        Ok(())
    }
}

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: row.get(0)?,
        name: row.get(1)?,
        date: row.get(2)?,
        created: row.get(3)?,
        status: row.get(4)?,
        deleted: row.get(5)?,
    })
}

fn transcript_from_row(row: &Row<'_>) -> rusqlite::Result<Transcript> {
    Ok(Transcript {
        meeting_id: row.get(0)?,
        text: row.get(1)?,
        formatted: row.get(2)?,
        deleted: row.get(3)?,
    })
}

fn prompt_from_row(row: &Row<'_>) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: row.get(0)?,
        name: row.get(1)?,
        prompt: row.get(2)?,
        deleted: row.get(3)?,
    })
}

fn query_from_row(row: &Row<'_>) -> rusqlite::Result<Query> {
    Ok(Query {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        created: row.get(4)?,
        deleted: row.get(5)?,
    })
}

#[async_trait]
impl StoragePort for SqliteStorage {
    async fn meetings(&self, include_deleted: bool) -> Result<HashMap<String, Meeting>> {
        let conn = self.conn.lock().unwrap();
        let sql = if include_deleted {
            "SELECT id, name, date, created, status, deleted FROM meetings"
        } else {
            "SELECT id, name, date, created, status, deleted FROM meetings WHERE deleted IS NULL"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], meeting_from_row)?;

        let mut meetings = HashMap::new();
        for meeting in rows {
            let meeting = meeting?;
            meetings.insert(meeting.id.clone(), meeting);
        }
        Ok(meetings)
    }

    async fn upsert_meeting(&self, meeting: &Meeting) -> Result<Meeting> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::upsert_meeting_tx(&tx, meeting)?;
        tx.commit()?;
        Ok(meeting.clone())
    }

    async fn soft_delete_meeting(&self, id: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE meetings SET deleted = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        tx.execute(
            "UPDATE transcripts SET deleted = ?1 WHERE meeting_id = ?2",
            params![now, id],
        )?;
        tx.execute(
            "UPDATE queries SET deleted = ?1 WHERE meeting_id = ?2",
            params![now, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn transcripts(&self, include_deleted: bool) -> Result<HashMap<String, Transcript>> {
        let conn = self.conn.lock().unwrap();
        let sql = if include_deleted {
            "SELECT meeting_id, text, formatted, deleted FROM transcripts"
        } else {
            "SELECT meeting_id, text, formatted, deleted FROM transcripts WHERE deleted IS NULL"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], transcript_from_row)?;

        let mut transcripts = HashMap::new();
        for transcript in rows {
            let transcript = transcript?;
            transcripts.insert(transcript.meeting_id.clone(), transcript);
        }
        Ok(transcripts)
    }

    async fn transcript(&self, meeting_id: &str) -> Result<Option<Transcript>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT meeting_id, text, formatted, deleted FROM transcripts WHERE meeting_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![meeting_id], transcript_from_row)?;
        rows.next().transpose().map_err(AppError::Database)
    }

    async fn upsert_transcript(&self, transcript: &Transcript) -> Result<Transcript> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        Self::upsert_transcript_tx(&tx, transcript)?;
        tx.commit()?;
        Ok(transcript.clone())
    }

    async fn prompts(&self, include_deleted: bool) -> Result<HashMap<i64, Prompt>> {
        let conn = self.conn.lock().unwrap();
        let sql = if include_deleted {
            "SELECT id, name, prompt, deleted FROM prompts"
        } else {
            "SELECT id, name, prompt, deleted FROM prompts WHERE deleted IS NULL"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], prompt_from_row)?;

        let mut prompts = HashMap::new();
        for prompt in rows {
            let prompt = prompt?;
            prompts.insert(prompt.id, prompt);
        }
        Ok(prompts)
    }

    async fn prompt(&self, id: i64) -> Result<Option<Prompt>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, prompt, deleted FROM prompts WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], prompt_from_row)?;
        rows.next().transpose().map_err(AppError::Database)
    }

    async fn prompt_by_name(&self, name: &str) -> Result<Option<Prompt>> {
        let conn = self.conn.lock().unwrap();
        // Names are not unique; the lowest id is the stable "first match"
        let mut stmt = conn.prepare(
            "SELECT id, name, prompt, deleted FROM prompts WHERE name = ?1 ORDER BY id LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![name], prompt_from_row)?;
        rows.next().transpose().map_err(AppError::Database)
    }

    async fn create_prompt(&self, name: &str, prompt_text: &str) -> Result<Prompt> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO prompts (name, prompt) VALUES (?1, ?2)",
            params![name, prompt_text],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Prompt {
            id,
            name: name.to_string(),
            prompt: prompt_text.to_string(),
            deleted: None,
        })
    }

    async fn update_prompt(&self, id: i64, name: &str, prompt_text: &str) -> Result<Prompt> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE prompts SET name = ?1, prompt = ?2 WHERE id = ?3",
            params![name, prompt_text, id],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Prompt with id {id}")));
        }
        let prompt = tx.query_row(
            "SELECT id, name, prompt, deleted FROM prompts WHERE id = ?1",
            params![id],
            prompt_from_row,
        )?;
        tx.commit()?;
        Ok(prompt)
    }

    async fn soft_delete_prompt(&self, id: i64) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE prompts SET deleted = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn queries_for_meeting(&self, meeting_id: &str) -> Result<Vec<Query>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, meeting_id, question, answer, created, deleted FROM queries
             WHERE meeting_id = ?1 AND deleted IS NULL ORDER BY created DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![meeting_id], query_from_row)?;

        let mut queries = Vec::new();
        for query in rows {
            queries.push(query?);
        }
        Ok(queries)
    }

    async fn query_history(&self, meeting_id: &str) -> Result<Vec<Query>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, meeting_id, question, answer, created, deleted FROM queries
             WHERE meeting_id = ?1 ORDER BY created DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![meeting_id], query_from_row)?;

        let mut queries = Vec::new();
        for query in rows {
            queries.push(query?);
        }
        Ok(queries)
    }

    async fn store_query(&self, meeting_id: &str, question: &str, answer: &str) -> Result<Query> {
        let created: DateTime<Utc> = Utc::now();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO queries (meeting_id, question, answer, created)
             VALUES (?1, ?2, ?3, ?4)",
            params![meeting_id, question, answer, created],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Query {
            id,
            meeting_id: meeting_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            created,
            deleted: None,
        })
    }

    async fn update_query(
        &self,
        id: i64,
        question: Option<&str>,
        answer: Option<&str>,
    ) -> Result<Query> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut query = tx
            .query_row(
                "SELECT id, meeting_id, question, answer, created, deleted FROM queries
                 WHERE id = ?1",
                params![id],
                query_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    AppError::NotFound(format!("Query with id {id}"))
                }
                other => AppError::Database(other),
            })?;
        // Empty values mean "leave this field alone"
        if let Some(question) = question.filter(|q| !q.is_empty()) {
            query.question = question.to_string();
        }
        if let Some(answer) = answer.filter(|a| !a.is_empty()) {
            query.answer = answer.to_string();
        }
        tx.execute(
            "UPDATE queries SET question = ?1, answer = ?2 WHERE id = ?3",
            params![query.question, query.answer, id],
        )?;
        tx.commit()?;
        Ok(query)
    }

    async fn soft_delete_query(&self, id: i64) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE queries SET deleted = ?1 WHERE id = ?2",
            params![Utc::now(), id],
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn apply_sync_batch(
        &self,
        meetings: &[Meeting],
        transcripts: &[Transcript],
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for meeting in meetings {
            Self::upsert_meeting_tx(&tx, meeting)?;
        }
        for transcript in transcripts {
            Self::upsert_transcript_tx(&tx, transcript)?;
        }
        tx.commit()?;
        Ok(())
    }
}
