/// Domain models for the meeting-minutes core
///
/// These models represent core business entities and are storage-agnostic.
/// Every entity carries a `deleted` tombstone timestamp instead of being
/// physically removed, so history survives deletion.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Represents a meeting. Its id is the transcription provider's transcript
/// id, so local and remote records share one keyspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: String,
    /// User-supplied name; empty for meetings discovered remotely
    pub name: String,
    /// User-supplied calendar date, if any
    pub date: Option<NaiveDate>,
    /// Provider-side creation time
    pub created: Option<DateTime<Utc>>,
    /// Free-text lifecycle label ("transcribed", "processing", ...)
    pub status: String,
    pub deleted: Option<DateTime<Utc>>,
}

impl Meeting {
    /// Creates a meeting for a freshly transcribed submission
    pub fn new(id: String, name: String, date: Option<NaiveDate>) -> Self {
        Self {
            id,
            name,
            date,
            created: Some(Utc::now()),
            status: "transcribed".to_string(),
            deleted: None,
        }
    }

    /// Creates a placeholder for a meeting that originated remotely; name
    /// and date stay empty until the user fills them in.
    pub fn from_remote(remote: &RemoteMeeting) -> Self {
        Self {
            id: remote.id.clone(),
            name: String::new(),
            date: None,
            created: remote.created,
            status: remote.status.clone(),
            deleted: None,
        }
    }
}

/// A meeting as the provider's listing reports it: provider-managed fields
/// only, no user-curated name or date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteMeeting {
    pub id: String,
    pub created: Option<DateTime<Utc>>,
    pub status: String,
}

/// The stored transcript of a meeting, 1:1 with `Meeting`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub meeting_id: String,
    /// Raw transcript text as the provider returned it
    pub text: String,
    /// Speaker-segmented rendering ("[Speaker A] ..." lines)
    pub formatted: String,
    pub deleted: Option<DateTime<Utc>>,
}

impl Transcript {
    pub fn new(meeting_id: String, text: String, formatted: String) -> Self {
        Self {
            meeting_id,
            text,
            formatted,
            deleted: None,
        }
    }
}

/// A reusable question template, independent of any meeting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub id: i64,
    pub name: String,
    pub prompt: String,
    pub deleted: Option<DateTime<Utc>>,
}

/// One question/answer exchange against a meeting's transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub id: i64,
    pub meeting_id: String,
    pub question: String,
    pub answer: String,
    pub created: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
}
