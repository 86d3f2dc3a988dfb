//! Meeting-minutes core
//!
//! Transcribe meeting audio through AssemblyAI, persist meetings,
//! transcripts, prompts and queries in SQLite with soft-delete semantics,
//! reconcile the local store against the provider's remote listing, and
//! answer free-form questions about a transcript via LeMUR.
//!
//! The crate follows a ports-and-adapters layout: the presentation layer
//! (out of scope here) talks to [`MeetingService`] and the [`StoragePort`]
//! accessors; adapters implement the ports against SQLite and AssemblyAI.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use adapters::{AssemblyAi, SqliteStorage};
pub use config::AssemblyAiConfig;
pub use domain::{Meeting, Prompt, Query, RemoteMeeting, Transcript};
pub use error::{AppError, Result};
pub use ports::{StoragePort, TranscriptionPort};
pub use services::MeetingService;
