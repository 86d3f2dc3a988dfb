/// Domain layer - core business models
///
/// These models are storage- and provider-agnostic.
pub mod models;

pub use models::{Meeting, Prompt, Query, RemoteMeeting, Transcript};
