/// Service layer - orchestration and reconciliation
pub mod meetings;
pub mod sync;

pub use meetings::MeetingService;
