/// Adapter implementations of the port traits
pub mod assemblyai;
pub mod storage;

pub use assemblyai::AssemblyAi;
pub use storage::SqliteStorage;
