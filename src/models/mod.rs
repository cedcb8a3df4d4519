pub mod message;
pub mod page;
pub mod problem;
pub mod sync_config;

pub use message::{Envelope, Request, Response};
pub use page::ProblemPage;
pub use problem::{ProblemMap, ProblemRecord, Submission};
pub use sync_config::{RepoId, SyncConfig, DEFAULT_BASE_PATH};
