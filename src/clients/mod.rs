pub mod repo_client;

pub use repo_client::{RemoteBlobRef, RepoContentsClient, UpsertResult};
