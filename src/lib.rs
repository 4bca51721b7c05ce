// ghusers library.
// Pages through the public GitHub users feed and keeps a durable local cache of it.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod sync;

pub use cache::{CachedUserRecord, FileUserStore, UserCache};
pub use config::Config;
pub use error::{ErrorKind, Result, SyncError};
pub use github::{GitHubClient, UserDetail, UserSource, UserSummary};
pub use sync::SyncCoordinator;
