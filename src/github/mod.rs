// GitHub API module.
// Provides the client, the remote user source trait, and wire types for the users API.

pub mod client;
pub mod endpoints;
pub mod source;
pub mod types;

pub use client::GitHubClient;
pub use source::UserSource;
pub use types::*;
