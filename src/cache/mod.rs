// Cache module for the local user store.
// Persists user records on disk so lists can be served without the network.

pub mod paths;
pub mod persist;
pub mod record;
pub mod store;

pub use record::CachedUserRecord;
pub use store::{FileUserStore, UserCache};
