// Synchronization module.
// Coordinates remote pagination with the local user cache.

pub mod coordinator;

pub use coordinator::SyncCoordinator;
