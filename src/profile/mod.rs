//! Backend-owned user profile and the per-session synchronization that
//! produces it.

mod sync;
mod types;

pub use sync::{ProfileSynchronizer, SyncError, SyncRequest, SyncState, PROFILE_ENDPOINT, SYNC_ENDPOINT};
pub use types::{Profile, Role};
