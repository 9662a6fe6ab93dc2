//! Synchronization engine: pulls the member roster and the bill feed from
//! the portal into Postgres, guarded so only one run is live at a time.

pub mod bills;
pub mod guard;
pub mod members;
pub mod store;

pub use bills::{sync_bills, SyncOptions, SyncOutcome, COMMIT_BATCH};
pub use guard::{SyncGuard, SyncPermit};
pub use members::{sync_members, MemberSyncOutcome};
pub use store::{PgSyncStore, SyncStore};

#[cfg(any(test, feature = "test-utils"))]
pub use store::mock;
