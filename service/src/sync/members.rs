//! Roster synchronization.

use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::assembly::AssemblyApiClient;
use crate::mapping;
use crate::repo::StoreError;

use super::store::SyncStore;

/// Counts from one roster sync invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MemberSyncOutcome {
    /// Members inserted.
    pub new: u64,
    /// Members merged into an existing row.
    pub merged: u64,
    /// Members whose activity score was recomputed afterwards.
    pub scored: u64,
}

/// Sync the member roster for one term, then recompute activity scores.
///
/// An upstream fetch failure yields an empty pass rather than an error; the
/// roster already stored stays authoritative until the portal recovers.
///
/// # Errors
/// Returns `StoreError` when the score refresh fails. Per-record upsert
/// failures are logged and absorbed.
pub async fn sync_members(
    store: &dyn SyncStore,
    client: &dyn AssemblyApiClient,
    term: u16,
) -> Result<MemberSyncOutcome, StoreError> {
    info!(term, "starting member sync");

    let records = match client.fetch_members(term, None, None).await {
        Ok(records) => records,
        Err(err) => {
            error!(error = %err, "failed to fetch member roster");
            Vec::new()
        }
    };

    let mut outcome = MemberSyncOutcome::default();
    for record in &records {
        let Some(member) = mapping::member_record_from(record) else {
            warn!("roster record without a name, skipping");
            continue;
        };
        match store.upsert_member(&member).await {
            Ok(true) => outcome.new += 1,
            Ok(false) => outcome.merged += 1,
            Err(err) => {
                error!(name = %member.name, error = %err, "failed to upsert member, continuing");
            }
        }
    }

    outcome.scored = store.refresh_activity_scores().await?;
    info!(
        new = outcome.new,
        merged = outcome.merged,
        scored = outcome.scored,
        "member sync complete"
    );
    Ok(outcome)
}
