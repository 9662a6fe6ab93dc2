//! On-demand sync triggers.
//!
//! Both endpoints contend for the same [`SyncGuard`] slot as the startup
//! background sync: a trigger while any sync is live gets a 409 instead of
//! a second writer.

use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;

use crate::sync::{self, MemberSyncOutcome, PgSyncStore, SyncOutcome};

use super::{ProblemDetails, SyncContext};

/// Trigger a member roster sync
///
/// # Errors
/// Returns `ProblemDetails` when a sync is already running (409) or the
/// store fails (500).
#[utoipa::path(
    post,
    path = "/sync/members",
    tag = "Sync",
    responses(
        (status = 200, description = "Roster sync finished", body = MemberSyncOutcome),
        (status = 409, description = "A sync is already running", body = ProblemDetails),
        (status = 500, description = "Sync aborted on a store failure", body = ProblemDetails)
    )
)]
pub async fn trigger_member_sync(
    Extension(context): Extension<Arc<SyncContext>>,
) -> Result<Json<MemberSyncOutcome>, ProblemDetails> {
    let Some(_permit) = context.guard.try_acquire() else {
        return Err(ProblemDetails::conflict("a sync is already running"));
    };

    let store = PgSyncStore::new(context.pool.clone());
    let outcome = sync::sync_members(&store, context.client.as_ref(), context.term).await?;
    Ok(Json(outcome))
}

/// Trigger an incremental bill sync
///
/// # Errors
/// Returns `ProblemDetails` when a sync is already running (409) or a batch
/// commit fails (500); batches committed before the failure persist.
#[utoipa::path(
    post,
    path = "/sync/bills",
    tag = "Sync",
    responses(
        (status = 200, description = "Bill sync finished", body = SyncOutcome),
        (status = 409, description = "A sync is already running", body = ProblemDetails),
        (status = 500, description = "Sync aborted on a store failure", body = ProblemDetails)
    )
)]
pub async fn trigger_bill_sync(
    Extension(context): Extension<Arc<SyncContext>>,
) -> Result<Json<SyncOutcome>, ProblemDetails> {
    let Some(_permit) = context.guard.try_acquire() else {
        return Err(ProblemDetails::conflict("a sync is already running"));
    };

    let store = PgSyncStore::new(context.pool.clone());
    let outcome = sync::sync_bills(&store, context.client.as_ref(), &context.options).await?;
    Ok(Json(outcome))
}
