//! Incremental bill synchronization, the heart of the service.
//!
//! One invocation pages through the upstream bill feed and decides, per
//! record, whether to insert, update, or skip. New rows are staged and
//! committed in batches of [`COMMIT_BATCH`]; a crash between batches loses
//! only the uncommitted tail, because re-running over the same page
//! re-derives the same rows and the external-ID uniqueness constraint
//! swallows re-inserts.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::assembly::{AssemblyApiClient, RawRecord};
use crate::mapping::{self, clean_proposer_name, MARKER_GOVERNMENT, SUFFIX_CHAIR};
use crate::repo::StoreError;

use super::store::SyncStore;

/// New rows per batch commit. A throughput/durability trade-off, not a
/// correctness boundary.
pub const COMMIT_BATCH: u64 = 20;

/// Tuning for one bill sync invocation.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Legislature term to sync.
    pub term: u16,
    /// Upper bound on pages fetched.
    pub max_pages: u32,
    /// Records per page.
    pub page_size: u32,
    /// Re-write status/vote fields of already-known bills instead of
    /// counting them as skipped.
    pub update_existing: bool,
    /// Only consider records newer than the stored low-water mark, and
    /// stop early once a page yields nothing new.
    pub incremental: bool,
    /// Pause between pages.
    pub page_delay: Duration,
    /// Pause every 5th record while proposer lookups are live.
    pub record_delay: Duration,
    /// Pause every 10th record once the proposer breaker is open and
    /// lookups are cheap no-ops.
    pub record_delay_degraded: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            term: 22,
            max_pages: 10,
            page_size: 100,
            update_existing: false,
            incremental: true,
            page_delay: Duration::from_secs(1),
            record_delay: Duration::from_millis(500),
            record_delay_degraded: Duration::from_millis(200),
        }
    }
}

/// Counts from one sync invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncOutcome {
    /// Bills inserted.
    pub new: u64,
    /// Bills patched in place (`update_existing` mode).
    pub updated: u64,
    /// Records skipped: malformed, older than the cutoff, or already known.
    pub skipped: u64,
}

enum RecordAction {
    Inserted,
    Updated,
    Skipped,
}

/// Run one bill sync pass.
///
/// Per-record failures are logged and absorbed: upstream instability must
/// never abort a multi-hundred-record pass. Batch-commit failures are
/// session-level and abort the invocation; batches committed before the
/// failure persist.
///
/// # Errors
/// Returns `StoreError` when a batch commit or low-water-mark query fails.
pub async fn sync_bills(
    store: &dyn SyncStore,
    client: &dyn AssemblyApiClient,
    options: &SyncOptions,
) -> Result<SyncOutcome, StoreError> {
    info!(
        max_pages = options.max_pages,
        incremental = options.incremental,
        "starting bill sync"
    );

    let cutoff = if options.incremental {
        let cutoff = store.latest_proposal_date().await?;
        if let Some(date) = cutoff {
            info!(%date, "incremental sync: only considering bills after low-water mark");
        }
        cutoff
    } else {
        None
    };

    let mut outcome = SyncOutcome::default();
    let mut page = 1u32;

    while page <= options.max_pages {
        let records = match client
            .fetch_bill_page(options.term, page, options.page_size)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                error!(page, error = %err, "failed to fetch bill page");
                Vec::new()
            }
        };

        if records.is_empty() {
            info!(page, "bill feed exhausted");
            break;
        }

        let mut page_new = 0u64;
        for (index, record) in records.iter().enumerate() {
            match process_record(store, client, options, cutoff, record).await {
                Ok(RecordAction::Inserted) => {
                    outcome.new += 1;
                    page_new += 1;
                    if outcome.new % COMMIT_BATCH == 0 {
                        store.commit_staged().await?;
                        info!(
                            new = outcome.new,
                            updated = outcome.updated,
                            skipped = outcome.skipped,
                            "batch committed"
                        );
                    }
                }
                Ok(RecordAction::Updated) => outcome.updated += 1,
                Ok(RecordAction::Skipped) => outcome.skipped += 1,
                Err(err) => {
                    // One bad record must not sink the page.
                    error!(error = %err, "error processing bill record, continuing");
                }
            }

            // Keep upstream load bounded. Once the proposer breaker is
            // open those lookups are no-ops, so the pace can pick up.
            if client.proposer_breaker_open() {
                if index > 0 && index % 10 == 0 {
                    sleep(options.record_delay_degraded).await;
                }
            } else if index > 0 && index % 5 == 0 {
                sleep(options.record_delay).await;
            }
        }

        store.commit_staged().await?;
        info!(
            page,
            page_new,
            new = outcome.new,
            updated = outcome.updated,
            skipped = outcome.skipped,
            "page processed"
        );

        if options.incremental && page_new == 0 {
            // Feed is newest-first: a page with nothing new means later
            // pages are older still.
            info!("incremental sync: page yielded no new bills, stopping early");
            break;
        }

        page += 1;
        sleep(options.page_delay).await;
    }

    store.commit_staged().await?;
    info!(
        new = outcome.new,
        updated = outcome.updated,
        skipped = outcome.skipped,
        "bill sync complete"
    );
    Ok(outcome)
}

async fn process_record(
    store: &dyn SyncStore,
    client: &dyn AssemblyApiClient,
    options: &SyncOptions,
    cutoff: Option<NaiveDate>,
    record: &RawRecord,
) -> Result<RecordAction, StoreError> {
    let bill_id = mapping::field_string(record, "BILL_ID");
    let bill_no = mapping::field_string(record, "BILL_NO");

    // The external bill ID is the dedup key; fall back to the bill number
    // when only that is present. Records with neither are malformed.
    let Some(external_id) = bill_id.or(bill_no) else {
        warn!("bill record carries neither BILL_ID nor BILL_NO, skipping");
        return Ok(RecordAction::Skipped);
    };

    let proc_date =
        mapping::field_string(record, "PROC_DT").and_then(|s| mapping::parse_flex_date(&s));

    // Dateless bills are always eligible; the cutoff only filters records
    // that are provably old.
    if let (Some(cutoff), Some(date)) = (cutoff, proc_date) {
        if date <= cutoff {
            return Ok(RecordAction::Skipped);
        }
    }

    if store.bill_exists(&external_id).await? {
        if options.update_existing {
            let status = mapping::field_string(record, "PROC_RESULT_CD");
            store
                .patch_bill_result(&external_id, status.as_deref(), proc_date)
                .await?;
            return Ok(RecordAction::Updated);
        }
        return Ok(RecordAction::Skipped);
    }

    let info = client.fetch_bill_proposers(&external_id, record).await;
    let mut bill = mapping::new_bill_from_record(record, external_id, &info);

    // Link the lead sponsor to a member row, except for committee-chair
    // and government bills which have no single legislator behind them.
    if let Some(rep) = &bill.rep_proposer {
        if !rep.contains(SUFFIX_CHAIR) && rep != MARKER_GOVERNMENT {
            let clean = bill
                .proposer_clean
                .clone()
                .unwrap_or_else(|| clean_proposer_name(rep));
            if let Some(member_id) = store.find_member_id_by_name(&clean).await? {
                bill.proposer_id = Some(member_id);
            }
        }
    }

    store.stage_bill(bill).await?;
    Ok(RecordAction::Inserted)
}
