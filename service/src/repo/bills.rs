//! Bill repository.

use chrono::NaiveDate;
use sqlx_postgres::PgPool;

use super::StoreError;
use crate::domain::{Bill, NewBill};

/// Filters for the bill list endpoint.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    /// Exact match on processing status.
    pub status: Option<String>,
    /// Substring match on committee name.
    pub committee: Option<String>,
    /// Substring match on the proposer label or lead sponsor.
    pub proposer: Option<String>,
    /// Substring match on title.
    pub query: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// List bills newest-first with optional filters and paging.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn list(pool: &PgPool, filter: &BillFilter) -> Result<Vec<Bill>, StoreError> {
    let bills = sqlx::query_as::<_, Bill>(
        r"
        SELECT * FROM bills
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL OR committee LIKE '%' || $2 || '%')
          AND ($3::text IS NULL
               OR proposer LIKE '%' || $3 || '%'
               OR rep_proposer LIKE '%' || $3 || '%')
          AND ($4::text IS NULL OR title LIKE '%' || $4 || '%')
        ORDER BY proposal_date DESC NULLS LAST, id DESC
        OFFSET $5 LIMIT $6
        ",
    )
    .bind(filter.status.as_deref())
    .bind(filter.committee.as_deref())
    .bind(filter.proposer.as_deref())
    .bind(filter.query.as_deref())
    .bind(filter.skip.max(0))
    .bind(filter.limit.clamp(1, 1000))
    .fetch_all(pool)
    .await?;

    Ok(bills)
}

/// Fetch one bill by primary key.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Bill>, StoreError> {
    let bill = sqlx::query_as::<_, Bill>("SELECT * FROM bills WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(bill)
}

/// Count all bill rows.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn count(pool: &PgPool) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bills")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Recent bills sponsored by one member, joined by the `proposer_id`
/// foreign key (the canonical sponsorship join).
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn sponsored_by(
    pool: &PgPool,
    member_id: i64,
    limit: i64,
) -> Result<Vec<Bill>, StoreError> {
    let bills = sqlx::query_as::<_, Bill>(
        r"
        SELECT * FROM bills
        WHERE proposer_id = $1
        ORDER BY proposal_date DESC NULLS LAST, id DESC
        LIMIT $2
        ",
    )
    .bind(member_id)
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await?;

    Ok(bills)
}

/// Whether a bill with this external ID is already stored.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn exists(pool: &PgPool, bill_id: &str) -> Result<bool, StoreError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM bills WHERE bill_id = $1 LIMIT 1")
        .bind(bill_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Proposal date of the most recent stored bill, the incremental sync's
/// low-water mark.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn latest_proposal_date(pool: &PgPool) -> Result<Option<NaiveDate>, StoreError> {
    let date = sqlx::query_scalar::<_, Option<NaiveDate>>("SELECT MAX(proposal_date) FROM bills")
        .fetch_one(pool)
        .await?;
    Ok(date)
}

/// Patch the processing-state fields of an already-stored bill.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn patch_result(
    pool: &PgPool,
    bill_id: &str,
    status: Option<&str>,
    vote_date: Option<NaiveDate>,
) -> Result<(), StoreError> {
    sqlx::query(
        r"
        UPDATE bills SET
            status = COALESCE($2, status),
            vote_result = $2,
            vote_date = COALESCE($3, vote_date),
            last_updated = NOW()
        WHERE bill_id = $1
        ",
    )
    .bind(bill_id)
    .bind(status)
    .bind(vote_date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert one bill, ignoring the insert when the external ID is already
/// present (re-running a sync over the same page must not duplicate rows).
/// Returns `true` when a row was actually inserted.
///
/// # Errors
/// Returns `StoreError` on query failure.
pub async fn insert<'e, E>(executor: E, bill: &NewBill) -> Result<bool, StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let result = sqlx::query(
        r"
        INSERT INTO bills (
            bill_id, bill_no, title, proposer, rep_proposer, proposer_clean,
            co_proposers, status, committee, proposal_date, content,
            bill_kind, vote_result, vote_date, proposer_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (bill_id) DO NOTHING
        ",
    )
    .bind(&bill.bill_id)
    .bind(bill.bill_no.as_deref())
    .bind(&bill.title)
    .bind(bill.proposer.as_deref())
    .bind(bill.rep_proposer.as_deref())
    .bind(bill.proposer_clean.as_deref())
    .bind(bill.co_proposers.as_deref())
    .bind(bill.status.as_deref())
    .bind(bill.committee.as_deref())
    .bind(bill.proposal_date)
    .bind(bill.content.as_deref())
    .bind(bill.bill_kind.as_deref())
    .bind(bill.vote_result.as_deref())
    .bind(bill.vote_date)
    .bind(bill.proposer_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
