//! Bill endpoints.

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;
use sqlx_postgres::PgPool;
use utoipa::IntoParams;

use crate::domain::Bill;
use crate::repo::{self, bills::BillFilter};

use super::ProblemDetails;

#[derive(Debug, Deserialize, IntoParams)]
pub struct BillListParams {
    /// Exact match on processing status.
    pub status: Option<String>,
    /// Substring match on committee.
    pub committee: Option<String>,
    /// Substring match on the proposer label or lead sponsor.
    pub proposer: Option<String>,
    /// Substring match on title.
    pub query: Option<String>,
    /// Rows to skip.
    #[serde(default)]
    pub skip: i64,
    /// Maximum rows to return (1-1000).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_limit() -> i64 {
    100
}

/// List bills newest-first
///
/// # Errors
/// Returns `ProblemDetails` on database failure.
#[utoipa::path(
    get,
    path = "/bills",
    tag = "Bills",
    params(BillListParams),
    responses(
        (status = 200, description = "Bills matching the filters", body = [Bill]),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn list_bills(
    Extension(pool): Extension<PgPool>,
    Query(params): Query<BillListParams>,
) -> Result<Json<Vec<Bill>>, ProblemDetails> {
    let filter = BillFilter {
        status: params.status,
        committee: params.committee,
        proposer: params.proposer,
        query: params.query,
        skip: params.skip,
        limit: params.limit,
    };
    let bills = repo::bills::list(&pool, &filter).await?;
    Ok(Json(bills))
}

/// Fetch one bill
///
/// # Errors
/// Returns `ProblemDetails` when the bill is absent or the query fails.
#[utoipa::path(
    get,
    path = "/bills/{id}",
    tag = "Bills",
    params(("id" = i64, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill detail", body = Bill),
        (status = 404, description = "Bill not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn get_bill(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<Bill>, ProblemDetails> {
    let Some(bill) = repo::bills::get(&pool, id).await? else {
        return Err(ProblemDetails::not_found(&format!("bill {id} not found")));
    };
    Ok(Json(bill))
}
