//! Member endpoints.

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx_postgres::PgPool;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Bill, Member};
use crate::repo::{self, members::MemberFilter};

use super::ProblemDetails;

/// Sponsored bills returned alongside a member detail.
const RECENT_BILLS_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MemberListParams {
    /// Substring match on name.
    pub name: Option<String>,
    /// Exact match on party.
    pub party: Option<String>,
    /// Substring match on district.
    pub district: Option<String>,
    /// Rows to skip.
    #[serde(default)]
    pub skip: i64,
    /// Maximum rows to return (1-1000).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RankingParams {
    /// Exact match on party.
    pub party: Option<String>,
    /// Maximum rows to return (1-1000).
    #[serde(default = "default_ranking_limit")]
    pub limit: i64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_limit() -> i64 {
    100
}

#[allow(clippy::missing_const_for_fn)]
fn default_ranking_limit() -> i64 {
    50
}

/// One member plus their most recent sponsored bills.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberDetail {
    #[serde(flatten)]
    pub member: Member,
    pub recent_bills: Vec<Bill>,
}

/// One row of the activity ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankedMember {
    /// 1-based position in the ranking.
    pub rank: usize,
    #[serde(flatten)]
    pub member: Member,
}

/// List members
///
/// # Errors
/// Returns `ProblemDetails` on database failure.
#[utoipa::path(
    get,
    path = "/members",
    tag = "Members",
    params(MemberListParams),
    responses(
        (status = 200, description = "Members matching the filters", body = [Member]),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn list_members(
    Extension(pool): Extension<PgPool>,
    Query(params): Query<MemberListParams>,
) -> Result<Json<Vec<Member>>, ProblemDetails> {
    let filter = MemberFilter {
        name: params.name,
        party: params.party,
        district: params.district,
        skip: params.skip,
        limit: params.limit,
    };
    let members = repo::members::list(&pool, &filter).await?;
    Ok(Json(members))
}

/// Activity-score ranking
///
/// # Errors
/// Returns `ProblemDetails` on database failure.
#[utoipa::path(
    get,
    path = "/members/ranking",
    tag = "Members",
    params(RankingParams),
    responses(
        (status = 200, description = "Members ordered by activity score", body = [RankedMember]),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn member_ranking(
    Extension(pool): Extension<PgPool>,
    Query(params): Query<RankingParams>,
) -> Result<Json<Vec<RankedMember>>, ProblemDetails> {
    let members = repo::members::ranking(&pool, params.party.as_deref(), params.limit).await?;
    let ranked = members
        .into_iter()
        .enumerate()
        .map(|(index, member)| RankedMember {
            rank: index + 1,
            member,
        })
        .collect();
    Ok(Json(ranked))
}

/// Fetch one member with recent sponsored bills
///
/// # Errors
/// Returns `ProblemDetails` when the member is absent or the query fails.
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "Members",
    params(("id" = i64, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member detail", body = MemberDetail),
        (status = 404, description = "Member not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn get_member(
    Extension(pool): Extension<PgPool>,
    Path(id): Path<i64>,
) -> Result<Json<MemberDetail>, ProblemDetails> {
    let Some(member) = repo::members::get(&pool, id).await? else {
        return Err(ProblemDetails::not_found(&format!(
            "member {id} not found"
        )));
    };
    let recent_bills = repo::bills::sponsored_by(&pool, id, RECENT_BILLS_LIMIT).await?;
    Ok(Json(MemberDetail {
        member,
        recent_bills,
    }))
}
