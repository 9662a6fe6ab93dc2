//! REST API handlers and `OpenAPI` documentation.
//!
//! All endpoints live under `/api/v1` and share the domain types, which
//! carry `ToSchema` derives for `OpenAPI` spec generation.

// The OpenApi derive macro generates code that triggers this lint
#![allow(clippy::needless_for_each)]

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Serialize, Serializer};
use sqlx_postgres::PgPool;
use utoipa::{OpenApi, ToSchema};

use crate::assembly::AssemblyApiClient;
use crate::domain::{Bill, Member};
use crate::repo::StoreError;
use crate::sync::{MemberSyncOutcome, SyncGuard, SyncOptions, SyncOutcome};

pub mod bills;
pub mod members;
pub mod sync;

/// Serialize a `StatusCode` as its `u16` representation.
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires `&T` signature
fn serialize_status_code<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

/// RFC 7807 Problem Details error response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// URI reference identifying the problem type
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short human-readable summary
    pub title: String,
    /// HTTP status code
    #[serde(serialize_with = "serialize_status_code")]
    #[schema(value_type = u16)]
    pub status: StatusCode,
    /// Human-readable explanation specific to this occurrence
    pub detail: String,
    /// URI reference identifying the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    /// Create an internal server error response.
    #[must_use]
    pub fn internal_error(detail: &str) -> Self {
        Self {
            problem_type: "https://assembly-dash.dev/errors/internal".to_string(),
            title: "Internal Server Error".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.to_string(),
            instance: None,
        }
    }

    /// Create a not-found response for a missing resource.
    #[must_use]
    pub fn not_found(detail: &str) -> Self {
        Self {
            problem_type: "https://assembly-dash.dev/errors/not-found".to_string(),
            title: "Not Found".to_string(),
            status: StatusCode::NOT_FOUND,
            detail: detail.to_string(),
            instance: None,
        }
    }

    /// Create a conflict response (e.g. a sync already in flight).
    #[must_use]
    pub fn conflict(detail: &str) -> Self {
        Self {
            problem_type: "https://assembly-dash.dev/errors/conflict".to_string(),
            title: "Conflict".to_string(),
            status: StatusCode::CONFLICT,
            detail: detail.to_string(),
            instance: None,
        }
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<StoreError> for ProblemDetails {
    fn from(err: StoreError) -> Self {
        Self::internal_error(&err.to_string())
    }
}

/// Shared state for the on-demand sync endpoints.
pub struct SyncContext {
    pub pool: PgPool,
    pub client: Arc<dyn AssemblyApiClient>,
    pub guard: SyncGuard,
    pub term: u16,
    pub options: SyncOptions,
}

/// `OpenAPI` documentation for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssemblyDash API",
        version = "1.0.0",
        description = "Legislative information REST API",
        license(name = "MIT")
    ),
    servers(
        (url = "/api/v1", description = "REST API v1")
    ),
    paths(
        members::list_members,
        members::member_ranking,
        members::get_member,
        bills::list_bills,
        bills::get_bill,
        sync::trigger_member_sync,
        sync::trigger_bill_sync
    ),
    components(schemas(
        Member,
        Bill,
        members::MemberDetail,
        members::RankedMember,
        SyncOutcome,
        MemberSyncOutcome,
        ProblemDetails
    ))
)]
pub struct ApiDoc;

/// Assemble the `/api/v1` router.
pub fn api_router(pool: PgPool, sync_context: Arc<SyncContext>) -> Router {
    Router::new()
        .route("/members", get(members::list_members))
        .route("/members/ranking", get(members::member_ranking))
        .route("/members/{id}", get(members::get_member))
        .route("/bills", get(bills::list_bills))
        .route("/bills/{id}", get(bills::get_bill))
        .route("/sync/members", post(sync::trigger_member_sync))
        .route("/sync/bills", post(sync::trigger_bill_sync))
        .layer(Extension(pool))
        .layer(Extension(sync_context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_details_serializes_correctly() {
        let problem = ProblemDetails::internal_error("Something went wrong");
        let json = serde_json::to_string(&problem).expect("serialize");
        assert!(json.contains("\"type\":"));
        assert!(json.contains("\"status\":500"));
    }

    #[test]
    fn not_found_carries_404() {
        let problem = ProblemDetails::not_found("member 7 not found");
        assert_eq!(problem.status, StatusCode::NOT_FOUND);
    }
}
