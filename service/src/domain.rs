//! Domain rows for the `members` and `bills` tables.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A legislator. The stable natural key for upsert matching is `name`;
/// the upstream roster API has no consistently usable numeric ID.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub hanja_name: Option<String>,
    pub eng_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    /// Calendar the birth date is given in (solar/lunar).
    pub birth_gbn: Option<String>,
    pub party: Option<String>,
    pub district: Option<String>,
    pub position: Option<String>,
    /// Primary committee.
    pub committee: Option<String>,
    /// Comma-joined list of all committee memberships.
    pub committees: Option<String>,
    /// Re-election indicator (first term, re-elected, ...).
    pub reele_gbn: Option<String>,
    /// Term count.
    pub units: Option<String>,
    pub tel_no: Option<String>,
    pub email: Option<String>,
    pub homepage: Option<String>,

    // Statistics feeding the activity score.
    pub num_bills: i64,
    pub attendance_rate: f64,
    pub speech_count: i64,
    /// Derived weighted score, always recomputed from the four statistical
    /// fields and never set independently.
    pub activity_score: f64,
    pub bill_pass_rate: f64,

    pub is_active: bool,
    pub last_updated: Option<NaiveDate>,
}

/// One piece of legislation. `bill_id` is the externally-issued unique ID;
/// `bill_no` is the human-facing number and may repeat across sources.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bill {
    pub id: i64,
    pub bill_id: String,
    pub bill_no: Option<String>,
    pub title: String,
    /// Free-text proposer label as reported upstream.
    pub proposer: Option<String>,
    /// Best-effort lead sponsor name.
    pub rep_proposer: Option<String>,
    /// Lead sponsor name with honorific/role suffixes stripped, used for
    /// member matching.
    pub proposer_clean: Option<String>,
    /// Comma-joined co-sponsor names.
    pub co_proposers: Option<String>,
    pub status: Option<String>,
    pub committee: Option<String>,
    pub proposal_date: Option<NaiveDate>,
    pub content: Option<String>,
    pub bill_kind: Option<String>,
    pub vote_result: Option<String>,
    pub vote_date: Option<NaiveDate>,
    /// Link to the lead sponsor's member row, when the cleaned proposer
    /// name resolves to an exact member name.
    pub proposer_id: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

/// A bill row as assembled by the sync engine before insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBill {
    pub bill_id: String,
    pub bill_no: Option<String>,
    pub title: String,
    pub proposer: Option<String>,
    pub rep_proposer: Option<String>,
    pub proposer_clean: Option<String>,
    pub co_proposers: Option<String>,
    pub status: Option<String>,
    pub committee: Option<String>,
    pub proposal_date: Option<NaiveDate>,
    pub content: Option<String>,
    pub bill_kind: Option<String>,
    pub vote_result: Option<String>,
    pub vote_date: Option<NaiveDate>,
    pub proposer_id: Option<i64>,
}

/// Normalized member fields from one upstream roster record.
///
/// `None` fields were absent upstream and must not clobber existing values
/// when merging into a stored member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberRecord {
    pub name: String,
    pub hanja_name: Option<String>,
    pub eng_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_gbn: Option<String>,
    pub party: Option<String>,
    pub district: Option<String>,
    pub position: Option<String>,
    pub committee: Option<String>,
    pub committees: Option<String>,
    pub reele_gbn: Option<String>,
    pub units: Option<String>,
    pub tel_no: Option<String>,
    pub email: Option<String>,
    pub homepage: Option<String>,
}
