//! Field mapping from upstream records to domain rows.
//!
//! The open-data portal returns flat key/value records with terse field
//! codes and inconsistent formatting. Everything here fails soft: a value
//! that cannot be interpreted becomes `None` (with a warning where that is
//! diagnostically useful), never an error.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::assembly::{ProposerInfo, RawRecord};
use crate::domain::{MemberRecord, NewBill};

/// Legislator honorific suffix (e.g. "홍길동의원").
pub const SUFFIX_LEGISLATOR: &str = "의원";
/// Committee-chair designation.
pub const SUFFIX_CHAIR: &str = "위원장";
/// Committee designation.
pub const SUFFIX_COMMITTEE: &str = "위원회";
/// Government-submitted marker.
pub const MARKER_GOVERNMENT: &str = "정부";

/// Default processing state for a freshly-seen bill ("pending").
pub const STATUS_PENDING: &str = "계류";

/// Read a record field as a non-empty trimmed string.
///
/// The portal sometimes serializes numeric fields (bill numbers, term
/// counts) as JSON numbers, so those are accepted too.
#[must_use]
pub fn field_string(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the two date formats the portal emits: hyphenated `YYYY-MM-DD`
/// and compact `YYYYMMDD`. Anything else logs a warning and yields `None`.
#[must_use]
pub fn parse_flex_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if trimmed.contains('-') {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    } else if trimmed.len() == 8 {
        NaiveDate::parse_from_str(trimmed, "%Y%m%d")
    } else {
        warn!(value = trimmed, "unsupported date format");
        return None;
    };

    match parsed {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(value = trimmed, error = %err, "failed to parse date");
            None
        }
    }
}

/// Proposer derived from a bill title's trailing parenthesized clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleProposer {
    /// "…(홍길동의원 대표발의)": lead sponsor is a named legislator.
    Legislator(String),
    /// "…(행정안전위원장)": introduced by a committee chair.
    Committee(String),
    /// "…(정부)": submitted by the government.
    Government,
}

/// Extract the proposer from a bill title, best effort.
///
/// The fallback chain is: find the last parenthesized clause, then check
/// for the legislator marker, the committee-chair marker, and the
/// government marker, in that order. A malformed or marker-free title is
/// simply `None`.
#[must_use]
pub fn proposer_from_title(title: &str) -> Option<TitleProposer> {
    let clause = title.rsplit_once('(')?.1;
    let clause = clause.split(')').next()?.trim();
    if clause.is_empty() {
        return None;
    }

    if let Some((name, _)) = clause.split_once(SUFFIX_LEGISLATOR) {
        let name = name.trim();
        if !name.is_empty() {
            return Some(TitleProposer::Legislator(format!(
                "{name}{SUFFIX_LEGISLATOR}"
            )));
        }
    }
    if clause.contains(SUFFIX_CHAIR) {
        return Some(TitleProposer::Committee(clause.to_string()));
    }
    if clause.contains(MARKER_GOVERNMENT) {
        return Some(TitleProposer::Government);
    }
    None
}

/// Strip honorific/role suffixes from a proposer name before member lookup.
#[must_use]
pub fn clean_proposer_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    for suffix in [SUFFIX_LEGISLATOR, SUFFIX_CHAIR, SUFFIX_COMMITTEE] {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned.trim().to_string()
}

/// Build the title-derived default proposer info for one bill record.
///
/// The proposer-detail endpoint overrides this when it answers; when that
/// endpoint is failing or empty this is all the sync engine gets.
#[must_use]
pub fn proposer_info_from_record(record: &RawRecord) -> ProposerInfo {
    let mut info = ProposerInfo {
        proposer_label: ["PPSR_CN", "PPSR_NM", "PROPOSER", "PRESENTER"]
            .iter()
            .find_map(|key| field_string(record, key)),
        ..ProposerInfo::default()
    };

    let title = field_string(record, "BILL_NAME").unwrap_or_default();
    match proposer_from_title(&title) {
        Some(TitleProposer::Legislator(name)) => info.rep_proposer = Some(name),
        Some(TitleProposer::Committee(label)) => {
            info.rep_proposer = Some(label);
            info.is_committee = true;
        }
        Some(TitleProposer::Government) => {
            info.rep_proposer = Some(MARKER_GOVERNMENT.to_string());
            info.is_government = true;
        }
        None => {}
    }

    info
}

/// Normalize one roster record into a [`MemberRecord`].
///
/// Returns `None` when the record has no usable name, since name is the
/// upsert key.
#[must_use]
pub fn member_record_from(record: &RawRecord) -> Option<MemberRecord> {
    let name = field_string(record, "HG_NM")?;

    Some(MemberRecord {
        name,
        hanja_name: field_string(record, "HJ_NM"),
        eng_name: field_string(record, "ENG_NM"),
        birth_date: field_string(record, "BTH_DATE").and_then(|s| parse_flex_date(&s)),
        birth_gbn: field_string(record, "BTH_GBN_NM"),
        party: field_string(record, "POLY_NM"),
        district: field_string(record, "ORIG_NM"),
        position: field_string(record, "JOB_RES_NM"),
        committee: field_string(record, "CMIT_NM"),
        committees: field_string(record, "CMITS"),
        reele_gbn: field_string(record, "REELE_GBN_NM"),
        units: field_string(record, "UNITS"),
        tel_no: field_string(record, "TEL_NO"),
        email: field_string(record, "E_MAIL"),
        homepage: field_string(record, "HOMEPAGE"),
    })
}

/// Assemble a [`NewBill`] from a bill-feed record plus resolved proposer
/// info. Member linkage (`proposer_id`) is the sync engine's job.
#[must_use]
pub fn new_bill_from_record(record: &RawRecord, bill_id: String, info: &ProposerInfo) -> NewBill {
    let proc_result = field_string(record, "PROC_RESULT_CD");
    let proc_date = field_string(record, "PROC_DT").and_then(|s| parse_flex_date(&s));

    NewBill {
        bill_id,
        bill_no: field_string(record, "BILL_NO"),
        title: field_string(record, "BILL_NAME").unwrap_or_default(),
        proposer: info
            .rep_proposer
            .clone()
            .or_else(|| info.proposer_label.clone()),
        rep_proposer: info.rep_proposer.clone(),
        proposer_clean: info
            .rep_proposer
            .as_deref()
            .map(clean_proposer_name)
            .filter(|s| !s.is_empty()),
        co_proposers: (!info.co_proposers.is_empty()).then(|| info.co_proposers.join(", ")),
        status: proc_result
            .clone()
            .or_else(|| Some(STATUS_PENDING.to_string())),
        committee: field_string(record, "CURR_COMMITTEE"),
        proposal_date: proc_date,
        content: None, // summary text requires a separate detail fetch
        bill_kind: field_string(record, "BILL_KIND_CD"),
        vote_result: proc_result,
        vote_date: proc_date,
        proposer_id: None,
    }
}
