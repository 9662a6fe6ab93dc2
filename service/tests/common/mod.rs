//! Shared fixtures for integration tests.

// Not every test crate uses every fixture.
#![allow(dead_code)]

use assembly_api::assembly::RawRecord;
use serde_json::{json, Value};

/// Build a bill-feed record with the fields the sync engine reads.
#[must_use]
pub fn bill_record(bill_id: &str, title: &str, proc_date: Option<&str>) -> RawRecord {
    let mut record = json!({
        "BILL_ID": bill_id,
        "BILL_NO": format!("22{bill_id}"),
        "BILL_NAME": title,
        "CURR_COMMITTEE": "기획재정위원회",
        "BILL_KIND_CD": "법률안",
    });
    if let Some(date) = proc_date {
        record["PROC_DT"] = json!(date);
        record["PROC_RESULT_CD"] = json!("원안가결");
    }
    record.as_object().cloned().unwrap_or_default()
}

/// Build a roster record for one member.
#[must_use]
pub fn member_record(name: &str, party: &str) -> RawRecord {
    json!({
        "HG_NM": name,
        "POLY_NM": party,
        "ORIG_NM": "서울 종로구",
        "CMIT_NM": "기획재정위원회",
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

/// Wrap rows in the object-shaped success envelope
/// (`{EP: {"row": [...]}}`).
#[must_use]
pub fn object_envelope(endpoint: &str, rows: Vec<RawRecord>) -> Value {
    json!({ endpoint: { "row": rows } })
}

/// Wrap rows in the array-shaped success envelope
/// (`{EP: [{"head": ...}, {"row": [...]}]}`).
#[must_use]
pub fn array_envelope(endpoint: &str, rows: Vec<RawRecord>) -> Value {
    json!({
        endpoint: [
            { "head": [{ "list_total_count": rows.len() }] },
            { "row": rows }
        ]
    })
}

/// Bare result envelope carrying only a `RESULT` code, as the portal sends
/// for errors and the "no matching data" sentinel.
#[must_use]
pub fn result_envelope(code: &str, message: &str) -> Value {
    json!({ "RESULT": { "CODE": code, "MESSAGE": message } })
}
