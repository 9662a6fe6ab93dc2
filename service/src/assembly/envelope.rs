//! Normalization of the open-data portal's response envelopes.
//!
//! The portal wraps row data in one of two shapes, depending on endpoint:
//!
//! ```json
//! {"ENDPOINT": {"row": [ ... ]}}
//! {"ENDPOINT": [{"head": ...}, {"row": [ ... ]}]}
//! ```
//!
//! and signals errors (including the "no matching data" sentinel) through a
//! `RESULT` object. Both concerns are handled here as pure functions so the
//! HTTP client stays a thin transport layer and callers only ever see a flat
//! list of records.

use serde_json::Value;

use super::types::RawRecord;

/// Result code meaning success.
const CODE_OK: &str = "INFO-000";

/// Result code meaning "no matching data": an empty result, not an error.
const CODE_NO_DATA: &str = "INFO-200";

/// Classification of the upstream `RESULT` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamResult {
    /// Success, or no `RESULT` object present (row-bearing responses often
    /// omit it).
    Success,
    /// The "no matching data" sentinel. Normalized to an empty row list.
    NoData,
    /// Any other non-success code.
    Error { code: String, message: String },
}

/// Inspect the `RESULT.CODE` field of a response body.
#[must_use]
pub fn classify_result(body: &Value) -> UpstreamResult {
    let Some(result) = body.get("RESULT") else {
        return UpstreamResult::Success;
    };

    let code = result
        .get("CODE")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match code {
        CODE_OK | "" => UpstreamResult::Success,
        CODE_NO_DATA => UpstreamResult::NoData,
        _ => UpstreamResult::Error {
            code: code.to_string(),
            message: result
                .get("MESSAGE")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
    }
}

/// Extract the flat row records for `endpoint` from a success envelope.
///
/// Accepts both documented shapes; a body matching neither (or carrying no
/// `row` array) yields an empty list, which callers treat the same as a
/// "no data" response.
#[must_use]
pub fn extract_rows(endpoint: &str, body: &Value) -> Vec<RawRecord> {
    let Some(payload) = body.get(endpoint) else {
        return Vec::new();
    };

    match payload {
        // {"ENDPOINT": {"row": [...]}}
        Value::Object(map) => rows_of(map.get("row")),
        // {"ENDPOINT": [{"head": ...}, {"row": [...]}]}
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .find_map(|item| item.get("row").map(|row| rows_of(Some(row))))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn rows_of(row: Option<&Value>) -> Vec<RawRecord> {
    row.and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rows() -> Value {
        json!([
            {"BILL_ID": "PRC_A1", "BILL_NO": "2200001"},
            {"BILL_ID": "PRC_A2", "BILL_NO": "2200002"},
        ])
    }

    #[test]
    fn object_and_array_envelopes_normalize_identically() {
        let object_shape = json!({"ALLBILL": {"row": sample_rows()}});
        let array_shape = json!({"ALLBILL": [
            {"head": [{"list_total_count": 2}]},
            {"row": sample_rows()},
        ]});

        let from_object = extract_rows("ALLBILL", &object_shape);
        let from_array = extract_rows("ALLBILL", &array_shape);

        assert_eq!(from_object.len(), 2);
        assert_eq!(from_object, from_array);
        assert_eq!(
            from_object[0].get("BILL_ID").and_then(Value::as_str),
            Some("PRC_A1")
        );
    }

    #[test]
    fn missing_endpoint_key_yields_empty() {
        let body = json!({"OTHER": {"row": sample_rows()}});
        assert!(extract_rows("ALLBILL", &body).is_empty());
    }

    #[test]
    fn array_without_row_element_yields_empty() {
        let body = json!({"ALLBILL": [{"head": {}}]});
        assert!(extract_rows("ALLBILL", &body).is_empty());
    }

    #[test]
    fn empty_row_list_yields_empty() {
        let body = json!({"ALLBILL": {"row": []}});
        assert!(extract_rows("ALLBILL", &body).is_empty());
    }

    #[test]
    fn classify_success_code() {
        let body = json!({"RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다."}});
        assert_eq!(classify_result(&body), UpstreamResult::Success);
    }

    #[test]
    fn classify_missing_result_as_success() {
        let body = json!({"ALLBILL": {"row": []}});
        assert_eq!(classify_result(&body), UpstreamResult::Success);
    }

    #[test]
    fn classify_no_data_sentinel() {
        let body = json!({"RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}});
        assert_eq!(classify_result(&body), UpstreamResult::NoData);
    }

    #[test]
    fn classify_error_code_carries_code_and_message() {
        let body = json!({"RESULT": {"CODE": "ERROR-290", "MESSAGE": "인증키가 유효하지 않습니다."}});
        let UpstreamResult::Error { code, message } = classify_result(&body) else {
            panic!("expected error classification");
        };
        assert_eq!(code, "ERROR-290");
        assert!(message.contains("인증키"));
    }
}
