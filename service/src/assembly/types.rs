//! Data types for open-data API responses.

use serde_json::{Map, Value};

/// One flat record from an upstream response, keyed by the portal's field
/// codes (`HG_NM`, `BILL_ID`, ...). The portal does not document a stable
/// schema per endpoint, so records stay dynamic until the field mapper
/// normalizes them.
pub type RawRecord = Map<String, Value>;

/// Proposer information for one bill, merged from the title heuristic and
/// the proposer-detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposerInfo {
    /// Lead sponsor name, best effort.
    pub rep_proposer: Option<String>,
    /// Raw proposer label from the bill record (e.g. "홍길동의원 등 10인").
    pub proposer_label: Option<String>,
    /// Co-sponsor names.
    pub co_proposers: Vec<String>,
    /// The bill was introduced by a committee (chair).
    pub is_committee: bool,
    /// The bill was submitted by the government.
    pub is_government: bool,
}
