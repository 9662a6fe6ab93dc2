//! HTTP client for the legislative open-data API.
//!
//! The trait abstraction mirrors the rest of the service's seams: the sync
//! engine is written against [`AssemblyApiClient`] so unit tests can script
//! upstream behavior with [`mock::MockAssemblyClient`] while production uses
//! [`HttpAssemblyClient`] over reqwest.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use super::envelope::{classify_result, extract_rows, UpstreamResult};
use super::types::{ProposerInfo, RawRecord};
use crate::mapping;

/// Member roster endpoint (the portal uses opaque endpoint identifiers).
const EP_MEMBER_ROSTER: &str = "nwvrqwxyaytdsfvhu";
/// Paged bill feed for one legislature term.
const EP_BILL_FEED: &str = "ncocpgfiaoituanbr";
/// Proposer detail for one bill.
const EP_BILL_PROPOSERS: &str = "BILLINFOPPSR";

/// Consecutive proposer-lookup failures after which further lookups are
/// skipped client-side until one succeeds.
pub const MAX_PROPOSER_FAILURES: u32 = 5;

/// Errors from one upstream query.
///
/// Sync callers treat every variant the same way (log it and carry on with
/// an empty result), so the variants exist for diagnostics, not control
/// flow.
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// Network failure, timeout, or unparseable JSON body.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx HTTP status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The portal answered with a non-success, non-"no data" result code.
    #[error("upstream error {code}: {message}")]
    Upstream { code: String, message: String },
}

/// Operations against the legislative open-data service.
#[async_trait]
pub trait AssemblyApiClient: Send + Sync {
    /// Fetch the member roster for one legislature term, optionally
    /// filtered by name or party.
    async fn fetch_members(
        &self,
        term: u16,
        name: Option<&str>,
        party: Option<&str>,
    ) -> Result<Vec<RawRecord>, ApiClientError>;

    /// Fetch one page of the bill feed. An empty page means the feed is
    /// exhausted.
    async fn fetch_bill_page(
        &self,
        term: u16,
        page_index: u32,
        page_size: u32,
    ) -> Result<Vec<RawRecord>, ApiClientError>;

    /// Resolve proposer info for one bill.
    ///
    /// Infallible by design: the title-derived default from `record` is
    /// returned whenever the detail endpoint fails, returns nothing, or is
    /// being skipped because its circuit breaker is open.
    async fn fetch_bill_proposers(&self, bill_id: &str, record: &RawRecord) -> ProposerInfo;

    /// Whether proposer-detail lookups are currently being skipped.
    fn proposer_breaker_open(&self) -> bool;
}

/// HTTP-based implementation of [`AssemblyApiClient`].
pub struct HttpAssemblyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    /// Consecutive proposer-lookup failures. Lives on the client value, not
    /// in a global, so every caller sharing this client shares the breaker.
    proposer_failures: AtomicU32,
}

impl HttpAssemblyClient {
    /// Create a new client with the given base URL, API key, and
    /// per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
            proposer_failures: AtomicU32::new(0),
        }
    }

    /// Issue one GET against `endpoint` and normalize the envelope.
    ///
    /// The API key and JSON-format flag are injected here; the "no
    /// matching data" sentinel comes back as an empty list rather than an
    /// error so callers never special-case it.
    async fn request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<RawRecord>, ApiClientError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, ?params, "querying open-data portal");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("KEY", self.api_key.as_str()), ("Type", "json")])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        match classify_result(&body) {
            UpstreamResult::Success => Ok(extract_rows(endpoint, &body)),
            UpstreamResult::NoData => {
                debug!(endpoint, "portal reports no matching data");
                Ok(Vec::new())
            }
            UpstreamResult::Error { code, message } => {
                Err(ApiClientError::Upstream { code, message })
            }
        }
    }

    fn record_proposer_failure(&self, bill_id: &str, reason: &str) {
        let failures = self.proposer_failures.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            bill_id,
            failures,
            threshold = MAX_PROPOSER_FAILURES,
            reason,
            "proposer lookup produced nothing"
        );
    }
}

#[async_trait]
impl AssemblyApiClient for HttpAssemblyClient {
    async fn fetch_members(
        &self,
        term: u16,
        name: Option<&str>,
        party: Option<&str>,
    ) -> Result<Vec<RawRecord>, ApiClientError> {
        let mut params = vec![
            ("ASSEMBLY", term.to_string()),
            ("pIndex", "1".to_string()),
            // The roster fits in one maximal page.
            ("pSize", "300".to_string()),
        ];
        if let Some(name) = name {
            params.push(("HG_NM", name.to_string()));
        }
        if let Some(party) = party {
            params.push(("POLY_NM", party.to_string()));
        }

        self.request(EP_MEMBER_ROSTER, &params).await
    }

    async fn fetch_bill_page(
        &self,
        term: u16,
        page_index: u32,
        page_size: u32,
    ) -> Result<Vec<RawRecord>, ApiClientError> {
        let params = [
            ("AGE", term.to_string()),
            ("pIndex", page_index.to_string()),
            ("pSize", page_size.to_string()),
        ];

        self.request(EP_BILL_FEED, &params).await
    }

    async fn fetch_bill_proposers(&self, bill_id: &str, record: &RawRecord) -> ProposerInfo {
        let mut info = mapping::proposer_info_from_record(record);

        if self.proposer_breaker_open() {
            debug!(
                bill_id,
                failures = self.proposer_failures.load(Ordering::Relaxed),
                "skipping proposer lookup, breaker open"
            );
            return info;
        }

        let params = [
            ("BILL_ID", bill_id.to_string()),
            ("pIndex", "1".to_string()),
            ("pSize", "100".to_string()),
        ];

        match self.request(EP_BILL_PROPOSERS, &params).await {
            Ok(rows) if !rows.is_empty() => {
                let mut rep = None;
                let mut co = Vec::new();
                for row in &rows {
                    let name = mapping::field_string(row, "PPSR_NM").unwrap_or_default();
                    if name.is_empty() {
                        continue;
                    }
                    if mapping::field_string(row, "REP_DIV").as_deref() == Some("대표발의") {
                        rep = Some(name);
                    } else {
                        co.push(name);
                    }
                }

                if let Some(rep) = rep {
                    info.rep_proposer = Some(rep);
                }
                if !co.is_empty() {
                    info.co_proposers = co;
                }

                self.proposer_failures.store(0, Ordering::Relaxed);
            }
            // An empty answer counts as a failure for breaker purposes.
            Ok(_) => self.record_proposer_failure(bill_id, "no data"),
            Err(err) => {
                self.record_proposer_failure(bill_id, "call failed");
                error!(bill_id, error = %err, "proposer lookup failed");
            }
        }

        info
    }

    fn proposer_breaker_open(&self) -> bool {
        self.proposer_failures.load(Ordering::Relaxed) >= MAX_PROPOSER_FAILURES
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{ApiClientError, AssemblyApiClient, ProposerInfo, RawRecord};
    use crate::mapping;

    /// Mock implementation of [`AssemblyApiClient`] for unit tests.
    ///
    /// Bill pages are scripted with `push_bill_page`; any page index past
    /// the scripted pages comes back empty ("feed exhausted"). Proposer
    /// lookups answer from a per-bill map and otherwise fall back to the
    /// same title heuristic as the real client.
    pub struct MockAssemblyClient {
        members: Mutex<Vec<RawRecord>>,
        members_error: Mutex<Option<ApiClientError>>,
        bill_pages: Mutex<Vec<Vec<RawRecord>>>,
        proposers: Mutex<HashMap<String, ProposerInfo>>,
        breaker_open: AtomicBool,
        bill_page_calls: Mutex<Vec<u32>>,
        proposer_calls: Mutex<Vec<String>>,
    }

    impl MockAssemblyClient {
        pub fn new() -> Self {
            Self {
                members: Mutex::new(Vec::new()),
                members_error: Mutex::new(None),
                bill_pages: Mutex::new(Vec::new()),
                proposers: Mutex::new(HashMap::new()),
                breaker_open: AtomicBool::new(false),
                bill_page_calls: Mutex::new(Vec::new()),
                proposer_calls: Mutex::new(Vec::new()),
            }
        }

        /// Set the roster returned by `fetch_members`.
        pub fn set_members(&self, members: Vec<RawRecord>) {
            *self.members.lock().unwrap() = members;
        }

        /// Make the next `fetch_members` call fail.
        pub fn set_members_error(&self, error: ApiClientError) {
            *self.members_error.lock().unwrap() = Some(error);
        }

        /// Append one scripted bill-feed page.
        pub fn push_bill_page(&self, page: Vec<RawRecord>) {
            self.bill_pages.lock().unwrap().push(page);
        }

        /// Script the proposer answer for one bill ID.
        pub fn set_proposers(&self, bill_id: &str, info: ProposerInfo) {
            self.proposers.lock().unwrap().insert(bill_id.into(), info);
        }

        /// Force the proposer circuit breaker open or closed.
        pub fn set_breaker_open(&self, open: bool) {
            self.breaker_open.store(open, Ordering::Relaxed);
        }

        /// Page indexes passed to `fetch_bill_page`.
        pub fn bill_page_calls(&self) -> Vec<u32> {
            self.bill_page_calls.lock().unwrap().clone()
        }

        /// Bill IDs passed to `fetch_bill_proposers`.
        pub fn proposer_calls(&self) -> Vec<String> {
            self.proposer_calls.lock().unwrap().clone()
        }
    }

    impl Default for MockAssemblyClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AssemblyApiClient for MockAssemblyClient {
        async fn fetch_members(
            &self,
            _term: u16,
            _name: Option<&str>,
            _party: Option<&str>,
        ) -> Result<Vec<RawRecord>, ApiClientError> {
            if let Some(err) = self.members_error.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self.members.lock().unwrap().clone())
        }

        async fn fetch_bill_page(
            &self,
            _term: u16,
            page_index: u32,
            _page_size: u32,
        ) -> Result<Vec<RawRecord>, ApiClientError> {
            self.bill_page_calls.lock().unwrap().push(page_index);
            let pages = self.bill_pages.lock().unwrap();
            Ok(pages
                .get(page_index.saturating_sub(1) as usize)
                .cloned()
                .unwrap_or_default())
        }

        async fn fetch_bill_proposers(&self, bill_id: &str, record: &RawRecord) -> ProposerInfo {
            self.proposer_calls.lock().unwrap().push(bill_id.into());
            self.proposers
                .lock()
                .unwrap()
                .get(bill_id)
                .cloned()
                .unwrap_or_else(|| mapping::proposer_info_from_record(record))
        }

        fn proposer_breaker_open(&self) -> bool {
            self.breaker_open.load(Ordering::Relaxed)
        }
    }
}
