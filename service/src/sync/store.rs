//! Persistence seam for the sync engine.
//!
//! The engine is written against [`SyncStore`] so its state machine can be
//! exercised with the in-memory [`mock::MockSyncStore`]; production uses
//! [`PgSyncStore`], which stages new bills in memory and writes each batch
//! in one transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx_postgres::PgPool;
use std::sync::Mutex;

use crate::domain::{MemberRecord, NewBill};
use crate::repo::{self, StoreError};

/// Store operations the sync engine needs.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Low-water mark for incremental sync: the most recent stored
    /// proposal date.
    async fn latest_proposal_date(&self) -> Result<Option<NaiveDate>, StoreError>;

    /// Whether a bill with this external ID exists, committed or staged.
    async fn bill_exists(&self, bill_id: &str) -> Result<bool, StoreError>;

    /// Patch status/vote fields of an already-stored bill.
    async fn patch_bill_result(
        &self,
        bill_id: &str,
        status: Option<&str>,
        vote_date: Option<NaiveDate>,
    ) -> Result<(), StoreError>;

    /// Member ID for an exact (cleaned) name match, if any.
    async fn find_member_id_by_name(&self, name: &str) -> Result<Option<i64>, StoreError>;

    /// Buffer one new bill for the next batch commit.
    async fn stage_bill(&self, bill: NewBill) -> Result<(), StoreError>;

    /// Commit all staged bills in one transaction, bumping the sponsor's
    /// bill count for each inserted row. A no-op when nothing is staged.
    async fn commit_staged(&self) -> Result<(), StoreError>;

    /// Insert or merge one roster record. Returns `true` when inserted.
    async fn upsert_member(&self, record: &MemberRecord) -> Result<bool, StoreError>;

    /// Recompute all activity scores. Returns the number of members scored.
    async fn refresh_activity_scores(&self) -> Result<u64, StoreError>;
}

/// Postgres-backed [`SyncStore`].
///
/// Create one per sync run; the staging buffer is not meant to outlive a
/// run.
pub struct PgSyncStore {
    pool: PgPool,
    staged: Mutex<Vec<NewBill>>,
}

impl PgSyncStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            staged: Mutex::new(Vec::new()),
        }
    }

    fn drain_staged(&self) -> Vec<NewBill> {
        match self.staged.lock() {
            Ok(mut staged) => std::mem::take(&mut *staged),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn latest_proposal_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        repo::bills::latest_proposal_date(&self.pool).await
    }

    async fn bill_exists(&self, bill_id: &str) -> Result<bool, StoreError> {
        {
            let staged = match self.staged.lock() {
                Ok(staged) => staged,
                Err(poisoned) => poisoned.into_inner(),
            };
            if staged.iter().any(|bill| bill.bill_id == bill_id) {
                return Ok(true);
            }
        }
        repo::bills::exists(&self.pool, bill_id).await
    }

    async fn patch_bill_result(
        &self,
        bill_id: &str,
        status: Option<&str>,
        vote_date: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        repo::bills::patch_result(&self.pool, bill_id, status, vote_date).await
    }

    async fn find_member_id_by_name(&self, name: &str) -> Result<Option<i64>, StoreError> {
        repo::members::find_id_by_name(&self.pool, name).await
    }

    async fn stage_bill(&self, bill: NewBill) -> Result<(), StoreError> {
        match self.staged.lock() {
            Ok(mut staged) => staged.push(bill),
            Err(poisoned) => poisoned.into_inner().push(bill),
        }
        Ok(())
    }

    async fn commit_staged(&self) -> Result<(), StoreError> {
        let batch = self.drain_staged();
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for bill in &batch {
            let inserted = repo::bills::insert(&mut *tx, bill).await?;
            if inserted {
                if let Some(member_id) = bill.proposer_id {
                    sqlx::query("UPDATE members SET num_bills = num_bills + 1 WHERE id = $1")
                        .bind(member_id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_member(&self, record: &MemberRecord) -> Result<bool, StoreError> {
        repo::members::upsert_from_record(&self.pool, record).await
    }

    async fn refresh_activity_scores(&self) -> Result<u64, StoreError> {
        repo::members::refresh_activity_scores(&self.pool).await
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
    //! In-memory store for sync engine tests.

    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::domain::{MemberRecord, NewBill};
    use crate::repo::StoreError;

    use super::SyncStore;

    /// A member as tracked by the mock store.
    #[derive(Debug, Clone)]
    pub struct MockMember {
        pub id: i64,
        pub name: String,
        pub num_bills: i64,
        pub attendance_rate: f64,
        pub speech_count: i64,
        pub bill_pass_rate: f64,
        pub activity_score: f64,
    }

    #[derive(Debug, Default)]
    struct Inner {
        bills: BTreeMap<String, NewBill>,
        staged: Vec<NewBill>,
        members: Vec<MockMember>,
        next_member_id: i64,
    }

    /// In-memory implementation of [`SyncStore`].
    ///
    /// Committed bills live in a map keyed by external bill ID, so a
    /// repeated insert of the same ID is ignored exactly like the
    /// database's unique constraint. `fail_next_commit` simulates a
    /// commit-time persistence failure.
    #[derive(Debug, Default)]
    pub struct MockSyncStore {
        inner: Mutex<Inner>,
        fail_next_commit: AtomicBool,
        commit_calls: AtomicU32,
    }

    impl MockSyncStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed one member with zeroed statistics.
        pub fn add_member(&self, name: &str) -> i64 {
            let mut inner = self.inner.lock().unwrap();
            inner.next_member_id += 1;
            let id = inner.next_member_id;
            inner.members.push(MockMember {
                id,
                name: name.to_string(),
                num_bills: 0,
                attendance_rate: 0.0,
                speech_count: 0,
                bill_pass_rate: 0.0,
                activity_score: 0.0,
            });
            id
        }

        /// Seed one member with explicit statistics.
        pub fn add_member_with_stats(
            &self,
            name: &str,
            num_bills: i64,
            attendance_rate: f64,
            speech_count: i64,
            bill_pass_rate: f64,
        ) -> i64 {
            let id = self.add_member(name);
            let mut inner = self.inner.lock().unwrap();
            if let Some(member) = inner.members.iter_mut().find(|m| m.id == id) {
                member.num_bills = num_bills;
                member.attendance_rate = attendance_rate;
                member.speech_count = speech_count;
                member.bill_pass_rate = bill_pass_rate;
            }
            id
        }

        /// Make the next `commit_staged` call fail.
        pub fn fail_next_commit(&self) {
            self.fail_next_commit.store(true, Ordering::Relaxed);
        }

        /// Committed bills, keyed by external bill ID.
        pub fn bills(&self) -> BTreeMap<String, NewBill> {
            self.inner.lock().unwrap().bills.clone()
        }

        /// All members, including synced statistics.
        pub fn members(&self) -> Vec<MockMember> {
            self.inner.lock().unwrap().members.clone()
        }

        /// Number of `commit_staged` calls so far.
        pub fn commit_calls(&self) -> u32 {
            self.commit_calls.load(Ordering::Relaxed)
        }

        /// Number of bills still staged (uncommitted).
        pub fn staged_len(&self) -> usize {
            self.inner.lock().unwrap().staged.len()
        }
    }

    #[async_trait]
    impl SyncStore for MockSyncStore {
        async fn latest_proposal_date(&self) -> Result<Option<NaiveDate>, StoreError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.bills.values().filter_map(|b| b.proposal_date).max())
        }

        async fn bill_exists(&self, bill_id: &str) -> Result<bool, StoreError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.bills.contains_key(bill_id)
                || inner.staged.iter().any(|b| b.bill_id == bill_id))
        }

        async fn patch_bill_result(
            &self,
            bill_id: &str,
            status: Option<&str>,
            vote_date: Option<NaiveDate>,
        ) -> Result<(), StoreError> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(bill) = inner.bills.get_mut(bill_id) {
                if let Some(status) = status {
                    bill.status = Some(status.to_string());
                }
                bill.vote_result = status.map(String::from);
                if vote_date.is_some() {
                    bill.vote_date = vote_date;
                }
            }
            Ok(())
        }

        async fn find_member_id_by_name(&self, name: &str) -> Result<Option<i64>, StoreError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.members.iter().find(|m| m.name == name).map(|m| m.id))
        }

        async fn stage_bill(&self, bill: NewBill) -> Result<(), StoreError> {
            self.inner.lock().unwrap().staged.push(bill);
            Ok(())
        }

        async fn commit_staged(&self) -> Result<(), StoreError> {
            self.commit_calls.fetch_add(1, Ordering::Relaxed);
            if self.fail_next_commit.swap(false, Ordering::Relaxed) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }

            let mut inner = self.inner.lock().unwrap();
            let staged = std::mem::take(&mut inner.staged);
            for bill in staged {
                if inner.bills.contains_key(&bill.bill_id) {
                    continue; // unique constraint: later duplicates are dropped
                }
                if let Some(member_id) = bill.proposer_id {
                    if let Some(member) = inner.members.iter_mut().find(|m| m.id == member_id) {
                        member.num_bills += 1;
                    }
                }
                inner.bills.insert(bill.bill_id.clone(), bill);
            }
            Ok(())
        }

        async fn upsert_member(&self, record: &MemberRecord) -> Result<bool, StoreError> {
            let existing = self.find_member_id_by_name(&record.name).await?;
            if existing.is_some() {
                return Ok(false);
            }
            self.add_member(&record.name);
            Ok(true)
        }

        async fn refresh_activity_scores(&self) -> Result<u64, StoreError> {
            let mut inner = self.inner.lock().unwrap();
            for member in &mut inner.members {
                member.activity_score = ad_scoring::activity_score(ad_scoring::ActivityInputs {
                    num_bills: member.num_bills,
                    attendance_rate: member.attendance_rate,
                    speech_count: member.speech_count,
                    bill_pass_rate: member.bill_pass_rate,
                });
            }
            Ok(inner.members.len() as u64)
        }
    }
}
