//! Sync engine behavior against scripted upstream and in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;

use assembly_api::assembly::mock::MockAssemblyClient;
use assembly_api::assembly::ApiClientError;
use assembly_api::domain::NewBill;
use assembly_api::sync::mock::MockSyncStore;
use assembly_api::sync::{sync_bills, sync_members, SyncOptions, SyncStore, COMMIT_BATCH};

use common::{bill_record, member_record};

fn fast_options() -> SyncOptions {
    SyncOptions {
        page_delay: Duration::ZERO,
        record_delay: Duration::ZERO,
        record_delay_degraded: Duration::ZERO,
        ..SyncOptions::default()
    }
}

fn full_options() -> SyncOptions {
    SyncOptions {
        incremental: false,
        ..fast_options()
    }
}

async fn seed_bill(store: &MockSyncStore, bill_id: &str, date: Option<NaiveDate>) {
    store
        .stage_bill(NewBill {
            bill_id: bill_id.to_string(),
            title: "기존 의안".to_string(),
            proposal_date: date,
            ..NewBill::default()
        })
        .await
        .unwrap();
    store.commit_staged().await.unwrap();
}

#[tokio::test]
async fn repeated_passes_do_not_duplicate_bills() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    client.push_bill_page(vec![
        bill_record("A1", "소득세법 일부개정법률안(홍길동의원 대표발의)", None),
        bill_record("A2", "국적법 일부개정법률안(법제사법위원장)", None),
        bill_record("A3", "정부조직법 일부개정법률안(정부)", None),
    ]);

    let first = sync_bills(&store, &client, &full_options()).await.unwrap();
    assert_eq!(first.new, 3);
    assert_eq!(store.bills().len(), 3);

    let second = sync_bills(&store, &client, &full_options()).await.unwrap();
    assert_eq!(second.new, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(store.bills().len(), 3);
}

#[tokio::test]
async fn incremental_cutoff_skips_old_but_not_dateless_bills() {
    let store = MockSyncStore::new();
    seed_bill(&store, "SEED", NaiveDate::from_ymd_opt(2024, 6, 1)).await;

    let client = MockAssemblyClient::new();
    client.push_bill_page(vec![
        bill_record("OLD", "오래된 의안(정부)", Some("2024-05-01")),
        bill_record("SAME", "같은 날 의안(정부)", Some("2024-06-01")),
        bill_record("NEW", "새 의안(정부)", Some("2024-06-02")),
        bill_record("NODATE", "날짜 없는 의안(정부)", None),
    ]);

    let outcome = sync_bills(&store, &client, &fast_options()).await.unwrap();
    assert_eq!(outcome.new, 2);
    assert_eq!(outcome.skipped, 2);

    let bills = store.bills();
    assert!(bills.contains_key("NEW"));
    assert!(bills.contains_key("NODATE"));
    assert!(!bills.contains_key("OLD"));
    assert!(!bills.contains_key("SAME"));
}

#[tokio::test]
async fn update_existing_patches_known_bills_in_place() {
    let store = MockSyncStore::new();
    seed_bill(&store, "A1", None).await;

    let client = MockAssemblyClient::new();
    client.push_bill_page(vec![bill_record(
        "A1",
        "소득세법 일부개정법률안(정부)",
        Some("2024-08-01"),
    )]);

    let options = SyncOptions {
        update_existing: true,
        ..full_options()
    };
    let outcome = sync_bills(&store, &client, &options).await.unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.new, 0);

    let bill = &store.bills()["A1"];
    assert_eq!(bill.vote_result.as_deref(), Some("원안가결"));
    assert_eq!(bill.vote_date, NaiveDate::from_ymd_opt(2024, 8, 1));
}

#[tokio::test]
async fn records_without_any_id_are_skipped_with_no_insert() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    let malformed = json!({"BILL_NAME": "이름만 있는 의안(정부)"})
        .as_object()
        .cloned()
        .unwrap();
    client.push_bill_page(vec![malformed, bill_record("A1", "정상 의안(정부)", None)]);

    let outcome = sync_bills(&store, &client, &full_options()).await.unwrap();
    assert_eq!(outcome.new, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(store.bills().len(), 1);
}

#[tokio::test]
async fn bill_number_serves_as_fallback_key() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    let no_bill_id = json!({"BILL_NO": "2200042", "BILL_NAME": "번호만 있는 의안(정부)"})
        .as_object()
        .cloned()
        .unwrap();
    client.push_bill_page(vec![no_bill_id]);

    let outcome = sync_bills(&store, &client, &full_options()).await.unwrap();
    assert_eq!(outcome.new, 1);
    assert!(store.bills().contains_key("2200042"));
}

#[tokio::test]
async fn incremental_run_stops_after_a_page_with_nothing_new() {
    let store = MockSyncStore::new();
    seed_bill(&store, "SEED", NaiveDate::from_ymd_opt(2024, 6, 1)).await;

    let client = MockAssemblyClient::new();
    client.push_bill_page(vec![bill_record(
        "OLD",
        "오래된 의안(정부)",
        Some("2024-05-01"),
    )]);
    client.push_bill_page(vec![bill_record(
        "OLDER",
        "더 오래된 의안(정부)",
        Some("2024-04-01"),
    )]);

    let outcome = sync_bills(&store, &client, &fast_options()).await.unwrap();
    assert_eq!(outcome.new, 0);
    // The feed is newest-first, so the second page is never requested.
    assert_eq!(client.bill_page_calls(), vec![1]);
}

#[tokio::test]
async fn full_run_pages_until_the_feed_is_exhausted() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    client.push_bill_page(vec![bill_record("A1", "의안 하나(정부)", None)]);
    client.push_bill_page(vec![bill_record("A2", "의안 둘(정부)", None)]);

    let outcome = sync_bills(&store, &client, &full_options()).await.unwrap();
    assert_eq!(outcome.new, 2);
    assert_eq!(client.bill_page_calls(), vec![1, 2, 3]);
}

#[tokio::test]
async fn new_bills_commit_in_batches() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    let page: Vec<_> = (0..25)
        .map(|i| bill_record(&format!("B{i:02}"), "대량 의안(정부)", None))
        .collect();
    client.push_bill_page(page);

    let outcome = sync_bills(&store, &client, &full_options()).await.unwrap();
    assert_eq!(outcome.new, 25);
    assert!(outcome.new > COMMIT_BATCH);
    assert_eq!(store.bills().len(), 25);
    assert_eq!(store.staged_len(), 0);
    // Mid-page batch, end-of-page, and final flush.
    assert_eq!(store.commit_calls(), 3);
}

#[tokio::test]
async fn commit_failure_aborts_the_run() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    let page: Vec<_> = (0..25)
        .map(|i| bill_record(&format!("B{i:02}"), "대량 의안(정부)", None))
        .collect();
    client.push_bill_page(page);
    store.fail_next_commit();

    let result = sync_bills(&store, &client, &full_options()).await;
    assert!(result.is_err());
    assert!(store.bills().is_empty());
}

#[tokio::test]
async fn lead_sponsor_is_linked_and_counted() {
    let store = MockSyncStore::new();
    let member_id = store.add_member("홍길동");

    let client = MockAssemblyClient::new();
    client.push_bill_page(vec![
        bill_record("A1", "소득세법 일부개정법률안(홍길동의원 대표발의)", None),
        bill_record("A2", "국적법 일부개정법률안(법제사법위원장)", None),
        bill_record("A3", "정부조직법 일부개정법률안(정부)", None),
    ]);

    sync_bills(&store, &client, &full_options()).await.unwrap();

    let bills = store.bills();
    assert_eq!(bills["A1"].proposer_id, Some(member_id));
    assert_eq!(bills["A2"].proposer_id, None);
    assert_eq!(bills["A3"].proposer_id, None);

    let member = store
        .members()
        .into_iter()
        .find(|m| m.id == member_id)
        .unwrap();
    assert_eq!(member.num_bills, 1);
}

#[tokio::test]
async fn roster_sync_inserts_then_merges() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    client.set_members(vec![
        member_record("홍길동", "더불어민주당"),
        member_record("김철수", "국민의힘"),
    ]);

    let first = sync_members(&store, &client, 22).await.unwrap();
    assert_eq!(first.new, 2);
    assert_eq!(first.scored, 2);

    client.set_members(vec![
        member_record("홍길동", "더불어민주당"),
        member_record("김철수", "국민의힘"),
    ]);
    let second = sync_members(&store, &client, 22).await.unwrap();
    assert_eq!(second.new, 0);
    assert_eq!(second.merged, 2);
    assert_eq!(store.members().len(), 2);
}

#[tokio::test]
async fn roster_fetch_failure_is_an_empty_pass_not_an_error() {
    let store = MockSyncStore::new();
    let client = MockAssemblyClient::new();
    client.set_members_error(ApiClientError::Status {
        status: 503,
        message: "unavailable".to_string(),
    });

    let outcome = sync_members(&store, &client, 22).await.unwrap();
    assert_eq!(outcome.new, 0);
    assert!(store.members().is_empty());
}

#[tokio::test]
async fn member_sync_refreshes_activity_scores() {
    let store = MockSyncStore::new();
    store.add_member_with_stats("홍길동", 25, 90.0, 100, 80.0);

    let client = MockAssemblyClient::new();
    client.set_members(vec![member_record("홍길동", "더불어민주당")]);

    sync_members(&store, &client, 22).await.unwrap();

    let member = store.members().into_iter().next().unwrap();
    assert!((member.activity_score - 65.0).abs() < f64::EPSILON);
}
