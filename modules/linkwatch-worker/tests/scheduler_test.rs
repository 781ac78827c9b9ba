use std::collections::HashSet;

use chrono::NaiveDate;
use linkwatch_engine::Verdict;
use linkwatch_worker::testing::{row, MemoryRowStore, ScriptedClassifier};
use linkwatch_worker::{Pacing, Scheduler, SheetLayout, Shard, SkipPolicy};

const URL_COL: u32 = 6;
const STATUS_COL: u32 = 13;
const CHECKED_COL: u32 = 15;
const WIDTH: usize = 15;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn header() -> Vec<String> {
    row(WIDTH, &[(URL_COL, "Link"), (STATUS_COL, "Status")])
}

fn link(n: usize) -> String {
    format!("https://city.gov/post/{n}")
}

/// Header plus `n` rows with distinct URLs and no prior status.
fn sheet(n: usize) -> Vec<Vec<String>> {
    let mut rows = vec![header()];
    rows.extend((0..n).map(|i| row(WIDTH, &[(URL_COL, link(i).as_str())])));
    rows
}

fn scheduler(
    store: MemoryRowStore,
    classifier: ScriptedClassifier,
    shard: Shard,
) -> Scheduler<MemoryRowStore, ScriptedClassifier> {
    Scheduler::new(store, classifier, SheetLayout::primary(), shard).with_pacing(Pacing::none())
}

#[tokio::test]
async fn removed_rows_never_reach_the_classifier() {
    let rows = vec![
        header(),
        row(WIDTH, &[(URL_COL, "https://a.test/"), (STATUS_COL, "Removed")]),
        row(WIDTH, &[(URL_COL, "https://b.test/"), (STATUS_COL, "removed ")]),
        row(WIDTH, &[(URL_COL, "https://c.test/"), (STATUS_COL, "Active")]),
    ];
    let store = MemoryRowStore::new(rows);
    let classifier = ScriptedClassifier::new().on("https://c.test/", Verdict::Active);
    let calls = classifier.clone();

    let stats = scheduler(store.clone(), classifier, Shard::single())
        .run(today())
        .await
        .unwrap();

    assert_eq!(calls.calls(), vec!["https://c.test/".to_string()]);
    assert_eq!(stats.skipped_removed, 2);
    assert_eq!(stats.checked, 1);
    assert_eq!(store.updates().len(), 1);
}

#[tokio::test]
async fn four_shards_cover_every_row_exactly_once() {
    let rows = sheet(37);
    let mut seen: Vec<String> = Vec::new();

    for index in 0..4 {
        let classifier = ScriptedClassifier::new();
        let calls = classifier.clone();
        scheduler(
            MemoryRowStore::new(rows.clone()),
            classifier,
            Shard::new(index, 4).unwrap(),
        )
        .run(today())
        .await
        .unwrap();
        seen.extend(calls.calls());
    }

    let unique: HashSet<&String> = seen.iter().collect();
    assert_eq!(seen.len(), 37);
    assert_eq!(unique.len(), 37);
    assert!((0..37).all(|i| unique.contains(&link(i))));
}

#[tokio::test]
async fn shard_owns_by_ordinal_including_header() {
    let store = MemoryRowStore::new(sheet(6));
    let classifier = ScriptedClassifier::new();
    let calls = classifier.clone();

    let stats = scheduler(store, classifier, Shard::new(0, 2).unwrap())
        .run(today())
        .await
        .unwrap();

    // Even ordinals past the header hold the odd links.
    assert_eq!(calls.calls(), vec![link(1), link(3), link(5)]);
    assert_eq!(stats.rows_seen, 6);
    assert_eq!(stats.owned, 3);
}

#[tokio::test]
async fn updates_flush_in_batches_with_final_remainder() {
    let store = MemoryRowStore::new(sheet(7));
    let stats = scheduler(store.clone(), ScriptedClassifier::new(), Shard::single())
        .with_flush_every(3)
        .run(today())
        .await
        .unwrap();

    let sizes: Vec<usize> = store.batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
    assert_eq!(stats.flushes, 3);
}

#[tokio::test]
async fn nothing_to_write_means_no_flush() {
    let rows = vec![
        header(),
        row(WIDTH, &[(URL_COL, "https://a.test/"), (STATUS_COL, "Removed")]),
    ];
    let store = MemoryRowStore::new(rows);
    let stats = scheduler(store.clone(), ScriptedClassifier::new(), Shard::single())
        .run(today())
        .await
        .unwrap();

    assert!(store.batches().is_empty());
    assert_eq!(stats.flushes, 0);
}

#[tokio::test]
async fn removal_date_written_only_for_removed() {
    let mut rows = sheet(0);
    rows.push(row(WIDTH, &[(URL_COL, "https://a.test/")]));
    rows.push(row(WIDTH, &[(URL_COL, "https://b.test/")]));
    rows.push(row(WIDTH, &[(URL_COL, "https://c.test/")]));
    let store = MemoryRowStore::new(rows);
    let classifier = ScriptedClassifier::new()
        .on("https://a.test/", Verdict::Removed)
        .on("https://b.test/", Verdict::Active)
        .on("https://c.test/", Verdict::LoginRequired);

    let stats = scheduler(store.clone(), classifier, Shard::single())
        .run(today())
        .await
        .unwrap();

    assert_eq!(
        store.update_for("'Logs'!M2:O2").unwrap(),
        vec!["Removed", "06/10/2024", "06/10/2024"]
    );
    assert_eq!(
        store.update_for("'Logs'!M3:O3").unwrap(),
        vec!["Active", "", "06/10/2024"]
    );
    assert_eq!(
        store.update_for("'Logs'!M4:O4").unwrap(),
        vec!["Login Required", "", "06/10/2024"]
    );
    assert_eq!((stats.removed, stats.active, stats.login_required), (1, 1, 1));
}

#[tokio::test]
async fn empty_and_short_rows_are_skipped() {
    let rows = vec![
        header(),
        vec!["only".to_string(), "two".to_string()],
        row(WIDTH, &[(URL_COL, "   ")]),
        row(WIDTH, &[(URL_COL, "https://a.test/")]),
    ];
    let store = MemoryRowStore::new(rows);
    let classifier = ScriptedClassifier::new();
    let calls = classifier.clone();

    let stats = scheduler(store.clone(), classifier, Shard::single())
        .run(today())
        .await
        .unwrap();

    assert_eq!(calls.calls(), vec!["https://a.test/".to_string()]);
    assert_eq!(stats.skipped_empty, 2);
    assert_eq!(store.updates()[0].range, "'Logs'!M4:O4");
}

#[tokio::test]
async fn recently_checked_rows_skipped_inside_window() {
    let rows = vec![
        header(),
        row(WIDTH, &[(URL_COL, "https://fresh.test/"), (CHECKED_COL, "06/09/2024")]),
        row(WIDTH, &[(URL_COL, "https://stale.test/"), (CHECKED_COL, "05/01/2024")]),
        row(WIDTH, &[(URL_COL, "https://never.test/")]),
    ];
    let classifier = ScriptedClassifier::new();
    let calls = classifier.clone();

    let stats = scheduler(MemoryRowStore::new(rows), classifier, Shard::single())
        .with_skip_policy(SkipPolicy::new(7))
        .run(today())
        .await
        .unwrap();

    assert_eq!(
        calls.calls(),
        vec!["https://stale.test/".to_string(), "https://never.test/".to_string()]
    );
    assert_eq!(stats.skipped_recent, 1);
}

#[tokio::test]
async fn failed_flush_surfaces_as_error() {
    let store = MemoryRowStore::new(sheet(2)).failing_writes();
    let result = scheduler(store, ScriptedClassifier::new(), Shard::single())
        .run(today())
        .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("sheet quota exceeded"));
}

#[tokio::test]
async fn classifier_is_returned_after_run() {
    let classifier = ScriptedClassifier::new();
    let mut s = scheduler(MemoryRowStore::new(sheet(1)), classifier, Shard::single());
    s.run(today()).await.unwrap();
    assert_eq!(s.into_classifier().calls(), vec![link(0)]);
}
