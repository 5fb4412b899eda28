//! Event retrieval against the fake's synthetic event stream.

use chrono::{Duration, TimeZone, Utc};
use papertrail_client::testing::FakePapertrail;
use papertrail_client::{Method, Papertrail};
use papertrail_sync::{
    events_file_path, EventRetriever, EventsRequest, ItemKind, Options, Orchestrator, TimeWindow,
};
use tempfile::TempDir;

const START: &str = "03/01/2021 10:00:00";
const END: &str = "03/01/2021 11:00:00";

/// A fake holding `count` events one minute apart, the first at `START`,
/// plus group "g1" with search "s1".
fn seeded_fake(count: u64, page_size: usize) -> (FakePapertrail, i64) {
    let fake = FakePapertrail::new().with_page_size(page_size);
    let group_id = fake.seed_group("g1", "*");
    fake.seed_search("s1", "*", group_id);

    let base = Utc.with_ymd_and_hms(2021, 3, 1, 10, 0, 0).unwrap();
    for i in 1..=count {
        fake.push_event(i, &format!("event {i}"), base + Duration::minutes(i as i64 - 1));
    }
    (fake, group_id)
}

fn obtain_options(dir: &TempDir) -> Options {
    Options {
        action: "obtain".to_string(),
        group_name: "g1".to_string(),
        system_wildcard: "*".to_string(),
        destination_port: 514,
        search: "s1".to_string(),
        query: "*".to_string(),
        start_date: START.to_string(),
        end_date: END.to_string(),
        path: dir.path().to_path_buf(),
        ..Options::default()
    }
}

fn expected_lines(count: u64) -> String {
    (1..=count).map(|i| format!("event {i}\n")).collect()
}

#[tokio::test]
async fn test_three_pages_are_assembled_oldest_first() {
    let dir = TempDir::new().unwrap();
    let (fake, _) = seeded_fake(25, 10);
    let orchestrator = Orchestrator::new(Papertrail::new(fake.clone()));

    let report = orchestrator.run(&obtain_options(&dir)).await.unwrap();

    assert_eq!(fake.calls_to(Method::GET, "events/search.json"), 3);

    let window = TimeWindow::parse(START, END).unwrap();
    let path = events_file_path(dir.path(), "g1", "s1", window);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, expected_lines(25));

    // Group and search already existed, so only the retrieval is reported.
    assert_eq!(report.items.len(), 1);
    let item = &report.items[0];
    assert_eq!(item.kind, ItemKind::EventsSearch);
    assert!(!item.created && !item.deleted);
    assert!(item.name.ends_with("with 25 events retrieved"), "{}", item.name);
    assert!(item.name.contains("g1_s1_03-01-2021_10:00:00_03-01-2021_11:00:00"));
}

#[tokio::test]
async fn test_follow_up_pages_are_bounded_by_oldest_id() {
    let (fake, group_id) = seeded_fake(25, 10);
    let papertrail = Papertrail::new(fake.clone());
    let dir = TempDir::new().unwrap();
    let window = TimeWindow::parse(START, END).unwrap();

    let collected = EventRetriever::new(&papertrail)
        .collect(&EventsRequest {
            group_id,
            group_name: "g1",
            search_name: "s1",
            query: "*",
            window,
            directory: dir.path(),
        })
        .await
        .unwrap();

    assert_eq!(collected.pages, 3);
    assert_eq!(collected.messages.len(), 25);

    let bounds: Vec<(Option<String>, Option<i64>)> = fake
        .calls()
        .into_iter()
        .filter_map(|c| c.body)
        .map(|body| {
            (
                body.get("max_id").and_then(|v| v.as_str()).map(str::to_string),
                body.get("max_time").and_then(|v| v.as_i64()),
            )
        })
        .collect();
    assert_eq!(
        bounds,
        vec![
            (None, Some(window.end())),
            (Some("16".to_string()), None),
            (Some("7".to_string()), None),
        ]
    );
}

#[tokio::test]
async fn test_single_page_needs_one_call() {
    let dir = TempDir::new().unwrap();
    let (fake, _) = seeded_fake(5, 10);
    let orchestrator = Orchestrator::new(Papertrail::new(fake.clone()));

    let report = orchestrator.run(&obtain_options(&dir)).await.unwrap();

    assert_eq!(fake.calls_to(Method::GET, "events/search.json"), 1);
    let window = TimeWindow::parse(START, END).unwrap();
    let contents = std::fs::read_to_string(events_file_path(dir.path(), "g1", "s1", window)).unwrap();
    assert_eq!(contents, expected_lines(5));
    assert!(report.items[0].name.ends_with("with 5 events retrieved"));
}

#[tokio::test]
async fn test_empty_window_writes_no_file() {
    let dir = TempDir::new().unwrap();
    let (fake, _) = seeded_fake(0, 10);
    let orchestrator = Orchestrator::new(Papertrail::new(fake.clone()));

    let report = orchestrator.run(&obtain_options(&dir)).await.unwrap();

    assert_eq!(fake.calls_to(Method::GET, "events/search.json"), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(report.items.len(), 1);
    assert!(report.items[0].name.ends_with("with 0 events retrieved"));
}

#[tokio::test]
async fn test_existing_file_is_truncated() {
    let dir = TempDir::new().unwrap();
    let (fake, _) = seeded_fake(3, 10);
    let window = TimeWindow::parse(START, END).unwrap();
    let path = events_file_path(dir.path(), "g1", "s1", window);
    std::fs::write(&path, "stale line\n".repeat(50)).unwrap();

    Orchestrator::new(Papertrail::new(fake))
        .run(&obtain_options(&dir))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), expected_lines(3));
}

#[tokio::test]
async fn test_bracketed_names_are_escaped_in_report() {
    let dir = TempDir::new().unwrap();
    let fake = FakePapertrail::new();
    let group_id = fake.seed_group("web [prod]", "*");
    fake.seed_search("s1", "*", group_id);

    let report = Orchestrator::new(Papertrail::new(fake))
        .run(&Options {
            group_name: "web [prod]".to_string(),
            ..obtain_options(&dir)
        })
        .await
        .unwrap();

    assert!(report.items[0].name.contains("web_\\[prod\\]_s1_"), "{}", report.items[0].name);
}
