use super::*;
use crate::error::ErrorKind;
use crate::status::status;
use crate::test_support::{
    failing_op, id, recording_op, EventLog, MockChangelog, MockSource, TestUnit, CLIENT, DB,
};

#[tokio::test]
async fn test_nothing_applied_is_a_noop() {
    let log = EventLog::default();
    let source = MockSource::new(&log).with_recording(&["A", "B"]);
    let changelog = MockChangelog::new(&log);

    let reverted = down(&source, &changelog, &DB, &CLIENT).await.unwrap();
    assert!(reverted.is_empty());
    assert!(!log
        .events()
        .iter()
        .any(|e| e.starts_with("load:") || e.starts_with("record_") || e.starts_with("down:")));
}

#[tokio::test]
async fn test_reverts_last_applied_not_last_listed() {
    let log = EventLog::default();
    let source = MockSource::new(&log).with_recording(&["A", "B", "C"]);
    let changelog = MockChangelog::new(&log)
        .with_entry("B", "2016-06-01T00:00:00Z")
        .with_entry("A", "2016-06-02T00:00:00Z");

    let reverted = down(&source, &changelog, &DB, &CLIENT).await.unwrap();
    assert_eq!(reverted, vec![id("B")]);
    assert_eq!(log.runs(), vec!["down:B"]);
    assert_eq!(changelog.ids(), vec!["A"]);
}

#[tokio::test]
async fn test_revert_then_status_shows_pending() {
    let log = EventLog::default();
    let source = MockSource::new(&log).with_recording(&["A", "B"]);
    let changelog = MockChangelog::new(&log).with_entry("A", "2016-06-03T20:10:12Z");

    let reverted = down(&source, &changelog, &DB, &CLIENT).await.unwrap();
    assert_eq!(reverted, vec![id("A")]);
    assert!(changelog.snapshot().is_empty());

    let items = status(&source, &changelog, &DB).await.unwrap();
    assert!(items.iter().all(|item| item.applied_at.is_pending()));
}

#[tokio::test]
async fn test_only_one_migration_per_call() {
    let log = EventLog::default();
    let source = MockSource::new(&log).with_recording(&["A", "B"]);
    let changelog = MockChangelog::new(&log)
        .with_entry("A", "2016-06-01T00:00:00Z")
        .with_entry("B", "2016-06-02T00:00:00Z");

    assert_eq!(
        down(&source, &changelog, &DB, &CLIENT).await.unwrap(),
        vec![id("B")]
    );
    assert_eq!(
        down(&source, &changelog, &DB, &CLIENT).await.unwrap(),
        vec![id("A")]
    );
    assert!(down(&source, &changelog, &DB, &CLIENT)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(log.runs(), vec!["down:B", "down:A"]);
}

#[tokio::test]
async fn test_execution_failure_leaves_changelog_untouched() {
    let log = EventLog::default();
    let failing = TestUnit::new(
        recording_op(&log, "up:A".to_string()),
        failing_op(&log, "down:A".to_string(), "collection is locked"),
    );
    let source = MockSource::new(&log).with("A", failing);
    let changelog = MockChangelog::new(&log).with_entry("A", "2016-06-03T20:10:12Z");

    let err = down(&source, &changelog, &DB, &CLIENT).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not migrate down A: collection is locked");
    assert_eq!(err.kind(), ErrorKind::ExecutionFailure);
    assert_eq!(changelog.ids(), vec!["A"]);
    assert!(!log.events().contains(&"record_reverted:A".to_string()));
}

#[tokio::test]
async fn test_load_failure() {
    let log = EventLog::default();
    let source = MockSource::new(&log).with_unloadable("A");
    let changelog = MockChangelog::new(&log).with_entry("A", "2016-06-03T20:10:12Z");

    let err = down(&source, &changelog, &DB, &CLIENT).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not migrate down A: Cannot find module 'A'");
    assert_eq!(err.kind(), ErrorKind::LoadFailure);
    assert_eq!(changelog.ids(), vec!["A"]);
}

#[tokio::test]
async fn test_changelog_delete_failure_after_revert() {
    let log = EventLog::default();
    let source = MockSource::new(&log).with_recording(&["A"]);
    let mut changelog = MockChangelog::new(&log).with_entry("A", "2016-06-03T20:10:12Z");
    changelog.delete_error = Some("write concern timeout".to_string());

    let err = down(&source, &changelog, &DB, &CLIENT).await.unwrap_err();
    assert!(matches!(err, MigrateError::DownUnrecorded { .. }));
    assert!(err
        .to_string()
        .starts_with("Could not migrate down A: Could not update changelog: write concern timeout"));
    assert_eq!(err.kind(), ErrorKind::ChangelogWriteFailure);
    assert_eq!(log.runs(), vec!["down:A"]);
    assert_eq!(changelog.ids(), vec!["A"]);
}
