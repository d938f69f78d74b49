//! End-to-end tests for the Janitor against real cookie databases

mod common;

use common::{now_secs, Profile, RecordingObserver, DAY};
use crumb_domain::{BucketSet, RunResult};
use crumb_janitor::{Janitor, JanitorConfig, JanitorError, Ledger, Trigger};
use crumb_store::{MemoryPrefs, TomlPrefs};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn janitor(profile: &Profile) -> Janitor<MemoryPrefs> {
    Janitor::new(profile.db(), MemoryPrefs::new()).unwrap()
}

#[tokio::test]
async fn test_empty_store() {
    let profile = Profile::new();
    let janitor = janitor(&profile);

    let preview = janitor.preview().await.unwrap();
    assert!(preview.is_empty());
    assert_eq!(preview.expired, 0);
    assert_eq!(preview.unused_at(90), Some(0));
    assert_eq!(preview.long_lived_at(90), Some(0));

    let summary = janitor.run_now().await.unwrap();
    assert!(summary.result.is_empty());
    assert_eq!(summary.affected.total(), 0);
    assert_eq!(janitor.ledger().unwrap(), Ledger::default());
}

#[tokio::test]
async fn test_expired_and_unused_row_is_counted_by_both_features() {
    let profile = Profile::new();
    let now = now_secs();
    profile.insert(now - 10, (now - 1000 * DAY) * 1_000_000);
    let janitor = janitor(&profile);

    let summary = janitor.run_now().await.unwrap();

    assert_eq!(profile.row_count(), 0);

    // Delete-expired runs first and removes the row
    assert_eq!(summary.affected.expired_deleted, 1);
    assert_eq!(summary.affected.unused_deleted, 0);
    assert_eq!(summary.affected.expiry_capped, 0);

    // The ledger follows the pre-run snapshot, so the overlap counts twice
    assert_eq!(summary.result.deleted_expired, 1);
    assert_eq!(summary.result.deleted_unused, 1);
    assert_eq!(summary.result.expiry_capped, 0);

    let ledger = janitor.ledger().unwrap();
    assert_eq!(ledger.delete_expired, 1);
    assert_eq!(ledger.delete_unused, 1);
    assert_eq!(ledger.expire, 0);
    assert_eq!(summary.ledger, ledger);
}

#[tokio::test]
async fn test_preview_buckets() {
    let profile = Profile::new();
    for ago in [10, 50, 100] {
        profile.insert_cookie(3650, ago);
    }
    let janitor = janitor(&profile);

    let preview = janitor.preview().await.unwrap();

    assert_eq!(preview.expired, 0);
    assert_eq!(preview.unused_at(7), Some(3));
    assert_eq!(preview.unused_at(14), Some(2));
    assert_eq!(preview.unused_at(30), Some(2));
    assert_eq!(preview.unused_at(60), Some(1));
    assert_eq!(preview.unused_at(91), Some(1));
    assert_eq!(preview.unused_at(182), Some(0));

    // The configured threshold is always present
    assert_eq!(preview.unused_at(90), Some(1));
    assert_eq!(preview.long_lived_at(90), Some(3));
    assert_eq!(preview.long_lived_at(1825), Some(3));

    // Preview never mutates
    assert_eq!(profile.row_count(), 3);
    assert_eq!(janitor.ledger().unwrap(), Ledger::default());
}

#[tokio::test]
async fn test_custom_buckets() {
    let profile = Profile::new();
    profile.insert_cookie(30, 10);
    let janitor = janitor(&profile).with_buckets(BucketSet::new([5, 20], [1]));

    let preview = janitor.preview().await.unwrap();

    assert_eq!(preview.unused.keys().copied().collect::<Vec<_>>(), vec![5, 20, 90]);
    assert_eq!(preview.long_lived.keys().copied().collect::<Vec<_>>(), vec![1, 90]);
    assert_eq!(preview.unused_at(5), Some(1));
    assert_eq!(preview.unused_at(20), Some(0));
    assert_eq!(preview.long_lived_at(1), Some(1));
    assert_eq!(preview.long_lived_at(90), Some(0));
}

#[tokio::test]
async fn test_expiry_cap() {
    let profile = Profile::new();
    profile.insert_cookie(1000, 0);
    profile.insert_cookie(10, 0);
    let janitor = janitor(&profile);

    let summary = janitor.run_now().await.unwrap();
    assert_eq!(summary.result.expiry_capped, 1);
    assert_eq!(summary.affected.expiry_capped, 1);
    assert_eq!(summary.result.modified(), 1);
    assert_eq!(profile.row_count(), 2);

    let max = profile.max_expiry().unwrap();
    assert!(max <= now_secs() + 90 * DAY);
    assert!(max >= now_secs() + 90 * DAY - 5);

    // Second run finds nothing left to cap
    let summary = janitor.run_now().await.unwrap();
    assert!(summary.result.is_empty());
    assert_eq!(summary.affected.total(), 0);
    assert_eq!(janitor.ledger().unwrap().expire, 1);
}

#[tokio::test]
async fn test_ledger_is_sum_of_runs() {
    let profile = Profile::new();
    let janitor = janitor(&profile);
    let mut total = RunResult::default();
    let mut previous = Ledger::default();

    for round in 0..4 {
        profile.insert(now_secs() - 60, now_secs() * 1_000_000);
        profile.insert_cookie(3650, 200 + round);
        profile.insert_cookie(500, 1);

        let summary = janitor.run_now().await.unwrap();
        total.deleted_expired += summary.result.deleted_expired;
        total.deleted_unused += summary.result.deleted_unused;
        total.expiry_capped += summary.result.expiry_capped;

        let ledger = janitor.ledger().unwrap();
        assert!(ledger.delete_expired >= previous.delete_expired);
        assert!(ledger.delete_unused >= previous.delete_unused);
        assert!(ledger.expire >= previous.expire);
        previous = ledger;
    }

    assert_eq!(previous.delete_expired, total.deleted_expired);
    assert_eq!(previous.delete_unused, total.deleted_unused);
    assert_eq!(previous.expire, total.expiry_capped);
    assert_eq!(previous.delete_expired, 4);
    assert_eq!(previous.delete_unused, 4);
}

#[tokio::test]
async fn test_disabled_features_leave_store_untouched() {
    let profile = Profile::new();
    profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    profile.insert_cookie(1000, 400);
    let janitor = janitor(&profile);
    janitor
        .update_config(&JanitorConfig {
            delete_expired_enabled: false,
            delete_unused_days: 0,
            expire_days: 0,
            ..Default::default()
        })
        .unwrap();

    let summary = janitor.run_now().await.unwrap();

    assert_eq!(summary.result, RunResult::default());
    assert_eq!(summary.affected.total(), 0);
    assert_eq!(profile.row_count(), 2);
    assert_eq!(janitor.ledger().unwrap(), Ledger::default());
}

#[tokio::test]
async fn test_missing_database_fails_without_ledger_change() {
    let profile = Profile::missing();
    let observer = Arc::new(RecordingObserver::default());
    let janitor = janitor(&profile).with_observer(observer.clone());

    let result = janitor.run_now().await;
    assert!(matches!(result, Err(JanitorError::StoreUnavailable(_))));

    let preview = janitor.preview().await;
    assert!(matches!(preview, Err(JanitorError::StoreUnavailable(_))));

    assert_eq!(janitor.ledger().unwrap(), Ledger::default());
    assert!(observer.completed.lock().unwrap().is_empty());

    let failed = observer.failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, Trigger::Manual);
}

#[tokio::test]
async fn test_locked_database_is_unavailable() {
    let profile = Profile::new();
    profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    let janitor = janitor(&profile);

    let holder = profile.connect();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let result = janitor.run_now().await;
    assert!(matches!(result, Err(JanitorError::StoreUnavailable(_))));
    assert_eq!(janitor.ledger().unwrap(), Ledger::default());

    holder.execute_batch("ROLLBACK;").unwrap();

    // The next trigger is the retry
    let summary = janitor.run_now().await.unwrap();
    assert_eq!(summary.result.deleted_expired, 1);
    assert_eq!(janitor.ledger().unwrap().delete_expired, 1);
}

#[tokio::test]
async fn test_concurrent_runs_are_serialized() {
    let profile = Profile::new();
    for _ in 0..3 {
        profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    }
    let janitor = Arc::new(janitor(&profile));

    let first = tokio::spawn({
        let janitor = janitor.clone();
        async move { janitor.run_now().await }
    });
    let second = tokio::spawn({
        let janitor = janitor.clone();
        async move { janitor.run_now().await }
    });

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let mut deleted = [first.result.deleted_expired, second.result.deleted_expired];
    deleted.sort_unstable();
    assert_eq!(deleted, [0, 3]);
    assert_eq!(janitor.ledger().unwrap().delete_expired, 3);
    assert!(!janitor.is_running());
}

#[tokio::test]
async fn test_abandoned_run_still_completes() {
    let profile = Profile::new();
    profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    let observer = Arc::new(RecordingObserver::default());
    let db = profile.db().with_busy_timeout(Duration::from_secs(10));
    let janitor = Janitor::new(db, MemoryPrefs::new())
        .unwrap()
        .with_observer(observer.clone());

    // Readers pass, writers wait for the reserved lock
    let holder = profile.connect();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(200), janitor.run_now()).await;
    assert!(abandoned.is_err());

    // The run keeps the lock after its caller went away
    assert!(janitor.is_running());
    assert_eq!(profile.row_count(), 1);

    holder.execute_batch("ROLLBACK;").unwrap();

    // Waits for the detached run to finish
    janitor.preview().await.unwrap();

    assert!(!janitor.is_running());
    assert_eq!(profile.row_count(), 0);
    assert_eq!(janitor.ledger().unwrap().delete_expired, 1);

    let completed = observer.completed.lock().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].affected.expired_deleted, 1);
}

#[tokio::test]
async fn test_observer_receives_summary() {
    let profile = Profile::new();
    profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    let observer = Arc::new(RecordingObserver::default());
    let janitor = janitor(&profile).with_observer(observer.clone());

    janitor.run_now().await.unwrap();

    let completed = observer.completed.lock().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].trigger, Trigger::Manual);
    assert_eq!(completed[0].result.deleted(), 1);
    assert_eq!(completed[0].ledger.delete_expired, 1);
    assert_eq!(completed[0].result.to_string(), "1 cookie deleted, 0 cookies modified");
}

#[tokio::test]
async fn test_idle_runs() {
    let profile = Profile::new();
    profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    let janitor = janitor(&profile);

    // Disabled by default
    assert!(janitor.run_idle().await.unwrap().is_none());
    assert_eq!(profile.row_count(), 1);
    assert_eq!(janitor.last_idle_run().unwrap(), None);

    janitor
        .update_config(&JanitorConfig {
            idle_enabled: true,
            ..Default::default()
        })
        .unwrap();

    let summary = janitor.run_idle().await.unwrap().unwrap();
    assert_eq!(summary.trigger, Trigger::Scheduled);
    assert_eq!(summary.result.deleted_expired, 1);
    assert_eq!(profile.row_count(), 0);

    let last = janitor.last_idle_run().unwrap().unwrap();
    assert_eq!(last, summary.finished_at);

    // Manual runs do not touch the idle timestamp
    janitor.run_now().await.unwrap();
    assert_eq!(janitor.last_idle_run().unwrap(), Some(last));
}

#[tokio::test]
async fn test_toml_preferences_persist_between_instances() {
    let profile = Profile::new();
    let prefs_dir = TempDir::new().unwrap();
    let prefs_path = prefs_dir.path().join("prefs.toml");

    profile.insert(now_secs() - 60, now_secs() * 1_000_000);
    {
        let janitor = Janitor::new(profile.db(), TomlPrefs::open(&prefs_path).unwrap()).unwrap();
        janitor
            .update_config(&JanitorConfig {
                expire_days: 30,
                ..Default::default()
            })
            .unwrap();
        janitor.run_now().await.unwrap();
    }

    let contents = std::fs::read_to_string(&prefs_path).unwrap();
    assert!(contents.contains("crumb.deleteExpired.count"));

    // Reopening never resets settings or counters
    let janitor = Janitor::new(profile.db(), TomlPrefs::open(&prefs_path).unwrap()).unwrap();
    assert_eq!(janitor.config().unwrap().expire_days, 30);
    assert_eq!(janitor.ledger().unwrap().delete_expired, 1);
}
