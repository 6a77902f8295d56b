//! End-to-end moderation flow against a file-backed scope
//! Run with: cargo test --test moderation_flow_test

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Once};

use warden_bot::application::services::{ModerationEngine, ScopeContext, StrikeOutcome};
use warden_bot::domain::traits::{Clock, RecordStore};
use warden_bot::infrastructure::directory::InMemoryDirectory;
use warden_bot::infrastructure::notifications::LogNotifier;
use warden_bot::infrastructure::storage::FileRecordStore;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

struct TestClock(AtomicI64);

impl Clock for TestClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

const SCOPE: &str = "school";
const T0: i64 = 1_718_000_000_000;

async fn directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());
    for name in ["banned", "signed-up", "ib", "econ-sl", "econ-hl"] {
        directory.ensure_capability(SCOPE, name).await;
    }
    directory.add_member(SCOPE, "U1").await;
    directory
}

fn engine(store: Arc<FileRecordStore>, directory: Arc<InMemoryDirectory>, clock: Arc<TestClock>) -> ModerationEngine {
    ModerationEngine::new(SCOPE, store, directory, Arc::new(LogNotifier)).with_clock(clock)
}

/// Three strikes suspend, unban restores, the sweep grants what the record calls for
#[tokio::test]
async fn test_strike_suspend_unban_cycle() {
    ensure_init();

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileRecordStore::open(dir.path(), SCOPE).await.unwrap());
    let directory = directory().await;
    let clock = Arc::new(TestClock(AtomicI64::new(T0)));
    let ctx = ScopeContext::new(engine(store.clone(), directory.clone(), clock.clone()));
    let engine = ctx.engine();

    assert!(store.get("U1").await.unwrap().is_none());

    // A member who signed up earlier holds their roles
    engine.enroll("U1", vec!["econ-hl".to_string()], true).await.unwrap();
    assert_eq!(
        directory.capability_names(SCOPE, "U1").await,
        vec!["econ-hl", "ib", "signed-up"]
    );

    engine.strike("U1").await.unwrap();
    engine.strike("U1").await.unwrap();
    let outcome = engine.strike("U1").await.unwrap();
    assert_eq!(outcome, StrikeOutcome::Suspended { strikes: 3, until: T0 + 86_400_000 });

    let record = store.get("U1").await.unwrap().unwrap();
    assert_eq!((record.strikes, record.unban_at), (3, T0 + 86_400_000));
    assert_eq!(directory.capability_names(SCOPE, "U1").await, vec!["banned"]);

    // The sweep leaves a live suspension alone
    clock.0.store(T0 + 60_000, Ordering::SeqCst);
    let report = ctx.sweep().await;
    assert_eq!(report.unbanned, 0);
    assert_eq!(directory.capability_names(SCOPE, "U1").await, vec!["banned"]);

    assert!(engine.unban("U1").await.unwrap());
    let record = store.get("U1").await.unwrap().unwrap();
    assert_eq!((record.strikes, record.unban_at), (3, 0));

    ctx.sweep().await;
    assert_eq!(
        directory.capability_names(SCOPE, "U1").await,
        vec!["econ-hl", "ib", "signed-up"]
    );

    ctx.shutdown().await;
}

/// Suspensions survive a restart and expire on the first sweep after the deadline
#[tokio::test]
async fn test_suspension_expires_after_restart() {
    ensure_init();

    let dir = tempfile::tempdir().unwrap();
    let directory = directory().await;
    let clock = Arc::new(TestClock(AtomicI64::new(T0)));

    {
        let store = Arc::new(FileRecordStore::open(dir.path(), SCOPE).await.unwrap());
        let ctx = ScopeContext::new(engine(store, directory.clone(), clock.clone()));
        ctx.engine().ban("U1", T0 + 1_000).await.unwrap();
        ctx.shutdown().await;
    }

    let contents = std::fs::read_to_string(dir.path().join(SCOPE).join("users")).unwrap();
    assert_eq!(contents, format!("U1|0|{}|0|\n", T0 + 1_000));

    clock.0.store(T0 + 5_000, Ordering::SeqCst);
    let store = Arc::new(FileRecordStore::open(dir.path(), SCOPE).await.unwrap());
    let ctx = ScopeContext::new(engine(store.clone(), directory.clone(), clock));

    let report = ctx.sweep().await;
    assert_eq!(report.unbanned, 1);
    assert_eq!(store.get("U1").await.unwrap().unwrap().unban_at, 0);
    assert_eq!(directory.capability_names(SCOPE, "U1").await, vec!["signed-up"]);
}
