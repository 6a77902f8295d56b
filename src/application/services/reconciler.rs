use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::moderation_service::ModerationEngine;
use super::role_sync::SyncReport;

/// Ticks land on whole-minute wall-clock boundaries
pub const DEFAULT_PERIOD_MS: i64 = 60_000;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub members: usize,
    pub unbanned: usize,
    pub failed: usize,
    pub sync: Option<SyncReport>,
}

/// Periodic sweep: lifts expired suspensions, then syncs the whole scope
pub struct Reconciler {
    engine: Arc<ModerationEngine>,
    period_ms: i64,
}

impl Reconciler {
    pub fn new(engine: Arc<ModerationEngine>) -> Self {
        Self {
            engine,
            period_ms: DEFAULT_PERIOD_MS,
        }
    }

    pub fn with_period_ms(mut self, period_ms: i64) -> Self {
        self.period_ms = period_ms.max(1);
        self
    }

    /// Delay until the next multiple of `period_ms` after `now`
    pub fn next_delay(now: i64, period_ms: i64) -> Duration {
        let remaining = period_ms - now.rem_euclid(period_ms);
        Duration::from_millis(remaining as u64)
    }

    /// Run one sweep while holding the scope lock.
    ///
    /// Failures are reported per member and never abort the sweep.
    pub async fn tick(&self) -> SweepReport {
        let engine = &self.engine;
        let scope = engine.scope();
        let sync = engine.synchronizer();
        let now = engine.clock().now_ms();
        let guard = engine.lock_scope().await;

        let mut report = SweepReport::default();
        let members = match engine.directory().list_members(scope).await {
            Ok(members) => members,
            Err(e) => {
                tracing::error!("[{}] Sweep could not list members: {}", scope, e);
                sync.report(&e).await;
                report.failed += 1;
                return report;
            }
        };
        report.members = members.len();

        for member in &members {
            let record = match engine.store().get(&member.id).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    report.failed += 1;
                    sync.report(&e).await;
                    continue;
                }
            };
            if !record.suspension_expired(now) {
                continue;
            }
            match engine.lift_suspension(&guard, &member.id).await {
                Ok(_) => report.unbanned += 1,
                Err(e) => {
                    tracing::warn!("[{}] Failed to unban {}: {}", scope, member, e);
                    report.failed += 1;
                    sync.report(&e).await;
                }
            }
        }

        match sync.sync().await {
            Ok(sync_report) => report.sync = Some(sync_report),
            Err(e) => {
                report.failed += 1;
                sync.report(&e).await;
            }
        }
        drop(guard);

        tracing::debug!(
            "[{}] Sweep done: {} member(s), {} unbanned, {} failed",
            scope, report.members, report.unbanned, report.failed
        );
        report
    }

    /// Start the loop. The first sweep runs immediately; each following one
    /// is scheduled only after the previous finished.
    pub fn spawn(self) -> ReconcilerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scope = self.engine.scope().to_string();
        let handle = tokio::spawn(async move {
            tracing::info!("[{}] Reconciler started", self.engine.scope());
            loop {
                self.tick().await;
                let delay = Self::next_delay(self.engine.clock().now_ms(), self.period_ms);
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            tracing::info!("[{}] Reconciler stopped", self.engine.scope());
        });
        ReconcilerHandle {
            scope,
            shutdown_tx,
            handle,
        }
    }
}

/// Owner of a running reconciler loop.
///
/// Dropping the handle also stops the loop after its current sweep.
pub struct ReconcilerHandle {
    scope: String,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the loop and wait for an in-flight sweep to complete
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("[{}] Reconciler task failed: {}", self.scope, e);
        }
    }
}
