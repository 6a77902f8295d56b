use std::sync::Arc;

use super::moderation_service::ModerationEngine;
use super::reconciler::{Reconciler, ReconcilerHandle};

/// One community's moderation session: its engine and reconciler loop
pub struct ScopeContext {
    engine: Arc<ModerationEngine>,
    reconciler: Option<ReconcilerHandle>,
}

impl ScopeContext {
    /// Wrap an engine without starting the reconciler
    pub fn new(engine: ModerationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            reconciler: None,
        }
    }

    /// Wrap an engine and start its reconciler with the given period
    pub fn start(engine: ModerationEngine, period_ms: i64) -> Self {
        let mut ctx = Self::new(engine);
        ctx.start_reconciler(period_ms);
        ctx
    }

    /// Start the reconciler if it is not already running
    pub fn start_reconciler(&mut self, period_ms: i64) {
        if self.reconciler.is_some() {
            return;
        }
        let reconciler = Reconciler::new(self.engine.clone()).with_period_ms(period_ms);
        self.reconciler = Some(reconciler.spawn());
    }

    pub fn scope(&self) -> &str {
        self.engine.scope()
    }

    pub fn engine(&self) -> &Arc<ModerationEngine> {
        &self.engine
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconciler.as_ref().is_some_and(|r| !r.is_finished())
    }

    /// Run one sweep now, outside the periodic schedule
    pub async fn sweep(&self) -> super::SweepReport {
        Reconciler::new(self.engine.clone()).tick().await
    }

    /// Stop the reconciler and wait for it
    pub async fn shutdown(mut self) {
        if let Some(reconciler) = self.reconciler.take() {
            reconciler.shutdown().await;
        }
        tracing::info!("[{}] Scope closed", self.engine.scope());
    }
}
