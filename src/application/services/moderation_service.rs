use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::application::errors::{DirectoryError, ModerationError, StoreError};
use crate::domain::entities::{ModerationRecord, BANNED, STRIKE_LIMIT, SUSPENSION_MS};
use crate::domain::traits::{Clock, Directory, Notifier, RecordStore, SystemClock};
use super::role_sync::RoleSynchronizer;

/// Proof that the caller holds one engine's scope lock.
///
/// Only [`ModerationEngine::lock_scope`] builds one, and it remembers the
/// engine it came from.
pub(crate) struct ScopeGuard<'a> {
    owner: &'a ModerationEngine,
    _held: MutexGuard<'a, ()>,
}

/// Result of a strike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Counter incremented, no role effect
    Warned { strikes: u32 },
    /// Limit reached, member suspended until the deadline
    Suspended { strikes: u32, until: i64 },
}

/// Applies strike/ban transitions to one scope's records.
///
/// Every public operation takes the scope lock for its whole
/// read-modify-write cycle, so commands and the reconciler never interleave
/// on a record.
pub struct ModerationEngine {
    scope: String,
    store: Arc<dyn RecordStore>,
    directory: Arc<dyn Directory>,
    synchronizer: RoleSynchronizer,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl ModerationEngine {
    pub fn new(
        scope: impl Into<String>,
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let scope = scope.into();
        let synchronizer = RoleSynchronizer::new(scope.clone(), store.clone(), directory.clone(), notifier);
        Self {
            scope,
            store,
            directory,
            synchronizer,
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Channel passed along with error reports
    pub fn with_notification_channel(mut self, channel: impl Into<String>) -> Self {
        self.synchronizer = self.synchronizer.with_channel(channel);
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn synchronizer(&self) -> &RoleSynchronizer {
        &self.synchronizer
    }

    pub(crate) fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub(crate) fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) async fn lock_scope(&self) -> ScopeGuard<'_> {
        ScopeGuard {
            owner: self,
            _held: self.lock.lock().await,
        }
    }

    pub async fn record(&self, id: &str) -> Result<Option<ModerationRecord>, StoreError> {
        self.store.get(id).await
    }

    /// Add a strike; the third one suspends the member for 24 hours
    pub async fn strike(&self, id: &str) -> Result<StrikeOutcome, ModerationError> {
        let _guard = self.lock_scope().await;

        let mut record = self.store.get(id).await?.unwrap_or_else(|| ModerationRecord::new(id));
        record.strikes = record.strikes.saturating_add(1);

        if record.strikes < STRIKE_LIMIT {
            self.store.upsert(&record).await?;
            tracing::info!("[{}] Strike {} for {}", self.scope, record.strikes, id);
            return Ok(StrikeOutcome::Warned { strikes: record.strikes });
        }

        let until = self.clock.now_ms() + SUSPENSION_MS;
        record.unban_at = until;
        self.store.upsert(&record).await?;
        tracing::info!("[{}] Strike {} for {}, suspending until {}", self.scope, record.strikes, id, until);
        self.apply_suspension(id).await?;
        Ok(StrikeOutcome::Suspended { strikes: record.strikes, until })
    }

    /// Remove one strike. Returns `false` when there was nothing to remove.
    pub async fn unstrike(&self, id: &str) -> Result<bool, ModerationError> {
        let _guard = self.lock_scope().await;

        let Some(mut record) = self.store.get(id).await? else {
            return Ok(false);
        };
        if record.strikes == 0 {
            return Ok(false);
        }
        record.strikes -= 1;
        self.store.upsert(&record).await?;
        tracing::info!("[{}] Removed a strike from {}, {} left", self.scope, id, record.strikes);
        Ok(true)
    }

    /// Suspend until the given epoch-millisecond deadline, overwriting any previous one
    pub async fn ban(&self, id: &str, until: i64) -> Result<(), ModerationError> {
        if until <= 0 {
            return Err(ModerationError::InvalidDeadline(until));
        }
        let _guard = self.lock_scope().await;

        let mut record = self.store.get(id).await?.unwrap_or_else(|| ModerationRecord::new(id));
        record.unban_at = until;
        self.store.upsert(&record).await?;
        tracing::info!("[{}] Banned {} until {}", self.scope, id, until);
        self.apply_suspension(id).await
    }

    /// Lift a suspension and restore the member's capabilities.
    /// Returns `false` if the member has no record.
    pub async fn unban(&self, id: &str) -> Result<bool, ModerationError> {
        let guard = self.lock_scope().await;

        if !self.lift_suspension(&guard, id).await? {
            return Ok(false);
        }
        self.synchronizer.sync().await?;
        Ok(true)
    }

    /// Set a member's course enrollments and honors flag, then sync the scope.
    ///
    /// Strikes and suspension state are preserved.
    pub async fn enroll(&self, id: &str, courses: Vec<String>, honors: bool) -> Result<ModerationRecord, ModerationError> {
        let _guard = self.lock_scope().await;

        let mut record = self.store.get(id).await?.unwrap_or_else(|| ModerationRecord::new(id));
        record.courses = courses;
        record.honors = honors;
        self.store.upsert(&record).await?;
        tracing::info!("[{}] Enrolled {} in {:?}", self.scope, id, record.courses);
        self.synchronizer.sync().await?;
        Ok(record)
    }

    /// Clear `unban_at` and revoke the banned capability, without syncing
    pub(crate) async fn lift_suspension(&self, guard: &ScopeGuard<'_>, id: &str) -> Result<bool, ModerationError> {
        assert!(std::ptr::eq(guard.owner, self), "scope guard belongs to another engine");
        let Some(mut record) = self.store.get(id).await? else {
            return Ok(false);
        };
        record.unban_at = 0;
        self.store.upsert(&record).await?;
        tracing::info!("[{}] Unbanned {}", self.scope, id);

        let Some(member) = self.directory.fetch_member(&self.scope, id).await? else {
            tracing::warn!("[{}] {} is not a member, skipping role changes", self.scope, id);
            return Ok(true);
        };
        if let Some(banned) = self.directory.get_capability(&self.scope, BANNED).await? {
            if self.directory.member_has_capability(&member, &banned).await? {
                self.directory.revoke_capability(&member, &banned).await?;
            }
        }
        Ok(true)
    }

    /// Strip course, honors and signed-up capabilities, then grant banned
    async fn apply_suspension(&self, id: &str) -> Result<(), ModerationError> {
        let Some(member) = self.directory.fetch_member(&self.scope, id).await? else {
            tracing::warn!("[{}] {} is not a member, skipping role changes", self.scope, id);
            return Ok(());
        };
        let banned = self
            .directory
            .get_capability(&self.scope, BANNED)
            .await?
            .ok_or_else(|| DirectoryError::CapabilityNotFound(BANNED.to_string()))?;

        for capability in self.directory.member_capabilities(&member).await? {
            if capability.is_stripped_on_suspend() {
                self.directory.revoke_capability(&member, &capability).await?;
            }
        }
        if !self.directory.member_has_capability(&member, &banned).await? {
            self.directory.grant_capability(&member, &banned).await?;
        }
        Ok(())
    }
}
