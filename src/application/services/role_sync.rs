use std::sync::Arc;

use crate::application::errors::{DirectoryError, ModerationError};
use crate::domain::entities::Member;
use crate::domain::traits::{Directory, Notifier, RecordStore};

/// Counters from one synchronization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub members: usize,
    /// Members without a record, or currently suspended
    pub skipped: usize,
    pub granted: usize,
    pub failed: usize,
}

enum MemberSync {
    NoRecord,
    Suspended,
    Granted(usize),
}

/// Grants every member the capabilities their record calls for.
///
/// Strictly additive: capabilities outside the desired set are never
/// revoked here, only by the suspend path.
pub struct RoleSynchronizer {
    scope: String,
    store: Arc<dyn RecordStore>,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    channel: Option<String>,
}

impl RoleSynchronizer {
    pub fn new(
        scope: impl Into<String>,
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            scope: scope.into(),
            store,
            directory,
            notifier,
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Forward an error to the notifier together with the configured channel
    pub async fn report(&self, error: &(dyn std::error::Error + Send + Sync)) {
        self.notifier.report(error, self.channel.as_deref()).await;
    }

    /// Sync every current member of the scope.
    ///
    /// Only a failure to list members aborts the pass; per-member failures
    /// are reported and counted.
    pub async fn sync(&self) -> Result<SyncReport, DirectoryError> {
        let members = self.directory.list_members(&self.scope).await?;
        let mut report = SyncReport {
            members: members.len(),
            ..Default::default()
        };

        for member in &members {
            match self.sync_member(member).await {
                Ok(MemberSync::NoRecord) | Ok(MemberSync::Suspended) => report.skipped += 1,
                Ok(MemberSync::Granted(n)) => report.granted += n,
                Err(e) => {
                    tracing::warn!("[{}] Failed to sync {}: {}", self.scope, member, e);
                    report.failed += 1;
                    self.report(&e).await;
                }
            }
        }

        tracing::debug!(
            "[{}] Synced {} member(s): {} granted, {} skipped, {} failed",
            self.scope, report.members, report.granted, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn sync_member(&self, member: &Member) -> Result<MemberSync, ModerationError> {
        let Some(record) = self.store.get(&member.id).await? else {
            return Ok(MemberSync::NoRecord);
        };
        if record.is_suspended() {
            return Ok(MemberSync::Suspended);
        }

        // Resolve everything first so a missing capability grants nothing
        let mut desired = Vec::new();
        for name in record.desired_capabilities() {
            let capability = self
                .directory
                .get_capability(&self.scope, &name)
                .await?
                .ok_or(DirectoryError::CapabilityNotFound(name))?;
            desired.push(capability);
        }

        let mut granted = 0;
        for capability in &desired {
            if !self.directory.member_has_capability(member, capability).await? {
                self.directory.grant_capability(member, capability).await?;
                tracing::debug!("[{}] Granted {} to {}", self.scope, capability, member);
                granted += 1;
            }
        }
        Ok(MemberSync::Granted(granted))
    }
}
