//! Application services - Moderation state machine and reconciliation

pub mod moderation_service;
pub mod reconciler;
pub mod role_sync;
pub mod scope;


pub use moderation_service::{ModerationEngine, StrikeOutcome};
pub use reconciler::{Reconciler, ReconcilerHandle, SweepReport, DEFAULT_PERIOD_MS};
pub use role_sync::{RoleSynchronizer, SyncReport};
pub use scope::ScopeContext;
