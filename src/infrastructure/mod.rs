//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Line-format record files
//! - Directory: In-memory membership service
//! - Notifications: Error reporting sinks
//! - Adapters: Platform integrations (console)

pub mod adapters;
pub mod config;
pub mod directory;
pub mod notifications;
pub mod storage;
