//! Application layer - Moderation use cases
//!
//! This layer contains:
//! - Services: moderation engine, role synchronizer, reconciler, scope context
//! - Errors: Domain-specific errors

pub mod errors;
pub mod services;
