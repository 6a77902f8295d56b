//! Domain layer - Core moderation model with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (ModerationRecord, Member, Capability)
//! - Traits: Abstractions for infrastructure (RecordStore, Directory, Notifier, Clock)
//! - Rules: Business logic invariants

pub mod entities;
pub mod traits;
