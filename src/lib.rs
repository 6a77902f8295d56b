//! Per-community moderation engine: strike records, time-boxed suspensions
//! and continuous reconciliation against member roles.

pub mod application;
pub mod domain;
pub mod infrastructure;
