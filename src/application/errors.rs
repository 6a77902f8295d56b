//! Application layer errors

use thiserror::Error;

/// Top-level errors surfaced by the binary
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Moderation error: {0}")]
    Moderation(#[from] ModerationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Record storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record on line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Invalid record: {0}")]
    Invalid(String),
}

/// Membership service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Membership service error: {0}")]
    Service(String),
}

/// Errors from direct moderation actions
#[derive(Error, Debug)]
pub enum ModerationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Suspension deadline must be positive, got {0}")]
    InvalidDeadline(i64),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
