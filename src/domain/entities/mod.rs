//! Domain entities - Core business objects with no external dependencies

pub mod capability;
pub mod member;
pub mod record;

pub use capability::{CapabilityHandle, BANNED, HONORS, SIGNED_UP};
pub use member::Member;
pub use record::{ModerationRecord, Standing, STRIKE_LIMIT, SUSPENSION_MS};
