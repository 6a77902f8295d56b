//! Domain traits - Abstractions for infrastructure implementations

pub mod clock;
pub mod directory;
pub mod notifier;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use directory::Directory;
pub use notifier::Notifier;
pub use store::RecordStore;
