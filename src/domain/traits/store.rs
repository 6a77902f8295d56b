use async_trait::async_trait;
use crate::application::errors::StoreError;
use crate::domain::entities::ModerationRecord;

/// Durable per-scope mapping from member id to moderation record
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Absent records are `Ok(None)`, not an error
    async fn get(&self, id: &str) -> Result<Option<ModerationRecord>, StoreError>;

    /// Replace the record with the same id in place, or append it.
    ///
    /// Either the whole persisted set is replaced or the previous set is
    /// left intact.
    async fn upsert(&self, record: &ModerationRecord) -> Result<(), StoreError>;

    /// All records in persisted (insertion) order
    async fn list(&self) -> Result<Vec<ModerationRecord>, StoreError>;
}
