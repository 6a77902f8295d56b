use async_trait::async_trait;
use crate::application::errors::DirectoryError;
use crate::domain::entities::{CapabilityHandle, Member};

/// Membership service - abstraction over the platform's member and role APIs
#[async_trait]
pub trait Directory: Send + Sync {
    /// Current members of a scope
    async fn list_members(&self, scope: &str) -> Result<Vec<Member>, DirectoryError>;

    /// Resolve a capability by name, `None` if the scope has no such capability
    async fn get_capability(&self, scope: &str, name: &str) -> Result<Option<CapabilityHandle>, DirectoryError>;

    async fn member_has_capability(&self, member: &Member, capability: &CapabilityHandle) -> Result<bool, DirectoryError>;

    /// Capabilities the member currently holds
    async fn member_capabilities(&self, member: &Member) -> Result<Vec<CapabilityHandle>, DirectoryError>;

    async fn grant_capability(&self, member: &Member, capability: &CapabilityHandle) -> Result<(), DirectoryError>;

    async fn revoke_capability(&self, member: &Member, capability: &CapabilityHandle) -> Result<(), DirectoryError>;

    /// Look up one member, `None` if they are not in the scope
    async fn fetch_member(&self, scope: &str, user_id: &str) -> Result<Option<Member>, DirectoryError>;
}
