//! In-memory membership service
//!
//! Stands in for the chat platform's member and role APIs in console mode
//! and in tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::application::errors::DirectoryError;
use crate::domain::entities::{CapabilityHandle, Member};
use crate::domain::traits::Directory;

#[derive(Debug, Default)]
struct ScopeState {
    /// capability name -> id
    capabilities: HashMap<String, String>,
    /// member id -> held capability ids
    members: BTreeMap<String, BTreeSet<String>>,
    next_id: u64,
}

impl ScopeState {
    fn handle_for(&self, id: &str) -> Option<CapabilityHandle> {
        self.capabilities
            .iter()
            .find(|(_, cid)| cid.as_str() == id)
            .map(|(name, cid)| CapabilityHandle::new(cid.clone(), name.clone()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    scopes: RwLock<HashMap<String, ScopeState>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a capability if the scope does not have one with this name
    pub async fn ensure_capability(&self, scope: &str, name: &str) -> CapabilityHandle {
        let mut scopes = self.scopes.write().await;
        let state = scopes.entry(scope.to_string()).or_default();
        if let Some(id) = state.capabilities.get(name) {
            return CapabilityHandle::new(id.clone(), name);
        }
        state.next_id += 1;
        let id = format!("{}:{}", scope, state.next_id);
        state.capabilities.insert(name.to_string(), id.clone());
        CapabilityHandle::new(id, name)
    }

    pub async fn add_member(&self, scope: &str, user_id: &str) -> Member {
        let mut scopes = self.scopes.write().await;
        scopes
            .entry(scope.to_string())
            .or_default()
            .members
            .entry(user_id.to_string())
            .or_default();
        Member::new(scope, user_id)
    }

    pub async fn remove_member(&self, scope: &str, user_id: &str) -> bool {
        let mut scopes = self.scopes.write().await;
        scopes
            .get_mut(scope)
            .map(|s| s.members.remove(user_id).is_some())
            .unwrap_or(false)
    }

    /// Names of the capabilities a member holds, sorted
    pub async fn capability_names(&self, scope: &str, user_id: &str) -> Vec<String> {
        let scopes = self.scopes.read().await;
        let Some(state) = scopes.get(scope) else {
            return Vec::new();
        };
        let mut names: Vec<String> = state
            .members
            .get(user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.handle_for(id).map(|h| h.name))
            .collect();
        names.sort();
        names
    }

    async fn with_member<T>(
        &self,
        member: &Member,
        f: impl FnOnce(&mut BTreeSet<String>) -> T,
    ) -> Result<T, DirectoryError> {
        let mut scopes = self.scopes.write().await;
        let held = scopes
            .get_mut(&member.scope)
            .and_then(|s| s.members.get_mut(&member.id))
            .ok_or_else(|| DirectoryError::MemberNotFound(member.id.clone()))?;
        Ok(f(held))
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn list_members(&self, scope: &str) -> Result<Vec<Member>, DirectoryError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .map(|s| s.members.keys().map(|id| Member::new(scope, id.clone())).collect())
            .unwrap_or_default())
    }

    async fn get_capability(&self, scope: &str, name: &str) -> Result<Option<CapabilityHandle>, DirectoryError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .and_then(|s| s.capabilities.get(name))
            .map(|id| CapabilityHandle::new(id.clone(), name)))
    }

    async fn member_has_capability(&self, member: &Member, capability: &CapabilityHandle) -> Result<bool, DirectoryError> {
        self.with_member(member, |held| held.contains(&capability.id)).await
    }

    async fn member_capabilities(&self, member: &Member) -> Result<Vec<CapabilityHandle>, DirectoryError> {
        let scopes = self.scopes.read().await;
        let state = scopes
            .get(&member.scope)
            .ok_or_else(|| DirectoryError::MemberNotFound(member.id.clone()))?;
        let held = state
            .members
            .get(&member.id)
            .ok_or_else(|| DirectoryError::MemberNotFound(member.id.clone()))?;
        Ok(held.iter().filter_map(|id| state.handle_for(id)).collect())
    }

    async fn grant_capability(&self, member: &Member, capability: &CapabilityHandle) -> Result<(), DirectoryError> {
        self.with_member(member, |held| {
            held.insert(capability.id.clone());
        })
        .await
    }

    async fn revoke_capability(&self, member: &Member, capability: &CapabilityHandle) -> Result<(), DirectoryError> {
        self.with_member(member, |held| {
            held.remove(&capability.id);
        })
        .await
    }

    async fn fetch_member(&self, scope: &str, user_id: &str) -> Result<Option<Member>, DirectoryError> {
        let scopes = self.scopes.read().await;
        Ok(scopes
            .get(scope)
            .filter(|s| s.members.contains_key(user_id))
            .map(|_| Member::new(scope, user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let dir = InMemoryDirectory::new();
        let role = dir.ensure_capability("g", "signed-up").await;
        let member = dir.add_member("g", "u1").await;

        assert!(!dir.member_has_capability(&member, &role).await.unwrap());
        dir.grant_capability(&member, &role).await.unwrap();
        assert!(dir.member_has_capability(&member, &role).await.unwrap());
        assert_eq!(dir.capability_names("g", "u1").await, vec!["signed-up"]);

        dir.revoke_capability(&member, &role).await.unwrap();
        assert!(dir.capability_names("g", "u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_lookups() {
        let dir = InMemoryDirectory::new();
        let first = dir.ensure_capability("g", "banned").await;
        let again = dir.ensure_capability("g", "banned").await;
        assert_eq!(first, again);

        assert!(dir.get_capability("g", "missing").await.unwrap().is_none());
        assert!(dir.fetch_member("g", "ghost").await.unwrap().is_none());

        dir.add_member("g", "u1").await;
        assert_eq!(dir.list_members("g").await.unwrap().len(), 1);
        assert!(dir.list_members("other").await.unwrap().is_empty());

        let ghost = Member::new("g", "ghost");
        assert_eq!(
            dir.grant_capability(&ghost, &first).await,
            Err(DirectoryError::MemberNotFound("ghost".to_string()))
        );
    }
}
