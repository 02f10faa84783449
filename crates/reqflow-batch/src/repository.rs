//! Remote store contract
//!
//! The engine assumes no transport: anything that can read the whole
//! collection and apply a patch to one item qualifies.

use crate::error::RemoteError;
use async_trait::async_trait;
use dashmap::DashMap;
use reqflow_model::{ItemId, Patchable};

/// Remote "read whole collection / write one item" store
#[async_trait]
pub trait Repository<T: Patchable>: Send + Sync {
    /// Every item in the collection
    async fn list(&self) -> Result<Vec<T>, RemoteError>;

    /// Apply `patch` to item `id`, returning the authoritative item
    async fn apply(&self, id: &ItemId, patch: &T::Patch) -> Result<T, RemoteError>;
}

/// Repository held in a concurrent map
///
/// All state is lost when dropped.
#[derive(Debug)]
pub struct InMemoryRepository<T: Patchable> {
    items: DashMap<ItemId, T>,
}

impl<T: Patchable> InMemoryRepository<T> {
    /// Create empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Create repository seeded with `items`
    ///
    /// Later items replace earlier ones with the same id.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = T>) -> Self {
        let repo = Self::new();
        for item in items {
            repo.insert(item);
        }
        repo
    }

    /// Insert or replace an item
    pub fn insert(&self, item: T) {
        self.items.insert(item.id().clone(), item);
    }

    /// Current copy of an item
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<T> {
        self.items.get(id).map(|entry| entry.value().clone())
    }

    /// All items, ordered by id
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        let mut items: Vec<T> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| a.id().cmp(b.id()));
        items
    }

    /// Item count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if repository is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Patchable> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Patchable> Repository<T> for InMemoryRepository<T> {
    async fn list(&self) -> Result<Vec<T>, RemoteError> {
        Ok(self.snapshot())
    }

    async fn apply(&self, id: &ItemId, patch: &T::Patch) -> Result<T, RemoteError> {
        let mut entry = self
            .items
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        entry.apply(patch);
        Ok(entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqflow_model::{Requirement, RequirementPatch};

    #[tokio::test]
    async fn in_memory_apply_and_list() {
        let repo = InMemoryRepository::with_items(vec![
            Requirement::new("b", "second"),
            Requirement::new("a", "first"),
        ]);

        let updated = repo
            .apply(&ItemId::new("a"), &RequirementPatch::Title("renamed".into()))
            .await
            .unwrap();
        assert_eq!(updated.title, "renamed");

        let listed = repo.list().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(listed[0].title, "renamed");
    }

    #[tokio::test]
    async fn in_memory_apply_unknown_id() {
        let repo: InMemoryRepository<Requirement> = InMemoryRepository::new();
        let err = repo
            .apply(&ItemId::new("ghost"), &RequirementPatch::Title("x".into()))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::NotFound(ItemId::new("ghost")));
    }
}
