use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;

use super::{ContentRepository, RepositoryError};
use crate::content::{Content, ContentStatus, ContentVersion};

/// Process-local store. Used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    records: DashMap<String, Content>,
    versions: DashMap<String, Vec<ContentVersion>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all(&self) -> Vec<Content> {
        self.records.iter().map(|r| self.hydrate(r.value().clone())).collect()
    }

    fn hydrate(&self, mut content: Content) -> Content {
        content.versions = self
            .versions
            .get(&content.id)
            .map(|v| v.value().clone())
            .unwrap_or_default();
        content
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn get(&self, id: &str) -> Result<Option<Content>, RepositoryError> {
        let found = self.records.get(id).map(|r| r.value().clone());
        Ok(found.map(|c| self.hydrate(c)))
    }

    async fn create(&self, content: &Content) -> Result<(), RepositoryError> {
        match self.records.entry(content.id.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::AlreadyExists(content.id.clone())),
            Entry::Vacant(slot) => {
                let mut stored = content.clone();
                stored.versions.clear();
                slot.insert(stored);
                Ok(())
            }
        }
    }

    async fn update(&self, content: &Content) -> Result<u64, RepositoryError> {
        let mut slot = self
            .records
            .get_mut(&content.id)
            .ok_or_else(|| RepositoryError::NotFound(content.id.clone()))?;
        if slot.revision != content.revision {
            return Err(RepositoryError::Conflict {
                id: content.id.clone(),
                expected: content.revision,
                actual: slot.revision,
            });
        }
        let mut stored = content.clone();
        stored.versions.clear();
        stored.revision += 1;
        let revision = stored.revision;
        *slot = stored;
        Ok(revision)
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        self.versions.remove(id);
        Ok(self.records.remove(id).is_some())
    }

    async fn list_fingerprints(&self, feed_id: &str) -> Result<HashSet<String>, RepositoryError> {
        Ok(self
            .records
            .iter()
            .filter_map(|r| {
                r.value()
                    .syndication
                    .as_ref()
                    .filter(|s| s.feed_id == feed_id)
                    .map(|s| s.fingerprint.clone())
            })
            .collect())
    }

    async fn append_version(
        &self,
        content_id: &str,
        version: &ContentVersion,
    ) -> Result<(), RepositoryError> {
        if !self.records.contains_key(content_id) {
            return Err(RepositoryError::NotFound(content_id.to_string()));
        }
        self.versions
            .entry(content_id.to_string())
            .or_default()
            .push(version.clone());
        Ok(())
    }

    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Content>, RepositoryError> {
        let mut due: Vec<Content> = self
            .records
            .iter()
            .filter(|r| {
                let c = r.value();
                c.status == ContentStatus::Approved && c.scheduled_at.is_some_and(|at| at <= now)
            })
            .map(|r| r.value().clone())
            .collect();
        due.sort_by_key(|c| c.scheduled_at);
        Ok(due)
    }
}
