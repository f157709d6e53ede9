//! In-memory storage backend.
//!
//! This module provides a fast, **ephemeral** storage implementation where
//! all data is held in RAM and **lost when the process exits**, unless it
//! is wrapped with JSONL snapshot persistence by the factory. It is the
//! reference backend for the [`ProjectStore`] trait.
//!
//! # Architecture
//!
//! - `HashMap<String, Vec<Issue>>`: one ordered collection per project
//! - Collections are append-only lists: `list` returns insertion order,
//!   `replace` keeps a record's position, `remove` shifts later records up
//!
//! # Thread Safety
//!
//! The storage is wrapped in `Arc<Mutex<_>>` for thread-safe access in
//! async contexts. Every trait method acquires the mutex, so each operation
//! is atomic with respect to the others.

use crate::domain::{Issue, IssueId};
use crate::error::Result;
use crate::storage::ProjectStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Inner storage structure (not thread-safe).
///
/// Wrapped in `Arc<Mutex<_>>` by [`new_memory_store`].
pub(crate) struct MemoryStoreInner {
    /// Ordered issue collections keyed by project name
    pub(super) collections: HashMap<String, Vec<Issue>>,
}

impl MemoryStoreInner {
    /// Create a new empty storage instance
    pub(crate) fn new() -> Self {
        Self {
            collections: HashMap::new(),
        }
    }
}

/// Thread-safe in-memory storage.
pub(crate) type MemoryStore = Arc<Mutex<MemoryStoreInner>>;

/// Create a new in-memory storage instance.
///
/// # Example
///
/// ```
/// use punchlist::storage::memory::new_memory_store;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_memory_store();
///     assert!(store.list("apitest").await.unwrap().is_empty());
/// }
/// ```
pub fn new_memory_store() -> Box<dyn ProjectStore> {
    Box::new(Arc::new(Mutex::new(MemoryStoreInner::new())))
}

/// Build a boxed store directly from an inner structure.
///
/// Used by the JSONL loader, which assembles the inner map itself.
pub(crate) fn from_inner(inner: MemoryStoreInner) -> Box<dyn ProjectStore> {
    Box::new(Arc::new(Mutex::new(inner)))
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list(&self, project: &str) -> Result<Vec<Issue>> {
        let inner = self.lock().await;
        Ok(inner.collections.get(project).cloned().unwrap_or_default())
    }

    async fn append(&mut self, project: &str, issue: Issue) -> Result<()> {
        let mut inner = self.lock().await;
        inner
            .collections
            .entry(project.to_string())
            .or_default()
            .push(issue);
        Ok(())
    }

    async fn find(&self, project: &str, id: &IssueId) -> Result<Option<Issue>> {
        let inner = self.lock().await;
        Ok(inner
            .collections
            .get(project)
            .and_then(|issues| issues.iter().find(|issue| issue.id == *id).cloned()))
    }

    async fn replace(&mut self, project: &str, id: &IssueId, issue: Issue) -> Result<bool> {
        let mut inner = self.lock().await;
        let Some(issues) = inner.collections.get_mut(project) else {
            return Ok(false);
        };
        match issues.iter_mut().find(|existing| existing.id == *id) {
            Some(slot) => {
                *slot = issue;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&mut self, project: &str, id: &IssueId) -> Result<bool> {
        let mut inner = self.lock().await;
        let Some(issues) = inner.collections.get_mut(project) else {
            return Ok(false);
        };
        match issues.iter().position(|issue| issue.id == *id) {
            Some(index) => {
                issues.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn all_ids(&self) -> Result<Vec<String>> {
        let inner = self.lock().await;
        Ok(inner
            .collections
            .values()
            .flatten()
            .map(|issue| issue.id.as_str().to_string())
            .collect())
    }

    async fn snapshot(&self) -> Result<Vec<(String, Issue)>> {
        let inner = self.lock().await;
        Ok(inner
            .collections
            .iter()
            .flat_map(|(project, issues)| {
                issues
                    .iter()
                    .map(|issue| (project.clone(), issue.clone()))
            })
            .collect())
    }

    async fn save(&self) -> Result<()> {
        // In-memory storage doesn't persist to disk
        Ok(())
    }
}
