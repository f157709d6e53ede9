//! Storage abstraction layer for punchlist.
//!
//! This module provides the project-keyed storage trait and the factory for
//! creating storage backends. Two implementations exist:
//!
//! - **In-memory**: Fast, ephemeral storage backed by a per-project HashMap
//! - **JSONL**: The in-memory store with a JSON Lines snapshot on disk
//!
//! # Architecture
//!
//! The storage layer uses an async trait so the in-memory backend and any
//! future truly-async backend share one interface. The trait is object-safe,
//! allowing dynamic dispatch via `Box<dyn ProjectStore>`.
//!
//! Collections preserve insertion order: `list` returns records in the
//! order they were appended, which the service relies on for deterministic
//! results.
//!
//! # Test Utilities
//!
//! This module provides a [`MockStore`] implementation for testing code
//! that depends on the [`ProjectStore`] trait. Enable the `test-util`
//! feature to use it from downstream crates.
//!
//! # Example
//!
//! ```no_run
//! use punchlist::storage::{open_store, StoreBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = open_store(StoreBackend::Memory).await?;
//!     let issues = store.list("apitest").await?;
//!     assert!(issues.is_empty());
//!     Ok(())
//! }
//! ```

use crate::domain::{Issue, IssueId};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod jsonl;
pub mod memory;

pub use jsonl::{load_from_jsonl, save_to_jsonl, LoadWarning};

/// Project-name-keyed storage backend consumed by the issue service.
///
/// Implementations must be `Send + Sync` to support concurrent access in
/// async contexts. A project's collection is created lazily on first
/// append; reading an unknown project yields an empty result, never an
/// error.
///
/// # Method Categories
///
/// - **Collection access**: `list`, `find`
/// - **Mutation**: `append`, `replace`, `remove`
/// - **Snapshot**: `all_ids`, `snapshot`, `save`
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Every record in the project's collection, in insertion order.
    ///
    /// Unknown projects yield an empty vec.
    async fn list(&self, project: &str) -> Result<Vec<Issue>>;

    /// Append a record to the project's collection, creating the
    /// collection if the project is new.
    async fn append(&mut self, project: &str, issue: Issue) -> Result<()>;

    /// Find a record by identifier within the project's collection.
    async fn find(&self, project: &str, id: &IssueId) -> Result<Option<Issue>>;

    /// Replace the record with the given identifier, keeping its position
    /// in the collection. Returns `false` if no such record exists.
    async fn replace(&mut self, project: &str, id: &IssueId, issue: Issue) -> Result<bool>;

    /// Remove the record with the given identifier. Returns `false` if no
    /// such record exists.
    async fn remove(&mut self, project: &str, id: &IssueId) -> Result<bool>;

    /// Every identifier across all projects.
    ///
    /// Used to seed the id generator's collision set when opening a store
    /// with existing data.
    async fn all_ids(&self) -> Result<Vec<String>>;

    /// All `(project, issue)` pairs, for persistence.
    async fn snapshot(&self) -> Result<Vec<(String, Issue)>>;

    /// Persist the store.
    ///
    /// This method takes `&self` (not `&mut self`) so callers can save
    /// after read-only access; implementations use interior mutability.
    /// No-op for the plain in-memory backend.
    async fn save(&self) -> Result<()>;
}

/// Storage backend configuration.
///
/// Determines which storage implementation [`open_store`] returns.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// In-memory storage (ephemeral)
    Memory,

    /// In-memory storage with a JSONL snapshot file (persistent)
    Jsonl(PathBuf),
}

impl StoreBackend {
    /// Returns the data file path for file-based backends.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StoreBackend::Jsonl(path) => Some(path),
            StoreBackend::Memory => None,
        }
    }
}

/// Wrapper that adds JSONL snapshot persistence to any storage backend.
///
/// Delegates every operation to the inner store and implements `save()` by
/// atomically rewriting the snapshot file.
struct JsonlBackedStore {
    inner: Box<dyn ProjectStore>,
    path: PathBuf,
}

#[async_trait]
impl ProjectStore for JsonlBackedStore {
    async fn list(&self, project: &str) -> Result<Vec<Issue>> {
        self.inner.list(project).await
    }

    async fn append(&mut self, project: &str, issue: Issue) -> Result<()> {
        self.inner.append(project, issue).await
    }

    async fn find(&self, project: &str, id: &IssueId) -> Result<Option<Issue>> {
        self.inner.find(project, id).await
    }

    async fn replace(&mut self, project: &str, id: &IssueId, issue: Issue) -> Result<bool> {
        self.inner.replace(project, id, issue).await
    }

    async fn remove(&mut self, project: &str, id: &IssueId) -> Result<bool> {
        self.inner.remove(project, id).await
    }

    async fn all_ids(&self) -> Result<Vec<String>> {
        self.inner.all_ids().await
    }

    async fn snapshot(&self) -> Result<Vec<(String, Issue)>> {
        self.inner.snapshot().await
    }

    async fn save(&self) -> Result<()> {
        jsonl::save_to_jsonl(self.inner.as_ref(), &self.path).await
    }
}

/// Create a storage instance for the given backend.
///
/// This factory function returns a trait object that can be used
/// polymorphically regardless of the backend implementation.
///
/// # Errors
///
/// Returns an error if the snapshot file exists but cannot be read.
/// Malformed lines within a readable snapshot are skipped with warnings,
/// never a startup failure.
pub async fn open_store(backend: StoreBackend) -> Result<Box<dyn ProjectStore>> {
    match backend {
        StoreBackend::Memory => Ok(memory::new_memory_store()),
        StoreBackend::Jsonl(path) => {
            let inner = if path.exists() {
                let (store, warnings) = jsonl::load_from_jsonl(&path).await?;
                for warning in &warnings {
                    tracing::warn!(warning = ?warning, "JSONL load warning");
                }
                store
            } else {
                // File doesn't exist yet (first run) - start empty
                memory::new_memory_store()
            };
            Ok(Box::new(JsonlBackedStore { inner, path }))
        }
    }
}

// ========== Test Utilities ==========

/// The hardcoded identifier recognized by [`MockStore`].
#[cfg(any(test, feature = "test-util"))]
pub const MOCK_ISSUE_ID: &str = "0123456789abcdef01234567";

/// Mock implementation of [`ProjectStore`] for testing.
///
/// This is a **stateless** mock that provides a minimal implementation of
/// the storage trait for verifying trait-object usage. It recognizes only
/// [`MOCK_ISSUE_ID`] and does not persist anything between calls.
///
/// For tests that need real CRUD behavior, use
/// [`memory::new_memory_store`] instead.
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Copy, Default)]
#[non_exhaustive]
pub struct MockStore;

#[cfg(any(test, feature = "test-util"))]
impl MockStore {
    /// Create a new MockStore instance.
    pub fn new() -> Self {
        Self
    }

    /// Creates a test issue with the given identifier.
    ///
    /// Useful for building expected values in downstream tests.
    pub fn create_test_issue(id: IssueId) -> Issue {
        use chrono::Utc;

        let now = Utc::now();
        Issue {
            id,
            issue_title: "Test Issue".to_string(),
            issue_text: "Test text".to_string(),
            created_by: "tester".to_string(),
            assigned_to: String::new(),
            status_text: String::new(),
            created_on: now,
            updated_on: now,
            open: true,
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl ProjectStore for MockStore {
    async fn list(&self, _project: &str) -> Result<Vec<Issue>> {
        Ok(vec![])
    }

    async fn append(&mut self, _project: &str, _issue: Issue) -> Result<()> {
        Ok(())
    }

    async fn find(&self, _project: &str, id: &IssueId) -> Result<Option<Issue>> {
        if id.as_str() == MOCK_ISSUE_ID {
            Ok(Some(Self::create_test_issue(id.clone())))
        } else {
            Ok(None)
        }
    }

    async fn replace(&mut self, _project: &str, id: &IssueId, _issue: Issue) -> Result<bool> {
        Ok(id.as_str() == MOCK_ISSUE_ID)
    }

    async fn remove(&mut self, _project: &str, id: &IssueId) -> Result<bool> {
        Ok(id.as_str() == MOCK_ISSUE_ID)
    }

    async fn all_ids(&self) -> Result<Vec<String>> {
        Ok(vec![MOCK_ISSUE_ID.to_string()])
    }

    async fn snapshot(&self) -> Result<Vec<(String, Issue)>> {
        Ok(vec![])
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }
}
