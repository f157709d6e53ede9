//! Shared server state.
//!
//! One [`IssueService`] behind an `Arc<RwLock<_>>` is shared by every
//! request. Reads (list) take the read lock; mutations take the write lock,
//! so each of the four operations executes atomically with respect to the
//! others and no request observes a half-applied mutation.

use crate::error::Result;
use punchlist::service::IssueService;
use punchlist::storage::StoreBackend;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state handed to the router.
#[derive(Clone)]
pub struct AppState {
    service: Arc<RwLock<IssueService>>,
}

impl AppState {
    /// Open the issue service over the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub async fn open(backend: StoreBackend) -> Result<Self> {
        let service = IssueService::open(backend).await?;
        Ok(Self {
            service: Arc::new(RwLock::new(service)),
        })
    }

    /// The shared issue service.
    pub fn service(&self) -> &Arc<RwLock<IssueService>> {
        &self.service
    }

    /// Persist the store (no-op for the in-memory backend).
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.service.read().await.save().await?;
        Ok(())
    }
}
