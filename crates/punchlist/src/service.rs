//! The issue store service.
//!
//! [`IssueService`] owns a storage backend and an identifier generator and
//! implements the four operations of the tracker: list-with-filter, create,
//! update, delete. The transport layer serializes access to the service, so
//! each operation executes atomically with respect to the others.

use crate::domain::{Issue, IssueFilter, IssueId, IssueUpdate, NewIssue};
use crate::error::{Error, Result};
use crate::id::IdGenerator;
use crate::storage::{open_store, ProjectStore, StoreBackend};
use chrono::Utc;
use tracing::debug;

/// Issue store service: the only component of any weight in this system.
pub struct IssueService {
    /// The storage backend (trait object for polymorphism)
    store: Box<dyn ProjectStore>,

    /// Identifier generator, seeded with every id already in the store
    ids: IdGenerator,
}

impl std::fmt::Debug for IssueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueService")
            .field("store", &"<dyn ProjectStore>")
            .finish_non_exhaustive()
    }
}

impl IssueService {
    /// Open a service over the given backend.
    ///
    /// Seeds the identifier generator with every id already present, so
    /// ids stay unique across restarts of a persistent backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub async fn open(backend: StoreBackend) -> Result<Self> {
        let store = open_store(backend).await?;
        Self::with_store(store).await
    }

    /// Build a service over an already-constructed store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot enumerate its identifiers.
    pub async fn with_store(store: Box<dyn ProjectStore>) -> Result<Self> {
        let mut ids = IdGenerator::new();
        for id in store.all_ids().await? {
            ids.register_id(id);
        }
        Ok(Self { store, ids })
    }

    /// List the project's records matching every filter term.
    ///
    /// An unknown project yields an empty vec, never an error. Result order
    /// is insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error only on a storage fault; the transport degrades
    /// that to an empty result.
    pub async fn list(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let issues = self.store.list(project).await?;
        Ok(issues
            .into_iter()
            .filter(|issue| filter.matches(issue))
            .collect())
    }

    /// Create a new record in the project's collection.
    ///
    /// On success the record has a fresh identifier, `open = true`, and
    /// `created_on == updated_on`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredFields`] if `issue_title`,
    /// `issue_text`, or `created_by` is empty; nothing is stored.
    pub async fn create(&mut self, project: &str, new_issue: NewIssue) -> Result<Issue> {
        new_issue.validate()?;

        let id = self
            .ids
            .generate(
                &new_issue.issue_title,
                &new_issue.issue_text,
                &new_issue.created_by,
            )
            .map_err(|e| Error::Storage(format!("id generation failed: {e}")))?;

        let now = Utc::now();
        let issue = Issue {
            id: IssueId::new(id),
            issue_title: new_issue.issue_title,
            issue_text: new_issue.issue_text,
            created_by: new_issue.created_by,
            assigned_to: new_issue.assigned_to,
            status_text: new_issue.status_text,
            created_on: now,
            updated_on: now,
            open: true,
        };

        self.store.append(project, issue.clone()).await?;
        debug!(project, id = %issue.id, "created issue");

        Ok(issue)
    }

    /// Apply a partial update to one record.
    ///
    /// The check order is contractual:
    ///
    /// 1. missing id
    /// 2. empty update set (takes precedence over not-found)
    /// 3. lookup
    /// 4. merge and stamp `updated_on`
    ///
    /// # Errors
    ///
    /// [`Error::MissingId`], [`Error::NoUpdateFields`], or
    /// [`Error::IssueNotFound`] per the order above.
    pub async fn update(
        &mut self,
        project: &str,
        id: Option<&str>,
        mut update: IssueUpdate,
    ) -> Result<IssueId> {
        let id = match id {
            Some(id) if !id.is_empty() => IssueId::new(id),
            _ => return Err(Error::MissingId),
        };

        update.normalize();
        if update.is_empty() {
            return Err(Error::NoUpdateFields { id });
        }

        let Some(mut issue) = self.store.find(project, &id).await? else {
            return Err(Error::IssueNotFound { id });
        };

        update.apply(&mut issue);
        issue.updated_on = Utc::now();

        if !self.store.replace(project, &id, issue).await? {
            return Err(Error::IssueNotFound { id });
        }
        debug!(project, %id, "updated issue");

        Ok(id)
    }

    /// Remove one record from the project's collection.
    ///
    /// # Errors
    ///
    /// [`Error::MissingId`] if no identifier was supplied,
    /// [`Error::IssueNotFound`] if it isn't in this project's collection.
    pub async fn delete(&mut self, project: &str, id: Option<&str>) -> Result<IssueId> {
        let id = match id {
            Some(id) if !id.is_empty() => IssueId::new(id),
            _ => return Err(Error::MissingId),
        };

        if !self.store.remove(project, &id).await? {
            return Err(Error::IssueNotFound { id });
        }
        debug!(project, %id, "deleted issue");

        Ok(id)
    }

    /// Persist the underlying store (no-op for plain in-memory).
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.store.save().await
    }
}
