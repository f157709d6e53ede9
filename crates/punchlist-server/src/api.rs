//! API operation implementations.
//!
//! Each method maps one HTTP operation onto the issue service and shapes
//! the outcome into the wire contract: every response is a JSON value, and
//! failures use the fixed `{error, ...}` bodies. Internal faults degrade
//! (empty array for list, nearest taxonomy error otherwise) and never leak
//! diagnostic detail to the caller.

use crate::models::{
    failure, failure_with_id, success, CreateIssueBody, DeleteIssueBody, UpdateIssueBody,
};
use crate::state::AppState;
use punchlist::domain::IssueFilter;
use punchlist::error::Error;
use punchlist::service::IssueService;
use serde_json::{json, Value};
use tracing::warn;

/// API operations for the issue endpoints.
pub struct Api {
    state: AppState,
}

impl Api {
    /// Create a new Api over the shared state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// `GET /api/issues/{project}` — list with query-string filters.
    ///
    /// Unknown filter keys were already dropped by the filter parser; any
    /// internal fault degrades to an empty array.
    pub async fn list(&self, project: &str, query: Option<&str>) -> Value {
        let pairs = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()).into_owned();
        let filter = IssueFilter::from_pairs(pairs);

        let service = self.state.service().read().await;
        match service.list(project, &filter).await {
            Ok(issues) => serde_json::to_value(&issues).unwrap_or_else(|err| {
                warn!(error = %err, project, "failed to serialize list result");
                json!([])
            }),
            Err(err) => {
                warn!(error = %err, project, "list failed, degrading to empty result");
                json!([])
            }
        }
    }

    /// `POST /api/issues/{project}` — create an issue.
    pub async fn create(&self, project: &str, body: CreateIssueBody) -> Value {
        let mut service = self.state.service().write().await;
        match service.create(project, body.into()).await {
            Ok(issue) => {
                persist(&service).await;
                serde_json::to_value(&issue).unwrap_or_else(|err| {
                    warn!(error = %err, project, "failed to serialize created issue");
                    failure("required field(s) missing")
                })
            }
            Err(Error::MissingRequiredFields) => failure("required field(s) missing"),
            Err(err) => {
                warn!(error = %err, project, "create failed");
                failure("required field(s) missing")
            }
        }
    }

    /// `PUT /api/issues/{project}` — partial update by `_id`.
    pub async fn update(&self, project: &str, body: UpdateIssueBody) -> Value {
        let (id, update) = body.into_update();

        let mut service = self.state.service().write().await;
        match service.update(project, id.as_deref(), update).await {
            Ok(id) => {
                persist(&service).await;
                success("successfully updated", id.as_str())
            }
            Err(Error::MissingId) => failure("missing _id"),
            Err(Error::NoUpdateFields { id }) => {
                failure_with_id("no update field(s) sent", id.as_str())
            }
            Err(Error::IssueNotFound { id }) => failure_with_id("could not update", id.as_str()),
            Err(err) => {
                warn!(error = %err, project, "update failed");
                match id {
                    Some(id) => failure_with_id("could not update", &id),
                    None => failure("missing _id"),
                }
            }
        }
    }

    /// `DELETE /api/issues/{project}` — remove by `_id`.
    pub async fn delete(&self, project: &str, body: DeleteIssueBody) -> Value {
        let mut service = self.state.service().write().await;
        match service.delete(project, body.id.as_deref()).await {
            Ok(id) => {
                persist(&service).await;
                success("successfully deleted", id.as_str())
            }
            Err(Error::MissingId) => failure("missing _id"),
            Err(Error::IssueNotFound { id }) => failure_with_id("could not delete", id.as_str()),
            Err(err) => {
                warn!(error = %err, project, "delete failed");
                match body.id {
                    Some(id) => failure_with_id("could not delete", &id),
                    None => failure("missing _id"),
                }
            }
        }
    }
}

/// Persist after a successful mutation.
///
/// The mutation is already visible in memory, so a failed snapshot write
/// does not change the response; it is logged for the operator.
async fn persist(service: &IssueService) {
    if let Err(err) = service.save().await {
        warn!(error = %err, "failed to persist store after mutation");
    }
}
