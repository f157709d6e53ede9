//! Wire models for the issue API.
//!
//! Request bodies deserialize loosely: every field is optional, unknown
//! fields are ignored, and an unparseable body degrades to the empty body
//! so the service's own validation produces the contractual error shape.

use punchlist::domain::{IssueUpdate, NewIssue, OpenPatch};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of `POST /api/issues/{project}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIssueBody {
    /// Issue title (required by the service)
    #[serde(default)]
    pub issue_title: Option<String>,

    /// Issue body text (required by the service)
    #[serde(default)]
    pub issue_text: Option<String>,

    /// Reporter (required by the service)
    #[serde(default)]
    pub created_by: Option<String>,

    /// Assignee (optional)
    #[serde(default)]
    pub assigned_to: Option<String>,

    /// Status note (optional)
    #[serde(default)]
    pub status_text: Option<String>,
}

impl From<CreateIssueBody> for NewIssue {
    fn from(body: CreateIssueBody) -> Self {
        Self {
            issue_title: body.issue_title.unwrap_or_default(),
            issue_text: body.issue_text.unwrap_or_default(),
            created_by: body.created_by.unwrap_or_default(),
            assigned_to: body.assigned_to.unwrap_or_default(),
            status_text: body.status_text.unwrap_or_default(),
        }
    }
}

/// Body of `PUT /api/issues/{project}`.
///
/// `open` stays a raw JSON value here because clients send it as either a
/// boolean or a string; the three-way coercion lives in the domain layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIssueBody {
    /// Identifier of the record to update
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    /// New title
    #[serde(default)]
    pub issue_title: Option<String>,

    /// New body text
    #[serde(default)]
    pub issue_text: Option<String>,

    /// New reporter
    #[serde(default)]
    pub created_by: Option<String>,

    /// New assignee
    #[serde(default)]
    pub assigned_to: Option<String>,

    /// New status note
    #[serde(default)]
    pub status_text: Option<String>,

    /// New open flag, loosely typed
    #[serde(default)]
    pub open: Option<Value>,
}

impl UpdateIssueBody {
    /// Split into the identifier and the coerced update set.
    pub fn into_update(self) -> (Option<String>, IssueUpdate) {
        let update = IssueUpdate {
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            open: self.open.as_ref().and_then(OpenPatch::coerce),
        };
        (self.id, update)
    }
}

/// Body of `DELETE /api/issues/{project}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteIssueBody {
    /// Identifier of the record to delete
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
}

/// Parse a request body as JSON or urlencoded form data.
///
/// An empty or unparseable body degrades to `T::default()` rather than an
/// HTTP-level error; the service's validation then reports the contractual
/// error (`missing _id`, `required field(s) missing`, ...).
pub fn parse_body<T: DeserializeOwned + Default>(content_type: Option<&str>, body: &[u8]) -> T {
    if body.is_empty() {
        return T::default();
    }

    if content_type.is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded")) {
        let map: serde_json::Map<String, Value> = url::form_urlencoded::parse(body)
            .into_owned()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        return serde_json::from_value(Value::Object(map)).unwrap_or_default();
    }

    serde_json::from_slice(body).unwrap_or_default()
}

/// A `{result, _id}` success body.
pub fn success(result: &str, id: &str) -> Value {
    json!({ "result": result, "_id": id })
}

/// An `{error}` failure body.
pub fn failure(error: &str) -> Value {
    json!({ "error": error })
}

/// An `{error, _id}` failure body.
pub fn failure_with_id(error: &str, id: &str) -> Value {
    json!({ "error": error, "_id": id })
}
