//! Domain types for per-project issue tracking.
//!
//! This module contains the issue record, the creation/update/filter
//! payloads, and the loose-value coercion rules for the `open` flag.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Canonical timestamp serialization: RFC 3339 UTC with millisecond
/// precision and a `Z` suffix.
///
/// Filters compare timestamps by string equality, so the textual form a
/// client reads from a response must round-trip exactly. Every timestamp in
/// this crate goes through this one format.
pub mod timestamp {
    use super::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Render a timestamp in the canonical wire format.
    pub fn canonical(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Serialize in the canonical format.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        canonical(ts).serialize(ser)
    }

    /// Deserialize from any RFC 3339 form, normalizing to UTC.
    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// One trackable item within a project.
///
/// The project name is the partition key and is implied by context; it is
/// not stored on the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier, generated server-side, immutable after creation
    #[serde(rename = "_id")]
    pub id: IssueId,

    /// Issue title (required, non-empty)
    pub issue_title: String,

    /// Issue body text (required, non-empty)
    pub issue_text: String,

    /// Who reported the issue (required, non-empty)
    pub created_by: String,

    /// Who the issue is assigned to (defaults to empty)
    #[serde(default)]
    pub assigned_to: String,

    /// Free-form status note (defaults to empty)
    #[serde(default)]
    pub status_text: String,

    /// Creation timestamp, set once, never mutated
    #[serde(with = "timestamp")]
    pub created_on: DateTime<Utc>,

    /// Last-update timestamp, overwritten on every successful update
    #[serde(with = "timestamp")]
    pub updated_on: DateTime<Utc>,

    /// Whether the issue is still open
    pub open: bool,
}

impl Issue {
    /// The canonical textual representation of a field, as used for filter
    /// comparison. Matches the JSON serialization of the field exactly.
    pub fn field_text(&self, field: FilterField) -> String {
        match field {
            FilterField::Id => self.id.0.clone(),
            FilterField::IssueTitle => self.issue_title.clone(),
            FilterField::IssueText => self.issue_text.clone(),
            FilterField::CreatedBy => self.created_by.clone(),
            FilterField::AssignedTo => self.assigned_to.clone(),
            FilterField::StatusText => self.status_text.clone(),
            FilterField::Open => self.open.to_string(),
            FilterField::CreatedOn => timestamp::canonical(&self.created_on),
            FilterField::UpdatedOn => timestamp::canonical(&self.updated_on),
        }
    }
}

/// A filterable field of an issue record.
///
/// This enum is the allow-list for list filters: query keys that do not map
/// to a variant are dropped before they reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// `_id`
    Id,
    /// `issue_title`
    IssueTitle,
    /// `issue_text`
    IssueText,
    /// `created_by`
    CreatedBy,
    /// `assigned_to`
    AssignedTo,
    /// `status_text`
    StatusText,
    /// `open`
    Open,
    /// `created_on`
    CreatedOn,
    /// `updated_on`
    UpdatedOn,
}

impl FilterField {
    /// Map a query-string key to a filterable field.
    ///
    /// Returns `None` for unrecognized keys; callers silently ignore those.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "_id" => Some(Self::Id),
            "issue_title" => Some(Self::IssueTitle),
            "issue_text" => Some(Self::IssueText),
            "created_by" => Some(Self::CreatedBy),
            "assigned_to" => Some(Self::AssignedTo),
            "status_text" => Some(Self::StatusText),
            "open" => Some(Self::Open),
            "created_on" => Some(Self::CreatedOn),
            "updated_on" => Some(Self::UpdatedOn),
            _ => None,
        }
    }
}

/// Filter for listing issues within a project.
///
/// A record matches when it satisfies every term (logical AND). The `open`
/// term is coerced two ways: the value `"true"` filters for open records,
/// any other value filters for closed ones. All other terms compare by
/// string equality against the field's canonical textual representation.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    terms: Vec<(FilterField, String)>,
}

impl IssueFilter {
    /// Build a filter from raw key/value pairs, dropping unknown keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let terms = pairs
            .into_iter()
            .filter_map(|(k, v)| FilterField::from_key(k.as_ref()).map(|f| (f, v.into())))
            .collect();
        Self { terms }
    }

    /// Whether the filter has no terms (matches everything).
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether the given issue satisfies every filter term.
    pub fn matches(&self, issue: &Issue) -> bool {
        self.terms.iter().all(|(field, value)| match field {
            // Two-way coercion: "true" means open, anything else means closed
            FilterField::Open => issue.open == (value == "true"),
            _ => issue.field_text(*field) == *value,
        })
    }
}

/// Data for creating a new issue
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    /// Issue title (required)
    pub issue_title: String,

    /// Issue body text (required)
    pub issue_text: String,

    /// Who reported the issue (required)
    pub created_by: String,

    /// Assignee (optional, defaults to empty)
    pub assigned_to: String,

    /// Status note (optional, defaults to empty)
    pub status_text: String,
}

impl NewIssue {
    /// Validate that every required field is present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MissingRequiredFields`] if
    /// `issue_title`, `issue_text`, or `created_by` is empty.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.issue_title.is_empty() || self.issue_text.is_empty() || self.created_by.is_empty()
        {
            return Err(crate::error::Error::MissingRequiredFields);
        }
        Ok(())
    }
}

/// Result of coercing a loosely-typed `open` value from an update payload.
///
/// Update coercion is three-way, unlike the two-way list filter:
///
/// | input                     | result     |
/// |---------------------------|------------|
/// | `true` / `"true"`         | `Open`     |
/// | `false` / `"false"`       | `Closed`   |
/// | `""` / `null`             | not provided |
/// | any other literal         | `Verbatim` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenPatch {
    /// Set the record open
    Open,
    /// Set the record closed
    Closed,
    /// A literal that is neither true-like nor false-like, preserved as-is
    Verbatim(String),
}

impl OpenPatch {
    /// Coerce a raw JSON value per the truth table above.
    ///
    /// Returns `None` when the value counts as "not provided" (null or the
    /// empty string) and must be excluded from the update set.
    pub fn coerce(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(true) => Some(Self::Open),
            serde_json::Value::Bool(false) => Some(Self::Closed),
            serde_json::Value::String(s) => match s.as_str() {
                "" => None,
                "true" => Some(Self::Open),
                "false" => Some(Self::Closed),
                _ => Some(Self::Verbatim(s.clone())),
            },
            other => Some(Self::Verbatim(other.to_string())),
        }
    }
}

/// Data for a partial update of an existing issue.
///
/// Only `Some` fields are applied. Empty-string values count as "not
/// provided" and are stripped by [`IssueUpdate::normalize`] before the
/// update set is inspected.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    /// New title (if updating)
    pub issue_title: Option<String>,

    /// New body text (if updating)
    pub issue_text: Option<String>,

    /// New reporter (if updating)
    pub created_by: Option<String>,

    /// New assignee (if updating)
    pub assigned_to: Option<String>,

    /// New status note (if updating)
    pub status_text: Option<String>,

    /// New open flag (if updating), already coerced
    pub open: Option<OpenPatch>,
}

impl IssueUpdate {
    /// Strip empty-string values; they count as "not provided".
    pub fn normalize(&mut self) {
        for field in [
            &mut self.issue_title,
            &mut self.issue_text,
            &mut self.created_by,
            &mut self.assigned_to,
            &mut self.status_text,
        ] {
            if field.as_deref() == Some("") {
                *field = None;
            }
        }
    }

    /// Whether no updatable field is present.
    pub fn is_empty(&self) -> bool {
        self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
    }

    /// Merge the update into an existing record, leaving absent fields
    /// untouched. Does not touch timestamps; the caller owns `updated_on`.
    pub fn apply(&self, issue: &mut Issue) {
        if let Some(title) = &self.issue_title {
            issue.issue_title = title.clone();
        }
        if let Some(text) = &self.issue_text {
            issue.issue_text = text.clone();
        }
        if let Some(created_by) = &self.created_by {
            issue.created_by = created_by.clone();
        }
        if let Some(assigned_to) = &self.assigned_to {
            issue.assigned_to = assigned_to.clone();
        }
        if let Some(status_text) = &self.status_text {
            issue.status_text = status_text.clone();
        }
        match &self.open {
            Some(OpenPatch::Open) => issue.open = true,
            Some(OpenPatch::Closed) => issue.open = false,
            Some(OpenPatch::Verbatim(raw)) => {
                // A typed record cannot hold a non-boolean open value.
                tracing::warn!(value = %raw, "dropping non-boolean open value from update");
            }
            None => {}
        }
    }
}
