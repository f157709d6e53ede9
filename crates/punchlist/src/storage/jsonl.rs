//! JSONL snapshot persistence for the in-memory store.
//!
//! The snapshot file holds one record per line, each a JSON object pairing
//! a project name with an issue. Loading is resilient: malformed lines and
//! invalid records are skipped with warnings rather than failing startup.

use super::memory::{from_inner, MemoryStoreInner};
use crate::domain::{Issue, IssueId};
use crate::error::{Error, Result};
use crate::storage::ProjectStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// One line of the snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    /// The project the issue belongs to
    project: String,

    /// The issue record itself
    issue: Issue,
}

/// Warnings that can occur during snapshot loading.
///
/// These are non-fatal: the load continues and the problematic line is
/// skipped. Callers should log them, as they indicate data corruption or
/// manual-editing mistakes that may need attention.
#[derive(Debug, Clone)]
pub enum LoadWarning {
    /// Line that couldn't be parsed as a snapshot record.
    ///
    /// **Effect**: line skipped entirely.
    MalformedJson {
        /// 1-based line number in the snapshot file.
        line_number: usize,
        /// The parse error text.
        error: String,
    },

    /// Record violating a store invariant (empty required field, or
    /// `created_on > updated_on`).
    ///
    /// **Effect**: record skipped; the rest of the file still loads.
    InvalidRecord {
        /// The project the record claimed.
        project: String,
        /// The record's identifier.
        id: IssueId,
        /// 1-based line number in the snapshot file.
        line_number: usize,
        /// What was wrong.
        error: String,
    },

    /// A second record with an identifier already present in the same
    /// project's collection.
    ///
    /// **Effect**: the later record is skipped; the first one wins.
    DuplicateId {
        /// The project holding both records.
        project: String,
        /// The duplicated identifier.
        id: IssueId,
        /// 1-based line number of the skipped record.
        line_number: usize,
    },
}

/// Check the invariants a stored record must satisfy.
fn validate_record(issue: &Issue) -> std::result::Result<(), String> {
    if issue.issue_title.is_empty() || issue.issue_text.is_empty() || issue.created_by.is_empty() {
        return Err("required field(s) empty".to_string());
    }
    if issue.created_on > issue.updated_on {
        return Err("created_on is after updated_on".to_string());
    }
    Ok(())
}

/// Load a store from a JSONL snapshot file.
///
/// Returns the store plus all non-fatal warnings encountered. Insertion
/// order within each project follows file order, so a save/load round trip
/// preserves list order.
///
/// # Errors
///
/// Returns an error only if the file itself cannot be read; individual bad
/// lines become [`LoadWarning`]s instead.
pub async fn load_from_jsonl(path: &Path) -> Result<(Box<dyn ProjectStore>, Vec<LoadWarning>)> {
    let contents = tokio::fs::read_to_string(path).await.map_err(Error::Io)?;

    let mut inner = MemoryStoreInner::new();
    let mut warnings = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (index, line) in contents.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: SnapshotRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(err) => {
                warnings.push(LoadWarning::MalformedJson {
                    line_number,
                    error: err.to_string(),
                });
                continue;
            }
        };

        if let Err(error) = validate_record(&record.issue) {
            warnings.push(LoadWarning::InvalidRecord {
                project: record.project,
                id: record.issue.id,
                line_number,
                error,
            });
            continue;
        }

        let key = (record.project.clone(), record.issue.id.as_str().to_string());
        if !seen.insert(key) {
            warnings.push(LoadWarning::DuplicateId {
                project: record.project,
                id: record.issue.id,
                line_number,
            });
            continue;
        }

        inner
            .collections
            .entry(record.project)
            .or_default()
            .push(record.issue);
    }

    Ok((from_inner(inner), warnings))
}

/// Save a store to a JSONL snapshot file with atomic writes.
///
/// Writes to a temporary file first, then renames it over the target. If
/// the process is interrupted mid-save the original file stays intact.
pub async fn save_to_jsonl(store: &dyn ProjectStore, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let file = File::create(&temp_path).await.map_err(Error::Io)?;
    let mut writer = BufWriter::new(file);

    for (project, issue) in store.snapshot().await? {
        let record = SnapshotRecord { project, issue };
        let json = serde_json::to_string(&record)?;

        writer.write_all(json.as_bytes()).await.map_err(Error::Io)?;
        writer.write_all(b"\n").await.map_err(Error::Io)?;
    }

    writer.flush().await.map_err(Error::Io)?;

    // Atomic rename
    tokio::fs::rename(&temp_path, path).await.map_err(Error::Io)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::new_memory_store;
    use crate::storage::MockStore;
    use tempfile::TempDir;

    fn record_line(project: &str, id: &str, title: &str) -> String {
        let mut issue = MockStore::create_test_issue(IssueId::new(id));
        issue.issue_title = title.to_string();
        serde_json::to_string(&SnapshotRecord {
            project: project.to_string(),
            issue,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_projects() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.jsonl");

        let mut store = new_memory_store();
        for (id, title) in [("a", "first"), ("b", "second")] {
            let mut issue = MockStore::create_test_issue(IssueId::new(id.repeat(24)));
            issue.issue_title = title.to_string();
            store.append("apitest", issue).await.unwrap();
        }
        let mut other = MockStore::create_test_issue(IssueId::new("c".repeat(24)));
        other.issue_title = "elsewhere".to_string();
        store.append("other", other).await.unwrap();

        save_to_jsonl(store.as_ref(), &path).await.unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).await.unwrap();
        assert!(warnings.is_empty());

        let titles: Vec<String> = loaded
            .list("apitest")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.issue_title)
            .collect();
        assert_eq!(titles, ["first", "second"]);
        assert_eq!(loaded.list("other").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped_with_warnings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.jsonl");

        let contents = format!(
            "{}\nnot json at all\n{}\n",
            record_line("apitest", &"a".repeat(24), "kept"),
            record_line("apitest", &"b".repeat(24), "also kept"),
        );
        std::fs::write(&path, contents).unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).await.unwrap();
        assert_eq!(loaded.list("apitest").await.unwrap().len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            LoadWarning::MalformedJson { line_number: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_invalid_records_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.jsonl");

        // Empty title violates the required-field invariant
        std::fs::write(&path, record_line("apitest", &"a".repeat(24), "") + "\n").unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).await.unwrap();
        assert!(loaded.list("apitest").await.unwrap().is_empty());
        assert!(matches!(warnings[0], LoadWarning::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_ids_first_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.jsonl");

        let contents = format!(
            "{}\n{}\n",
            record_line("apitest", &"a".repeat(24), "original"),
            record_line("apitest", &"a".repeat(24), "impostor"),
        );
        std::fs::write(&path, contents).unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).await.unwrap();
        let issues = loaded.list("apitest").await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_title, "original");
        assert!(matches!(warnings[0], LoadWarning::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn test_same_id_in_different_projects_is_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.jsonl");

        let contents = format!(
            "{}\n{}\n",
            record_line("alpha", &"a".repeat(24), "one"),
            record_line("beta", &"a".repeat(24), "two"),
        );
        std::fs::write(&path, contents).unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded.list("alpha").await.unwrap().len(), 1);
        assert_eq!(loaded.list("beta").await.unwrap().len(), 1);
    }
}
