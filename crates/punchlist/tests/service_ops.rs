//! Integration tests for the issue service.
//!
//! These tests verify the full behavior of the four operations against the
//! in-memory backend: creation defaults, required-field validation, filter
//! semantics, update check ordering, delete idempotence, and JSONL
//! persistence through the service.

use punchlist::domain::{IssueFilter, IssueUpdate, NewIssue, OpenPatch};
use punchlist::error::Error;
use punchlist::service::IssueService;
use punchlist::storage::StoreBackend;
use rstest::rstest;
use tempfile::tempdir;

const PROJECT: &str = "apitest";

async fn memory_service() -> IssueService {
    IssueService::open(StoreBackend::Memory).await.unwrap()
}

fn full_issue() -> NewIssue {
    NewIssue {
        issue_title: "Full Issue".to_string(),
        issue_text: "Text".to_string(),
        created_by: "Tester".to_string(),
        assigned_to: "Dev A".to_string(),
        status_text: "In QA".to_string(),
    }
}

fn required_only(title: &str) -> NewIssue {
    NewIssue {
        issue_title: title.to_string(),
        issue_text: "Just the basics".to_string(),
        created_by: "Tester".to_string(),
        ..Default::default()
    }
}

// ========== Create ==========

#[tokio::test]
async fn test_create_sets_defaults() {
    let mut service = memory_service().await;

    let issue = service.create(PROJECT, required_only("Required Only")).await.unwrap();

    assert!(!issue.id.as_str().is_empty());
    assert!(issue.open);
    assert_eq!(issue.created_on, issue.updated_on);
    assert_eq!(issue.assigned_to, "");
    assert_eq!(issue.status_text, "");
}

#[tokio::test]
async fn test_create_with_every_field() {
    let mut service = memory_service().await;

    let issue = service.create(PROJECT, full_issue()).await.unwrap();

    assert_eq!(issue.issue_title, "Full Issue");
    assert_eq!(issue.issue_text, "Text");
    assert_eq!(issue.created_by, "Tester");
    assert_eq!(issue.assigned_to, "Dev A");
    assert_eq!(issue.status_text, "In QA");
}

#[rstest]
#[case::no_title(NewIssue { issue_text: "x".into(), created_by: "c".into(), ..Default::default() })]
#[case::no_text(NewIssue { issue_title: "t".into(), created_by: "c".into(), ..Default::default() })]
#[case::no_creator(NewIssue { issue_title: "t".into(), issue_text: "x".into(), ..Default::default() })]
#[case::all_empty(NewIssue::default())]
#[tokio::test]
async fn test_create_missing_required_fields(#[case] new_issue: NewIssue) {
    let mut service = memory_service().await;

    let result = service.create(PROJECT, new_issue).await;
    assert!(matches!(result, Err(Error::MissingRequiredFields)));

    // Nothing was stored
    let issues = service.list(PROJECT, &IssueFilter::default()).await.unwrap();
    assert!(issues.is_empty());
}

#[tokio::test]
async fn test_created_ids_are_unique() {
    let mut service = memory_service().await;

    let a = service.create(PROJECT, required_only("Twin A")).await.unwrap();
    let b = service.create(PROJECT, required_only("Twin A")).await.unwrap();

    assert_ne!(a.id, b.id);
}

// ========== List ==========

#[tokio::test]
async fn test_list_unknown_project_is_empty() {
    let service = memory_service().await;
    let issues = service.list("never-seen", &IssueFilter::default()).await.unwrap();
    assert!(issues.is_empty());
}

#[tokio::test]
async fn test_list_preserves_insertion_order() {
    let mut service = memory_service().await;
    for title in ["one", "two", "three"] {
        service.create(PROJECT, required_only(title)).await.unwrap();
    }

    let titles: Vec<String> = service
        .list(PROJECT, &IssueFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.issue_title)
        .collect();
    assert_eq!(titles, ["one", "two", "three"]);
}

#[tokio::test]
async fn test_list_open_filter() {
    let mut service = memory_service().await;
    let kept = service.create(PROJECT, required_only("stays open")).await.unwrap();
    let closed = service.create(PROJECT, required_only("gets closed")).await.unwrap();

    let update = IssueUpdate {
        open: Some(OpenPatch::Closed),
        ..Default::default()
    };
    service
        .update(PROJECT, Some(closed.id.as_str()), update)
        .await
        .unwrap();

    let open = service
        .list(PROJECT, &IssueFilter::from_pairs([("open", "true")]))
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, kept.id);

    let not_open = service
        .list(PROJECT, &IssueFilter::from_pairs([("open", "false")]))
        .await
        .unwrap();
    assert_eq!(not_open.len(), 1);
    assert_eq!(not_open[0].id, closed.id);
}

#[tokio::test]
async fn test_list_combined_filters() {
    let mut service = memory_service().await;
    service.create(PROJECT, full_issue()).await.unwrap();
    let mut other = required_only("Other reporter");
    other.created_by = "Someone Else".to_string();
    service.create(PROJECT, other).await.unwrap();

    let filter = IssueFilter::from_pairs([("open", "true"), ("created_by", "Tester")]);
    let issues = service.list(PROJECT, &filter).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].created_by, "Tester");
}

#[tokio::test]
async fn test_list_filter_by_canonical_timestamp() {
    let mut service = memory_service().await;
    let created = service.create(PROJECT, required_only("timed")).await.unwrap();

    // The canonical text of created_on, as a client would read it back
    let stamp = created.field_text(punchlist::domain::FilterField::CreatedOn);
    let filter = IssueFilter::from_pairs([("created_on", stamp)]);

    let issues = service.list(PROJECT, &filter).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, created.id);
}

#[tokio::test]
async fn test_projects_are_partitioned() {
    let mut service = memory_service().await;
    service.create("alpha", required_only("alpha issue")).await.unwrap();
    service.create("beta", required_only("beta issue")).await.unwrap();

    let alpha = service.list("alpha", &IssueFilter::default()).await.unwrap();
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0].issue_title, "alpha issue");
}

// ========== Update ==========

#[tokio::test]
async fn test_update_missing_id() {
    let mut service = memory_service().await;

    let update = IssueUpdate {
        issue_text: Some("x".to_string()),
        ..Default::default()
    };
    let result = service.update(PROJECT, None, update.clone()).await;
    assert!(matches!(result, Err(Error::MissingId)));

    // Empty string counts as missing too
    let result = service.update(PROJECT, Some(""), update).await;
    assert!(matches!(result, Err(Error::MissingId)));
}

#[tokio::test]
async fn test_update_no_fields_takes_precedence_over_not_found() {
    let mut service = memory_service().await;

    // The id does not exist, but the empty update set must win
    let result = service
        .update(PROJECT, Some("ffffffffffffffffffffffff"), IssueUpdate::default())
        .await;
    match result {
        Err(Error::NoUpdateFields { id }) => {
            assert_eq!(id.as_str(), "ffffffffffffffffffffffff");
        }
        other => panic!("expected NoUpdateFields, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_only_empty_strings_counts_as_no_fields() {
    let mut service = memory_service().await;
    let created = service.create(PROJECT, required_only("target")).await.unwrap();

    let update = IssueUpdate {
        issue_title: Some(String::new()),
        assigned_to: Some(String::new()),
        ..Default::default()
    };
    let result = service.update(PROJECT, Some(created.id.as_str()), update).await;
    assert!(matches!(result, Err(Error::NoUpdateFields { .. })));

    // No mutation happened
    let after = service.list(PROJECT, &IssueFilter::default()).await.unwrap();
    assert_eq!(after[0].issue_title, "target");
    assert_eq!(after[0].updated_on, created.updated_on);
}

#[tokio::test]
async fn test_update_unknown_id_with_real_field() {
    let mut service = memory_service().await;

    let update = IssueUpdate {
        issue_text: Some("nope".to_string()),
        ..Default::default()
    };
    let result = service
        .update(PROJECT, Some("000000000000000000000000"), update)
        .await;
    match result {
        Err(Error::IssueNotFound { id }) => {
            assert_eq!(id.as_str(), "000000000000000000000000");
        }
        other => panic!("expected IssueNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_merges_only_given_fields() {
    let mut service = memory_service().await;
    let created = service.create(PROJECT, full_issue()).await.unwrap();

    let update = IssueUpdate {
        issue_text: Some("Updated text".to_string()),
        assigned_to: Some("Dev B".to_string()),
        ..Default::default()
    };
    let id = service
        .update(PROJECT, Some(created.id.as_str()), update)
        .await
        .unwrap();
    assert_eq!(id, created.id);

    let issues = service.list(PROJECT, &IssueFilter::default()).await.unwrap();
    let after = &issues[0];
    assert_eq!(after.issue_text, "Updated text");
    assert_eq!(after.assigned_to, "Dev B");
    // Everything else untouched
    assert_eq!(after.issue_title, "Full Issue");
    assert_eq!(after.status_text, "In QA");
    assert_eq!(after.created_on, created.created_on);
    assert!(after.updated_on >= created.updated_on);
}

#[tokio::test]
async fn test_update_open_via_string_false() {
    let mut service = memory_service().await;
    let created = service.create(PROJECT, required_only("to close")).await.unwrap();

    let update = IssueUpdate {
        open: Some(OpenPatch::coerce(&serde_json::json!("false")).unwrap()),
        ..Default::default()
    };
    service
        .update(PROJECT, Some(created.id.as_str()), update)
        .await
        .unwrap();

    let open = service
        .list(PROJECT, &IssueFilter::from_pairs([("open", "true")]))
        .await
        .unwrap();
    assert!(open.iter().all(|i| i.id != created.id));

    let closed = service
        .list(PROJECT, &IssueFilter::from_pairs([("open", "false")]))
        .await
        .unwrap();
    assert!(closed.iter().any(|i| i.id == created.id));
}

// ========== Delete ==========

#[tokio::test]
async fn test_delete_missing_id() {
    let mut service = memory_service().await;
    let result = service.delete(PROJECT, None).await;
    assert!(matches!(result, Err(Error::MissingId)));
}

#[tokio::test]
async fn test_delete_unknown_id() {
    let mut service = memory_service().await;
    let result = service.delete(PROJECT, Some("ffffffffffffffffffffffff")).await;
    assert!(matches!(result, Err(Error::IssueNotFound { .. })));
}

#[tokio::test]
async fn test_delete_removes_and_is_not_idempotent() {
    let mut service = memory_service().await;
    let created = service.create(PROJECT, required_only("doomed")).await.unwrap();

    let id = service
        .delete(PROJECT, Some(created.id.as_str()))
        .await
        .unwrap();
    assert_eq!(id, created.id);

    let remaining = service.list(PROJECT, &IssueFilter::default()).await.unwrap();
    assert!(remaining.iter().all(|i| i.id != created.id));

    // Second delete of the same id fails
    let result = service.delete(PROJECT, Some(created.id.as_str())).await;
    assert!(matches!(result, Err(Error::IssueNotFound { .. })));
}

#[tokio::test]
async fn test_delete_is_scoped_to_project() {
    let mut service = memory_service().await;
    let created = service.create("alpha", required_only("alpha only")).await.unwrap();

    // Same id addressed through another project is not found
    let result = service.delete("beta", Some(created.id.as_str())).await;
    assert!(matches!(result, Err(Error::IssueNotFound { .. })));
    assert_eq!(service.list("alpha", &IssueFilter::default()).await.unwrap().len(), 1);
}

// ========== Persistence ==========

#[tokio::test]
async fn test_jsonl_round_trip_through_service() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("issues.jsonl");

    let created = {
        let mut service = IssueService::open(StoreBackend::Jsonl(path.clone()))
            .await
            .unwrap();
        let created = service.create(PROJECT, full_issue()).await.unwrap();
        service.save().await.unwrap();
        created
    };

    let service = IssueService::open(StoreBackend::Jsonl(path)).await.unwrap();
    let issues = service.list(PROJECT, &IssueFilter::default()).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, created.id);
    assert_eq!(issues[0].issue_title, "Full Issue");
}

#[tokio::test]
async fn test_reopened_service_keeps_ids_unique() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("issues.jsonl");

    let first = {
        let mut service = IssueService::open(StoreBackend::Jsonl(path.clone()))
            .await
            .unwrap();
        let first = service.create(PROJECT, required_only("seed")).await.unwrap();
        service.save().await.unwrap();
        first
    };

    let mut service = IssueService::open(StoreBackend::Jsonl(path)).await.unwrap();
    let second = service.create(PROJECT, required_only("seed")).await.unwrap();
    assert_ne!(first.id, second.id);
}
