use super::*;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, EVENT_DATE_FORMAT).expect("date")
}

#[tokio::test]
async fn stores_and_lists_submissions_newest_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = storage
        .insert_submission("alice", 31, date("2024-05-01"))
        .await
        .expect("insert");
    let second = storage
        .insert_submission("bob", 42, date("2024-06-15"))
        .await
        .expect("insert");

    let listed = storage.list_submissions().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    assert_eq!(listed[1].user_name, "alice");
    assert_eq!(listed[1].event_date, date("2024-05-01"));
}

#[tokio::test]
async fn empty_database_lists_nothing() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.list_submissions().await.expect("list").is_empty());
    assert_eq!(storage.count_submissions().await.expect("count"), 0);
}

#[tokio::test]
async fn loads_submission_by_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let stored = storage
        .insert_submission("carol", 27, date("2025-01-09"))
        .await
        .expect("insert");

    let loaded = storage
        .load_submission(stored.id)
        .await
        .expect("load")
        .expect("present");
    assert_eq!(loaded.user_name, "carol");
    assert_eq!(loaded.user_age, 27);

    let missing = storage
        .load_submission(SubmissionId(stored.id.0 + 100))
        .await
        .expect("load");
    assert!(missing.is_none());
}

#[test]
fn wire_form_uses_plain_date_and_second_precision_timestamp() {
    let stored = StoredSubmission {
        id: SubmissionId(4),
        user_name: "dave".to_string(),
        user_age: 50,
        event_date: date("2024-12-31"),
        submitted_at: NaiveDate::from_ymd_opt(2025, 2, 3)
            .and_then(|d| d.and_hms_micro_opt(4, 5, 6, 789))
            .expect("timestamp"),
    };
    let submission = stored.to_submission();
    assert_eq!(submission.id, Some(SubmissionId(4)));
    assert_eq!(submission.event_date, "2024-12-31");
    assert_eq!(submission.submitted_at, "2025-02-03 04:05:06");
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("submissions.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage
        .insert_submission("erin", 19, date("2024-03-03"))
        .await
        .expect("insert");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(reopened.count_submissions().await.expect("count"), 1);
}

#[test]
fn sqlite_path_ignores_memory_and_foreign_urls() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert!(sqlite_path("postgres://localhost/db").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/submissions.db?mode=rwc"),
        Some(PathBuf::from("./data/submissions.db"))
    );
}
