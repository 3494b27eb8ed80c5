use taskboard_core::db::open_db;
use taskboard_core::{
    KeyValueStorage, LocalTaskRepository, MemoryStorage, NewTask, SqliteStorage, Task, TaskErrorCause,
    TaskOperation, TaskRepository, TaskValidationError,
};

fn repo() -> LocalTaskRepository<MemoryStorage> {
    LocalTaskRepository::with_medium(MemoryStorage::new())
}

fn task(id: i64) -> Task {
    NewTask::new("Work", format!("task {id}"), 30.0).with_id(id)
}

#[test]
fn create_and_get_all_roundtrip() {
    let repo = repo();
    repo.create(&task(1)).unwrap();
    repo.create(&task(2)).unwrap();

    assert_eq!(repo.get_all().unwrap(), vec![task(1), task(2)]);
}

#[test]
fn create_rejects_invalid_fields_without_writing() {
    let repo = repo();
    let cases = [
        (
            NewTask::new("", "desc", 1.0).with_id(1),
            TaskValidationError::EmptySource,
        ),
        (
            NewTask::new("Work", "   ", 1.0).with_id(1),
            TaskValidationError::EmptyDescription,
        ),
        (
            NewTask::new("Work", "desc", -5.0).with_id(1),
            TaskValidationError::InvalidDuration(-5.0),
        ),
        (
            NewTask::new("Work", "desc", 1.0).with_id(0),
            TaskValidationError::InvalidId(0),
        ),
    ];

    for (candidate, expected) in cases {
        let err = repo.create(&candidate).unwrap_err();
        assert_eq!(err.operation(), TaskOperation::Create);
        match err.cause() {
            TaskErrorCause::Validation(actual) => assert_eq!(actual, &expected),
            other => panic!("unexpected cause: {other}"),
        }
    }
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn create_rejects_duplicate_id() {
    let repo = repo();
    repo.create(&task(7)).unwrap();

    let err = repo.create(&task(7)).unwrap_err();
    assert!(matches!(err.cause(), TaskErrorCause::DuplicateId(7)));
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn update_replaces_entry_in_place() {
    let repo = repo();
    repo.create(&task(1)).unwrap();
    repo.create(&task(2)).unwrap();

    let mut edited = task(1);
    edited.description = "rewritten".to_string();
    edited.duration = 45.0;
    repo.update(&edited).unwrap();

    assert_eq!(repo.get_all().unwrap(), vec![edited, task(2)]);
}

#[test]
fn update_rejects_missing_or_non_positive_id() {
    let repo = repo();
    repo.create(&task(1)).unwrap();

    for id in [0, -4] {
        let err = repo.update(&task(id)).unwrap_err();
        assert!(matches!(
            err.cause(),
            TaskErrorCause::Validation(TaskValidationError::InvalidId(_))
        ));
    }
}

#[test]
fn update_of_absent_id_fails_and_leaves_collection_unchanged() {
    let repo = repo();
    repo.create(&task(1)).unwrap();
    repo.create(&task(2)).unwrap();
    let before = repo.get_all().unwrap();

    let err = repo.update(&task(999_999)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "failed to update task: task with id 999999 not found"
    );
    assert_eq!(repo.get_all().unwrap(), before);
}

#[test]
fn delete_and_toggle_of_absent_id_fail_with_not_found() {
    let repo = repo();
    repo.create(&task(1)).unwrap();
    let before = repo.get_all().unwrap();

    let err = repo.delete(42).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.operation(), TaskOperation::Delete);

    let err = repo.toggle_status(42).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("failed to toggle task status:"));

    assert_eq!(repo.get_all().unwrap(), before);
}

#[test]
fn delete_rejects_invalid_id() {
    let err = repo().delete(-1).unwrap_err();
    assert!(matches!(
        err.cause(),
        TaskErrorCause::Validation(TaskValidationError::InvalidId(-1))
    ));
}

#[test]
fn delete_removes_only_matching_entry() {
    let repo = repo();
    for id in 1..=3 {
        repo.create(&task(id)).unwrap();
    }

    repo.delete(2).unwrap();
    assert_eq!(repo.get_all().unwrap(), vec![task(1), task(3)]);
}

#[test]
fn toggle_twice_restores_original_task() {
    let repo = repo();
    repo.create(&task(1)).unwrap();

    let toggled = repo.toggle_status(1).unwrap();
    assert!(toggled.completed);
    assert_eq!(repo.get_all().unwrap(), vec![toggled]);

    repo.toggle_status(1).unwrap();
    assert_eq!(repo.get_all().unwrap(), vec![task(1)]);
}

#[test]
fn delete_all_is_idempotent() {
    let repo = repo();
    repo.create(&task(1)).unwrap();

    repo.delete_all().unwrap();
    assert!(repo.get_all().unwrap().is_empty());
    repo.delete_all().unwrap();
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn storage_failures_name_the_operation() {
    let medium = MemoryStorage::new();
    let repo = LocalTaskRepository::with_medium(medium.clone());
    medium.set_available(false);

    let err = repo.get_all().unwrap_err();
    assert!(matches!(err.cause(), TaskErrorCause::Storage(_)));
    assert!(err.to_string().starts_with("failed to retrieve tasks: storage is not available"));

    let err = repo.delete_all().unwrap_err();
    assert_eq!(err.operation(), TaskOperation::DeleteAll);
}

#[test]
fn medium_filled_to_the_quota_edge_still_reads_and_clears() {
    let blob = serde_json::to_string(&[task(1)]).unwrap();
    let quota = ("tasks".len() + blob.len() + 11) as u64;
    let medium = MemoryStorage::with_quota(quota);
    let repo = LocalTaskRepository::with_medium(medium.clone());
    repo.create(&task(1)).unwrap();
    assert_eq!(medium.get_item("tasks").unwrap(), Some(blob));

    assert_eq!(repo.get_all().unwrap(), vec![task(1)]);

    let err = repo.create(&task(2)).unwrap_err();
    assert!(matches!(err.cause(), TaskErrorCause::Storage(_)));
    assert!(err.to_string().starts_with("failed to create task: storage quota exceeded"));

    repo.delete_all().unwrap();
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn corrupted_blob_surfaces_through_every_read_path() {
    let medium = MemoryStorage::new();
    medium.set_item("tasks", "{{{").unwrap();
    let repo = LocalTaskRepository::with_medium(medium);

    assert!(repo.get_all().is_err());
    assert!(repo.create(&task(1)).is_err());
    assert!(repo.toggle_status(1).is_err());
}

#[test]
fn sqlite_backed_repository_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let repo = LocalTaskRepository::with_medium(SqliteStorage::try_new(conn).unwrap());
        repo.create(&task(1)).unwrap();
        repo.toggle_status(1).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let repo = LocalTaskRepository::with_medium(SqliteStorage::try_new(conn).unwrap());
    let tasks = repo.get_all().unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].completed);
}
