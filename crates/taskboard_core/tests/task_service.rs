use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskboard_core::{
    Clock, KeyValueStorage, LocalTaskRepository, MemoryStorage, NewTask, TaskErrorCause,
    TaskRepository, TaskService,
};

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

fn service_over(medium: &MemoryStorage) -> TaskService<LocalTaskRepository<MemoryStorage>> {
    TaskService::new(LocalTaskRepository::with_medium(medium.clone()))
}

fn report() -> NewTask {
    NewTask::new("Work", "Write report", 90.0)
}

#[test]
fn create_toggle_delete_scenario() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    service.initialize().unwrap();

    let created = service.create(report()).unwrap();
    assert!(created.id > 0);
    assert_eq!(created.source, "Work");
    assert_eq!(created.description, "Write report");
    assert_eq!(created.duration, 90.0);
    assert!(!created.completed);

    let all = service.get_all().unwrap();
    assert_eq!(all, vec![created.clone()]);
    assert_eq!(service.store().get_all().as_slice(), all.as_slice());

    let toggled = service.toggle_status(created.id).unwrap();
    assert!(toggled.completed);
    assert!(service.store().get_all()[0].completed);
    assert!(service.repository().get_all().unwrap()[0].completed);

    service.delete(created.id).unwrap();
    assert!(service.get_all().unwrap().is_empty());
    assert!(service.store().is_empty());
}

#[test]
fn created_ids_are_unique_even_with_a_stalled_clock() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium).with_clock(FixedClock(1_700_000_000_000));

    let first = service.create(report()).unwrap();
    let second = service.create(report()).unwrap();

    assert_eq!(first.id, 1_700_000_000_000);
    assert_eq!(second.id, first.id + 1);
}

#[test]
fn ids_continue_above_reloaded_collection() {
    let medium = MemoryStorage::new();
    let seeded = LocalTaskRepository::with_medium(medium.clone());
    seeded.create(&report().with_id(5_000)).unwrap();

    let service = service_over(&medium).with_clock(FixedClock(10));
    service.initialize().unwrap();

    assert_eq!(service.create(report()).unwrap().id, 5_001);
}

#[test]
fn create_after_largest_possible_id_fails_without_writing() {
    let medium = MemoryStorage::new();
    let seeded = LocalTaskRepository::with_medium(medium.clone());
    seeded.create(&report().with_id(i64::MAX)).unwrap();
    let before = medium.get_item("tasks").unwrap();

    let service = service_over(&medium);
    service.initialize().unwrap();

    let err = service.create(NewTask::new("x", "y", 1.0)).unwrap_err();
    assert!(matches!(err.cause(), TaskErrorCause::IdsExhausted));
    assert!(err.to_string().starts_with("failed to create task: "));
    assert_eq!(service.store().len(), 1);
    assert_eq!(medium.get_item("tasks").unwrap(), before);
}

#[test]
fn update_of_absent_id_leaves_store_and_storage_unchanged() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    service.create(report()).unwrap();
    service.create(NewTask::new("Home", "Dishes", 15.0)).unwrap();
    let before = service.get_all().unwrap();
    let store_before = service.store().get_all();

    let err = service.update(&report().with_id(999_999)).unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(service.get_all().unwrap(), before);
    assert_eq!(*service.store().get_all(), *store_before);
}

#[test]
fn failed_persist_does_not_touch_store() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    let existing = service.create(report()).unwrap();

    let notifications = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&notifications);
    let _subscription = service.store().subscribe(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    medium.set_available(false);
    assert!(service.create(report()).is_err());
    assert!(service.toggle_status(existing.id).is_err());
    assert!(service.delete(existing.id).is_err());
    assert!(service.delete_all().is_err());

    assert_eq!(notifications.load(Ordering::SeqCst), 0);
    assert_eq!(service.store().get_all().as_slice(), &[existing]);
}

#[test]
fn rejected_draft_is_not_reflected() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);

    let err = service.create(NewTask::new("Work", "", 10.0)).unwrap_err();
    assert!(err.to_string().starts_with("failed to create task:"));
    assert!(service.store().is_empty());
}

#[test]
fn initialize_failure_resets_store_and_reraises() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    service.create(report()).unwrap();
    assert_eq!(service.store().len(), 1);

    medium.set_item("tasks", "not json").unwrap();
    let err = service.initialize().unwrap_err();

    assert!(err.to_string().contains("corrupted task data"));
    assert!(service.store().is_empty());
    assert!(!service.is_initialized());
}

#[test]
fn initialize_loads_persisted_tasks() {
    let medium = MemoryStorage::new();
    let writer = service_over(&medium);
    writer.create(report()).unwrap();
    writer.create(NewTask::new("Home", "Dishes", 15.0)).unwrap();

    let reader = service_over(&medium);
    assert!(!reader.is_initialized());
    reader.initialize().unwrap();

    assert!(reader.is_initialized());
    assert_eq!(reader.store().len(), 2);
}

#[test]
fn get_all_reconciles_drifted_store() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    let kept = service.create(report()).unwrap();

    service.store().delete_all();
    assert!(service.store().is_empty());

    assert_eq!(service.get_all().unwrap(), vec![kept.clone()]);
    assert_eq!(service.store().get_all().as_slice(), &[kept]);
}

#[test]
fn delete_all_twice_keeps_everything_empty() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    service.create(report()).unwrap();

    service.delete_all().unwrap();
    service.delete_all().unwrap();

    assert!(service.get_all().unwrap().is_empty());
    assert!(service.store().is_empty());
}

#[test]
fn subscribers_observe_each_successful_mutation() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    let lengths = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&lengths);
    let subscription = service.store().subscribe(move |tasks| {
        sink.lock().unwrap().push(tasks.len());
    });

    let task = service.create(report()).unwrap();
    service.toggle_status(task.id).unwrap();
    service.delete(task.id).unwrap();
    subscription.unsubscribe();
    service.create(report()).unwrap();

    assert_eq!(*lengths.lock().unwrap(), vec![1, 1, 0]);
}

#[test]
fn statistics_follow_store_contents() {
    let medium = MemoryStorage::new();
    let service = service_over(&medium);
    let task = service.create(report()).unwrap();
    service.create(NewTask::new("Home", "Dishes", 30.0)).unwrap();
    service.toggle_status(task.id).unwrap();

    let stats = service.statistics();
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.completion_label(), "50%");
    assert_eq!(stats.total_duration_label(), "2h");
    assert_eq!(stats.completed_duration_label(), "1h30m");
}
