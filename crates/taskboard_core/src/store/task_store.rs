//! Observable task collection.
//!
//! `TaskStore` is a cloneable handle; clones observe and mutate the same
//! state. Each mutation swaps in a freshly built `Arc<Vec<Task>>`, so a
//! subscriber can detect change by pointer identity or through a selector.
//! Listeners run after the internal lock is released and may read the store.

use crate::model::task::{Task, TaskId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Immutable snapshot of the task collection.
pub type TaskList = Arc<Vec<Task>>;

type Listener = Arc<dyn Fn(&TaskList) + Send + Sync>;

struct StoreState {
    tasks: TaskList,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
}

/// Shared, subscribable task collection.
#[derive(Clone)]
pub struct TaskStore {
    state: Arc<Mutex<StoreState>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store with no subscribers.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                tasks: Arc::new(Vec::new()),
                listeners: BTreeMap::new(),
                next_listener_id: 0,
            })),
        }
    }

    /// Current snapshot. Cheap: clones the `Arc`, not the tasks.
    pub fn get_all(&self) -> TaskList {
        Arc::clone(&lock(&self.state).tasks)
    }

    pub fn len(&self) -> usize {
        lock(&self.state).tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.state).tasks.is_empty()
    }

    /// Appends `task`.
    pub fn create(&self, task: Task) {
        self.set(|tasks| {
            let mut next = tasks.to_vec();
            next.push(task);
            next
        });
    }

    /// Replaces the entry with the same id. Unknown ids leave contents as-is.
    pub fn update(&self, task: Task) {
        self.set(|tasks| {
            tasks
                .iter()
                .map(|existing| {
                    if existing.id == task.id {
                        task.clone()
                    } else {
                        existing.clone()
                    }
                })
                .collect()
        });
    }

    pub fn delete(&self, id: TaskId) {
        self.set(|tasks| tasks.iter().filter(|task| task.id != id).cloned().collect());
    }

    pub fn toggle_status(&self, id: TaskId) {
        self.set(|tasks| {
            tasks
                .iter()
                .map(|task| {
                    if task.id == id {
                        task.toggled()
                    } else {
                        task.clone()
                    }
                })
                .collect()
        });
    }

    pub fn delete_all(&self) {
        self.set(|_| Vec::new());
    }

    /// Replaces the whole collection, e.g. after a reload from storage.
    pub fn replace_all(&self, tasks: Vec<Task>) {
        self.set(move |_| tasks);
    }

    /// Registers `listener` for every change.
    ///
    /// The listener stays registered until the returned handle is dropped or
    /// [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TaskList) + Send + Sync + 'static,
    {
        let mut state = lock(&self.state);
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.insert(id, Arc::new(listener));

        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Registers `listener` for changes of a derived slice.
    ///
    /// `selector` runs on every change; `listener` fires only when the
    /// selected value differs from the previous one.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe_with_selector<T, S, F>(&self, selector: S, listener: F) -> Subscription
    where
        T: PartialEq + Send + 'static,
        S: Fn(&TaskList) -> T + Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let last = Mutex::new(selector(&self.get_all()));
        self.subscribe(move |tasks| {
            let next = selector(tasks);
            let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
            if *last != next {
                listener(&next);
                *last = next;
            }
        })
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    fn set(&self, update: impl FnOnce(&[Task]) -> Vec<Task>) {
        let (snapshot, listeners) = {
            let mut state = lock(&self.state);
            let next = Arc::new(update(state.tasks.as_slice()));
            state.tasks = Arc::clone(&next);
            let listeners = state.listeners.values().cloned().collect::<Vec<_>>();
            (next, listeners)
        };

        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Handle keeping one store listener registered.
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<StoreState>>,
}

impl Subscription {
    /// Detaches the listener. Same as dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).listeners.remove(&self.id);
        }
    }
}

fn lock(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
