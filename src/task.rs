//! Task state model and async task tracking
//!
//! [`TaskStateMachine`] is the per-task `Idle -> Doing -> Done | Error`
//! model. [`TaskTracker`] runs engine invocations on blocking threads, keeps
//! each task's state by [`TaskId`], and broadcasts progress [`Event`]s.

use crate::engine::Engine;
use crate::types::{Event, Stage, TaskId, TaskState};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the event channel; slow subscribers miss older events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// State of one task
///
/// Transitions that would break `Idle -> Doing -> Done | Error` are refused
/// and leave the state untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskStateMachine {
    state: TaskState,
}

impl TaskStateMachine {
    /// New machine in [`TaskState::Idle`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &TaskState {
        &self.state
    }

    /// `Idle -> Doing`
    pub fn start(&mut self) -> bool {
        self.transition(TaskState::Doing)
    }

    /// `Doing -> Done(message)`
    pub fn complete(&mut self, message: impl Into<String>) -> bool {
        self.transition(TaskState::Done(message.into()))
    }

    /// `Doing -> Error(message)`
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        self.transition(TaskState::Error(message.into()))
    }

    /// Consume the machine, returning its state
    pub fn into_state(self) -> TaskState {
        self.state
    }

    fn transition(&mut self, next: TaskState) -> bool {
        let allowed = matches!(
            (&self.state, &next),
            (TaskState::Idle, TaskState::Doing)
                | (TaskState::Doing, TaskState::Done(_))
                | (TaskState::Doing, TaskState::Error(_))
        );
        if allowed {
            self.state = next;
        } else {
            warn!(from = ?self.state, to = ?next, "rejected illegal task state transition");
        }
        allowed
    }
}

/// Which entry point a tracked task runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Decompress,
    Compress,
}

/// Handle to a task started with [`TaskTracker::spawn_decompress`] or
/// [`TaskTracker::spawn_compress`]
#[derive(Debug)]
pub struct TaskHandle {
    /// Task ID
    pub id: TaskId,
    handle: JoinHandle<TaskState>,
}

impl TaskHandle {
    /// Wait for the task to reach its terminal state
    ///
    /// A panicked worker is reported as [`TaskState::Error`].
    pub async fn join(self) -> TaskState {
        match self.handle.await {
            Ok(state) => state,
            Err(e) => TaskState::Error(format!("task {} panicked: {e}", self.id)),
        }
    }
}

/// Terminal result of a tracked task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    /// Task ID
    pub id: TaskId,
    /// Terminal state
    pub state: TaskState,
}

/// Runs engine invocations off the async runtime and tracks their state
///
/// Cheap to clone; clones share the task table and event channel.
#[derive(Clone)]
pub struct TaskTracker {
    engine: Arc<Engine>,
    tasks: Arc<RwLock<HashMap<TaskId, TaskStateMachine>>>,
    next_id: Arc<AtomicU64>,
    event_tx: broadcast::Sender<Event>,
}

impl TaskTracker {
    /// Tracker driving `engine`
    pub fn new(engine: Engine) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: Arc::new(engine),
            tasks: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            event_tx,
        }
    }

    /// The engine tasks run on
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Subscribe to task events
    ///
    /// Each subscriber sees events emitted after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Start decompressing `input` into `output` in the background
    pub async fn spawn_decompress(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> TaskHandle {
        self.spawn(Operation::Decompress, input.into(), output.into()).await
    }

    /// Start compressing `input` into `output` in the background
    pub async fn spawn_compress(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> TaskHandle {
        self.spawn(Operation::Compress, input.into(), output.into()).await
    }

    /// Decompress and wait for the terminal state
    pub async fn decompress_file(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> TaskReport {
        let handle = self.spawn_decompress(input, output).await;
        let id = handle.id;
        TaskReport {
            id,
            state: handle.join().await,
        }
    }

    /// Compress and wait for the terminal state
    pub async fn compress(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> TaskReport {
        let handle = self.spawn_compress(input, output).await;
        let id = handle.id;
        TaskReport {
            id,
            state: handle.join().await,
        }
    }

    /// Current state of a task, `None` for unknown or forgotten IDs
    pub async fn state(&self, id: TaskId) -> Option<TaskState> {
        self.tasks.read().await.get(&id).map(|task| task.state().clone())
    }

    /// Drop a finished task from the table
    ///
    /// Returns `false` if the task is unknown or still running.
    pub async fn forget(&self, id: TaskId) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.get(&id) {
            Some(task) if task.state().is_terminal() => {
                tasks.remove(&id);
                true
            }
            _ => false,
        }
    }

    async fn spawn(&self, operation: Operation, input: PathBuf, output: PathBuf) -> TaskHandle {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut task = TaskStateMachine::new();
        task.start();
        self.tasks.write().await.insert(id, task);

        info!(task_id = id.get(), ?input, ?output, ?operation, "task queued");
        let _ = self.event_tx.send(Event::Queued {
            id,
            input: input.clone(),
        });

        let tracker = self.clone();
        let handle = tokio::spawn(async move {
            let engine = Arc::clone(&tracker.engine);
            let event_tx = tracker.event_tx.clone();

            let result = tokio::task::spawn_blocking(move || {
                let observer = move |stage: Stage, path: &Path| {
                    let _ = event_tx.send(stage_event(id, stage, path));
                };
                match operation {
                    Operation::Decompress => engine.decompress_with(&input, &output, &observer),
                    Operation::Compress => engine.compress_with(&input, &output, &observer),
                }
            })
            .await;

            let state = match result {
                Ok(state) => state,
                Err(e) => TaskState::Error(format!("task {id} panicked: {e}")),
            };

            tracker.finish(id, &state).await;
            state
        });

        TaskHandle { id, handle }
    }

    async fn finish(&self, id: TaskId, state: &TaskState) {
        if let Some(task) = self.tasks.write().await.get_mut(&id) {
            match state {
                TaskState::Done(message) => task.complete(message.clone()),
                TaskState::Error(message) => task.fail(message.clone()),
                TaskState::Idle | TaskState::Doing => false,
            };
        }

        let event = match state {
            TaskState::Done(message) => {
                info!(task_id = id.get(), %message, "task done");
                Event::Done {
                    id,
                    message: message.clone(),
                }
            }
            TaskState::Error(error) => {
                warn!(task_id = id.get(), %error, "task failed");
                Event::Failed {
                    id,
                    error: error.clone(),
                }
            }
            TaskState::Idle | TaskState::Doing => {
                debug!(task_id = id.get(), ?state, "task ended without a terminal state");
                return;
            }
        };
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTracker")
            .field("engine", &self.engine)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn stage_event(id: TaskId, stage: Stage, path: &Path) -> Event {
    let path = path.to_path_buf();
    match stage {
        Stage::Extract => Event::Extracting { id, path },
        Stage::Clean => Event::Cleaning { id, path },
        Stage::Unwind => Event::Unwinding { id, path },
        Stage::Compress => Event::Compressing { id, path },
    }
}
