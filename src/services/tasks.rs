use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::events::{ProgressUpdate, RunReport};
use crate::domain::{Stage, TaskKind};

/// Write side of one task's progress channel.
///
/// Percentages are clamped to `0..=100` and never go backwards. Anything
/// reported after [`ProgressReporter::finish`] is dropped.
#[derive(Clone)]
pub struct ProgressReporter {
    sender: mpsc::UnboundedSender<ProgressUpdate>,
    last_percent: Arc<AtomicU8>,
    finished: Arc<AtomicBool>,
    finished_at: Arc<OnceLock<Instant>>,
}

impl ProgressReporter {
    /// A reporter paired with a fresh receiver.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                last_percent: Arc::new(AtomicU8::new(0)),
                finished: Arc::new(AtomicBool::new(false)),
                finished_at: Arc::new(OnceLock::new()),
            },
            receiver,
        )
    }

    /// A reporter nobody listens to.
    #[must_use]
    pub fn detached() -> Self {
        Self::channel().0
    }

    pub fn report(&self, progress: u8, message: impl Into<String>, stage: Stage) {
        if self.finished.load(Ordering::Acquire) {
            return;
        }
        let requested = progress.min(100);
        let previous = self.last_percent.fetch_max(requested, Ordering::AcqRel);
        let progress = previous.max(requested);

        let message = message.into();
        debug!(progress, stage = stage.as_str(), %message, "Progress");
        let _ = self.sender.send(ProgressUpdate::Progress {
            progress,
            message,
            stage,
        });
    }

    /// Sends the terminal update. Only the first call has an effect.
    pub fn finish(&self, success: bool, message: impl Into<String>, result: Option<RunReport>) {
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.finished_at.set(Instant::now());
        let _ = self.sender.send(ProgressUpdate::Finished {
            success,
            message: message.into(),
            result,
        });
    }

    #[must_use]
    pub fn last_percent(&self) -> u8 {
        self.last_percent.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Time since the terminal update was sent.
    #[must_use]
    pub fn finished_for(&self) -> Option<Duration> {
        self.finished_at.get().map(Instant::elapsed)
    }
}

struct TaskEntry {
    kind: TaskKind,
    parameters: serde_json::Value,
    created_at: DateTime<Utc>,
    reporter: ProgressReporter,
    receiver: Option<mpsc::UnboundedReceiver<ProgressUpdate>>,
}

/// Snapshot of a registered task.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskInfo {
    pub task_id: String,
    pub kind: TaskKind,
    pub parameters: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub progress: u8,
    pub finished: bool,
}

/// How long a finished task waits for a consumer before it is dropped.
pub const DEFAULT_TASK_RETENTION: Duration = Duration::from_secs(30 * 60);

/// In-memory registry of running generation tasks and their progress queues.
///
/// Each task has exactly one consumer. The entry is removed once its stream
/// has delivered the terminal update. Finished tasks nobody streamed are
/// dropped after the retention period.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, TaskEntry>>,
    retention: Duration,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_TASK_RETENTION)
    }
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Registers a task and returns its id.
    ///
    /// Expired tasks are swept first.
    pub async fn start_task(&self, kind: TaskKind, parameters: serde_json::Value) -> String {
        self.prune_expired().await;

        let task_id = Uuid::new_v4().to_string();
        let (reporter, receiver) = ProgressReporter::channel();

        self.tasks.write().await.insert(
            task_id.clone(),
            TaskEntry {
                kind,
                parameters,
                created_at: Utc::now(),
                reporter,
                receiver: Some(receiver),
            },
        );

        info!(task_id = %task_id, kind = kind.as_str(), "Task started");
        task_id
    }

    /// Reporter for `task_id`, handed to the run that feeds it.
    pub async fn reporter(&self, task_id: &str) -> Option<ProgressReporter> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .map(|entry| entry.reporter.clone())
    }

    /// Queues a progress update. Returns `false` for unknown tasks.
    pub async fn report_progress(
        &self,
        task_id: &str,
        progress: u8,
        message: impl Into<String>,
        stage: Stage,
    ) -> bool {
        match self.reporter(task_id).await {
            Some(reporter) => {
                reporter.report(progress, message, stage);
                true
            }
            None => false,
        }
    }

    pub async fn info(&self, task_id: &str) -> Option<TaskInfo> {
        self.tasks.read().await.get(task_id).map(|entry| TaskInfo {
            task_id: task_id.to_string(),
            kind: entry.kind,
            parameters: entry.parameters.clone(),
            created_at: entry.created_at,
            progress: entry.reporter.last_percent(),
            finished: entry.reporter.is_finished(),
        })
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        self.tasks.read().await.contains_key(task_id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Drops tasks that finished longer than the retention period ago.
    /// Returns how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, entry| {
            entry
                .reporter
                .finished_for()
                .is_none_or(|age| age < self.retention)
        });
        let pruned = before - tasks.len();
        if pruned > 0 {
            debug!(pruned, "Expired finished tasks");
        }
        pruned
    }

    pub async fn remove(&self, task_id: &str) -> bool {
        let removed = self.tasks.write().await.remove(task_id).is_some();
        if removed {
            debug!(task_id, "Task removed");
        }
        removed
    }

    /// Stream of updates for `task_id`, ending after the terminal update.
    ///
    /// Returns `None` for unknown tasks and for tasks already being streamed.
    pub async fn stream_progress(
        self: &Arc<Self>,
        task_id: &str,
    ) -> Option<BoxStream<'static, ProgressUpdate>> {
        let receiver = self
            .tasks
            .write()
            .await
            .get_mut(task_id)
            .and_then(|entry| entry.receiver.take())?;

        let state = StreamState {
            receiver,
            registry: Arc::clone(self),
            task_id: task_id.to_string(),
            done: false,
        };

        Some(stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }
            if let Some(update) = state.receiver.recv().await {
                if update.is_terminal() {
                    state.done = true;
                    state.registry.remove(&state.task_id).await;
                }
                Some((update, state))
            } else {
                state.done = true;
                state.registry.remove(&state.task_id).await;
                None
            }
        })
        .boxed())
    }
}

struct StreamState {
    receiver: mpsc::UnboundedReceiver<ProgressUpdate>,
    registry: Arc<TaskRegistry>,
    task_id: String,
    done: bool,
}

impl Drop for StreamState {
    /// A consumer that goes away early forfeits the task. The run itself
    /// keeps going; its updates are discarded.
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let registry = Arc::clone(&self.registry);
            let task_id = std::mem::take(&mut self.task_id);
            handle.spawn(async move {
                registry.remove(&task_id).await;
            });
        }
    }
}
