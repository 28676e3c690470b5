//! # Background Tasks
//!
//! UI-driving operations take seconds, longer than a request should block.
//! The HTTP layer starts each one as a task, returns its id, and lets the
//! client wait on it through `/api/task_wait`.
//!
//! A task's deadline is checked only while someone waits on it. When it
//! passes, the task is marked failed and its eventual result is dropped;
//! the underlying operation keeps running to completion.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ScanError;

/// Tasks older than this are dropped when a new task is created.
pub const TASK_RETENTION: Duration = Duration::from_secs(12 * 60 * 60);
/// Poll interval of [`TaskRegistry::wait`].
pub const WAIT_STEP: Duration = Duration::from_millis(200);
/// Error recorded on a task whose deadline passed.
pub const TIMED_OUT: &str = "Task timed out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Snapshot of one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    #[serde(skip)]
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: f64,
    pub started_at: Option<f64>,
    pub completed_at: Option<f64>,
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl TaskRecord {
    fn new(timeout: Option<Duration>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: epoch_now(),
            started_at: None,
            completed_at: None,
            timeout,
        }
    }

    fn deadline_passed(&self, now: f64) -> bool {
        let Some(timeout) = self.timeout else {
            return false;
        };
        let since = self.started_at.unwrap_or(self.created_at);
        now - since > timeout.as_secs_f64()
    }
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Shared table of every task the server started.
#[derive(Debug)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, TaskRecord>>,
    retention: Duration,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_retention(TASK_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            retention,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TaskRecord>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `work` in the background and return the new task's id.
    pub fn spawn<F>(self: &Arc<Self>, timeout: Option<Duration>, work: F) -> String
    where
        F: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let record = TaskRecord::new(timeout);
        let id = record.id.clone();
        {
            let mut tasks = self.lock();
            self.purge(&mut tasks, record.created_at);
            tasks.insert(id.clone(), record);
            debug!(task = %id, total = tasks.len(), "created task");
        }

        let registry = Arc::clone(self);
        let task_id = id.clone();
        tokio::spawn(async move {
            registry.mark_started(&task_id);
            let outcome = work.await;
            registry.finish(&task_id, outcome);
        });
        id
    }

    fn purge(&self, tasks: &mut HashMap<String, TaskRecord>, now: f64) {
        let retention = self.retention.as_secs_f64();
        tasks.retain(|_, task| now - task.created_at <= retention);
    }

    fn mark_started(&self, id: &str) {
        if let Some(task) = self.lock().get_mut(id) {
            task.status = TaskStatus::InProgress;
            task.started_at = Some(epoch_now());
        }
    }

    fn finish(&self, id: &str, outcome: Result<Value, String>) {
        let mut tasks = self.lock();
        let Some(task) = tasks.get_mut(id) else {
            return;
        };
        if task.status.is_finished() {
            debug!(task = %id, "task finished after it was abandoned, dropping result");
            return;
        }
        match outcome {
            Ok(value) => {
                task.status = TaskStatus::Completed;
                task.result = Some(value);
            }
            Err(error) => {
                task.status = TaskStatus::Failed;
                task.error = Some(error);
            }
        }
        task.completed_at = Some(epoch_now());
    }

    pub fn get(&self, id: &str) -> Option<TaskRecord> {
        self.lock().get(id).cloned()
    }

    /// Every task, oldest first.
    pub fn list(&self) -> Vec<TaskRecord> {
        let mut tasks: Vec<TaskRecord> = self.lock().values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        tasks
    }

    /// Wait until the task finishes or its deadline passes.
    ///
    /// Returns `None` for an unknown id.
    pub async fn wait(&self, id: &str, step: Duration) -> Option<TaskRecord> {
        loop {
            {
                let mut tasks = self.lock();
                let task = tasks.get_mut(id)?;
                if task.status.is_finished() {
                    return Some(task.clone());
                }
                if task.deadline_passed(epoch_now()) {
                    let elapsed_ms = task.timeout.map(|t| t.as_millis() as u64).unwrap_or(0);
                    warn!(
                        task = %id,
                        error = %ScanError::timeout("background task", elapsed_ms),
                        "task may still be running in the background"
                    );
                    task.status = TaskStatus::Failed;
                    task.error = Some(TIMED_OUT.to_string());
                    task.completed_at = Some(epoch_now());
                    return Some(task.clone());
                }
            }
            tokio::time::sleep(step).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_completed_task_has_result() {
        let registry = Arc::new(TaskRegistry::new());
        let id = registry.spawn(Some(Duration::from_secs(5)), async { Ok(json!({"entries": 3})) });

        let task = registry.wait(&id, Duration::from_millis(5)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"entries": 3})));
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_task_keeps_error() {
        let registry = Arc::new(TaskRegistry::new());
        let id = registry.spawn(None, async { Err("capture failed".to_string()) });

        let task = registry.wait(&id, Duration::from_millis(5)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("capture failed"));
    }

    #[tokio::test]
    async fn test_timed_out_task_stays_failed() {
        let registry = Arc::new(TaskRegistry::new());
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let id = registry.spawn(Some(Duration::from_millis(20)), async move {
            let _ = gate.await;
            Ok(json!("late"))
        });

        let task = registry.wait(&id, Duration::from_millis(5)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some(TIMED_OUT));

        release.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let task = registry.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let registry = TaskRegistry::new();
        assert!(registry.wait("nope", WAIT_STEP).await.is_none());
    }

    #[tokio::test]
    async fn test_old_tasks_are_purged_on_create() {
        let registry = Arc::new(TaskRegistry::new());
        let old = registry.spawn(None, async { Ok(Value::Null) });
        registry.wait(&old, Duration::from_millis(5)).await.unwrap();
        if let Some(task) = registry.lock().get_mut(&old) {
            task.created_at -= TASK_RETENTION.as_secs_f64() + 1.0;
        }

        let fresh = registry.spawn(None, async { Ok(Value::Null) });
        assert!(registry.get(&old).is_none());
        assert!(registry.get(&fresh).is_some());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in_progress");
    }
}
