//! Task Manager - Background task management with graceful shutdown
//!
//! Background loops are spawned with a child of one shared cancellation token.
//! Shutdown cancels the token, waits for the loops to finish within a timeout
//! and aborts whatever is still running.

use anyhow::Result;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handle for a background task with its name
struct TaskHandle {
    name: String,
    handle: JoinHandle<()>,
}

/// Background task manager with graceful shutdown capabilities
pub struct TaskManager {
    tasks: RwLock<Vec<TaskHandle>>,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
}

impl TaskManager {
    /// Create a new task manager that waits up to `shutdown_timeout` on shutdown.
    pub fn new(shutdown_timeout: Duration) -> Self {
        info!("Creating new task manager with shutdown timeout: {:?}", shutdown_timeout);

        Self {
            tasks: RwLock::new(Vec::new()),
            cancel: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    /// Create a new task manager with default settings
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(30))
    }

    /// Spawn a named background task.
    ///
    /// `task_fn` receives the token it must watch to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the task manager is shutting down
    pub async fn spawn_task<F, Fut>(&self, name: impl Into<String>, task_fn: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        if self.is_shutting_down() {
            anyhow::bail!("Task manager is shutting down, cannot spawn '{name}'");
        }

        info!("Spawning background task: {}", name);
        let future = task_fn(self.cancel.child_token());
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            debug!("Task {} started execution", task_name);
            future.await;
            debug!("Task {} finished execution", task_name);
        });

        self.tasks.write().await.push(TaskHandle { name, handle });
        Ok(())
    }

    /// Number of tasks that have not finished yet.
    pub async fn task_count(&self) -> usize {
        self.tasks
            .read()
            .await
            .iter()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Check if the task manager is shutting down
    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel every task and wait for them to stop.
    pub async fn shutdown(&self) {
        if self.is_shutting_down() {
            warn!("Task manager is already shutting down");
            return;
        }
        info!("Initiating graceful shutdown of background tasks");
        self.cancel.cancel();

        let tasks: Vec<TaskHandle> = self.tasks.write().await.drain(..).collect();
        if tasks.is_empty() {
            info!("No tasks to shutdown");
            return;
        }

        let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().map(|t| (t.name, t.handle)).unzip();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

        match timeout(self.shutdown_timeout, join_all(handles)).await {
            Ok(results) => {
                for (name, result) in names.iter().zip(results) {
                    match result {
                        Ok(()) => debug!("Task {} completed successfully", name),
                        Err(e) if e.is_cancelled() => debug!("Task {} was cancelled", name),
                        Err(e) => warn!("Task {} failed: {}", name, e),
                    }
                }
            }
            Err(_) => {
                warn!("Timeout waiting for background tasks, force-cancelling remaining");
                for abort in aborts {
                    abort.abort();
                }
            }
        }

        info!("Task manager shutdown completed");
    }
}
