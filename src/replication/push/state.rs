//! Push replication lifecycle
//!
//! At most one scheduling loop runs per store. Startup and shutdown are
//! serialized by one lock; everything else talks to the loop through its
//! notification queue.

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::observability::Event;
use crate::replication::errors::{ReplicationError, ReplicationResult};

use super::pass::PassResources;
use super::scheduler::{run_loop, Action, Notification};

/// A running loop.
struct Lifecycle {
    notifications: mpsc::Sender<Notification>,
    handle: JoinHandle<()>,
}

/// Push replication state owned by one store.
pub struct PushReplicationState {
    resources: PassResources,
    lifecycle: Mutex<Option<Lifecycle>>,
}

impl PushReplicationState {
    pub fn new(resources: PassResources) -> Self {
        Self {
            resources,
            lifecycle: Mutex::new(None),
        }
    }

    pub fn resources(&self) -> &PassResources {
        &self.resources
    }

    /// Launch the scheduling loop. No-op if it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn startup(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            return;
        }
        let (notifications, receiver) = mpsc::channel(1);
        let handle = tokio::spawn(run_loop(self.resources.clone(), receiver));
        *lifecycle = Some(Lifecycle {
            notifications,
            handle,
        });
        tracing::info!(
            event = %Event::PushReplicationStartup,
            name = %self.resources.name,
            workers = self.resources.config.workers,
            interval_ms = self.resources.config.interval.as_millis() as u64,
            "push replication started"
        );
    }

    /// Stop the loop and wait until it has exited. No-op if it is not
    /// running.
    pub async fn shutdown(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(active) = lifecycle.take() else {
            return;
        };
        let (notification, acknowledged) = Notification::new(Action::Disable);
        if active.notifications.send(notification).await.is_ok() {
            let _ = acknowledged.await;
        }
        if let Err(err) = active.handle.await {
            tracing::error!(
                event = %Event::PushReplicationWorkerFailed,
                name = %self.resources.name,
                error = %err,
                "push replication loop ended abnormally"
            );
        }
        tracing::info!(
            event = %Event::PushReplicationShutdown,
            name = %self.resources.name,
            "push replication stopped"
        );
    }

    /// Run a pass now and wait for it to finish (or be preempted).
    pub async fn run_now(&self) -> ReplicationResult<()> {
        let notifications = {
            let lifecycle = self.lifecycle.lock().await;
            match lifecycle.as_ref() {
                Some(active) => active.notifications.clone(),
                None => {
                    return Err(ReplicationError::not_running(
                        "push replication is not started",
                    ))
                }
            }
        };
        let (notification, acknowledged) = Notification::new(Action::RunNow);
        notifications
            .send(notification)
            .await
            .map_err(|_| ReplicationError::not_running("push replication loop has stopped"))?;
        acknowledged.await.map_err(|_| {
            ReplicationError::not_running("push replication loop stopped before running the pass")
        })
    }

    /// Whether the loop is running.
    pub async fn is_running(&self) -> bool {
        self.lifecycle.lock().await.is_some()
    }
}
