use std::future::Future;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Lifetime scope for one screen's effect handling.
///
/// Every task spawned through the session's [`SessionScope`] is cancelled
/// when the session shuts down, long-lived subscriptions included.
pub struct Session {
    scope: SessionScope,
}

#[derive(Clone)]
pub struct SessionScope {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Session {
    pub fn new() -> Self {
        Self {
            scope: SessionScope {
                cancel: CancellationToken::new(),
                tracker: TaskTracker::new(),
            },
        }
    }

    pub fn scope(&self) -> SessionScope {
        self.scope.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.scope.tracker.len()
    }

    /// Cancels all in-flight tasks and waits for them to unwind.
    pub async fn shutdown(self) {
        let SessionScope { cancel, tracker } = self.scope;
        cancel.cancel();
        tracker.close();
        tracker.wait().await;
        tracing::info!("Session closed");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionScope {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `future` on `runtime` until it completes or the session ends,
    /// whichever comes first.
    pub fn spawn_on<F>(&self, future: F, runtime: &Handle)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            tracing::debug!("Session already closed, not spawning");
            return;
        }

        let cancel = self.cancel.clone();
        self.tracker.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = future => {}
                }
            },
            runtime,
        );
    }
}
