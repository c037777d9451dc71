use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::Result;
use crate::state::Config;

/// Execution context an effect runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Serialized; only emits view effects.
    Ui,
    /// Repository access.
    Io,
    /// Notifier, scheduler and validation work.
    Background,
    /// Long-lived stream subscriptions. Not admission-limited, so an open
    /// subscription never holds an Io slot.
    Subscription,
}

/// Runtime handle plus one admission semaphore per bounded tier. The UI
/// tier admits a single task at a time.
#[derive(Clone)]
pub struct ExecutionTiers {
    runtime: Handle,
    ui: Arc<Semaphore>,
    io: Arc<Semaphore>,
    background: Arc<Semaphore>,
}

impl ExecutionTiers {
    pub fn new(runtime: Handle, io_concurrency: usize, background_concurrency: usize) -> Self {
        Self {
            runtime,
            ui: Arc::new(Semaphore::new(1)),
            io: Arc::new(Semaphore::new(io_concurrency.max(1))),
            background: Arc::new(Semaphore::new(background_concurrency.max(1))),
        }
    }

    pub fn from_config(runtime: Handle, config: &Config) -> Self {
        Self::new(
            runtime,
            config.io_concurrency,
            config.background_concurrency,
        )
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Waits for a slot on `tier`. The slot is released when the permit
    /// drops. Unbounded tiers admit immediately and hand out no permit.
    pub async fn enter(&self, tier: Tier) -> Result<Option<OwnedSemaphorePermit>> {
        match self.semaphore(tier) {
            Some(semaphore) => Ok(Some(semaphore.clone().acquire_owned().await?)),
            None => Ok(None),
        }
    }

    /// Free slots on `tier`, or `None` when the tier is unbounded.
    pub fn available(&self, tier: Tier) -> Option<usize> {
        self.semaphore(tier).map(|s| s.available_permits())
    }

    fn semaphore(&self, tier: Tier) -> Option<&Arc<Semaphore>> {
        match tier {
            Tier::Ui => Some(&self.ui),
            Tier::Io => Some(&self.io),
            Tier::Background => Some(&self.background),
            Tier::Subscription => None,
        }
    }
}
