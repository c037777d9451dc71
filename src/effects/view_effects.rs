use tokio::sync::broadcast;

/// One-shot UI commands for whichever view is attached right now.
///
/// Nothing is buffered for views that attach later: an effect emitted while
/// no view is attached is dropped.
#[derive(Clone)]
pub struct ViewEffectChannel<V> {
    tx: broadcast::Sender<V>,
}

impl<V: Clone> ViewEffectChannel<V> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn attach(&self) -> broadcast::Receiver<V> {
        self.tx.subscribe()
    }

    pub fn has_view(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// Returns whether a view received the effect.
    pub fn emit(&self, effect: V) -> bool {
        match self.tx.send(effect) {
            Ok(_) => true,
            Err(_) => {
                tracing::debug!("No view attached, dropping view effect");
                false
            }
        }
    }
}

/// Feeds every effect a view receives to `apply` until the channel closes.
/// A view that falls behind skips the effects it missed and keeps going.
pub async fn follow_view_effects<V: Clone>(mut view: broadcast::Receiver<V>, mut apply: impl FnMut(V)) {
    loop {
        match view.recv().await {
            Ok(effect) => apply(effect),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("View fell behind, skipped {} view effects", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
