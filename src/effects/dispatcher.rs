use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::session::SessionScope;
use super::tiers::{ExecutionTiers, Tier};
use super::view_effects::ViewEffectChannel;
use crate::error::Result;

/// Handles one screen's effects.
///
/// Implementations match every effect variant in both methods with no
/// catch-all arm, so adding a variant fails to compile until it is routed.
#[async_trait]
pub trait EffectHandler: Send + Sync + 'static {
    type Effect: fmt::Debug + Send + 'static;
    type Event: Send + 'static;
    type ViewEffect: Clone + Send + 'static;

    fn tier(effect: &Self::Effect) -> Tier;

    async fn handle(
        &self,
        effect: Self::Effect,
        output: &EffectOutput<Self::Event, Self::ViewEffect>,
    ) -> Result<()>;
}

/// Where a handler reports outcomes: events go back to the screen's state
/// machine, view effects go to the attached view.
pub struct EffectOutput<E, V> {
    events: mpsc::UnboundedSender<E>,
    view_effects: ViewEffectChannel<V>,
}

impl<E, V: Clone> EffectOutput<E, V> {
    pub fn new(events: mpsc::UnboundedSender<E>, view_effects: ViewEffectChannel<V>) -> Self {
        Self {
            events,
            view_effects,
        }
    }

    pub fn dispatch_event(&self, event: E) {
        if self.events.send(event).is_err() {
            tracing::debug!("Event receiver gone, dropping event");
        }
    }

    pub fn emit_view_effect(&self, effect: V) {
        self.view_effects.emit(effect);
    }
}

impl<E, V: Clone> Clone for EffectOutput<E, V> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            view_effects: self.view_effects.clone(),
        }
    }
}

/// Spawns one task per effect into the owning session, on the tier the
/// handler picks for it. No ordering holds between separate dispatches.
pub struct EffectDispatcher<H: EffectHandler> {
    handler: Arc<H>,
    output: EffectOutput<H::Event, H::ViewEffect>,
    tiers: ExecutionTiers,
    scope: SessionScope,
}

impl<H: EffectHandler> EffectDispatcher<H> {
    pub fn new(
        handler: H,
        output: EffectOutput<H::Event, H::ViewEffect>,
        tiers: ExecutionTiers,
        scope: SessionScope,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            output,
            tiers,
            scope,
        }
    }

    pub fn dispatch(&self, effect: H::Effect) {
        let tier = H::tier(&effect);
        let description = format!("{:?}", effect);
        tracing::debug!("Dispatching {} on {:?} tier", description, tier);

        let handler = self.handler.clone();
        let output = self.output.clone();
        let tiers = self.tiers.clone();

        self.scope.spawn_on(
            async move {
                let _permit = match tiers.enter(tier).await {
                    Ok(permit) => permit,
                    Err(e) => {
                        tracing::error!("Could not enter {:?} tier for {}: {:?}", tier, description, e);
                        return;
                    }
                };

                if let Err(e) = handler.handle(effect, &output).await {
                    tracing::error!("Effect {} failed: {:?}", description, e);
                }
            },
            self.tiers.runtime(),
        );
    }
}
