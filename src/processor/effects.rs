//! Effect dispatch.
//!
//! Effects arrive from the reduce loop in production order and each one is
//! spawned into its own task, so a slow effect never holds up other effects
//! or the reduction of later actions. A completed effect's action goes back
//! through the regular [`ActionSender`]; it is never reduced in place.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::config::ProcessorConfig;
use crate::contract::{BoxEffect, ReducerAction};
use crate::lifecycle::Lifecycle;
use crate::processor::sender::ActionSender;

pub(crate) struct EffectDispatcher<A: ReducerAction> {
    effects: mpsc::UnboundedReceiver<BoxEffect<A>>,
    intake: ActionSender<A>,
    lifecycle: Lifecycle,
    slots: Option<Arc<Semaphore>>,
    cancel_on_shutdown: bool,
}

impl<A: ReducerAction> EffectDispatcher<A> {
    pub(crate) fn new(
        effects: mpsc::UnboundedReceiver<BoxEffect<A>>,
        intake: ActionSender<A>,
        lifecycle: Lifecycle,
        config: &ProcessorConfig,
    ) -> Self {
        Self {
            effects,
            intake,
            lifecycle,
            slots: config
                .max_concurrent_effects
                .map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
            cancel_on_shutdown: config.cancel_effects_on_shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = self.lifecycle.wait() => break,
                Some(outcome) = running.join_next(), if !running.is_empty() => {
                    log_outcome(outcome);
                }
                effect = self.effects.recv() => match effect {
                    Some(effect) => self.spawn(&mut running, effect),
                    None => break,
                },
            }
        }

        let in_flight = running.len();
        if self.cancel_on_shutdown {
            running.shutdown().await;
            tracing::debug!(in_flight, "effect dispatcher stopped; in-flight effects aborted");
        } else {
            running.detach_all();
            tracing::debug!(in_flight, "effect dispatcher stopped; in-flight effects detached");
        }
    }

    fn spawn(&self, running: &mut JoinSet<()>, effect: BoxEffect<A>) {
        let intake = self.intake.clone();
        let slots = self.slots.clone();
        running.spawn(
            async move {
                let _slot = match slots {
                    Some(slots) => slots.acquire_owned().await.ok(),
                    None => None,
                };
                if let Some(action) = effect.run().await {
                    intake.send(action);
                }
            }
            .in_current_span(),
        );
    }
}

fn log_outcome(outcome: Result<(), JoinError>) {
    if let Err(err) = outcome {
        if err.is_panic() {
            tracing::warn!("effect panicked; treated as producing no action");
        }
    }
}
