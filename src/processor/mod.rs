//! The action/effect feedback loop.
//!
//! ```text
//! send ──→ action queue ──→ reduce ──→ publish state
//!               ↑              │
//!               │              ↓
//!               └──────── effect queue ──→ effect tasks
//! ```
//!
//! Two tasks run per processor. The reduce loop is the only writer of the
//! state: it dequeues one action at a time, reduces it, publishes the
//! snapshot, and hands any effect to the dispatcher. The dispatcher runs
//! every effect in its own task and sends the resulting action back through
//! the action queue, so chains of action → effect → action never nest.

mod effects;
mod sender;
mod stream;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProcessorConfig;
use crate::contract::{BoxEffect, Reducer};
use crate::lifecycle::{Lifecycle, LifecyclePhase};

use effects::EffectDispatcher;
use stream::Subscribers;

pub use sender::ActionSender;
pub use stream::StateStream;

/// Serializes actions through a reducer and publishes every resulting state.
///
/// Usage example:
/// ```ignore
/// let processor = Processor::new(0, reducer::from_fn(|state: &mut i64, action: i64| {
///     *state += action * 10;
///     None
/// }));
///
/// let mut states = processor.subscribe();
/// processor.send(1);
/// processor.send(2);
/// assert_eq!(states.next().await, Some(10));
/// assert_eq!(states.next().await, Some(30));
/// ```
///
/// `send` may be called from any number of tasks at once. Actions from one
/// caller are reduced in the order that caller sent them, and an effect's
/// action is always reduced after the action that produced the effect.
pub struct Processor<R: Reducer> {
    id: Uuid,
    intake: ActionSender<R::Action>,
    subscribers: Subscribers<R::State>,
    latest: Arc<RwLock<R::State>>,
    lifecycle: Lifecycle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<R: Reducer> Processor<R> {
    /// Start a processor with the default configuration.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn new(initial_state: R::State, reducer: R) -> Self {
        Self::with_config(initial_state, reducer, ProcessorConfig::default())
    }

    /// Start a processor with an explicit configuration.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn with_config(initial_state: R::State, reducer: R, config: ProcessorConfig) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("processor", name = %config.name, %id);
        let lifecycle = Lifecycle::new();

        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (effect_tx, effect_rx) = mpsc::unbounded_channel();
        let intake = ActionSender::new(
            action_tx,
            Arc::new(AtomicUsize::new(0)),
            lifecycle.clone(),
            config.backlog_warn_threshold,
        );
        let subscribers = Subscribers::new();
        let latest = Arc::new(RwLock::new(initial_state.clone()));

        let reduce_loop = ReduceLoop {
            reducer,
            state: initial_state,
            actions: action_rx,
            effects: effect_tx,
            intake: intake.clone(),
            subscribers: subscribers.clone(),
            latest: Arc::clone(&latest),
            lifecycle: lifecycle.clone(),
        };
        let dispatcher =
            EffectDispatcher::new(effect_rx, intake.clone(), lifecycle.clone(), &config);

        span.in_scope(|| tracing::debug!(?config, "processor started"));
        let tasks = vec![
            tokio::spawn(reduce_loop.run().instrument(span.clone())),
            tokio::spawn(dispatcher.run().instrument(span)),
        ];

        Self {
            id,
            intake,
            subscribers,
            latest,
            lifecycle,
            tasks: Mutex::new(tasks),
        }
    }

    /// Enqueue an action. Returns immediately; no-op after teardown.
    pub fn send(&self, action: R::Action) {
        self.intake.send(action);
    }

    /// Cloneable intake handle with the same semantics as [`Processor::send`].
    pub fn sender(&self) -> ActionSender<R::Action> {
        self.intake.clone()
    }

    /// Subscribe to states published from now on.
    pub fn subscribe(&self) -> StateStream<R::State> {
        self.subscribers.subscribe()
    }

    /// The most recently published state, or the initial state.
    pub fn current(&self) -> R::State {
        self.latest.read().clone()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Actions accepted but not yet reduced. Zero once stopped.
    pub fn pending_actions(&self) -> usize {
        self.intake.pending_actions()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Stop both loops and wait for them to exit.
    ///
    /// Queued actions are discarded (so [`Processor::pending_actions`] reads
    /// zero afterwards) and every subscriber stream ends.
    /// In-flight effects are detached (or aborted, per
    /// [`ProcessorConfig::cancel_effects_on_shutdown`]); whatever they
    /// produce afterwards is dropped.
    pub async fn shutdown(&self) {
        if self.lifecycle.signal() {
            tracing::debug!(id = %self.id, "processor teardown requested");
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(err) = task.await {
                tracing::debug!(id = %self.id, error = %err, "processor task ended abnormally");
            }
        }
    }
}

impl<R: Reducer> Drop for Processor<R> {
    fn drop(&mut self) {
        self.lifecycle.signal();
    }
}

/// Single writer of the processor state.
struct ReduceLoop<R: Reducer> {
    reducer: R,
    state: R::State,
    actions: mpsc::UnboundedReceiver<R::Action>,
    effects: mpsc::UnboundedSender<BoxEffect<R::Action>>,
    intake: ActionSender<R::Action>,
    subscribers: Subscribers<R::State>,
    latest: Arc<RwLock<R::State>>,
    lifecycle: Lifecycle,
}

impl<R: Reducer> ReduceLoop<R> {
    async fn run(mut self) {
        // Runs on clean exit and when the task is torn down after a reducer
        // panic, so subscribers never wait on a dead processor.
        let _stopped = scopeguard::guard(
            (
                self.subscribers.clone(),
                self.intake.clone(),
                self.lifecycle.clone(),
            ),
            |(subscribers, intake, lifecycle)| {
                subscribers.close();
                intake.discard_backlog();
                lifecycle.mark_stopped();
                tracing::debug!("reduce loop stopped");
            },
        );

        loop {
            let action = tokio::select! {
                biased;
                _ = self.lifecycle.wait() => break,
                action = self.actions.recv() => match action {
                    Some(action) => action,
                    None => break,
                },
            };
            self.intake.mark_reduced();
            tracing::trace!(pending = self.intake.pending_actions(), "reducing action");

            let reducer = &self.reducer;
            let state = &mut self.state;
            let effect = match panic::catch_unwind(AssertUnwindSafe(|| reducer.reduce(state, action)))
            {
                Ok(effect) => effect,
                Err(payload) => {
                    tracing::error!("reducer panicked; processor stopped");
                    panic::resume_unwind(payload);
                }
            };

            *self.latest.write() = self.state.clone();
            self.subscribers.publish(&self.state);

            if let Some(effect) = effect {
                if self.effects.send(effect).is_err() {
                    tracing::trace!("effect dispatcher stopped; dropping effect");
                }
            }
        }
    }
}
