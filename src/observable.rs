//! Property-style processor for hosts that observe a value directly.
//!
//! [`ObservableProcessor`] keeps the state inline and mutates it on every
//! `send`. It is bound to one designated context: the task or thread that
//! owns it. Effects run on an injected runtime handle; their actions are not
//! applied from the background. They are redirected into the adapter's
//! inbox and applied only when the owner calls [`ObservableProcessor::pump`],
//! [`ObservableProcessor::process_next`] or
//! [`ObservableProcessor::run_until_idle`].
//!
//! Nothing drains the inbox on its own. A host that never pumps never sees
//! effect results: hook `pump` into the host's frame or event-loop tick, or
//! await `process_next` in the task that owns the adapter.
//!
//! Usage example:
//! ```ignore
//! let mut processor = ObservableProcessor::new(GestureState::default(), GestureReducer);
//! processor.observe(|state| println!("new state: {state:?}"));
//!
//! processor.send(GestureAction::Tap);
//! // later, on the same context
//! processor.pump();
//! ```

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::contract::{BoxEffect, Reducer};

type Observer<S> = Box<dyn FnMut(&S)>;

pub struct ObservableProcessor<R: Reducer> {
    state: R::State,
    reducer: R,
    revision: u64,
    runtime: Handle,
    inbox_tx: mpsc::UnboundedSender<R::Action>,
    inbox_rx: mpsc::UnboundedReceiver<R::Action>,
    effects: JoinSet<()>,
    observers: Vec<Observer<R::State>>,
    cancel_effects_on_drop: bool,
}

impl<R: Reducer> ObservableProcessor<R> {
    /// Run effects on the current tokio runtime.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn new(initial_state: R::State, reducer: R) -> Self {
        Self::with_runtime(initial_state, reducer, Handle::current())
    }

    /// Run effects on `runtime`.
    pub fn with_runtime(initial_state: R::State, reducer: R, runtime: Handle) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            state: initial_state,
            reducer,
            revision: 0,
            runtime,
            inbox_tx,
            inbox_rx,
            effects: JoinSet::new(),
            observers: Vec::new(),
            cancel_effects_on_drop: false,
        }
    }

    /// Abort in-flight effects when the adapter is dropped instead of
    /// letting them finish.
    pub fn cancel_effects_on_drop(mut self, cancel: bool) -> Self {
        self.cancel_effects_on_drop = cancel;
        self
    }

    /// Register a change observer. Called after every reduction with the
    /// latest state.
    pub fn observe(&mut self, observer: impl FnMut(&R::State) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &R::State {
        &self.state
    }

    /// Number of reductions applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Effects spawned and not yet reaped.
    pub fn in_flight_effects(&self) -> usize {
        self.effects.len()
    }

    /// Reduce `action` in place and start any resulting effect.
    pub fn send(&mut self, action: R::Action) {
        let effect = self.reducer.reduce(&mut self.state, action);
        self.revision += 1;
        for observer in &mut self.observers {
            observer(&self.state);
        }
        if let Some(effect) = effect {
            self.spawn(effect);
        }
    }

    /// Apply every effect action that has already arrived. Never waits.
    /// Returns the number of actions applied.
    pub fn pump(&mut self) -> usize {
        while let Some(outcome) = self.effects.try_join_next() {
            log_outcome(outcome);
        }

        let mut applied = 0;
        while let Ok(action) = self.inbox_rx.try_recv() {
            self.send(action);
            applied += 1;
        }
        applied
    }

    /// Wait for the next effect action and apply it.
    ///
    /// Returns `false` without waiting when no effect is in flight and the
    /// inbox is empty, since nothing could arrive.
    pub async fn process_next(&mut self) -> bool {
        loop {
            if let Ok(action) = self.inbox_rx.try_recv() {
                self.send(action);
                return true;
            }
            match self.effects.join_next().await {
                Some(outcome) => log_outcome(outcome),
                None => return false,
            }
        }
    }

    /// Apply effect actions until no effect is in flight and the inbox is
    /// empty, including effects started along the way.
    pub async fn run_until_idle(&mut self) {
        while self.process_next().await {}
    }

    fn spawn(&mut self, effect: BoxEffect<R::Action>) {
        let inbox = self.inbox_tx.clone();
        self.effects.spawn_on(
            async move {
                if let Some(action) = effect.run().await {
                    if inbox.send(action).is_err() {
                        tracing::trace!("observable processor dropped; discarding effect action");
                    }
                }
            },
            &self.runtime,
        );
    }
}

impl<R: Reducer> Drop for ObservableProcessor<R> {
    fn drop(&mut self) {
        if self.cancel_effects_on_drop {
            self.effects.abort_all();
        } else {
            self.effects.detach_all();
        }
    }
}

fn log_outcome(outcome: Result<(), JoinError>) {
    if let Err(err) = outcome {
        if err.is_panic() {
            tracing::warn!("effect panicked; treated as producing no action");
        }
    }
}
