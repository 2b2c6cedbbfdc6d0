//! Shared reducers, effects and stream helpers.

#![allow(dead_code, unused_imports)]

use async_trait::async_trait;
use statefold::{effect, BoxEffect, Effect, Reducer, StateStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Upper bound for any single wait in tests.
pub const WAIT: Duration = Duration::from_secs(10);

/// Adds `action * 10` to the state. Never produces an effect.
pub struct ScaleReducer;

impl Reducer for ScaleReducer {
    type State = i64;
    type Action = i64;

    fn reduce(&self, state: &mut i64, action: i64) -> Option<BoxEffect<i64>> {
        *state += action * 10;
        None
    }
}

/// Effect that counts its runs and produces nothing.
pub struct CountingEffect {
    pub runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Effect<i64> for CountingEffect {
    async fn run(&self) -> Option<i64> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        None
    }
}

/// `ScaleReducer` that also counts calls and returns a `CountingEffect`.
pub struct CountingReducer {
    pub calls: Arc<AtomicUsize>,
    pub effect_runs: Arc<AtomicUsize>,
}

impl CountingReducer {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            effect_runs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Reducer for CountingReducer {
    type State = i64;
    type Action = i64;

    fn reduce(&self, state: &mut i64, action: i64) -> Option<BoxEffect<i64>> {
        *state += action * 10;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(CountingEffect {
            runs: self.effect_runs.clone(),
        }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u32,
    pub settled: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyAction {
    Bump,
    Settled,
}

/// `Bump` increments and schedules `Settled` after `delay`.
pub struct TallyReducer {
    pub delay: Duration,
}

impl Reducer for TallyReducer {
    type State = Tally;
    type Action = TallyAction;

    fn reduce(&self, state: &mut Tally, action: TallyAction) -> Option<BoxEffect<TallyAction>> {
        match action {
            TallyAction::Bump => {
                state.count += 1;
                Some(effect::delayed(self.delay, TallyAction::Settled))
            }
            TallyAction::Settled => {
                state.settled += 1;
                None
            }
        }
    }
}

/// Effect that waits for `gate`, records completion, then yields `then`.
pub struct GatedEffect<A> {
    pub gate: Arc<Notify>,
    pub finished: Arc<AtomicBool>,
    pub then: parking_lot::Mutex<Option<A>>,
}

#[async_trait]
impl<A: Send + 'static> Effect<A> for GatedEffect<A> {
    async fn run(&self) -> Option<A> {
        self.gate.notified().await;
        self.finished.store(true, Ordering::SeqCst);
        self.then.lock().take()
    }
}

/// Sets its flag when dropped.
pub struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Signals `started`, then never completes. `dropped` flips once the
/// running future is torn down.
pub struct NeverEndingEffect {
    pub started: Arc<Notify>,
    pub dropped: Arc<AtomicBool>,
}

#[async_trait]
impl<A: Send + 'static> Effect<A> for NeverEndingEffect {
    async fn run(&self) -> Option<A> {
        let _flag = DropFlag(self.dropped.clone());
        self.started.notify_one();
        std::future::pending::<()>().await;
        None
    }
}

/// Next snapshot, failing the test on timeout or a finished stream.
pub async fn next_state<S>(stream: &mut StateStream<S>) -> S {
    tokio::time::timeout(WAIT, stream.next())
        .await
        .expect("timed out waiting for state")
        .expect("state stream ended")
}

pub async fn take_states<S>(stream: &mut StateStream<S>, count: usize) -> Vec<S> {
    let mut states = Vec::with_capacity(count);
    for _ in 0..count {
        states.push(next_state(stream).await);
    }
    states
}

/// Asserts that the stream finishes (yields `None`) within `WAIT`.
pub async fn assert_ended<S: std::fmt::Debug>(stream: &mut StateStream<S>) {
    let item = tokio::time::timeout(WAIT, stream.next())
        .await
        .expect("timed out waiting for stream to end");
    assert!(item.is_none(), "expected end of stream, got {:?}", item);
}

/// Poll `condition` until it holds, failing after `WAIT`.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
