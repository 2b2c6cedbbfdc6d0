//! State fan-out to subscribers.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Ordered stream of state snapshots for one subscriber.
///
/// Yields one snapshot per reduced action, starting with the first action
/// reduced after the subscription was created. Ends once the processor stops.
/// Each subscriber has its own unbounded buffer, so a slow reader never
/// loses snapshots and never delays the processor.
pub struct StateStream<S> {
    receiver: mpsc::UnboundedReceiver<S>,
}

impl<S> StateStream<S> {
    /// Wait for the next snapshot. `None` once the processor has stopped
    /// and every buffered snapshot has been read.
    pub async fn next(&mut self) -> Option<S> {
        self.receiver.recv().await
    }

    /// Take a buffered snapshot without waiting.
    pub fn try_next(&mut self) -> Option<S> {
        self.receiver.try_recv().ok()
    }
}

impl<S> Stream for StateStream<S> {
    type Item = S;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.receiver.poll_recv(cx)
    }
}

/// Registry of live subscribers.
pub(crate) struct Subscribers<S> {
    inner: Arc<Mutex<SubscriberSet<S>>>,
}

struct SubscriberSet<S> {
    senders: Vec<mpsc::UnboundedSender<S>>,
    closed: bool,
}

impl<S> Clone for Subscribers<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> Subscribers<S> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubscriberSet {
                senders: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Register a subscriber. After `close` the returned stream is already
    /// finished.
    pub(crate) fn subscribe(&self) -> StateStream<S> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut set = self.inner.lock();
        if !set.closed {
            set.senders.push(sender);
        }
        StateStream { receiver }
    }

    /// Deliver `state` to every subscriber, pruning dropped ones.
    pub(crate) fn publish(&self, state: &S) {
        let mut set = self.inner.lock();
        set.senders
            .retain(|sender| sender.send(state.clone()).is_ok());
    }

    /// Finish every stream and refuse new subscribers.
    pub(crate) fn close(&self) {
        let mut set = self.inner.lock();
        set.closed = true;
        set.senders.clear();
    }

    /// Registered subscribers, including dropped ones not yet pruned.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().senders.len()
    }
}
