//! Processor lifecycle tracking.
//!
//! A processor moves `Running → Stopping → Stopped` exactly once. Loops wait
//! on [`Lifecycle::wait`] to learn about teardown; intake handles consult
//! [`Lifecycle::is_running`] to drop late actions.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecyclePhase {
    /// Accepting and reducing actions.
    Running = 0,
    /// Teardown requested; loops are winding down.
    Stopping = 1,
    /// The reduce loop has exited (teardown or reducer panic).
    Stopped = 2,
}

#[derive(Clone)]
pub(crate) struct Lifecycle {
    phase: Arc<AtomicU8>,
    notify: Arc<Notify>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            phase: Arc::new(AtomicU8::new(LifecyclePhase::Running as u8)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Request teardown. Returns `true` only for the call that initiated it.
    pub(crate) fn signal(&self) -> bool {
        let initiated = self
            .phase
            .compare_exchange(
                LifecyclePhase::Running as u8,
                LifecyclePhase::Stopping as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if initiated {
            self.notify.notify_waiters();
        }
        initiated
    }

    pub(crate) fn mark_stopped(&self) {
        self.phase
            .store(LifecyclePhase::Stopped as u8, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub(crate) fn is_running(&self) -> bool {
        self.phase() == LifecyclePhase::Running
    }

    pub(crate) fn phase(&self) -> LifecyclePhase {
        match self.phase.load(Ordering::SeqCst) {
            0 => LifecyclePhase::Running,
            1 => LifecyclePhase::Stopping,
            _ => LifecyclePhase::Stopped,
        }
    }

    /// Resolves once the lifecycle has left `Running`.
    pub(crate) async fn wait(&self) {
        // Register with Notify before checking the phase; otherwise a signal
        // landing between the check and the await would be lost.
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if !self.is_running() {
            return;
        }
        notified.await;
    }
}
