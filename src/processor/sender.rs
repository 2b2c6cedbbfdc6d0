//! Action intake handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::contract::ReducerAction;
use crate::lifecycle::{Lifecycle, LifecyclePhase};

/// Cloneable handle that feeds actions into a processor.
///
/// `send` never blocks and never fails. The queue behind it is unbounded:
/// callers are responsible for not producing action storms, for example an
/// effect that unconditionally re-triggers itself. Once the processor has
/// stopped, sent actions are silently discarded.
pub struct ActionSender<A> {
    sender: mpsc::UnboundedSender<A>,
    backlog: Arc<AtomicUsize>,
    lifecycle: Lifecycle,
    warn_threshold: Option<usize>,
}

impl<A> Clone for ActionSender<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            backlog: Arc::clone(&self.backlog),
            lifecycle: self.lifecycle.clone(),
            warn_threshold: self.warn_threshold,
        }
    }
}

impl<A: ReducerAction> ActionSender<A> {
    pub(crate) fn new(
        sender: mpsc::UnboundedSender<A>,
        backlog: Arc<AtomicUsize>,
        lifecycle: Lifecycle,
        warn_threshold: Option<usize>,
    ) -> Self {
        Self {
            sender,
            backlog,
            lifecycle,
            warn_threshold,
        }
    }

    /// Enqueue `action` for reduction.
    pub fn send(&self, action: A) {
        if !self.lifecycle.is_running() {
            tracing::trace!("processor stopped; dropping action");
            return;
        }

        // Count before enqueueing so the reduce loop never decrements first.
        let pending = self.backlog.fetch_add(1, Ordering::SeqCst) + 1;
        if self.sender.send(action).is_err() {
            self.backlog.fetch_sub(1, Ordering::SeqCst);
            tracing::trace!("action queue closed; dropping action");
            return;
        }

        if let Some(threshold) = self.warn_threshold {
            if threshold > 0 && pending % threshold == 0 {
                tracing::warn!(
                    pending,
                    "action backlog growing; check for effects that keep re-triggering actions"
                );
            }
        }
    }

    /// Actions accepted but not yet reduced. Zero once the processor has
    /// stopped, since queued actions are discarded at teardown.
    pub fn pending_actions(&self) -> usize {
        if self.lifecycle.phase() == LifecyclePhase::Stopped {
            return 0;
        }
        self.backlog.load(Ordering::SeqCst)
    }

    /// True once the processor no longer accepts actions.
    pub fn is_closed(&self) -> bool {
        !self.lifecycle.is_running() || self.sender.is_closed()
    }

    pub(crate) fn mark_reduced(&self) {
        self.backlog.fetch_sub(1, Ordering::SeqCst);
    }

    /// Forget actions still queued when the reduce loop exits.
    pub(crate) fn discard_backlog(&self) {
        let discarded = self.backlog.swap(0, Ordering::SeqCst);
        if discarded > 0 {
            tracing::debug!(discarded, "queued actions discarded at teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines_containing(&self, needle: &str) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .filter(|line| line.contains(needle))
                .map(str::to_string)
                .collect()
        }
    }

    fn sender_with_threshold(
        threshold: Option<usize>,
    ) -> (ActionSender<u32>, mpsc::UnboundedReceiver<u32>, Lifecycle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let lifecycle = Lifecycle::new();
        let sender = ActionSender::new(
            tx,
            Arc::new(AtomicUsize::new(0)),
            lifecycle.clone(),
            threshold,
        );
        (sender, rx, lifecycle)
    }

    #[test]
    fn backlog_warning_fires_at_each_multiple_of_threshold() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let (sender, _rx, _lifecycle) = sender_with_threshold(Some(3));
        tracing::subscriber::with_default(subscriber, || {
            for action in 0..7 {
                sender.send(action);
            }
        });

        let warnings = logs.lines_containing("action backlog growing");
        assert_eq!(warnings.len(), 2, "warnings: {warnings:?}");
        assert!(warnings[0].contains("pending=3"));
        assert!(warnings[1].contains("pending=6"));
        assert_eq!(sender.pending_actions(), 7);
    }

    #[test]
    fn no_backlog_warning_without_threshold() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let (sender, _rx, _lifecycle) = sender_with_threshold(None);
        tracing::subscriber::with_default(subscriber, || {
            for action in 0..20 {
                sender.send(action);
            }
        });

        assert!(logs.lines_containing("action backlog growing").is_empty());
    }

    #[test]
    fn discarded_backlog_reads_zero() {
        let (sender, _rx, lifecycle) = sender_with_threshold(None);
        for action in 0..5 {
            sender.send(action);
        }
        assert_eq!(sender.pending_actions(), 5);

        lifecycle.signal();
        sender.send(99);
        assert_eq!(sender.pending_actions(), 5, "stopping sender refuses new work");

        sender.discard_backlog();
        lifecycle.mark_stopped();
        assert_eq!(sender.pending_actions(), 0);
        assert!(sender.is_closed());
    }
}
