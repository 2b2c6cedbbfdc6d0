use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`Processor`](crate::Processor).
///
/// None of these change reduction semantics: every action is still reduced
/// once, in arrival order, and every produced effect is eventually started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Label attached to the processor's tracing span.
    pub name: String,
    /// Upper bound on effects running at the same time.
    /// Excess effects wait for a slot; `None` means unbounded.
    pub max_concurrent_effects: Option<usize>,
    /// Emit a warning each time the number of accepted but not yet reduced
    /// actions reaches a multiple of this value. Purely diagnostic: the
    /// intake queue is never limited.
    pub backlog_warn_threshold: Option<usize>,
    /// Abort in-flight effects on teardown instead of letting them finish.
    /// Their results are dropped either way.
    pub cancel_effects_on_shutdown: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            name: "processor".to_string(),
            max_concurrent_effects: None,
            backlog_warn_threshold: Some(10_000),
            cancel_effects_on_shutdown: false,
        }
    }
}
