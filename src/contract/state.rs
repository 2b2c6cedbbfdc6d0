//! Base trait for reducer state.

/// Marker trait for state owned by a processor.
///
/// States should be:
/// - Value-like (Clone produces an independent snapshot)
/// - Self-contained (all data a subscriber needs)
/// - Shareable across threads (snapshots are handed to other tasks)
pub trait ReducerState: Clone + Send + Sync + 'static {}

impl<T> ReducerState for T where T: Clone + Send + Sync + 'static {}
