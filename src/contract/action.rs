//! Base trait for actions fed into a reducer.

/// Marker trait for action values.
///
/// Actions represent:
/// - Caller intents submitted through `send`
/// - Results of completed effects
///
/// Actions are consumed by reducers to produce new states.
pub trait ReducerAction: Send + 'static {}

impl<T> ReducerAction for T where T: Send + 'static {}
