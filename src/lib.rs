//! Unidirectional state management.
//!
//! A [`Reducer`] maps `(state, action)` to a new state and an optional
//! [`Effect`]. A [`Processor`] serializes actions from any number of callers,
//! applies the reducer, publishes every resulting state to subscribers, and
//! runs effects concurrently, feeding the actions they produce back into the
//! same ordered queue.
//!
//! [`ObservableProcessor`] offers the same contract for hosts that observe a
//! single current value instead of a stream.

pub mod config;
pub mod contract;
pub mod lifecycle;
pub mod logging;
pub mod observable;
pub mod processor;

pub use crate::config::{ConfigError, ProcessorConfig};
pub use crate::contract::{effect, reducer};
pub use crate::contract::{BoxEffect, Effect, FnReducer, Reducer, ReducerAction, ReducerState};
pub use crate::lifecycle::LifecyclePhase;
pub use crate::observable::ObservableProcessor;
pub use crate::processor::{ActionSender, Processor, StateStream};
