//! Unidirectional data flow primitives.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Reducer ──→ State ──→ Subscribers
//!    ↑          │
//!    │          ↓
//!    └────── Effect
//! ```
//!
//! - **State**: Value-semantic snapshot of the system
//! - **Action**: Caller intents or effect results
//! - **Reducer**: The only place where state transitions happen
//! - **Effect**: Deferred async work that yields at most one follow-up action

pub mod action;
pub mod effect;
pub mod reducer;
pub mod state;

pub use action::ReducerAction;
pub use effect::{BoxEffect, Effect};
pub use reducer::{FnReducer, Reducer};
pub use state::ReducerState;
