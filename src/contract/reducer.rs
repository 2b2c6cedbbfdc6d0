//! Reducer trait and closure adapter.

use std::fmt;
use std::marker::PhantomData;

use super::action::ReducerAction;
use super::effect::BoxEffect;
use super::state::ReducerState;

/// Reducer transforms state based on actions.
///
/// The reducer is the only place where state transitions happen. It mutates
/// the state in place and optionally selects one effect whose result will be
/// fed back as a new action.
///
/// Processors call `reduce` from a single serialized context, so
/// implementations never see concurrent invocations. A reducer that needs to
/// report failure encodes it in the state or in the action its effect
/// produces; a panic inside `reduce` stops the processor, and effects that
/// were produced but not yet started are dropped with it.
pub trait Reducer: Send + 'static {
    /// The state type this reducer operates on.
    type State: ReducerState;

    /// The action type this reducer handles and its effects resolve to.
    type Action: ReducerAction;

    /// Apply `action` to `state` and return an optional effect.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
    ) -> Option<BoxEffect<Self::Action>>;
}

/// Reducer backed by a closure. Built with [`from_fn`].
pub struct FnReducer<S, A, F> {
    f: F,
    _types: PhantomData<fn(S, A)>,
}

/// Build a reducer from a closure.
///
/// ```ignore
/// let reducer = statefold::reducer::from_fn(|state: &mut i64, action: i64| {
///     *state += action * 10;
///     None
/// });
/// ```
pub fn from_fn<S, A, F>(f: F) -> FnReducer<S, A, F>
where
    S: ReducerState,
    A: ReducerAction,
    F: Fn(&mut S, A) -> Option<BoxEffect<A>> + Send + 'static,
{
    FnReducer {
        f,
        _types: PhantomData,
    }
}

impl<S, A, F> Reducer for FnReducer<S, A, F>
where
    S: ReducerState,
    A: ReducerAction,
    F: Fn(&mut S, A) -> Option<BoxEffect<A>> + Send + 'static,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &mut S, action: A) -> Option<BoxEffect<A>> {
        (self.f)(state, action)
    }
}

impl<S, A, F> fmt::Debug for FnReducer<S, A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReducer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::effect;

    #[test]
    fn fn_reducer_folds_in_place() {
        let reducer = from_fn(|state: &mut i64, action: i64| {
            *state += action * 10;
            None
        });
        let mut state = 0;
        for action in [1, 2, 3] {
            assert!(reducer.reduce(&mut state, action).is_none());
        }
        assert_eq!(state, 60);
    }

    #[test]
    fn fn_reducer_returns_selected_effect() {
        let reducer = from_fn(|state: &mut u32, action: u32| {
            *state += 1;
            (action > 0).then(|| effect::just(action - 1))
        });
        let mut state = 0;
        assert!(reducer.reduce(&mut state, 0).is_none());
        assert!(reducer.reduce(&mut state, 3).is_some());
        assert_eq!(state, 2);
    }
}
