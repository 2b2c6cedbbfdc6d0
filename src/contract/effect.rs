//! Effect trait and built-in effects.
//!
//! An effect is a unit of asynchronous work returned by a reducer. Processors
//! run it outside the reduce path and feed the action it produces (if any)
//! back through the same ordered intake as caller actions.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::action::ReducerAction;

/// Asynchronous side effect that resolves to at most one action.
///
/// Effects run independently of the processor's serialization and may take
/// arbitrary time. They must not call back into the processor; the only
/// channel back is the returned action. Failures are the effect's own
/// concern: return `None` to drop them, or an action that carries the
/// failure.
///
/// Processors call `run` exactly once and drop the effect afterwards.
#[async_trait]
pub trait Effect<A>: Send + Sync {
    /// Perform the work. `None` means no follow-up action.
    async fn run(&self) -> Option<A>;
}

/// Owned, type-erased effect as returned by reducers.
pub type BoxEffect<A> = Box<dyn Effect<A>>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Resolves immediately to `action`.
pub fn just<A: ReducerAction>(action: A) -> BoxEffect<A> {
    Box::new(Just {
        action: Mutex::new(Some(action)),
    })
}

/// Waits for `duration`, then resolves to `action`.
pub fn delayed<A: ReducerAction>(duration: Duration, action: A) -> BoxEffect<A> {
    Box::new(Delayed {
        duration,
        action: Mutex::new(Some(action)),
    })
}

/// Wraps an arbitrary future.
pub fn from_future<A, F>(future: F) -> BoxEffect<A>
where
    A: ReducerAction,
    F: Future<Output = Option<A>> + Send + 'static,
{
    Box::new(FutureEffect {
        future: Mutex::new(Some(Box::pin(future))),
    })
}

/// Runs `future` for its side effects only; never produces an action.
pub fn fire_and_forget<A, F>(future: F) -> BoxEffect<A>
where
    A: ReducerAction,
    F: Future<Output = ()> + Send + 'static,
{
    from_future(async move {
        future.await;
        None
    })
}

/// Converts the action produced by `effect` with `f`.
///
/// Lets a parent reducer embed a child reducer and lift its effects into the
/// parent action type.
pub fn map<A, B, F>(effect: BoxEffect<A>, f: F) -> BoxEffect<B>
where
    A: ReducerAction,
    B: ReducerAction,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    Box::new(Map { inner: effect, f })
}

// One-shot payloads live behind a mutex because `run` borrows `&self`.
// A second run finds the slot empty and yields `None`.

struct Just<A> {
    action: Mutex<Option<A>>,
}

#[async_trait]
impl<A: ReducerAction> Effect<A> for Just<A> {
    async fn run(&self) -> Option<A> {
        self.action.lock().take()
    }
}

struct Delayed<A> {
    duration: Duration,
    action: Mutex<Option<A>>,
}

#[async_trait]
impl<A: ReducerAction> Effect<A> for Delayed<A> {
    async fn run(&self) -> Option<A> {
        tokio::time::sleep(self.duration).await;
        self.action.lock().take()
    }
}

struct FutureEffect<A> {
    future: Mutex<Option<BoxFuture<Option<A>>>>,
}

#[async_trait]
impl<A: ReducerAction> Effect<A> for FutureEffect<A> {
    async fn run(&self) -> Option<A> {
        let future = self.future.lock().take();
        match future {
            Some(future) => future.await,
            None => None,
        }
    }
}

struct Map<A, F> {
    inner: BoxEffect<A>,
    f: F,
}

#[async_trait]
impl<A, B, F> Effect<B> for Map<A, F>
where
    A: ReducerAction,
    B: ReducerAction,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    async fn run(&self) -> Option<B> {
        self.inner.run().await.map(&self.f)
    }
}
