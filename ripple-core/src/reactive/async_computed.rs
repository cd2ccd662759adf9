//! Asynchronous computed values.
//!
//! The body is a closure returning a future. Calling the closure is the
//! tracked part: every signal it reads before handing back the future
//! becomes a dependency. Reads made while the future is being polled happen
//! outside any reactive context and are not tracked.
//!
//! Futures are spawned with [`tokio::task::spawn_local`], so an
//! `AsyncComputed` has to be created (and its dependencies written) inside a
//! [`tokio::task::LocalSet`].
//!
//! A re-run does not cancel the future started by the previous run. Both
//! settle and write their outcome; whichever settles last wins.

use std::fmt::{self, Debug};
use std::future::Future;

use super::context::current_subscriber;
use super::effect::Effect;
use super::signal::Signal;

/// The three cells maintained by [`async_computed`].
///
/// The governing effect is kept alive by the runtime, so the cells keep
/// updating after this struct is destructured or dropped.
#[must_use]
pub struct AsyncComputed<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    /// Latest successful result, `None` until the first success.
    pub value: Signal<Option<T>>,
    /// True from the start of a run until its future settles.
    pub loading: Signal<bool>,
    /// Error of the latest failed run, cleared when a run starts.
    pub error: Signal<Option<E>>,
    effect: Effect,
}

impl<T, E> AsyncComputed<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    /// The effect that starts a run whenever a dependency changes.
    pub fn effect(&self) -> &Effect {
        &self.effect
    }
}

impl<T, E> Clone for AsyncComputed<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            loading: self.loading.clone(),
            error: self.error.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T, E> Debug for AsyncComputed<T, E>
where
    T: Clone + PartialEq + Debug + 'static,
    E: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncComputed")
            .field("value", &self.value.peek())
            .field("loading", &self.loading.peek())
            .field("error", &self.error.peek())
            .finish()
    }
}

/// Derive a value from an asynchronous computation.
///
/// Each run sets `loading` to true, clears `error`, calls `body` and spawns
/// the returned future. On success the result goes to `value`, on failure
/// to `error`; `loading` goes back to false in both cases.
///
/// # Panics
///
/// Panics if called outside a `LocalSet`, like `spawn_local`.
pub fn async_computed<T, E, F, Fut>(body: F) -> AsyncComputed<T, E>
where
    T: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
{
    let value = Signal::new(None);
    let loading = Signal::new(false);
    let error = Signal::new(None);

    let (value_out, loading_out, error_out) = (value.clone(), loading.clone(), error.clone());
    let effect = Effect::new(move |_| {
        loading_out.set(true);
        error_out.set(None);

        let future = body();

        let reaction = current_subscriber();
        let (value, loading, error) = (value_out.clone(), loading_out.clone(), error_out.clone());
        tokio::task::spawn_local(async move {
            match future.await {
                Ok(result) => {
                    value.set(Some(result));
                }
                Err(err) => {
                    tracing::debug!(reaction = ?reaction, "async computation failed");
                    error.set(Some(err));
                }
            }
            loading.set(false);
        });
    })
    .retained();

    AsyncComputed {
        value,
        loading,
        error,
        effect,
    }
}
