//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency is written with a different value, the effect
//!    re-runs synchronously (or once the enclosing batch closes).
//!
//! 3. Before re-running, the effect detaches from all of its old
//!    dependencies and tracks new ones during execution. A dependency that
//!    is not read again is dropped, so conditional reads shrink and grow the
//!    dependency set between runs.
//!
//! # Ownership
//!
//! The `Effect` handle owns the reaction. Dropping the last clone disposes
//! it. Call [`Effect::detach`] to hand it over to the runtime instead, in
//! which case it keeps reacting for the lifetime of the thread.
//!
//! # Asynchronous work
//!
//! Only reads made while the body is executing are tracked. Work the body
//! spawns (a future polled later, a callback invoked later) reads outside
//! the tracking window and records nothing.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::runtime::{Reactive, Runtime};
use super::subscriber::{CellId, SubscriberId};

/// Why a reaction is running.
///
/// On the first run (and on manual runs through [`Effect::run`]) there is no
/// source. When a write caused the run, the trigger names the written cell
/// and carries the value it held before the write.
pub struct Trigger {
    source: Option<CellId>,
    previous: Option<Rc<dyn Any>>,
}

impl Trigger {
    pub(crate) fn initial() -> Self {
        Self {
            source: None,
            previous: None,
        }
    }

    pub(crate) fn changed(cell: CellId, previous: Rc<dyn Any>) -> Self {
        Self {
            source: Some(cell),
            previous: Some(previous),
        }
    }

    /// True when no write caused this run.
    pub fn is_initial(&self) -> bool {
        self.source.is_none()
    }

    /// The cell whose write caused this run.
    pub fn source(&self) -> Option<CellId> {
        self.source
    }

    /// The value the source cell held before the write, if it is a `T`.
    pub fn previous<T: 'static>(&self) -> Option<&T> {
        self.previous.as_deref()?.downcast_ref()
    }

    /// Like [`previous`](Self::previous), but only when `cell` is the source.
    pub fn previous_of<T: 'static>(&self, cell: CellId) -> Option<&T> {
        if self.source == Some(cell) {
            self.previous()
        } else {
            None
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("source", &self.source)
            .field("has_previous", &self.previous.is_some())
            .finish()
    }
}

struct EffectInner {
    id: SubscriberId,
    body: Box<dyn Fn(&Trigger)>,
    disposed: Cell<bool>,
    run_count: Cell<usize>,
}

impl EffectInner {
    fn execute(&self, trigger: &Trigger) {
        if self.disposed.get() {
            return;
        }

        // Cleanup before run: the body re-subscribes to what it reads now.
        Runtime::clear_dependencies(self.id);

        let _ctx = ReactiveContext::enter(self.id);
        let run = self.run_count.get() + 1;
        self.run_count.set(run);
        tracing::trace!(reaction = %self.id, run, source = ?trigger.source(), "running reaction");

        (self.body)(trigger);

        // Disposed from inside its own body: drop the edges the rest of the
        // body recorded.
        if self.disposed.get() {
            Runtime::clear_dependencies(self.id);
        }
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn run(&self, trigger: &Trigger) {
        self.execute(trigger);
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        Runtime::unregister(self.id);
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// An effect built with [`Effect::new`] lives as long as some handle to it
/// does. Effects built with [`effect`], [`when`](super::when) or
/// [`Effect::detach`] are kept alive by the runtime until disposed.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let seen = count.clone();
///
/// let effect = Effect::new(move |_| {
///     println!("Count is: {}", seen.get());
/// });
///
/// count.set(5); // Prints: "Count is: 5"
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
#[must_use = "dropping the last handle disposes the effect; call `detach` to keep it running"]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies. A
    /// panic in that first run propagates to the caller.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Trigger) + 'static,
    {
        let effect = Self::new_lazy(body);
        effect.run();
        effect
    }

    /// Create a new effect without running it immediately.
    ///
    /// It has no dependencies, and so never reacts, until [`run`](Self::run)
    /// is called.
    pub fn new_lazy<F>(body: F) -> Self
    where
        F: Fn(&Trigger) + 'static,
    {
        let inner = Rc::new(EffectInner {
            id: SubscriberId::new(),
            body: Box::new(body),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
        });
        let reactive: Rc<dyn Reactive> = inner.clone();
        Runtime::register(&reactive);
        Self { inner }
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Run the effect now, as if it were running for the first time.
    pub fn run(&self) {
        self.inner.execute(&Trigger::initial());
    }

    /// Dispose of the effect.
    ///
    /// After disposal, the effect is detached from every cell and will not
    /// run again.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        Runtime::clear_dependencies(self.inner.id);
        Runtime::release(self.inner.id);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Keep the effect alive for the rest of the thread, independently of
    /// this handle.
    pub fn detach(self) {
        Runtime::retain(self.inner);
    }

    /// Like [`detach`](Self::detach), but keeps a handle for inspection and
    /// [`dispose`](Self::dispose).
    pub(crate) fn retained(self) -> Self {
        Runtime::retain(self.inner.clone());
        self
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        self.dependencies().len()
    }

    /// The cells read during the latest run, in first-read order.
    pub fn dependencies(&self) -> Vec<CellId> {
        Runtime::dependencies_of(self.inner.id)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create an effect that the runtime keeps alive until it is disposed.
///
/// Unlike [`Effect::new`], the returned handle may be dropped without
/// stopping the effect.
pub fn effect<F>(body: F) -> Effect
where
    F: Fn(&Trigger) + 'static,
{
    Effect::new(body).retained()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
