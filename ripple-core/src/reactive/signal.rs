//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive (a reactive cell). It holds
//! a value and tracks which reactions depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read with [`Signal::get`] within a reactive context,
//!    the signal subscribes the running reaction.
//!
//! 2. When a signal is written with a value that differs from the current
//!    one, every subscribed reaction runs once, in the order it subscribed.
//!    Writing an equal value does nothing at all: no notification, no
//!    history entry, no persistence write.
//!
//! 3. Notifications trigger re-execution of dependent computations, which
//!    rebuild their subscriptions as they go.
//!
//! # Optional features
//!
//! - History: an undo/redo log bounded to a fixed number of past values.
//! - Persistence: the value is loaded from a [`Storage`] at construction and
//!   stored back on every change. Failures are logged, never raised.
//!
//! # Memory Layout
//!
//! Each signal handle is a single `Rc`. The shared state holds:
//! - A unique ID
//! - The value
//! - The optional history and persistence hook
//!
//! Subscriber sets live in the thread's runtime graph, keyed by ID.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::context::ReactiveContext;
use super::history::{History, HistorySnapshot};
use super::runtime::Runtime;
use super::subscriber::{CellId, SubscriberId};
use crate::config::CellConfig;
use crate::error::Result;
use crate::persist::{self, Storage};

/// Something that can be read like a cell: [`Signal`] and
/// [`Computed`](super::Computed).
pub trait Readable {
    type Value;

    /// Read with tracking.
    fn get(&self) -> Self::Value;

    /// Read without tracking.
    fn peek(&self) -> Self::Value;

    fn id(&self) -> CellId;
}

type Encoder<T> = fn(&dyn Storage, &str, &T) -> Result<()>;

struct Persistence<T> {
    key: String,
    storage: Arc<dyn Storage>,
    encode: Encoder<T>,
}

struct SignalInner<T> {
    id: CellId,
    value: RefCell<T>,
    history: RefCell<Option<History<T>>>,
    persistence: Option<Persistence<T>>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::release_cell(self.id);
    }
}

/// A reactive cell holding a value of type T.
///
/// # Type Parameters
///
/// - `T`: The type of value stored in the signal. `PartialEq` decides which
///   writes are no-ops; `Clone` is needed because reads hand out copies.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Signal;
///
/// let count = Signal::new(0);
///
/// // Read the value
/// assert_eq!(count.get(), 0);
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// assert_eq!(count.peek(), 5);
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self::from_parts(value, None, None)
    }

    /// Create a signal that keeps up to `size` past values for
    /// [`undo`](Self::undo) and [`redo`](Self::redo).
    pub fn with_history(value: T, size: usize) -> Self {
        Self::from_parts(value, Some(size), None)
    }

    fn from_parts(value: T, history: Option<usize>, persistence: Option<Persistence<T>>) -> Self {
        let history = history.map(|size| History::new(value.clone(), size));
        Self {
            inner: Rc::new(SignalInner {
                id: CellId::new(),
                value: RefCell::new(value),
                history: RefCell::new(history),
                persistence,
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a reactive context, this also registers the
    /// current computation as a subscriber.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value, with tracking.
    ///
    /// `f` must not write to this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&*self.inner.value.borrow())
    }

    /// Borrow the current value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    fn track(&self) {
        if let Some(subscriber) = ReactiveContext::current_subscriber() {
            Runtime::add_dependency(self.inner.id, subscriber);
        }
    }

    /// Set a new value and notify subscribers.
    ///
    /// Does nothing if `value` equals the current value. Returns whether the
    /// value changed.
    pub fn set(&self, value: T) -> bool {
        self.write(value, false)
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let value = f(&*self.inner.value.borrow());
        self.set(value)
    }

    /// `replay` is set for undo/redo, which must not record a new step.
    fn write(&self, value: T, replay: bool) -> bool {
        let previous = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            std::mem::replace(&mut *current, value)
        };

        if let Some(persistence) = &self.inner.persistence {
            let value = self.inner.value.borrow();
            if let Err(err) = (persistence.encode)(&*persistence.storage, &persistence.key, &*value) {
                tracing::warn!(key = %persistence.key, error = ?err, "failed to persist value");
            }
        }

        if !replay {
            if let Some(history) = self.inner.history.borrow_mut().as_mut() {
                history.push(self.inner.value.borrow().clone());
            }
        }

        Runtime::notify_signal_change(self.inner.id, Rc::new(previous));
        true
    }

    /// Restore the previous value from history.
    ///
    /// Returns `false` when there is nothing to undo, including when the
    /// signal has no history.
    pub fn undo(&self) -> bool {
        let target = self.inner.history.borrow_mut().as_mut().and_then(History::undo);
        self.replay(target, "undo")
    }

    /// Re-apply the value most recently undone.
    ///
    /// Returns `false` when there is nothing to redo. Any regular write after
    /// an undo discards the redo stack.
    pub fn redo(&self) -> bool {
        let target = self.inner.history.borrow_mut().as_mut().and_then(History::redo);
        self.replay(target, "redo")
    }

    fn replay(&self, target: Option<T>, action: &'static str) -> bool {
        let Some(value) = target else {
            return false;
        };
        tracing::debug!(cell = %self.inner.id, action, "replaying history");
        self.write(value, true);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.borrow().as_ref().is_some_and(History::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.borrow().as_ref().is_some_and(History::can_redo)
    }

    pub fn has_history(&self) -> bool {
        self.inner.history.borrow().is_some()
    }

    /// Copy of the undo and redo stacks, if history is enabled.
    pub fn history_snapshot(&self) -> Option<HistorySnapshot<T>> {
        self.inner.history.borrow().as_ref().map(History::snapshot)
    }

    /// The key this signal persists under, if persistence is active.
    pub fn persistence_key(&self) -> Option<&str> {
        self.inner.persistence.as_ref().map(|p| p.key.as_str())
    }

    /// Reactions subscribed to this signal, in notification order.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        Runtime::subscribers_of(self.inner.id)
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.inner.id)
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    /// Create a signal from a [`CellConfig`], persisting to the process-wide
    /// default store.
    pub fn with_config(value: T, config: &CellConfig) -> Self {
        Self::with_storage(value, config, persist::default_storage())
    }

    /// Create a signal from a [`CellConfig`], persisting to `storage`.
    ///
    /// A value already stored under the configured key replaces `value`. If
    /// it fails to decode, the failure is logged and `value` is kept.
    pub fn with_storage(value: T, config: &CellConfig, storage: Arc<dyn Storage>) -> Self {
        let mut value = value;
        let persistence = config.persistence_key().map(|key| {
            match persist::load::<T>(&*storage, key) {
                Ok(Some(stored)) => {
                    tracing::debug!(key, "loaded persisted value");
                    value = stored;
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(key, error = ?err, "failed to load persisted value, keeping initial value");
                }
            }
            Persistence {
                key: key.to_string(),
                storage,
                encode: persist::store::<T>,
            }
        });
        Self::from_parts(value, config.history_capacity(), persistence)
    }
}

impl<T> Readable for Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    type Value = T;

    fn get(&self) -> T {
        Signal::get(self)
    }

    fn peek(&self) -> T {
        Signal::peek(self)
    }

    fn id(&self) -> CellId {
        Signal::id(self)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .field("history", &self.has_history())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
