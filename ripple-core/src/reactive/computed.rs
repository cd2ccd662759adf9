//! Computed Implementation
//!
//! A Computed is a derived value kept in a hidden signal by an effect.
//!
//! # How Computeds Work
//!
//! 1. On creation, the effect runs the computation once and stores the
//!    result in the hidden signal.
//!
//! 2. Every write to a dependency re-runs the computation immediately. There
//!    is no lazy evaluation and no dirty state.
//!
//! 3. The result is written back through the hidden signal, so a result
//!    equal to the previous one notifies nobody.
//!
//! # Glitches
//!
//! Propagation is push-based with no topological ordering. A reaction that
//! depends on two computeds sharing a source runs once per computed that
//! changes, seeing one updated input and one stale input in the first run.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use super::effect::Effect;
use super::signal::{Readable, Signal};
use super::subscriber::{CellId, SubscriberId};

/// A read-only value derived from other reactive values.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{Computed, Signal};
///
/// let count = Signal::new(2);
/// let source = count.clone();
/// let doubled = Computed::new(move || source.get() * 2);
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    signal: Signal<T>,
    effect: Effect,
}

impl<T> Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a computed value. `compute` runs immediately.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        // The first run seeds the hidden signal; later runs write through it.
        let slot: Rc<RefCell<Option<Signal<T>>>> = Rc::default();
        let writer = slot.clone();
        let effect = Effect::new(move |_| {
            let value = compute();
            let existing = writer.borrow().clone();
            match existing {
                Some(signal) => {
                    signal.set(value);
                }
                None => *writer.borrow_mut() = Some(Signal::new(value)),
            }
        });
        let signal = slot
            .borrow()
            .clone()
            .expect("computed effect runs on creation");
        Self { signal, effect }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> CellId {
        self.signal.id()
    }

    /// ID of the effect that keeps this value up to date.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.effect.id()
    }

    /// Get the current value, with tracking.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    /// Get the current value without tracking.
    pub fn peek(&self) -> T {
        self.signal.peek()
    }

    /// Borrow the current value, with tracking.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    /// Reactions subscribed to this value, in notification order.
    pub fn subscribers(&self) -> Vec<SubscriberId> {
        self.signal.subscribers()
    }

    pub fn subscriber_count(&self) -> usize {
        self.signal.subscriber_count()
    }

    /// Number of times the computation has run.
    pub fn run_count(&self) -> usize {
        self.effect.run_count()
    }

    /// The cells the computation read during its latest run.
    pub fn dependencies(&self) -> Vec<CellId> {
        self.effect.dependencies()
    }
}

impl<T> Readable for Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    type Value = T;

    fn get(&self) -> T {
        Computed::get(self)
    }

    fn peek(&self) -> T {
        Computed::peek(self)
    }

    fn id(&self) -> CellId {
        Computed::id(self)
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id())
            .field("value", &self.peek())
            .field("run_count", &self.run_count())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Create a computed value. Shorthand for [`Computed::new`].
pub fn computed<T, F>(compute: F) -> Computed<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    Computed::new(compute)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
