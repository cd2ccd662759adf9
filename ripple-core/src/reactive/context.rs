//! Reactive Context
//!
//! The reactive context tracks which reaction is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! the signal subscribes the current reaction.
//!
//! # Implementation
//!
//! We use a thread-local single slot holding the running reaction, if any.
//! Entering a context saves the previous occupant in the returned guard and
//! dropping the guard puts it back. Plain clearing on exit would lose the
//! outer reaction whenever a reaction runs inside another reaction's body
//! (a computed created inside an effect, a write that triggers a dependent),
//! and every read after the nested run would go untracked.

use std::cell::Cell;

use super::SubscriberId;

thread_local! {
    static CURRENT: Cell<Option<SubscriberId>> = const { Cell::new(None) };
}

/// Guard that restores the previous occupant of the context when dropped.
///
/// The restore also runs while unwinding, so a panicking reaction body does
/// not leave a stale reaction in the slot.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
    previous: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While this context is active, any signals that are read will
    /// register the subscriber as a dependent.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::replace(Some(subscriber_id))
    }

    /// Enter a context in which reads are not tracked at all.
    pub fn untracked() -> Self {
        Self::replace(None)
    }

    fn replace(subscriber_id: Option<SubscriberId>) -> Self {
        let previous = CURRENT.with(|slot| slot.replace(subscriber_id));
        Self {
            subscriber_id,
            previous,
        }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CURRENT.with(Cell::get)
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The slot may already be gone during thread teardown.
        let _ = CURRENT.try_with(|slot| {
            let popped = slot.replace(self.previous);
            debug_assert_eq!(
                popped, self.subscriber_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.subscriber_id, popped
            );
        });
    }
}

/// The reaction currently collecting dependencies on this thread.
pub fn current_subscriber() -> Option<SubscriberId> {
    ReactiveContext::current_subscriber()
}

/// Whether a read right now would be tracked.
pub fn is_tracking() -> bool {
    ReactiveContext::is_active()
}

/// Run `f` with tracking switched off, restoring the context afterwards.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_subscriber() {
        let id = SubscriberId::new();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(id);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn nested_contexts_restore_outer() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();

        {
            let _ctx1 = ReactiveContext::enter(id1);
            assert_eq!(current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(id2);
                assert_eq!(current_subscriber(), Some(id2));
            }

            // After inner context drops, outer should be current
            assert_eq!(current_subscriber(), Some(id1));
        }

        assert!(current_subscriber().is_none());
    }

    #[test]
    fn untrack_hides_the_active_subscriber() {
        let id = SubscriberId::new();
        let _ctx = ReactiveContext::enter(id);

        let inside = untrack(current_subscriber);
        assert_eq!(inside, None);
        assert_eq!(current_subscriber(), Some(id));
    }

    #[test]
    fn context_is_restored_after_panic() {
        let id = SubscriberId::new();

        let result = std::panic::catch_unwind(|| {
            let _ctx = ReactiveContext::enter(id);
            panic!("body failed");
        });

        assert!(result.is_err());
        assert!(!is_tracking());
    }
}
