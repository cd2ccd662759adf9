//! Batching
//!
//! Group writes so their notifications are delivered after the batch body
//! returns instead of during it.
//!
//! Each value-changing write inside a batch queues one delivery to the
//! subscribers the cell had at write time. The queue is not deduplicated:
//! writing one cell three times with three different values delivers three
//! notifications once the batch closes, in write order.

use super::runtime::Runtime;

/// Run `body` with notifications deferred until it returns.
///
/// Batches do not nest: calling `batch` inside an open batch runs the body
/// inline and the outermost call flushes.
///
/// If `body` panics, the batch is closed and the queued notifications are
/// discarded.
///
/// # Example
///
/// ```
/// use ripple_core::reactive::{batch, Effect, Signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let a = Signal::new(1);
/// let b = Signal::new(2);
/// let runs = Rc::new(Cell::new(0));
///
/// let (a2, b2, runs2) = (a.clone(), b.clone(), runs.clone());
/// let _effect = Effect::new(move |_| {
///     let _ = a2.get() + b2.get();
///     runs2.set(runs2.get() + 1);
/// });
///
/// batch(|| {
///     a.set(10);
///     b.set(20);
///     assert_eq!(runs.get(), 1);
/// });
///
/// // One delivery per write, both after the body.
/// assert_eq!(runs.get(), 3);
/// ```
pub fn batch<R>(body: impl FnOnce() -> R) -> R {
    if !Runtime::open_batch() {
        return body();
    }

    // Use a guard so the batch is closed even if the body panics.
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let pending = Runtime::close_batch();
            if std::thread::panicking() {
                if !pending.is_empty() {
                    tracing::warn!(
                        discarded = pending.len(),
                        "batch body panicked, dropping queued notifications"
                    );
                }
                return;
            }

            tracing::debug!(notifications = pending.len(), "flushing batch");
            for delivery in pending {
                delivery();
            }
        }
    }

    let _guard = BatchGuard;
    body()
}

/// Check if currently inside a batch.
pub fn is_batching() -> bool {
    Runtime::is_batching()
}
