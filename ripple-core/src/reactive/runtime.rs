//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals and
//! reactions. It owns the dependency graph and delivers notifications when
//! signals change.
//!
//! # How It Works
//!
//! 1. When a reaction is created, it registers with the runtime.
//!
//! 2. When a reaction reads a signal, the runtime records the edge on both
//!    sides: the reaction joins the signal's ordered subscriber set and the
//!    signal joins the reaction's dependency list.
//!
//! 3. Before a reaction re-runs, the runtime detaches it from every signal
//!    it listed, so the run rebuilds the dependency set from scratch.
//!
//! 4. When a signal's value changes, the runtime snapshots its subscribers
//!    and runs each of them in subscription order, or queues that delivery
//!    when a batch is open.
//!
//! # Thread Safety
//!
//! The graph is thread-local. Signals and reactions are `!Send` handles, so
//! every write and every reaction run for a graph happens on the thread that
//! owns it. There is no parallel propagation.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::effect::Trigger;
use super::subscriber::{CellId, SubscriberId};

/// A trait for computations that can be re-run when a dependency changes.
pub trait Reactive {
    /// Get the subscriber ID for this reactive computation.
    fn subscriber_id(&self) -> SubscriberId;

    /// Run the computation in response to a notification.
    fn run(&self, trigger: &Trigger);
}

/// A queued notification, one per value-changing write made inside a batch.
type PendingNotification = Box<dyn FnOnce()>;

/// Per-thread dependency graph and scheduler state.
#[derive(Default)]
struct Graph {
    /// Live reactions. Weak so that dropping an effect handle disposes it.
    registry: HashMap<SubscriberId, Weak<dyn Reactive>>,

    /// Ordered subscriber set of every cell that has ever been read in a
    /// tracked context.
    subscribers: HashMap<CellId, IndexSet<SubscriberId>>,

    /// Cells each reaction read during its latest run.
    dependencies: HashMap<SubscriberId, SmallVec<[CellId; 4]>>,

    batching: bool,
    pending: Vec<PendingNotification>,

    /// Reactions kept alive independently of any handle; they live until
    /// disposed or until the thread exits.
    retained: HashMap<SubscriberId, Rc<dyn Reactive>>,
}

thread_local! {
    static GRAPH: RefCell<Graph> = RefCell::new(Graph::default());
}

fn with_graph<R>(f: impl FnOnce(&mut Graph) -> R) -> R {
    GRAPH.with(|graph| f(&mut graph.borrow_mut()))
}

/// Like [`with_graph`], but a no-op once the thread-local is being torn
/// down. Used from `Drop` impls.
fn try_with_graph(f: impl FnOnce(&mut Graph)) {
    let _ = GRAPH.try_with(|graph| {
        if let Ok(mut graph) = graph.try_borrow_mut() {
            f(&mut graph);
        }
    });
}

/// The reactive runtime of the current thread.
///
/// All methods are associated functions over the thread-local graph.
pub struct Runtime;

impl Runtime {
    /// Register a reactive computation with the runtime.
    ///
    /// Only a weak reference is kept; the caller owns the computation.
    pub fn register(reactive: &Rc<dyn Reactive>) {
        let id = reactive.subscriber_id();
        with_graph(|graph| {
            graph.registry.insert(id, Rc::downgrade(reactive));
        });
    }

    /// Unregister a reactive computation and drop all of its edges.
    pub fn unregister(id: SubscriberId) {
        try_with_graph(|graph| {
            graph.registry.remove(&id);
            graph.detach(id);
            graph.dependencies.remove(&id);
        });
    }

    /// Keep a reactive computation alive for the rest of the thread.
    pub fn retain(reactive: Rc<dyn Reactive>) {
        let id = reactive.subscriber_id();
        with_graph(|graph| graph.retained.insert(id, reactive));
    }

    /// Give up the runtime's own reference to a retained computation.
    ///
    /// Returns true if it was retained. The computation is dropped here if
    /// nothing else holds it.
    pub fn release(id: SubscriberId) -> bool {
        // Dropped outside the borrow: the computation's `Drop` unregisters.
        let released = with_graph(|graph| graph.retained.remove(&id));
        released.is_some()
    }

    /// Forget a cell that is being dropped.
    pub fn release_cell(cell: CellId) {
        try_with_graph(|graph| {
            if let Some(subscribers) = graph.subscribers.remove(&cell) {
                for subscriber in subscribers {
                    if let Some(deps) = graph.dependencies.get_mut(&subscriber) {
                        deps.retain(|dep| *dep != cell);
                    }
                }
            }
        });
    }

    /// Record that a subscriber depends on a cell.
    ///
    /// Called by signals when they are read within a reactive context.
    /// Repeated reads during one run record a single edge.
    pub fn add_dependency(cell: CellId, subscriber: SubscriberId) {
        with_graph(|graph| {
            let added = graph.subscribers.entry(cell).or_default().insert(subscriber);
            if added {
                graph.dependencies.entry(subscriber).or_default().push(cell);
            }
        });
    }

    /// Remove a subscriber from every cell it depends on and clear its
    /// dependency list.
    ///
    /// Called before re-running a computation to clear stale dependencies.
    /// Returns how many edges were removed.
    pub fn clear_dependencies(subscriber: SubscriberId) -> usize {
        with_graph(|graph| graph.detach(subscriber))
    }

    /// Ordered snapshot of the reactions subscribed to a cell.
    pub fn subscribers_of(cell: CellId) -> Vec<SubscriberId> {
        with_graph(|graph| {
            graph
                .subscribers
                .get(&cell)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        })
    }

    /// Number of reactions subscribed to a cell.
    pub fn subscriber_count(cell: CellId) -> usize {
        with_graph(|graph| graph.subscribers.get(&cell).map_or(0, IndexSet::len))
    }

    /// Snapshot of the cells a reaction read during its latest run.
    pub fn dependencies_of(subscriber: SubscriberId) -> Vec<CellId> {
        with_graph(|graph| {
            graph
                .dependencies
                .get(&subscriber)
                .map(|deps| deps.to_vec())
                .unwrap_or_default()
        })
    }

    /// Notify all subscribers that a cell changed.
    ///
    /// The subscriber set is snapshotted here, at write time. Inside a batch
    /// the delivery is queued instead of run; every call queues its own
    /// delivery, so two writes to one cell in a batch notify twice.
    pub fn notify_signal_change(cell: CellId, previous: Rc<dyn Any>) {
        let snapshot = Self::subscribers_of(cell);
        if snapshot.is_empty() {
            return;
        }

        let queued = with_graph(|graph| graph.batching);
        if queued {
            tracing::trace!(%cell, subscribers = snapshot.len(), "queueing notification");
            let delivery: PendingNotification =
                Box::new(move || Self::deliver(cell, &snapshot, previous));
            with_graph(|graph| graph.pending.push(delivery));
        } else {
            Self::deliver(cell, &snapshot, previous);
        }
    }

    fn deliver(cell: CellId, snapshot: &[SubscriberId], previous: Rc<dyn Any>) {
        tracing::trace!(%cell, subscribers = snapshot.len(), "notifying subscribers");
        let trigger = Trigger::changed(cell, previous);

        // A panic in one reaction stops delivery to the rest of the snapshot.
        for id in snapshot {
            let Some(reactive) = Self::lookup(*id) else {
                continue;
            };
            reactive.run(&trigger);
        }
    }

    fn lookup(id: SubscriberId) -> Option<Rc<dyn Reactive>> {
        with_graph(|graph| graph.registry.get(&id).and_then(Weak::upgrade))
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        super::context::current_subscriber()
    }

    /// Check if we're inside a reactive context.
    pub fn is_tracking() -> bool {
        super::context::is_tracking()
    }

    /// Open a batch. Returns `false` when one was already open.
    pub(crate) fn open_batch() -> bool {
        with_graph(|graph| !std::mem::replace(&mut graph.batching, true))
    }

    /// Close the batch and hand back the queued deliveries, oldest first.
    pub(crate) fn close_batch() -> Vec<PendingNotification> {
        with_graph(|graph| {
            graph.batching = false;
            std::mem::take(&mut graph.pending)
        })
    }

    /// Whether a batch is currently open on this thread.
    pub fn is_batching() -> bool {
        with_graph(|graph| graph.batching)
    }
}

impl Graph {
    fn detach(&mut self, subscriber: SubscriberId) -> usize {
        let Some(deps) = self.dependencies.get_mut(&subscriber) else {
            return 0;
        };
        let deps = std::mem::take(deps);
        for cell in &deps {
            if let Some(set) = self.subscribers.get_mut(cell) {
                // shift_remove keeps the notification order of the others.
                set.shift_remove(&subscriber);
            }
        }
        deps.len()
    }
}
