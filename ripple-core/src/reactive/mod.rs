//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, effects,
//! computed values, batching and history.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as an effect), the signal automatically
//! registers that context as a dependent. When the signal's value changes,
//! all dependents run again.
//!
//! ## Effects
//!
//! An Effect is a computation that runs once on creation and again whenever
//! a signal it read changes. Each run starts from an empty dependency set,
//! so only the signals read by the latest run keep it subscribed.
//!
//! ## Computed values
//!
//! A Computed is an effect writing into a hidden signal. It recomputes
//! eagerly on every dependency write; an unchanged result notifies nobody.
//! [`derive`], [`watch`], [`when`] and [`async_computed`] are built the same
//! way.
//!
//! ## Batches
//!
//! [`batch`] defers notifications until its body returns, then delivers one
//! per value-changing write, in write order.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is an active
//! tracking context and, if so, register the dependency in the thread's
//! runtime graph.
//!
//! Propagation is push-based and depth-first. There is no topological
//! ordering and no cycle detection: a reaction that keeps writing a value it
//! depends on recurses until the stack overflows.

mod async_computed;
mod batch;
mod combinators;
mod computed;
pub mod context;
mod effect;
mod history;
mod runtime;
mod signal;
mod subscriber;

pub use async_computed::{async_computed, AsyncComputed};
pub use batch::{batch, is_batching};
pub use combinators::{derive, watch, when, Sources, Truthy};
pub use computed::{computed, Computed};
pub use context::{untrack, ReactiveContext};
pub use effect::{effect, Effect, Trigger};
pub use history::{History, HistorySnapshot, DEFAULT_HISTORY_SIZE};
pub use runtime::{Reactive, Runtime};
pub use signal::{Readable, Signal};
pub use subscriber::{CellId, SubscriberId};
