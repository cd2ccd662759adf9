//! Ripple Core
//!
//! This crate provides a fine-grained reactive runtime. It implements:
//!
//! - Reactive cells ([`Signal`](reactive::Signal)) with optional undo/redo
//!   history and persistence
//! - Effects that track the cells they read and re-run when those change
//! - Computed values and the `derive`/`watch`/`when` combinators
//! - Batched updates
//! - Asynchronous computed values on a tokio `LocalSet`
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `persist`: Key-value stores backing persisted cells
//! - `config`: Per-cell options
//! - `error`: Error types for storage and configuration
//!
//! # Example
//!
//! ```rust
//! use ripple_core::reactive::{Computed, Effect, Signal};
//!
//! // Create a signal
//! let count = Signal::new(0);
//!
//! // Create a derived value
//! let source = count.clone();
//! let doubled = Computed::new(move || source.get() * 2);
//!
//! // Create an effect
//! let (c, d) = (count.clone(), doubled.clone());
//! let _effect = Effect::new(move |_| {
//!     println!("Count: {}, Doubled: {}", c.get(), d.get());
//! });
//!
//! // Update the signal
//! count.set(5);
//! // The effect reads both cells, so it runs once per changed input and
//! // prints "Count: 5, Doubled: 10" twice.
//! ```

pub mod config;
pub mod error;
pub mod persist;
pub mod reactive;

pub use config::CellConfig;
pub use error::{Error, Result};
