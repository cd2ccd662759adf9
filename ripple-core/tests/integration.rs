//! Integration Tests for Reactive System
//!
//! These tests verify that signals, computeds, effects, batches and history
//! work together correctly.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use ripple_core::persist::{self, MemoryStorage, Storage};
use ripple_core::reactive::{
    batch, computed, context, derive, effect, watch, when, Computed, Effect, Signal,
};
use ripple_core::CellConfig;

fn log<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}

/// A conditional read swaps dependencies instead of accumulating them.
#[test]
fn dependencies_follow_the_branch_taken() {
    let guard = Signal::new(true);
    let a = Signal::new("a");
    let b = Signal::new("b");

    let (g, a2, b2) = (guard.clone(), a.clone(), b.clone());
    let effect = Effect::new(move |_| {
        if g.get() {
            a2.get();
        } else {
            b2.get();
        }
    });

    assert_eq!(effect.dependencies(), vec![guard.id(), a.id()]);
    assert_eq!(a.subscriber_count(), 1);
    assert_eq!(b.subscriber_count(), 0);

    guard.set(false);
    assert_eq!(effect.dependencies(), vec![guard.id(), b.id()]);
    assert_eq!(a.subscriber_count(), 0);
    assert_eq!(b.subscriber_count(), 1);

    // A write to the dropped branch no longer reaches the effect.
    let runs = effect.run_count();
    a.set("a2");
    assert_eq!(effect.run_count(), runs);

    guard.set(true);
    assert_eq!(effect.dependencies(), vec![guard.id(), a.id()]);
    assert_eq!(b.subscriber_count(), 0);
}

/// Diamond: R feeds A and B, C reads both. No topological ordering, so C
/// runs once per upstream computed that changes and sees a stale B first.
#[test]
fn diamond_runs_downstream_once_per_upstream_write() {
    let root = Signal::new(1);
    let r = root.clone();
    let a = computed(move || r.get() + 1);
    let r = root.clone();
    let b = computed(move || r.get() * 2);

    let seen = log();
    let (a2, b2, out) = (a.clone(), b.clone(), seen.clone());
    let c = Effect::new(move |_| out.borrow_mut().push(a2.get() + b2.get()));

    root.set(2);

    assert_eq!(*seen.borrow(), vec![4, 5, 7]);
    assert_eq!(c.run_count(), 3);
}

/// Subscribers run in the order they subscribed.
#[test]
fn notification_order_is_subscription_order() {
    let signal = Signal::new(0);
    let order = log();

    let effects: Vec<Effect> = (0..3)
        .map(|i| {
            let (s, out) = (signal.clone(), order.clone());
            Effect::new(move |trigger| {
                s.get();
                if !trigger.is_initial() {
                    out.borrow_mut().push(i);
                }
            })
        })
        .collect();

    signal.set(1);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
    assert_eq!(
        signal.subscribers(),
        effects.iter().map(Effect::id).collect::<Vec<_>>()
    );
}

/// A reaction created inside another reaction must not steal the outer
/// reaction's later reads.
#[test]
fn nested_run_restores_outer_tracking() {
    let before = Signal::new(1);
    let inner_source = Signal::new(10);
    let after = Signal::new(100);
    let children: Rc<RefCell<Vec<Computed<i32>>>> = Rc::default();

    let (b, i, a, kids) = (
        before.clone(),
        inner_source.clone(),
        after.clone(),
        children.clone(),
    );
    let outer = Effect::new(move |_| {
        b.get();
        let i = i.clone();
        kids.borrow_mut().push(computed(move || i.get()));
        a.get();
    });

    assert_eq!(outer.dependencies(), vec![before.id(), after.id()]);
    assert_eq!(children.borrow()[0].dependencies(), vec![inner_source.id()]);
    assert!(!context::is_tracking());

    // The outer effect reacts to `after`, proving the read was attributed.
    after.set(200);
    assert_eq!(outer.run_count(), 2);
}

/// A panic in a reaction propagates to the writer, skips the remaining
/// subscribers of that pass and leaves the runtime usable.
#[test]
fn reaction_panic_propagates_and_stops_delivery() {
    let signal = Signal::new(0);
    let later_runs = Arc::new(AtomicI32::new(0));

    let s = signal.clone();
    let _failing = Effect::new(move |_| {
        if s.get() == 1 {
            panic!("reaction failed");
        }
    });
    let (s, runs) = (signal.clone(), later_runs.clone());
    let _later = Effect::new(move |_| {
        s.get();
        runs.fetch_add(1, Ordering::SeqCst);
    });

    let result = catch_unwind(AssertUnwindSafe(|| signal.set(1)));
    assert!(result.is_err());
    assert!(!context::is_tracking());
    assert_eq!(later_runs.load(Ordering::SeqCst), 1);
    assert_eq!(signal.peek(), 1);

    // Both reactions still respond afterwards.
    signal.set(2);
    assert_eq!(later_runs.load(Ordering::SeqCst), 2);
}

/// A reaction may write a cell it reads as long as the writes converge.
#[test]
fn self_write_that_converges() {
    let value = Signal::new(0);

    let v = value.clone();
    let clamp = Effect::new(move |_| {
        let current = v.get();
        if current > 10 {
            v.set(10);
        }
    });

    value.set(50);
    assert_eq!(value.get(), 10);
    // Initial run, the write of 50, then the nested re-run after clamping.
    assert_eq!(clamp.run_count(), 3);
    assert_eq!(value.subscriber_count(), 1);
}

/// Batched writes notify once per write, after the body returns.
#[test]
fn batch_preserves_one_notification_per_write() {
    let a = Signal::new(0);
    let b = Signal::new(0);
    let counter = Arc::new(AtomicI32::new(0));

    let (a2, b2, c) = (a.clone(), b.clone(), counter.clone());
    let _effect = Effect::new(move |_| {
        a2.get();
        b2.get();
        c.fetch_add(1, Ordering::SeqCst);
    });
    counter.store(0, Ordering::SeqCst);

    batch(|| {
        a.set(1);
        a.set(2);
        a.set(3);
        b.set(1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    });

    assert_eq!(counter.load(Ordering::SeqCst), 4);
}

/// Undo/redo drive dependents like ordinary writes.
#[test]
fn undo_redo_propagate_to_computed() {
    let text = Signal::with_history(String::new(), 100);
    let t = text.clone();
    let length = computed(move || t.with(String::len));

    text.set("he".to_string());
    text.set("hello".to_string());
    assert_eq!(length.get(), 5);

    text.undo();
    assert_eq!(length.get(), 2);
    text.undo();
    assert_eq!(length.get(), 0);
    text.redo();
    assert_eq!(length.get(), 2);

    text.set("x".to_string());
    assert!(!text.redo());
    assert_eq!(length.get(), 1);
}

/// Persisted cells load what an earlier cell under the same key stored.
#[test]
fn persistence_round_trip_through_default_storage() {
    persist::set_default_storage(Arc::new(MemoryStorage::new()));
    let key = format!("integration-{}", std::process::id());
    let config = CellConfig::new().with_persistence(key.clone());

    let first = Signal::with_config(3_u32, &config);
    assert_eq!(first.get(), 3);
    first.set(7);

    let second = Signal::with_config(0_u32, &config);
    assert_eq!(second.get(), 7);
    assert_eq!(persist::default_storage().get(&key).as_deref(), Some("7"));
}

/// Configuration documents drive the same options as the builder.
#[test]
fn config_from_json_enables_history_and_persistence() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let config = CellConfig::from_json(
        r#"{"persist": true, "key": "doc", "history": true, "historySize": 2}"#,
    )
    .unwrap();

    let cell = Signal::with_storage(vec![1], &config, storage.clone());
    cell.set(vec![1, 2]);
    cell.set(vec![1, 2, 3]);

    assert_eq!(cell.history_snapshot().unwrap().past.len(), 2);
    assert!(cell.undo());
    assert_eq!(cell.get(), vec![1, 2]);
    assert_eq!(storage.get("doc").as_deref(), Some("[1,2]"));
}

/// `derive` and a hand-written computed agree on every write.
#[test]
fn derive_equivalent_to_computed() {
    let x = Signal::new(1.5_f64);
    let y = Signal::new(2.0_f64);
    let derived = derive((x.clone(), y.clone()), |(x, y)| x * y);
    let (cx, cy) = (x.clone(), y.clone());
    let manual = Computed::new(move || cx.get() * cy.get());

    for (nx, ny) in [(2.0, 3.0), (0.5, 3.0), (0.5, -1.0)] {
        x.set(nx);
        assert_eq!(derived.get(), manual.get());
        y.set(ny);
        assert_eq!(derived.get(), manual.get());
    }
    assert_eq!(derived.get(), -0.5);
}

/// `effect`, `watch` and `when` keep reacting when called as statements.
#[test]
fn statement_form_reactions_stay_subscribed() {
    let cell = Signal::new(1);
    let flag = Signal::new(false);
    let effect_runs = Arc::new(AtomicI32::new(0));
    let watch_calls = Arc::new(AtomicI32::new(0));
    let fired = Arc::new(AtomicI32::new(0));

    let (c, runs) = (cell.clone(), effect_runs.clone());
    let _ = effect(move |_| {
        c.get();
        runs.fetch_add(1, Ordering::SeqCst);
    });
    let calls = watch_calls.clone();
    watch(&cell, move |_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
    });
    let count = fired.clone();
    let _ = when(&flag, move || {
        count.fetch_add(1, Ordering::SeqCst);
    });

    cell.set(2);
    cell.set(3);
    flag.set(true);

    assert_eq!(effect_runs.load(Ordering::SeqCst), 3);
    assert_eq!(watch_calls.load(Ordering::SeqCst), 3);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(cell.subscriber_count(), 2);
}
