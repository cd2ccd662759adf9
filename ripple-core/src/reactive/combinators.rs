//! Derived combinators built from signals and effects: [`derive`],
//! [`watch`] and [`when`].

use super::computed::Computed;
use super::effect::Effect;
use super::signal::{Readable, Signal};

/// A tuple of readable cells whose values can be read together.
pub trait Sources: 'static {
    type Values;

    /// Read every source, with tracking, in tuple order.
    fn read(&self) -> Self::Values;
}

macro_rules! impl_sources {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name),+> Sources for ($($name,)+)
        where
            $($name: Readable + 'static,)+
        {
            type Values = ($($name::Value,)+);

            fn read(&self) -> Self::Values {
                ($(self.$idx.get(),)+)
            }
        }
    };
}

impl_sources!(A: 0);
impl_sources!(A: 0, B: 1);
impl_sources!(A: 0, B: 1, C: 2);
impl_sources!(A: 0, B: 1, C: 2, D: 3);
impl_sources!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_sources!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

/// A computed value over explicitly listed sources.
///
/// Equivalent to a [`Computed`] whose body reads each source and passes the
/// values to `body`.
///
/// ```rust
/// use ripple_core::reactive::{derive, Signal};
///
/// let x = Signal::new(1);
/// let y = Signal::new(2);
/// let sum = derive((x.clone(), y.clone()), |(x, y)| x + y);
///
/// x.set(10);
/// assert_eq!(sum.get(), 12);
/// ```
pub fn derive<S, T, F>(sources: S, body: F) -> Computed<T>
where
    S: Sources,
    T: Clone + PartialEq + 'static,
    F: Fn(S::Values) -> T + 'static,
{
    Computed::new(move || body(sources.read()))
}

/// Call `callback(new, old)` now and on every change of `source`.
///
/// `old` is `None` on the first call. It is also `None` when the run was
/// triggered by some other cell the callback itself read.
///
/// The watcher stays subscribed for the rest of the thread.
pub fn watch<T, F>(source: &Signal<T>, callback: F)
where
    T: Clone + PartialEq + 'static,
    F: Fn(&T, Option<&T>) + 'static,
{
    let source = source.clone();
    Effect::new(move |trigger| {
        let value = source.get();
        callback(&value, trigger.previous_of::<T>(source.id()));
    })
    .detach();
}

/// Values with a notion of "set" used by [`when`].
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &'static str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! impl_truthy_int {
    ($($ty:ty),*) => {
        $(impl Truthy for $ty {
            fn is_truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

impl_truthy_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

/// Call `callback` whenever `condition` is (re-)evaluated as truthy.
///
/// The condition is read on every run, so the effect keeps reacting to
/// every change, truthy or not. Reads inside `callback` are tracked like
/// any other read in the effect.
///
/// The effect is kept alive by the runtime; the returned handle is only
/// needed to [`dispose`](Effect::dispose) it.
pub fn when<C, F>(condition: &C, callback: F) -> Effect
where
    C: Readable + Clone + 'static,
    C::Value: Truthy,
    F: Fn() + 'static,
{
    let condition = condition.clone();
    Effect::new(move |_| {
        if condition.get().is_truthy() {
            callback();
        }
    })
    .retained()
}
