//! The functor/applicative/monad sugar derived from `then`, plus the
//! single-value folds (`reduce`/`reduce_right`), `filter`, and `concat`.

use crate::error::PromiseError;
use crate::outcome::Outcome;
use crate::promise::Promise;

impl<T, E, U> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// Functor map: transform a fulfillment value, passing rejections
    /// through unchanged.
    pub fn map<T2>(&self, f: impl FnOnce(T) -> T2 + 'static) -> Promise<T2, E, U>
    where
        T2: Clone + 'static,
    {
        self.then(move |v| Outcome::Value(f(v)), Outcome::Rejected)
    }

    /// Monad bind: transform a fulfillment value into another trusted
    /// promise and adopt its eventual settlement, passing rejections
    /// through unchanged.
    pub fn flat_map<T2>(&self, f: impl FnOnce(T) -> Promise<T2, E, U> + 'static) -> Promise<T2, E, U>
    where
        T2: Clone + 'static,
    {
        self.then(move |v| Outcome::Following(f(v)), Outcome::Rejected)
    }

    /// Keep a fulfillment value only if it satisfies `predicate`; otherwise
    /// reject with whatever `on_reject` produces from it.
    pub fn filter(
        &self,
        predicate: impl FnOnce(&T) -> bool + 'static,
        on_reject: impl FnOnce(T) -> E + 'static,
    ) -> Promise<T, E, U> {
        self.then(
            move |v| {
                if predicate(&v) {
                    Outcome::Value(v)
                } else {
                    Outcome::Rejected(on_reject(v))
                }
            },
            Outcome::Rejected,
        )
    }
}

impl<F, A, B, E, U> Promise<F, E, U>
where
    F: FnOnce(A) -> B + 'static,
    A: Clone + 'static,
    B: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// Applicative apply: once both this promise's function and `arg` have
    /// fulfilled, apply one to the other.
    pub fn ap(&self, arg: &Promise<A, E, U>) -> Promise<B, E, U> {
        let arg = arg.clone();
        self.then(move |f| Outcome::Following(arg.map(f)), Outcome::Rejected)
    }
}

impl<T, E, U> Promise<T, E, U>
where
    T: Default + Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    /// Race `self` against `other`, adopting whichever settles first (the
    /// combinator this crate calls `any`, applied to a pair). Not a
    /// collection-concatenation: both promises carry a single value, not an
    /// array, so there is nothing to append — just a race between two
    /// candidates.
    pub fn concat(&self, other: &Promise<T, E, U>) -> Promise<T, Vec<E>, U> {
        let host = self.inner_host();
        crate::combinators::any(host, vec![self.clone(), other.clone()])
    }
}

impl<T, E, U> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// The one-argument fold: since this promise carries a single value,
    /// not a collection, there is nothing to accumulate over. Equal to
    /// resolving a fresh promise with `self`.
    pub fn reduce(&self) -> Promise<T, E, U> {
        self.then(Outcome::Value, Outcome::Rejected)
    }

    /// The two-argument fold: combine `initial` with this promise's
    /// eventual value through `f`, once it fulfills. Defined as
    /// `map(|v| f(initial, v))` — folding a single element, not a
    /// collection.
    pub fn reduce_with<Acc>(
        &self,
        initial: Acc,
        f: impl FnOnce(Acc, T) -> Acc + 'static,
    ) -> Promise<Acc, E, U>
    where
        Acc: Clone + 'static,
    {
        self.then(move |v| Outcome::Value(f(initial, v)), Outcome::Rejected)
    }

    /// `reduce_right`'s one-argument form. Identical to [`Promise::reduce`]:
    /// left and right coincide once there is only one element to fold.
    pub fn reduce_right(&self) -> Promise<T, E, U> {
        self.reduce()
    }

    /// `reduce_right`'s two-argument form. Identical to
    /// [`Promise::reduce_with`]: left and right coincide once there is only
    /// one element to fold.
    pub fn reduce_right_with<Acc>(
        &self,
        initial: Acc,
        f: impl FnOnce(Acc, T) -> Acc + 'static,
    ) -> Promise<Acc, E, U>
    where
        Acc: Clone + 'static,
    {
        self.reduce_with(initial, f)
    }
}
