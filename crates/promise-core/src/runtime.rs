//! [`Runtime`]: a host bound once, with every combinator exposed as a
//! method so callers never have to thread a `Host` through call sites by
//! hand.

use std::rc::Rc;

use promise_host::Host;

use crate::combinators;
use crate::error::PromiseError;
use crate::handler::Settlement;
use crate::outcome::Outcome;
use crate::promise::{Deferred, Promise};

/// A promise factory bound to one [`Host`]. Every promise produced by a
/// `Runtime`'s methods (and every promise derived from one of those via
/// `then` and friends) shares that same host, so a single microtask queue
/// and timer list drives the whole graph.
#[derive(Clone)]
pub struct Runtime {
    host: Rc<dyn Host>,
}

impl Runtime {
    /// Bind a runtime to a host.
    pub fn new(host: Rc<dyn Host>) -> Self {
        Runtime { host }
    }

    /// The host this runtime is bound to.
    pub fn host(&self) -> Rc<dyn Host> {
        self.host.clone()
    }

    /// Create a new, unsettled promise together with its resolver.
    pub fn deferred<T: 'static, E: 'static, U: 'static>(&self) -> Deferred<T, E, U> {
        Promise::deferred(self.host.clone())
    }

    /// An already-fulfilled promise.
    pub fn resolve<T, E, U>(&self, value: T) -> Promise<T, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::resolve_value(self.host.clone(), value)
    }

    /// Alias for [`Runtime::resolve`] — the applicative "pure".
    pub fn of<T, E, U>(&self, value: T) -> Promise<T, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        self.resolve(value)
    }

    /// An already-rejected promise.
    pub fn reject<T, E, U>(&self, reason: E) -> Promise<T, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::reject_value(self.host.clone(), reason)
    }

    /// A promise that never settles.
    pub fn empty<T, E, U>(&self) -> Promise<T, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::empty(self.host.clone())
    }

    /// Coerce an [`Outcome`] into a trusted promise.
    pub fn cast<T, E, U>(&self, outcome: Outcome<T, E, U>) -> Promise<T, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static + From<PromiseError>,
        U: Clone + 'static,
    {
        combinators::cast(self.host.clone(), outcome)
    }

    /// Wait for every promise to fulfill, in order; reject as soon as one
    /// does.
    pub fn all<T, E, U>(&self, items: Vec<Promise<T, E, U>>) -> Promise<Vec<T>, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::all(self.host.clone(), items)
    }

    /// Wait for the first fulfillment; reject with every reason once all
    /// have rejected. Empty input resolves to `T::default()`.
    pub fn any<T, E, U>(&self, items: Vec<Promise<T, E, U>>) -> Promise<T, Vec<E>, U>
    where
        T: Default + Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::any(self.host.clone(), items)
    }

    /// Wait for the first `n` fulfillments (clamped to the array length).
    pub fn some<T, E, U>(&self, items: Vec<Promise<T, E, U>>, n: usize) -> Promise<Vec<T>, Vec<E>, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::some(self.host.clone(), items, n)
    }

    /// The first settlement, whichever promise and whichever way, wins.
    pub fn race<T, E, U>(&self, items: Vec<Promise<T, E, U>>) -> Promise<T, E, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
    {
        combinators::race(self.host.clone(), items)
    }

    /// Wait for every promise to settle, one way or another; never itself
    /// rejects.
    pub fn settle<T, E, U, ErrOut>(
        &self,
        items: Vec<Promise<T, E, U>>,
    ) -> Promise<Vec<Settlement<T, E>>, ErrOut, U>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        U: Clone + 'static,
        ErrOut: Clone + 'static,
    {
        combinators::settle(self.host.clone(), items)
    }

    /// See [`crate::anamorphism::unfold`].
    pub fn unfold<Seed, Value, E, U>(
        &self,
        unspool: impl FnMut(Seed) -> Promise<(Value, Seed), E, U> + 'static,
        stop: impl FnMut(&Seed) -> bool + 'static,
        handler: impl FnMut(Value) + 'static,
        seed: Seed,
    ) -> Promise<Seed, E, U>
    where
        Seed: Clone + 'static,
        Value: Clone + 'static,
        E: Clone + 'static + From<PromiseError>,
        U: Clone + 'static,
    {
        crate::anamorphism::unfold(self.host.clone(), unspool, stop, handler, seed)
    }

    /// See [`crate::anamorphism::iterate`].
    pub fn iterate<X, E, U>(
        &self,
        f: impl FnMut(X) -> Promise<X, E, U> + 'static,
        stop: impl FnMut(&X) -> bool + 'static,
        handler: impl FnMut(X) + 'static,
        x: X,
    ) -> Promise<X, E, U>
    where
        X: Clone + 'static,
        E: Clone + 'static + From<PromiseError>,
        U: Clone + 'static,
    {
        crate::anamorphism::iterate(self.host.clone(), f, stop, handler, x)
    }
}
