//! The static array combinators (`all`, `any`, `some`, `race`, `settle`)
//! and the trivial constructors (`resolve`, `reject`, `of`, `empty`,
//! `cast`). These don't belong on `Promise` itself since they operate over
//! a collection of promises rather than a single one; [`crate::runtime`]
//! exposes them as methods on `Runtime` bound to one host.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use promise_host::Host;

use crate::error::PromiseError;
use crate::handler::Settlement;
use crate::outcome::Outcome;
use crate::promise::Promise;

/// Wait for every promise to fulfill, in order; reject as soon as any one
/// rejects (fail-fast), with whatever reason it rejected with.
pub(crate) fn all<T, E, U>(host: Rc<dyn Host>, items: Vec<Promise<T, E, U>>) -> Promise<Vec<T>, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    let next = deferred.promise.clone();
    let total = items.len();
    if total == 0 {
        next.settle_fulfilled(Vec::new());
        return deferred.promise;
    }

    let results: Rc<RefCell<Vec<Option<T>>>> = Rc::new(RefCell::new(vec![None; total]));
    let remaining = Rc::new(Cell::new(total));

    for (i, p) in items.into_iter().enumerate() {
        let next = next.clone();
        let results = results.clone();
        let remaining = remaining.clone();
        p.subscribe(move |result| match result {
            Ok(v) => {
                results.borrow_mut()[i] = Some(v);
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    let values = results.borrow_mut().iter_mut().map(|o| o.take().unwrap()).collect();
                    next.settle_fulfilled(values);
                }
            }
            Err(e) => next.settle_rejected(e),
        });
    }

    deferred.promise
}

/// Wait only for the first fulfillment; reject, once every promise has
/// rejected, with the array of all rejection reasons (in settlement
/// order). Empty input fulfills with `T::default()` rather than rejecting.
pub(crate) fn any<T, E, U>(host: Rc<dyn Host>, items: Vec<Promise<T, E, U>>) -> Promise<T, Vec<E>, U>
where
    T: Default + Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    let next = deferred.promise.clone();
    let total = items.len();
    if total == 0 {
        next.settle_fulfilled(T::default());
        return deferred.promise;
    }

    let reasons: Rc<RefCell<Vec<E>>> = Rc::new(RefCell::new(Vec::new()));
    let remaining = Rc::new(Cell::new(total));

    for p in items {
        let next = next.clone();
        let reasons = reasons.clone();
        let remaining = remaining.clone();
        p.subscribe(move |result| match result {
            Ok(v) => next.settle_fulfilled(v),
            Err(e) => {
                reasons.borrow_mut().push(e);
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    next.settle_rejected(reasons.borrow().clone());
                }
            }
        });
    }

    deferred.promise
}

/// Wait for the first `n` fulfillments (`n` clamped to the array length),
/// in the order they settle; reject with every rejection reason collected
/// so far as soon as fewer than `n` fulfillments remain achievable.
pub(crate) fn some<T, E, U>(
    host: Rc<dyn Host>,
    items: Vec<Promise<T, E, U>>,
    n: usize,
) -> Promise<Vec<T>, Vec<E>, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    let next = deferred.promise.clone();
    let total = items.len();
    let needed = n.min(total);

    if needed == 0 {
        next.settle_fulfilled(Vec::new());
        return deferred.promise;
    }

    let fulfilled: Rc<RefCell<Vec<T>>> = Rc::new(RefCell::new(Vec::new()));
    let reasons: Rc<RefCell<Vec<E>>> = Rc::new(RefCell::new(Vec::new()));
    let remaining = Rc::new(Cell::new(total));

    for p in items {
        let next = next.clone();
        let fulfilled = fulfilled.clone();
        let reasons = reasons.clone();
        let remaining = remaining.clone();
        p.subscribe(move |result| {
            remaining.set(remaining.get() - 1);
            match result {
                Ok(v) => {
                    let mut f = fulfilled.borrow_mut();
                    if f.len() < needed {
                        f.push(v);
                    }
                    if f.len() == needed {
                        let snapshot = f.clone();
                        drop(f);
                        next.settle_fulfilled(snapshot);
                        return;
                    }
                }
                Err(e) => reasons.borrow_mut().push(e),
            }
            let still_possible = fulfilled.borrow().len() + remaining.get() >= needed;
            if !still_possible && fulfilled.borrow().len() < needed {
                next.settle_rejected(reasons.borrow().clone());
            }
        });
    }

    deferred.promise
}

/// The first settlement (fulfillment or rejection) among `items` wins; an
/// empty array races forever.
pub(crate) fn race<T, E, U>(host: Rc<dyn Host>, items: Vec<Promise<T, E, U>>) -> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    let next = deferred.promise.clone();
    for p in items {
        let next = next.clone();
        p.subscribe(move |result| match result {
            Ok(v) => next.settle_fulfilled(v),
            Err(e) => next.settle_rejected(e),
        });
    }
    deferred.promise
}

/// Wait for every promise to settle, one way or another; never itself
/// rejects. `ErrOut` is the (unused) rejection type of the returned
/// promise, chosen by the caller since this combinator never produces one.
pub(crate) fn settle<T, E, U, ErrOut>(
    host: Rc<dyn Host>,
    items: Vec<Promise<T, E, U>>,
) -> Promise<Vec<Settlement<T, E>>, ErrOut, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
    ErrOut: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    let next = deferred.promise.clone();
    let total = items.len();
    if total == 0 {
        next.settle_fulfilled(Vec::new());
        return deferred.promise;
    }

    let results: Rc<RefCell<Vec<Option<Settlement<T, E>>>>> =
        Rc::new(RefCell::new((0..total).map(|_| None).collect()));
    let remaining = Rc::new(Cell::new(total));

    for (i, p) in items.into_iter().enumerate() {
        let next = next.clone();
        let results = results.clone();
        let remaining = remaining.clone();
        p.subscribe(move |result| {
            let snapshot = match result {
                Ok(v) => Settlement::Fulfilled(v),
                Err(e) => Settlement::Rejected(e),
            };
            results.borrow_mut()[i] = Some(snapshot);
            remaining.set(remaining.get() - 1);
            if remaining.get() == 0 {
                let values = results.borrow_mut().iter_mut().map(|o| o.take().unwrap()).collect();
                next.settle_fulfilled(values);
            }
        });
    }

    deferred.promise
}

/// An already-fulfilled promise.
pub(crate) fn resolve_value<T, E, U>(host: Rc<dyn Host>, value: T) -> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    deferred.promise.settle_fulfilled(value);
    deferred.promise
}

/// An already-rejected promise.
pub(crate) fn reject_value<T, E, U>(host: Rc<dyn Host>, reason: E) -> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    let deferred = Promise::deferred(host);
    deferred.promise.settle_rejected(reason);
    deferred.promise
}

/// A promise that never settles. The neutral element for `race`, and
/// occasionally useful as a placeholder.
pub(crate) fn empty<T, E, U>(host: Rc<dyn Host>) -> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    Promise::deferred(host).promise
}

/// Coerce an arbitrary [`Outcome`] into a trusted [`Promise`] — the
/// uniform entry point for "this might be a value, a rejection, a trusted
/// promise, or an untrusted thenable". Identity if `outcome` is already a
/// trusted promise: unlike [`resolve_value`]/[`reject_value`]/the
/// `Thenable` path, a `Following` outcome is already the promise we'd
/// otherwise construct a new one to adopt, so it is returned unchanged
/// rather than wrapped in another layer of following.
pub(crate) fn cast<T, E, U>(host: Rc<dyn Host>, outcome: Outcome<T, E, U>) -> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    match outcome {
        Outcome::Following(p) => p,
        other => {
            let deferred = Promise::deferred(host);
            deferred.promise.resolve(other);
            deferred.promise
        }
    }
}
