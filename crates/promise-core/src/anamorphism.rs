//! `unfold`/`iterate`: build up a promise-driven sequence of steps without
//! growing the call stack, by routing every step through `Promise::subscribe`
//! (which always defers through the host) instead of calling the next step
//! inline.

use std::rc::Rc;

use promise_host::Host;

use crate::error::PromiseError;
use crate::promise::Promise;

/// Repeatedly unspool a seed into a `(value, next seed)` pair — each step
/// possibly asynchronous — calling `handler` with every produced value,
/// until `stop` says the seed is exhausted. Resolves to the final seed once
/// stopped, or rejects as soon as any step's promise rejects.
pub fn unfold<Seed, Value, E, U>(
    host: Rc<dyn Host>,
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
    let deferred = Promise::deferred(host);
    let result = deferred.promise.clone();
    unfold_step(unspool, stop, handler, seed, result);
    deferred.promise
}

fn unfold_step<Seed, Value, E, U>(
    mut unspool: impl FnMut(Seed) -> Promise<(Value, Seed), E, U> + 'static,
    mut stop: impl FnMut(&Seed) -> bool + 'static,
    mut handler: impl FnMut(Value) + 'static,
    seed: Seed,
    result: Promise<Seed, E, U>,
) where
    Seed: Clone + 'static,
    Value: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    if stop(&seed) {
        result.settle_fulfilled(seed);
        return;
    }
    let next = unspool(seed);
    next.subscribe(move |settled| match settled {
        Ok((value, next_seed)) => {
            handler(value);
            unfold_step(unspool, stop, handler, next_seed, result);
        }
        Err(e) => result.settle_rejected(e),
    });
}

/// Repeatedly apply `f` to an initial value — each application possibly
/// asynchronous — calling `handler` with the value produced at every step
/// (including the initial one), until `stop` says to halt. Resolves to the
/// final value once stopped, or rejects as soon as any step's promise
/// rejects.
pub fn iterate<X, E, U>(
    host: Rc<dyn Host>,
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
    let deferred = Promise::deferred(host);
    let result = deferred.promise.clone();
    iterate_step(f, stop, handler, x, result);
    deferred.promise
}

fn iterate_step<X, E, U>(
    mut f: impl FnMut(X) -> Promise<X, E, U> + 'static,
    mut stop: impl FnMut(&X) -> bool + 'static,
    mut handler: impl FnMut(X) + 'static,
    x: X,
    result: Promise<X, E, U>,
) where
    X: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    handler(x.clone());
    if stop(&x) {
        result.settle_fulfilled(x);
        return;
    }
    let next = f(x);
    next.subscribe(move |settled| match settled {
        Ok(next_x) => iterate_step(f, stop, handler, next_x, result),
        Err(e) => result.settle_rejected(e),
    });
}
