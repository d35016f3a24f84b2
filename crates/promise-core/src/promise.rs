//! The promise type itself: construction, the primitive `then`, inspection,
//! and the sugar derived from `then` (catch, tap, finally, ...).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use promise_host::Host;

use crate::error::PromiseError;
use crate::handler::{ProgressListener, Reaction, Settlement, State};
use crate::outcome::Outcome;

pub(crate) struct PromiseInner<T, E, U> {
    host: Rc<dyn Host>,
    state: RefCell<State<T, E>>,
    /// Set as soon as a resolution has been *initiated* — including a
    /// `Following`/`Thenable` resolution that hasn't actually settled the
    /// state yet. Guards the "a promise may be resolved only once" rule
    /// independently of `state`, since `state` stays `Pending` for the
    /// whole time a trusted promise is being followed.
    locked: Cell<bool>,
    reactions: RefCell<Vec<Reaction<T, E>>>,
    progress: RefCell<Vec<ProgressListener<U>>>,
}

/// A deterministic, single-threaded future value.
///
/// Cloning a `Promise` is cheap (an `Rc` bump) and all clones refer to the
/// same underlying settlement — there is no split-brain between them.
pub struct Promise<T, E, U = ()> {
    pub(crate) inner: Rc<PromiseInner<T, E, U>>,
}

impl<T, E, U> Clone for Promise<T, E, U> {
    fn clone(&self) -> Self {
        Promise {
            inner: self.inner.clone(),
        }
    }
}

/// The resolver half of a promise: the capability to fulfill, reject, or
/// report progress on the [`Promise`] it guards. Kept separate from
/// `Promise` itself so that a producer can hold the write capability while
/// only handing consumers the read-only promise.
pub struct Deferred<T, E, U = ()> {
    promise: Promise<T, E, U>,
}

impl<T: 'static, E: 'static, U: 'static> Promise<T, E, U> {
    /// Create a new, unsettled promise together with its resolver.
    pub fn deferred(host: Rc<dyn Host>) -> Deferred<T, E, U> {
        Deferred {
            promise: Promise {
                inner: Rc::new(PromiseInner {
                    host,
                    state: RefCell::new(State::Pending),
                    locked: Cell::new(false),
                    reactions: RefCell::new(Vec::new()),
                    progress: RefCell::new(Vec::new()),
                }),
            },
        }
    }
}

impl<T, E, U> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static,
    U: Clone + 'static,
{
    /// Register a one-shot reaction for this promise's eventual settlement.
    /// If already settled, the reaction still only runs after the current
    /// call stack unwinds (never synchronously with registration).
    pub(crate) fn subscribe(&self, reaction: impl FnOnce(Result<T, E>) + 'static) {
        match &*self.inner.state.borrow() {
            State::Pending => {
                self.inner.reactions.borrow_mut().push(Box::new(reaction));
            }
            State::Fulfilled(v) => {
                let v = v.clone();
                self.inner.host.enqueue(Box::new(move || reaction(Ok(v))));
            }
            State::Rejected(e) => {
                let e = e.clone();
                self.inner.host.enqueue(Box::new(move || reaction(Err(e))));
            }
        }
    }

    /// The host this promise was created against. Combinators that need to
    /// construct auxiliary promises (`spread`, `concat`, `delay`, `timeout`)
    /// read it from here rather than threading a `Host` through every call.
    pub(crate) fn inner_host(&self) -> Rc<dyn Host> {
        self.inner.host.clone()
    }

    /// Snapshot this promise's current settlement. Never blocks; a pending
    /// promise simply reports `Settlement::Pending`.
    pub fn inspect(&self) -> Settlement<T, E> {
        match &*self.inner.state.borrow() {
            State::Pending => Settlement::Pending,
            State::Fulfilled(v) => Settlement::Fulfilled(v.clone()),
            State::Rejected(e) => Settlement::Rejected(e.clone()),
        }
    }

    pub(crate) fn settle_fulfilled(&self, value: T) {
        {
            let mut state = self.inner.state.borrow_mut();
            if !matches!(*state, State::Pending) {
                return;
            }
            *state = State::Fulfilled(value.clone());
        }
        self.inner.progress.borrow_mut().clear();
        let reactions: Vec<_> = self.inner.reactions.borrow_mut().drain(..).collect();
        for reaction in reactions {
            let value = value.clone();
            self.inner.host.enqueue(Box::new(move || reaction(Ok(value))));
        }
    }

    pub(crate) fn settle_rejected(&self, reason: E) {
        {
            let mut state = self.inner.state.borrow_mut();
            if !matches!(*state, State::Pending) {
                return;
            }
            *state = State::Rejected(reason.clone());
        }
        self.inner.progress.borrow_mut().clear();
        let reactions: Vec<_> = self.inner.reactions.borrow_mut().drain(..).collect();
        for reaction in reactions {
            let reason = reason.clone();
            self.inner.host.enqueue(Box::new(move || reaction(Err(reason))));
        }
    }

    /// Assimilate an untrusted thenable. Its `then` is invoked from inside
    /// a deferred microtask, never inline with this call, so a thenable
    /// that settles synchronously, settles twice, or panics cannot
    /// desynchronize this promise's settle-once guarantee (`settle_*`
    /// already ignore a second settlement).
    pub(crate) fn assimilate(&self, thenable: Box<dyn crate::outcome::Thenable<T, E, U>>) {
        let on_fulfilled_target = self.clone();
        let on_rejected_target = self.clone();
        self.inner.host.enqueue(Box::new(move || {
            thenable.then(
                Box::new(move |v| on_fulfilled_target.settle_fulfilled(v)),
                Box::new(move |e| on_rejected_target.settle_rejected(e)),
            );
        }));
    }

    /// Broadcast a progress value to every listener currently registered,
    /// each invoked from its own deferred microtask. No-op once settled.
    pub(crate) fn notify(&self, progress: U) {
        if !matches!(*self.inner.state.borrow(), State::Pending) {
            return;
        }
        let listeners: Vec<_> = self.inner.progress.borrow().clone();
        for listener in listeners {
            let progress = progress.clone();
            self.inner
                .host
                .enqueue(Box::new(move || listener(progress)));
        }
    }

    /// Register a progress listener directly on this promise. Has no
    /// effect once this promise has settled, since progress is only
    /// meaningful before a final value exists. This is the plumbing
    /// `then`/`delay` use to forward a parent's progress to whatever they
    /// derive; see [`Promise::progress`] for the public, `then`-shaped
    /// surface.
    pub(crate) fn add_progress_listener(&self, listener: impl Fn(U) + 'static) {
        if matches!(*self.inner.state.borrow(), State::Pending) {
            self.inner.progress.borrow_mut().push(Rc::new(listener));
        }
    }

    /// Terminal consumer: the fatal-commit operation. Unlike `then`, this
    /// does not produce a new promise. An unhandled rejection is logged
    /// twice — once synchronously with the reaction, once again from a
    /// freshly enqueued task — before `on_rejected` runs, so the failure is
    /// still visible in a host whose logger drops or swallows the first
    /// call (e.g. one that only flushes on its own microtask boundary).
    pub fn done(
        &self,
        on_fulfilled: impl FnOnce(T) + 'static,
        on_rejected: impl FnOnce(E) + 'static,
    ) where
        E: std::fmt::Debug,
    {
        let host = self.inner.host.clone();
        self.subscribe(move |result| match result {
            Ok(v) => on_fulfilled(v),
            Err(e) => {
                log::error!("unhandled promise rejection: {:?}", e);
                let e_async = e.clone();
                host.enqueue(Box::new(move || {
                    log::error!("unhandled promise rejection: {:?}", e_async);
                }));
                on_rejected(e);
            }
        });
    }
}

impl<T, E, U> Promise<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// Resolve this promise's underlying settlement with an [`Outcome`].
    /// A no-op if this promise has already begun resolving. Resolving with
    /// a `Following(self)` (directly, or via a chain) rejects with
    /// [`PromiseError::SelfResolution`] instead of deadlocking.
    pub(crate) fn resolve(&self, outcome: Outcome<T, E, U>) {
        if self.inner.locked.get() {
            return;
        }
        self.inner.locked.set(true);
        match outcome {
            Outcome::Value(v) => self.settle_fulfilled(v),
            Outcome::Rejected(e) => self.settle_rejected(e),
            Outcome::Following(p) => self.follow(p),
            Outcome::Thenable(t) => self.assimilate(t),
        }
    }

    fn follow(&self, other: Promise<T, E, U>) {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            self.settle_rejected(E::from(PromiseError::SelfResolution));
            return;
        }
        let target = self.clone();
        other.subscribe(move |result| match result {
            Ok(v) => target.settle_fulfilled(v),
            Err(e) => target.settle_rejected(e),
        });
    }

    /// The primitive every other combinator is built from: register
    /// reactions for both outcomes and produce the promise that settles
    /// with whatever they return. Progress updates from `self` are
    /// forwarded to the derived promise unchanged; use
    /// [`Promise::then_with_progress`] for the full `then(onF, onR, onP)`
    /// primitive that can transform them in transit.
    pub fn then<T2, E2>(
        &self,
        on_fulfilled: impl FnOnce(T) -> Outcome<T2, E2, U> + 'static,
        on_rejected: impl FnOnce(E) -> Outcome<T2, E2, U> + 'static,
    ) -> Promise<T2, E2, U>
    where
        T2: Clone + 'static,
        E2: Clone + 'static + From<PromiseError>,
    {
        self.then_with_progress(on_fulfilled, on_rejected, |u| u)
    }

    /// The full three-argument `then`: like [`Promise::then`], but every
    /// progress update forwarded from `self` is first passed through
    /// `on_progress` before the derived promise re-broadcasts it to its own
    /// listeners. Progress emitted after `self` settles is dropped, same as
    /// any other post-settlement progress.
    pub fn then_with_progress<T2, E2>(
        &self,
        on_fulfilled: impl FnOnce(T) -> Outcome<T2, E2, U> + 'static,
        on_rejected: impl FnOnce(E) -> Outcome<T2, E2, U> + 'static,
        on_progress: impl Fn(U) -> U + 'static,
    ) -> Promise<T2, E2, U>
    where
        T2: Clone + 'static,
        E2: Clone + 'static + From<PromiseError>,
    {
        let deferred = Promise::deferred(self.inner.host.clone());
        let next = deferred.promise.clone();
        self.subscribe(move |result| {
            let outcome = match result {
                Ok(v) => on_fulfilled(v),
                Err(e) => on_rejected(e),
            };
            next.resolve(outcome);
        });
        let next_progress = deferred.promise.clone();
        self.add_progress_listener(move |u| next_progress.notify(on_progress(u)));
        deferred.promise
    }

    /// `progress(fn)` is `then` with only the progress arm supplied:
    /// observe, and optionally transform, progress updates without
    /// altering the eventual fulfillment or rejection.
    pub fn progress(&self, on_progress: impl Fn(U) -> U + 'static) -> Promise<T, E, U> {
        self.then_with_progress(Outcome::Value, Outcome::Rejected, on_progress)
    }

    /// Recover from rejection, possibly into a different rejection type or
    /// by chaining into another trusted promise.
    pub fn catch<E2>(
        &self,
        on_rejected: impl FnOnce(E) -> Outcome<T, E2, U> + 'static,
    ) -> Promise<T, E2, U>
    where
        E2: Clone + 'static + From<PromiseError>,
    {
        self.then(Outcome::Value, on_rejected)
    }

    /// Recover from rejection with a plain fallback value, keeping the
    /// same rejection type for the returned promise (there is nothing left
    /// to reject with once the fallback always succeeds).
    pub fn else_(&self, fallback: impl FnOnce(E) -> T + 'static) -> Promise<T, E, U> {
        self.then(Outcome::Value, move |e| Outcome::Value(fallback(e)))
    }

    /// Replace a fulfillment value unconditionally, passing rejections
    /// through unchanged.
    pub fn yield_<T2>(&self, value: T2) -> Promise<T2, E, U>
    where
        T2: Clone + 'static,
    {
        self.then(move |_| Outcome::Value(value), Outcome::Rejected)
    }

    /// Run a side effect on fulfillment without changing the value.
    pub fn tap(&self, f: impl FnOnce(&T) + 'static) -> Promise<T, E, U> {
        self.then(
            move |v| {
                f(&v);
                Outcome::Value(v)
            },
            Outcome::Rejected,
        )
    }

    /// Unconditionally reject with `reason` if this promise fulfills;
    /// passes an existing rejection through unchanged.
    pub fn throw_(&self, reason: E) -> Promise<T, E, U> {
        self.then(move |_| Outcome::Rejected(reason), Outcome::Rejected)
    }

    /// Run a side effect regardless of how this promise settles, without
    /// altering the settlement itself.
    pub fn finally_(&self, f: impl Fn() + 'static) -> Promise<T, E, U> {
        let f = Rc::new(f);
        let f_ok = f.clone();
        let f_err = f;
        self.then(
            move |v| {
                f_ok();
                Outcome::Value(v)
            },
            move |e| {
                f_err();
                Outcome::Rejected(e)
            },
        )
    }
}

impl<T, E, U> Deferred<T, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// A clone of the promise this resolver guards.
    pub fn promise(&self) -> Promise<T, E, U> {
        self.promise.clone()
    }

    /// Resolve with an arbitrary [`Outcome`] — a plain value, a rejection,
    /// a trusted promise to follow, or an untrusted thenable to assimilate.
    pub fn resolve(&self, outcome: Outcome<T, E, U>) {
        self.promise.resolve(outcome);
    }

    /// Fulfill directly with a plain value.
    pub fn fulfill(&self, value: T) {
        self.promise.settle_fulfilled(value);
    }

    /// Reject directly with a reason.
    pub fn reject(&self, reason: E) {
        self.promise.settle_rejected(reason);
    }

    /// Broadcast a progress value to every listener currently registered.
    pub fn notify(&self, progress: U) {
        self.promise.notify(progress);
    }
}

impl<T, E, U> Promise<Vec<Promise<T, E, U>>, E, U>
where
    T: Clone + 'static,
    E: Clone + 'static + From<PromiseError>,
    U: Clone + 'static,
{
    /// Once this promise's array of promises has itself fulfilled, wait for
    /// every element to fulfill (via [`all`](crate::combinators::all)) and
    /// hand the collected values to `fn` as a single `Vec` — Rust has no
    /// variadic spread, so a call that would read `fn(...a)` becomes
    /// `fn(a)`.
    pub fn spread<T2>(
        &self,
        on_fulfilled: impl FnOnce(Vec<T>) -> Outcome<T2, E, U> + 'static,
    ) -> Promise<T2, E, U>
    where
        T2: Clone + 'static,
    {
        let host = self.inner_host();
        self.then(
            move |promises| {
                Outcome::Following(
                    crate::combinators::all(host, promises).then(on_fulfilled, Outcome::Rejected),
                )
            },
            Outcome::Rejected,
        )
    }
}
