//! Classification of "the thing a `then` callback (or a [`Deferred`]) hands
//! back to the machinery", and the trusted/untrusted split that the
//! resolution algorithm acts on.
//!
//! [`Deferred`]: crate::promise::Deferred

use crate::promise::Promise;

/// An untrusted thenable: something that merely *looks* like a promise
/// because it exposes a `then` method, as opposed to a [`Promise`] produced
/// by this crate. Untrusted thenables are assimilated defensively — their
/// `then` is always invoked from inside a host microtask, never inline, so
/// a thenable that calls back synchronously, calls back twice, or panics
/// cannot desynchronize the handler state machine from its settle-once
/// invariant.
///
/// `self: Box<Self>` lets the resolution algorithm move a boxed trait
/// object out of an [`Outcome::Thenable`] to call this exactly once.
pub trait Thenable<T, E, U = ()> {
    /// Subscribe to this thenable's eventual settlement. Implementations
    /// must call at most one of `on_fulfilled`/`on_rejected`, at most once.
    /// The resolution algorithm does not rely on that guarantee for
    /// soundness (callers are always invoked from a deferred microtask,
    /// and the target promise ignores a second settlement), but well
    /// behaved thenables should still honor it.
    fn then(
        self: Box<Self>,
        on_fulfilled: Box<dyn FnOnce(T)>,
        on_rejected: Box<dyn FnOnce(E)>,
    );

    /// Optional progress notification. Default: thenables that don't know
    /// about progress simply never call this.
    #[allow(unused_variables)]
    fn on_progress(&self, listener: Box<dyn FnOnce(U)>) {}
}

/// What a resolution attempt (a `Deferred::resolve`, or the value a `then`
/// callback returns) classifies as.
///
/// This is the Rust-native stand-in for the dynamic `getHandler(x)`
/// classification used by dynamically typed promise implementations: there
/// is no structural `.then` duck-typing here, only this closed, explicit
/// enum. Callbacks and `resolve` calls build one of these directly instead
/// of handing back an arbitrary value for the resolver to inspect.
pub enum Outcome<T, E, U = ()> {
    /// A plain value: fulfill with it directly.
    Value(T),
    /// A plain rejection reason: reject with it directly.
    Rejected(E),
    /// A trusted promise from this same crate: adopt its eventual state.
    /// Self-following (resolving a promise with itself, directly or through
    /// a chain) is detected and turned into a
    /// [`PromiseError::SelfResolution`](crate::error::PromiseError::SelfResolution)
    /// rejection.
    Following(Promise<T, E, U>),
    /// An untrusted thenable: assimilate it asynchronously.
    Thenable(Box<dyn Thenable<T, E, U>>),
}

impl<T, E, U> Outcome<T, E, U> {
    /// Build a [`Outcome::Value`].
    pub fn value(v: T) -> Self {
        Outcome::Value(v)
    }

    /// Build a [`Outcome::Rejected`].
    pub fn rejected(e: E) -> Self {
        Outcome::Rejected(e)
    }

    /// Build a [`Outcome::Following`].
    pub fn following(p: Promise<T, E, U>) -> Self {
        Outcome::Following(p)
    }

    /// Build a [`Outcome::Thenable`].
    pub fn thenable(t: impl Thenable<T, E, U> + 'static) -> Self {
        Outcome::Thenable(Box::new(t))
    }
}
