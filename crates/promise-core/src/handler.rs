//! The internal settlement state machine shared by every [`Promise`].
//!
//! [`Promise`]: crate::promise::Promise

/// A point-in-time snapshot of a promise's settlement, as returned by
/// `inspect`. Unlike the internal [`State`], this is public and has no
/// notion of "resolution already in progress" — from the outside, a
/// promise that is following another trusted promise is indistinguishable
/// from one that is simply still pending.
#[derive(Debug, Clone)]
pub enum Settlement<T, E> {
    /// Not yet fulfilled or rejected.
    Pending,
    /// Fulfilled with a value.
    Fulfilled(T),
    /// Rejected with a reason.
    Rejected(E),
}

impl<T, E> Settlement<T, E> {
    /// True if this snapshot is [`Settlement::Pending`].
    pub fn is_pending(&self) -> bool {
        matches!(self, Settlement::Pending)
    }

    /// True if this snapshot is [`Settlement::Fulfilled`].
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    /// True if this snapshot is [`Settlement::Rejected`].
    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }
}

/// Internal terminal state. `Pending` covers both "never resolved" and
/// "resolution started but still following a trusted promise or assimilating
/// a thenable" — the latter never needs its own tag because the promise
/// doing the following already enforces the settle-once guard via
/// [`PromiseInner::locked`](crate::promise::PromiseInner).
pub(crate) enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

/// A one-shot reaction registered by `then`: invoked exactly once, with the
/// parent's final `Result<T, E>`, when the parent settles. Type-erased over
/// whatever downstream promise type `then` produced, so `PromiseInner<T, E,
/// U>` can hold a homogeneous list of these regardless of how many
/// differently-typed `.then()` chains are hanging off of it.
pub(crate) type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>)>;

/// A progress listener registered by `progress`/`notify`. Unlike a
/// [`Reaction`], this can fire any number of times while the promise is
/// pending, so it is shared (`Rc`) rather than consumed on first use.
pub(crate) type ProgressListener<U> = std::rc::Rc<dyn Fn(U)>;
