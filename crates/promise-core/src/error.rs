//! Errors the promise core itself can raise, as opposed to rejection values
//! supplied by user code.

use thiserror::Error;

/// A failure the handler state machine synthesizes internally.
///
/// This is distinct from `E`, the user's own rejection-reason type: a
/// promise rejects with a `PromiseError` only when something about the
/// *machinery* went wrong (a promise resolved with itself, a timer elapsed)
/// rather than because user code called `reject`. Call sites that can
/// produce one of these require `E: From<PromiseError>` so the value can be
/// folded into the caller's own error type without every promise in the
/// crate paying for the bound.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromiseError {
    /// A promise was resolved with itself, directly or through a chain of
    /// `Following` links. The spec requires this to reject rather than
    /// deadlock or loop forever.
    #[error("a promise cannot be resolved with itself")]
    SelfResolution,

    /// A `timeout` combinator's deadline elapsed before the underlying
    /// promise settled.
    #[error("promise timed out after {after_ms}ms")]
    Timeout {
        /// The timeout duration that elapsed, in milliseconds.
        after_ms: u64,
    },

    /// An `unfold`/`iterate` anamorphism, or a `Following` chain, exceeded
    /// the maximum permitted recursion depth without settling.
    #[error("exceeded maximum recursion depth of {limit}")]
    MaxRecursionDepth {
        /// The configured limit that was exceeded.
        limit: usize,
    },
}
