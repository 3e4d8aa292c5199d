//! Coalescing error types
//!
//! `TooLate` is a caller contract violation: the collapsing window already
//! closed. `Failed` and `Panicked` report the outcome of the one execution
//! and are delivered identically to every caller that joined it.

use std::fmt;
use std::sync::Arc;

/// Error returned by [`SingleFlight::get`](super::SingleFlight::get)
#[derive(Debug)]
pub enum CoalescingError<E> {
    /// The coordinator already finished its single execution
    TooLate,
    /// The computation returned an error, shared by all callers
    Failed(Arc<E>),
    /// The computation panicked on the executing thread
    Panicked(String),
}

impl<E> CoalescingError<E> {
    /// Whether this is a join-after-completion error
    pub fn is_too_late(&self) -> bool {
        matches!(self, CoalescingError::TooLate)
    }

    /// The computation's own error, if that is what this is
    pub fn computation_error(&self) -> Option<&Arc<E>> {
        match self {
            CoalescingError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

// Manual impl: `Arc<E>` is cloneable for any `E`.
impl<E> Clone for CoalescingError<E> {
    fn clone(&self) -> Self {
        match self {
            CoalescingError::TooLate => CoalescingError::TooLate,
            CoalescingError::Failed(err) => CoalescingError::Failed(Arc::clone(err)),
            CoalescingError::Panicked(msg) => CoalescingError::Panicked(msg.clone()),
        }
    }
}

impl<E: fmt::Display> fmt::Display for CoalescingError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoalescingError::TooLate => {
                write!(f, "Too late: coalesced request already completed")
            }
            CoalescingError::Failed(err) => write!(f, "Coalesced request failed: {}", err),
            CoalescingError::Panicked(msg) => write!(f, "Coalesced request panicked: {}", msg),
        }
    }
}

impl<E> std::error::Error for CoalescingError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoalescingError::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
