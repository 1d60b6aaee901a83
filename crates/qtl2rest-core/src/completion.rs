//! Who answers a request.
//!
//! A request is answered either by its handler or, when the transport stops
//! waiting, by the transport itself. Exactly one side wins; the loser must
//! not log or report the request again.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const PENDING: u8 = 0;
const ANSWERED: u8 = 1;
const ABANDONED: u8 = 2;

/// Shared answered/abandoned state of one request.
///
/// Clones observe the same state.
///
/// # Example
///
/// ```
/// use qtl2rest_core::Completion;
///
/// let completion = Completion::new();
/// let worker = completion.clone();
///
/// assert!(completion.abandon());
/// assert!(!worker.claim());
/// assert!(worker.is_abandoned());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Completion(Arc<AtomicU8>);

impl Completion {
    /// Creates a pending completion.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request answered by its handler.
    ///
    /// Returns `false` if the request was already answered or abandoned.
    pub fn claim(&self) -> bool {
        self.transition(ANSWERED)
    }

    /// Marks the request abandoned by the transport.
    ///
    /// Returns `false` if the handler answered first.
    pub fn abandon(&self) -> bool {
        self.transition(ABANDONED)
    }

    /// Whether the transport gave up on the request.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::Acquire) == ABANDONED
    }

    fn transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
