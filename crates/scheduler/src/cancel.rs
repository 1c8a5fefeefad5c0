//! Cancellation tokens for in-flight renders
//!
//! A render that suspends on an asynchronous page rasterization can be
//! superseded before it resumes (document replaced, rotation changed).
//! The view hands a token to the render and cancels it on reset; the render
//! checks the token when it resumes and discards its output.

use std::cell::Cell;
use std::rc::Rc;

/// Cancellation token for cooperative render cancellation
///
/// Clones share the same underlying flag, so the view can keep one handle
/// while the render future holds another.
///
/// # Example
///
/// ```
/// use thumbstrip_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let render_token = token.clone();
///
/// token.cancel();
/// assert!(render_token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Check if `cancel()` has been called on this token or any clone
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Check whether two handles share the same flag
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Rc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}
