//! Cooperative cancellation flag shared between a caller and a running solve.
//!
//! A thin `Arc<AtomicBool>` wrapper: the caller holds a handle and flips it
//! from wherever a cancel request originates (a signal handler, an HTTP
//! request drop, a UI "stop" button), the solver polls it between retry
//! iterations. No runtime, no channel, no async — the same "caller owns a
//! flag, library polls it" shape as [`Clock`](crate::Clock) for injected
//! time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to a single cancellation flag. Cloning shares the same
/// underlying flag; it does not create an independent one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
