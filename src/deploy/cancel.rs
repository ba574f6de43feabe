// ABOUTME: Cooperative cancellation for in-flight release transactions.
// ABOUTME: Checked between phases only; a running phase is never interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation flag shared between the caller and a running transaction.
///
/// Cancelling before the pending record is written aborts with no side
/// effects; cancelling after promotion is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
