//! Minimal cooperative cancellation token (§5). Checked at every suspension
//! point: upstream receive, event send, and between ledgers/operations.
//! Deliberately smaller than a `CancellationToken` crate dependency since
//! the only operation any component needs is "has this been cancelled".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
