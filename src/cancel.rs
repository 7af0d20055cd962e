use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::AsmLensError;

/// Cooperative cancellation flag shared between a request and whoever may
/// abort it. Cloning shares the flag.
///
/// Checked between files and patterns, never mid-line.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        // No data rides on the flag.
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the flag is set, for use with `?`.
    pub fn check(&self) -> Result<(), AsmLensError> {
        if self.is_cancelled() {
            Err(AsmLensError::Cancelled)
        } else {
            Ok(())
        }
    }
}
