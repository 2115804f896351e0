//! Scoped processing-mode override.

use prism_domain::ProcessingMode;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) fn lock_mode(slot: &Mutex<ProcessingMode>) -> MutexGuard<'_, ProcessingMode> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Swaps the active mode on construction and restores the prior mode on
/// drop, including drops during unwinding.
///
/// Not reentrant: two overlapping guards on one slot restore in drop order,
/// so concurrent overriding calls must be serialized per orchestrator.
pub struct ModeGuard<'a> {
    slot: &'a Mutex<ProcessingMode>,
    prior: ProcessingMode,
}

impl<'a> ModeGuard<'a> {
    pub fn acquire(slot: &'a Mutex<ProcessingMode>, mode: ProcessingMode) -> Self {
        let mut current = lock_mode(slot);
        let prior = *current;
        *current = mode;
        Self { slot, prior }
    }

    pub fn prior(&self) -> ProcessingMode {
        self.prior
    }
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        *lock_mode(self.slot) = self.prior;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restores_on_scope_exit() {
        let slot = Mutex::new(ProcessingMode::Route);
        {
            let guard = ModeGuard::acquire(&slot, ProcessingMode::Collaborate);
            assert_eq!(guard.prior(), ProcessingMode::Route);
            assert_eq!(*lock_mode(&slot), ProcessingMode::Collaborate);
        }
        assert_eq!(*lock_mode(&slot), ProcessingMode::Route);
    }

    #[test]
    fn test_restores_on_panic() {
        let slot = Mutex::new(ProcessingMode::Coordinate);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ModeGuard::acquire(&slot, ProcessingMode::Route);
            panic!("dispatch blew up");
        }));
        assert!(outcome.is_err());
        assert_eq!(*lock_mode(&slot), ProcessingMode::Coordinate);
    }
}
