#[cfg(test)]
mod tests;

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Fixed-capacity admission semaphore bounding in-flight work.
///
/// Acquisition is non-blocking: under overload a request fails immediately
/// instead of queuing, which keeps latency bounded rather than queue depth.
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Slot held for the lifetime of one admitted request.
///
/// Dropping the permit releases the slot, so release happens exactly once on
/// every exit path, including errors.
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Try to claim a slot without waiting.
    #[inline]
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        let acquired = Arc::clone(&self.semaphore).try_acquire_owned();
        match acquired {
            Ok(permit) => Some(AdmissionPermit { _permit: permit }),
            Err(_) => {
                debug!("Concurrency gate at capacity ({})", self.capacity);
                None
            }
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    #[inline]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held by in-flight requests.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}
