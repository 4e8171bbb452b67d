//! Admission gate: bounds concurrent active invocations for one statistics
//! name and tracks acquisition latency.
//!
//! The gate is a counting semaphore with a bounded acquisition wait. Permits
//! are handed out as RAII guards, so a granted admission is always returned to
//! the semaphore that issued it, even if the gate has since been replaced by a
//! reconfiguration or the holding task is cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Outcome of an admission attempt.
#[derive(Debug)]
pub enum Admission {
    /// No gate is configured for the name; entry is unrestricted.
    Unbounded,
    /// A permit was acquired. Dropping the permit releases it.
    Granted(AdmissionPermit),
    /// No permit became available within the wait budget.
    Denied {
        /// Time actually spent waiting before giving up.
        waited: Duration,
    },
}

impl Admission {
    /// Whether the call may proceed.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        !matches!(self, Self::Denied { .. })
    }

    /// Time spent waiting for the decision.
    #[must_use]
    pub fn waited(&self) -> Duration {
        match self {
            Self::Unbounded => Duration::ZERO,
            Self::Granted(permit) => permit.waited(),
            Self::Denied { waited } => *waited,
        }
    }
}

/// RAII admission permit. Dropping it releases the slot back to the gate
/// instance that granted it.
#[derive(Debug)]
pub struct AdmissionPermit {
    // Keeps the granting semaphore alive until release, so a permit obtained
    // from an already-replaced gate still returns to the right place.
    _permit: OwnedSemaphorePermit,
    waited: Duration,
}

impl AdmissionPermit {
    /// Time spent waiting before this permit was granted.
    #[must_use]
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

// ---------------------------------------------------------------------------
// AdmissionGate
// ---------------------------------------------------------------------------

/// Counting semaphore bounding concurrent active invocations.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: u32,
    semaphore: Arc<Semaphore>,
    max_wait_observed_nanos: AtomicU64,
}

impl AdmissionGate {
    /// Create a gate with `capacity` permits. Callers disable gating by not
    /// constructing a gate at all rather than by passing zero.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity as usize)),
            max_wait_observed_nanos: AtomicU64::new(0),
        }
    }

    /// Attempt to acquire a permit, waiting up to `max_wait`.
    ///
    /// A zero `max_wait` makes a single non-blocking attempt. The time spent
    /// waiting is folded into the observed-maximum gauge whether or not the
    /// permit was granted, including waits that exhaust the budget.
    pub async fn try_acquire(&self, max_wait: Duration) -> Admission {
        let start = Instant::now();
        let acquired = if max_wait.is_zero() {
            self.semaphore.clone().try_acquire_owned().ok()
        } else {
            match tokio::time::timeout(max_wait, self.semaphore.clone().acquire_owned()).await {
                // acquire_owned only fails when the semaphore is closed,
                // which this gate never does.
                Ok(result) => result.ok(),
                Err(_elapsed) => None,
            }
        };
        let waited = start.elapsed();
        self.record_wait(waited);
        match acquired {
            Some(permit) => Admission::Granted(AdmissionPermit {
                _permit: permit,
                waited,
            }),
            None => Admission::Denied { waited },
        }
    }

    fn record_wait(&self, waited: Duration) {
        let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
        self.max_wait_observed_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    /// Configured number of permits.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Permits currently available: capacity minus granted-and-unreleased.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// High-water mark of time spent waiting to acquire a permit from this
    /// gate instance.
    #[must_use]
    pub fn max_wait_observed(&self) -> Duration {
        Duration::from_nanos(self.max_wait_observed_nanos.load(Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
