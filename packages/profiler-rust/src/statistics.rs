//! Named invocation statistics: counters, thresholds, fault classification,
//! and ownership of the admission gate.
//!
//! One `ServiceStatistics` exists per resolved operation name and is shared by
//! every concurrent caller of that name. All counters are independent atomics;
//! no lock is held while recording. Configuration fields are also atomics
//! (written rarely by administrative calls, read on every invocation), except
//! the matcher lists, which sit behind a read-write lock, and the gate, which
//! is swapped wholesale through [`arc_swap`].

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use floodgate_core::fault::{classify, FaultCategory, FaultMatcher};
use floodgate_core::naming::{validate_statistics_name, NameError};

use crate::config::{
    DEFAULT_ACQUISITION_MAX_WAIT, DEFAULT_SLOW_INVOCATION_THRESHOLD,
    DEFAULT_VERY_SLOW_INVOCATION_THRESHOLD,
};
use crate::gate::{Admission, AdmissionGate};

const NANOS_PER_MILLI: u64 = 1_000_000;

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// ServiceStatistics
// ---------------------------------------------------------------------------

/// Aggregated statistics and admission control for one operation name.
pub struct ServiceStatistics {
    name: String,

    business_matchers: RwLock<Vec<FaultMatcher>>,
    communication_matchers: RwLock<Vec<FaultMatcher>>,

    invocation_count: AtomicU64,
    business_fault_count: AtomicU64,
    communication_fault_count: AtomicU64,
    service_unavailable_count: AtomicU64,
    other_fault_count: AtomicU64,
    slow_invocation_count: AtomicU64,
    very_slow_invocation_count: AtomicU64,
    total_duration_nanos: AtomicU64,
    current_active: AtomicU64,

    slow_threshold_nanos: AtomicU64,
    very_slow_threshold_nanos: AtomicU64,
    acquisition_max_wait_nanos: AtomicU64,
    acquisition_latency_max_nanos: AtomicU64,

    configured_max_active: AtomicU32,
    gate: ArcSwapOption<AdmissionGate>,
}

impl ServiceStatistics {
    /// Create statistics for `name` with the given fault matcher lists.
    ///
    /// Thresholds start at the shipped defaults and the admission gate is
    /// disabled until [`set_max_active`](Self::set_max_active) enables it.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] when `name` is not a valid export identifier.
    /// The failure is local to this entry; nothing is registered.
    pub fn new(
        name: impl Into<String>,
        business: Vec<FaultMatcher>,
        communication: Vec<FaultMatcher>,
    ) -> Result<Self, NameError> {
        let name = name.into();
        validate_statistics_name(&name)?;
        Ok(Self {
            name,
            business_matchers: RwLock::new(business),
            communication_matchers: RwLock::new(communication),
            invocation_count: AtomicU64::new(0),
            business_fault_count: AtomicU64::new(0),
            communication_fault_count: AtomicU64::new(0),
            service_unavailable_count: AtomicU64::new(0),
            other_fault_count: AtomicU64::new(0),
            slow_invocation_count: AtomicU64::new(0),
            very_slow_invocation_count: AtomicU64::new(0),
            total_duration_nanos: AtomicU64::new(0),
            current_active: AtomicU64::new(0),
            slow_threshold_nanos: AtomicU64::new(duration_to_nanos(
                DEFAULT_SLOW_INVOCATION_THRESHOLD,
            )),
            very_slow_threshold_nanos: AtomicU64::new(duration_to_nanos(
                DEFAULT_VERY_SLOW_INVOCATION_THRESHOLD,
            )),
            acquisition_max_wait_nanos: AtomicU64::new(duration_to_nanos(
                DEFAULT_ACQUISITION_MAX_WAIT,
            )),
            acquisition_latency_max_nanos: AtomicU64::new(0),
            configured_max_active: AtomicU32::new(0),
            gate: ArcSwapOption::const_empty(),
        })
    }

    /// Operation name this entry aggregates.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // -- recording ----------------------------------------------------------

    /// Mark one invocation as in flight. Every call must be paired with
    /// exactly one [`record_exit`](Self::record_exit).
    pub fn record_enter(&self) {
        self.current_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark one in-flight invocation as finished.
    pub fn record_exit(&self) {
        self.current_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a completed invocation: bumps the invocation count, adds the
    /// duration, and classifies the call as very slow, slow, or neither.
    ///
    /// Called once per completed invocation, on success and failure alike.
    pub fn record_completion(&self, duration: Duration) {
        let nanos = duration_to_nanos(duration);
        self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.invocation_count.fetch_add(1, Ordering::Relaxed);

        if nanos >= self.very_slow_threshold_nanos.load(Ordering::Relaxed) {
            self.very_slow_invocation_count.fetch_add(1, Ordering::Relaxed);
        } else if nanos >= self.slow_threshold_nanos.load(Ordering::Relaxed) {
            self.slow_invocation_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Classify a fault with this entry's matcher lists and bump the matching
    /// category counter.
    pub fn record_fault(&self, error: &(dyn StdError + 'static)) -> FaultCategory {
        let business = self.business_matchers.read();
        let communication = self.communication_matchers.read();
        let category = classify(error, &business, &communication);
        drop(business);
        drop(communication);

        let counter = match category {
            FaultCategory::ServiceUnavailable => &self.service_unavailable_count,
            FaultCategory::Communication => &self.communication_fault_count,
            FaultCategory::Business => &self.business_fault_count,
            FaultCategory::Other => &self.other_fault_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(service = %self.name, category = category.as_str(), "recorded fault");
        category
    }

    // -- admission ----------------------------------------------------------

    /// Request admission, waiting up to `max_wait` for a permit.
    ///
    /// Returns [`Admission::Unbounded`] when no gate is configured. The time
    /// spent waiting (granted or denied) is folded into this entry's
    /// acquisition-latency high-water gauge, which survives gate replacement.
    pub async fn admit(&self, max_wait: Duration) -> Admission {
        let admission = match self.gate.load_full() {
            Some(gate) => gate.try_acquire(max_wait).await,
            None => Admission::Unbounded,
        };
        self.acquisition_latency_max_nanos
            .fetch_max(duration_to_nanos(admission.waited()), Ordering::Relaxed);
        admission
    }

    // -- configuration ------------------------------------------------------

    /// Set the concurrency limit. A positive value installs a fresh gate with
    /// that many permits; zero removes the gate. Permits of a replaced gate
    /// are discarded, but calls already holding one are unaffected: their
    /// permits return to the old semaphore on release.
    pub fn set_max_active(&self, max_active: u32) {
        self.configured_max_active.store(max_active, Ordering::Relaxed);
        if max_active > 0 {
            self.gate.store(Some(Arc::new(AdmissionGate::new(max_active))));
        } else {
            self.gate.store(None);
        }
    }

    /// Configured concurrency limit; zero means unlimited.
    #[must_use]
    pub fn max_active(&self) -> u32 {
        self.configured_max_active.load(Ordering::Relaxed)
    }

    /// Permits currently available, or `None` when the gate is disabled.
    #[must_use]
    pub fn available_permits(&self) -> Option<usize> {
        self.gate.load().as_ref().map(|gate| gate.available_permits())
    }

    /// Replace the business fault matchers.
    pub fn set_business_matchers(&self, matchers: Vec<FaultMatcher>) {
        *self.business_matchers.write() = matchers;
    }

    /// Replace the communication fault matchers.
    pub fn set_communication_matchers(&self, matchers: Vec<FaultMatcher>) {
        *self.communication_matchers.write() = matchers;
    }

    /// Threshold at and above which a completed call counts as slow.
    #[must_use]
    pub fn slow_invocation_threshold(&self) -> Duration {
        Duration::from_nanos(self.slow_threshold_nanos.load(Ordering::Relaxed))
    }

    pub fn set_slow_invocation_threshold(&self, threshold: Duration) {
        self.slow_threshold_nanos
            .store(duration_to_nanos(threshold), Ordering::Relaxed);
    }

    /// Slow threshold in whole milliseconds (truncating).
    #[must_use]
    pub fn slow_invocation_threshold_millis(&self) -> u64 {
        self.slow_threshold_nanos.load(Ordering::Relaxed) / NANOS_PER_MILLI
    }

    pub fn set_slow_invocation_threshold_millis(&self, millis: u64) {
        self.slow_threshold_nanos
            .store(millis.saturating_mul(NANOS_PER_MILLI), Ordering::Relaxed);
    }

    /// Threshold at and above which a completed call counts as very slow.
    #[must_use]
    pub fn very_slow_invocation_threshold(&self) -> Duration {
        Duration::from_nanos(self.very_slow_threshold_nanos.load(Ordering::Relaxed))
    }

    pub fn set_very_slow_invocation_threshold(&self, threshold: Duration) {
        self.very_slow_threshold_nanos
            .store(duration_to_nanos(threshold), Ordering::Relaxed);
    }

    /// Very-slow threshold in whole milliseconds (truncating).
    #[must_use]
    pub fn very_slow_invocation_threshold_millis(&self) -> u64 {
        self.very_slow_threshold_nanos.load(Ordering::Relaxed) / NANOS_PER_MILLI
    }

    pub fn set_very_slow_invocation_threshold_millis(&self, millis: u64) {
        self.very_slow_threshold_nanos
            .store(millis.saturating_mul(NANOS_PER_MILLI), Ordering::Relaxed);
    }

    /// Admission wait budget applied when the caller does not override it.
    #[must_use]
    pub fn acquisition_max_wait(&self) -> Duration {
        Duration::from_nanos(self.acquisition_max_wait_nanos.load(Ordering::Relaxed))
    }

    pub fn set_acquisition_max_wait(&self, max_wait: Duration) {
        self.acquisition_max_wait_nanos
            .store(duration_to_nanos(max_wait), Ordering::Relaxed);
    }

    /// Admission wait budget in whole milliseconds (truncating).
    #[must_use]
    pub fn acquisition_max_wait_millis(&self) -> u64 {
        self.acquisition_max_wait_nanos.load(Ordering::Relaxed) / NANOS_PER_MILLI
    }

    pub fn set_acquisition_max_wait_millis(&self, millis: u64) {
        self.acquisition_max_wait_nanos
            .store(millis.saturating_mul(NANOS_PER_MILLI), Ordering::Relaxed);
    }

    // -- read accessors -----------------------------------------------------

    /// Number of completed invocations.
    #[must_use]
    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.load(Ordering::Relaxed)
    }

    /// Number of faults classified as business.
    #[must_use]
    pub fn business_fault_count(&self) -> u64 {
        self.business_fault_count.load(Ordering::Relaxed)
    }

    /// Number of faults classified as communication.
    #[must_use]
    pub fn communication_fault_count(&self) -> u64 {
        self.communication_fault_count.load(Ordering::Relaxed)
    }

    /// Number of admission denials classified into this entry.
    #[must_use]
    pub fn service_unavailable_count(&self) -> u64 {
        self.service_unavailable_count.load(Ordering::Relaxed)
    }

    /// Number of faults no matcher claimed.
    #[must_use]
    pub fn other_fault_count(&self) -> u64 {
        self.other_fault_count.load(Ordering::Relaxed)
    }

    /// Sum of all four fault category counters.
    #[must_use]
    pub fn total_fault_count(&self) -> u64 {
        self.business_fault_count()
            + self.communication_fault_count()
            + self.other_fault_count()
            + self.service_unavailable_count()
    }

    /// Number of completed calls that crossed the slow threshold only.
    #[must_use]
    pub fn slow_invocation_count(&self) -> u64 {
        self.slow_invocation_count.load(Ordering::Relaxed)
    }

    /// Number of completed calls that crossed the very-slow threshold.
    #[must_use]
    pub fn very_slow_invocation_count(&self) -> u64 {
        self.very_slow_invocation_count.load(Ordering::Relaxed)
    }

    /// Sum of all completed invocation durations.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed))
    }

    /// Total duration in whole milliseconds (truncating).
    #[must_use]
    pub fn total_duration_millis(&self) -> u64 {
        self.total_duration_nanos.load(Ordering::Relaxed) / NANOS_PER_MILLI
    }

    /// Invocations currently in flight.
    #[must_use]
    pub fn current_active(&self) -> u64 {
        self.current_active.load(Ordering::Relaxed)
    }

    /// High-water mark of time spent waiting for admission, across gate
    /// replacements.
    #[must_use]
    pub fn acquisition_latency_max(&self) -> Duration {
        Duration::from_nanos(self.acquisition_latency_max_nanos.load(Ordering::Relaxed))
    }

    /// Point-in-time view of every counter and gauge. Fields are read
    /// independently, so a snapshot taken under load may be momentarily
    /// inconsistent across fields.
    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            name: self.name.clone(),
            invocation_count: self.invocation_count(),
            business_fault_count: self.business_fault_count(),
            communication_fault_count: self.communication_fault_count(),
            service_unavailable_count: self.service_unavailable_count(),
            other_fault_count: self.other_fault_count(),
            total_fault_count: self.total_fault_count(),
            slow_invocation_count: self.slow_invocation_count(),
            very_slow_invocation_count: self.very_slow_invocation_count(),
            total_duration_millis: self.total_duration_millis(),
            current_active: self.current_active(),
            max_active: self.max_active(),
            available_permits: self.available_permits(),
            acquisition_latency_max_millis: self.acquisition_latency_max_nanos.load(Ordering::Relaxed)
                / NANOS_PER_MILLI,
        }
    }
}

impl fmt::Debug for ServiceStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceStatistics")
            .field("name", &self.name)
            .field(
                "slow_invocation_threshold_millis",
                &self.slow_invocation_threshold_millis(),
            )
            .field(
                "very_slow_invocation_threshold_millis",
                &self.very_slow_invocation_threshold_millis(),
            )
            .field("invocation_count", &self.invocation_count())
            .field("current_active", &self.current_active())
            .field("max_active", &self.max_active())
            .field("available_permits", &self.available_permits())
            .field("total_duration_millis", &self.total_duration_millis())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// StatisticsSnapshot
// ---------------------------------------------------------------------------

/// Serializable point-in-time view of a [`ServiceStatistics`] entry, suitable
/// for handing to any metrics backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub name: String,
    pub invocation_count: u64,
    pub business_fault_count: u64,
    pub communication_fault_count: u64,
    pub service_unavailable_count: u64,
    pub other_fault_count: u64,
    pub total_fault_count: u64,
    pub slow_invocation_count: u64,
    pub very_slow_invocation_count: u64,
    pub total_duration_millis: u64,
    pub current_active: u64,
    pub max_active: u32,
    pub available_permits: Option<usize>,
    pub acquisition_latency_max_millis: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use floodgate_core::fault::ServiceUnavailable;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("first business failure")]
    struct FirstBusinessError {
        #[source]
        cause: Option<ConnectTimeout>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("second business failure")]
    struct SecondBusinessError;

    #[derive(Debug, thiserror::Error)]
    #[error("connect timed out")]
    struct ConnectTimeout;

    #[derive(Debug, thiserror::Error)]
    #[error("constraint violation")]
    struct ConstraintViolation;

    #[derive(Debug, thiserror::Error)]
    #[error("unexpected state")]
    struct UnexpectedState;

    fn make_stats() -> ServiceStatistics {
        ServiceStatistics::new(
            "test",
            vec![
                FaultMatcher::of::<FirstBusinessError>(),
                FaultMatcher::of::<SecondBusinessError>(),
            ],
            vec![FaultMatcher::of::<ConnectTimeout>()],
        )
        .unwrap()
    }

    #[test]
    fn invalid_name_fails_construction() {
        let result = ServiceStatistics::new("a:b", Vec::new(), Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn fault_batch_lands_in_expected_categories() {
        let stats = make_stats();

        // Two business faults of distinct types.
        stats.record_fault(&FirstBusinessError { cause: None });
        stats.record_fault(&SecondBusinessError);

        // One communication fault.
        stats.record_fault(&ConnectTimeout);

        // Three unclassified faults.
        stats.record_fault(&ConstraintViolation);
        stats.record_fault(&UnexpectedState);
        stats.record_fault(&std::fmt::Error);

        assert_eq!(stats.business_fault_count(), 2);
        assert_eq!(stats.communication_fault_count(), 1);
        assert_eq!(stats.other_fault_count(), 3);
        assert_eq!(stats.total_fault_count(), 6);
    }

    #[test]
    fn business_fault_caused_by_communication_counts_as_communication() {
        let stats = make_stats();
        stats.record_fault(&FirstBusinessError {
            cause: Some(ConnectTimeout),
        });

        assert_eq!(stats.business_fault_count(), 0);
        assert_eq!(stats.communication_fault_count(), 1);
        assert_eq!(stats.other_fault_count(), 0);
    }

    #[test]
    fn admission_denial_counts_as_service_unavailable() {
        let stats = make_stats();
        stats.record_fault(&ServiceUnavailable {
            name: "test".to_string(),
            max_active: 1,
            waited: Duration::ZERO,
        });

        assert_eq!(stats.service_unavailable_count(), 1);
        assert_eq!(stats.total_fault_count(), 1);
    }

    #[test]
    fn acquisition_max_wait_millis_round_trip() {
        let stats = make_stats();

        stats.set_acquisition_max_wait_millis(100);
        assert_eq!(stats.acquisition_max_wait().as_nanos(), 100_000_000);
        assert_eq!(stats.acquisition_max_wait_millis(), 100);

        stats.set_acquisition_max_wait_millis(250);
        assert_eq!(stats.acquisition_max_wait().as_nanos(), 250_000_000);
        assert_eq!(stats.acquisition_max_wait_millis(), 250);

        stats.set_acquisition_max_wait_millis(5000);
        assert_eq!(stats.acquisition_max_wait().as_nanos(), 5_000_000_000);
        assert_eq!(stats.acquisition_max_wait_millis(), 5000);
    }

    #[test]
    fn acquisition_max_wait_nanos_truncates_to_millis() {
        let stats = make_stats();

        stats.set_acquisition_max_wait(Duration::from_nanos(343_000_000));
        assert_eq!(stats.acquisition_max_wait_millis(), 343);

        stats.set_acquisition_max_wait(Duration::from_nanos(343_999_999));
        assert_eq!(stats.acquisition_max_wait_millis(), 343);
    }

    #[test]
    fn threshold_millis_round_trip() {
        let stats = make_stats();
        stats.set_slow_invocation_threshold_millis(50);
        stats.set_very_slow_invocation_threshold_millis(100);
        assert_eq!(stats.slow_invocation_threshold(), Duration::from_millis(50));
        assert_eq!(
            stats.very_slow_invocation_threshold(),
            Duration::from_millis(100)
        );
        assert_eq!(stats.slow_invocation_threshold_millis(), 50);
        assert_eq!(stats.very_slow_invocation_threshold_millis(), 100);
    }

    #[test]
    fn completion_buckets_are_mutually_exclusive() {
        let stats = make_stats();
        stats.set_slow_invocation_threshold(Duration::from_millis(50));
        stats.set_very_slow_invocation_threshold(Duration::from_millis(100));

        stats.record_completion(Duration::from_millis(75));
        assert_eq!(stats.slow_invocation_count(), 1);
        assert_eq!(stats.very_slow_invocation_count(), 0);

        stats.record_completion(Duration::from_millis(10));
        assert_eq!(stats.slow_invocation_count(), 1);
        assert_eq!(stats.very_slow_invocation_count(), 0);

        stats.record_completion(Duration::from_millis(150));
        assert_eq!(stats.slow_invocation_count(), 1);
        assert_eq!(stats.very_slow_invocation_count(), 1);

        assert_eq!(stats.invocation_count(), 3);
        assert_eq!(stats.total_duration_millis(), 235);
    }

    #[test]
    fn completion_thresholds_are_inclusive() {
        let stats = make_stats();
        stats.set_slow_invocation_threshold(Duration::from_millis(50));
        stats.set_very_slow_invocation_threshold(Duration::from_millis(100));

        stats.record_completion(Duration::from_millis(50));
        assert_eq!(stats.slow_invocation_count(), 1);

        stats.record_completion(Duration::from_millis(100));
        assert_eq!(stats.very_slow_invocation_count(), 1);
        assert_eq!(stats.slow_invocation_count(), 1);
    }

    #[test]
    fn lower_thresholds_route_to_very_slow() {
        let stats = make_stats();
        stats.set_slow_invocation_threshold(Duration::from_millis(25));
        stats.set_very_slow_invocation_threshold(Duration::from_millis(50));

        stats.record_completion(Duration::from_millis(75));
        assert_eq!(stats.very_slow_invocation_count(), 1);
        assert_eq!(stats.slow_invocation_count(), 0);
    }

    #[test]
    fn concurrent_enter_exit_pairs_leave_no_residue() {
        let stats = make_stats();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        stats.record_enter();
                        stats.record_completion(Duration::from_micros(10));
                        stats.record_exit();
                    }
                });
            }
        });

        assert_eq!(stats.invocation_count(), 8000);
        assert_eq!(stats.current_active(), 0);
    }

    #[tokio::test]
    async fn admit_is_unbounded_without_gate() {
        let stats = make_stats();
        assert_eq!(stats.max_active(), 0);
        assert!(stats.available_permits().is_none());

        let admission = stats.admit(Duration::ZERO).await;
        assert!(matches!(admission, Admission::Unbounded));
    }

    #[tokio::test]
    async fn set_max_active_replaces_gate_without_touching_old_permits() {
        let stats = make_stats();
        stats.set_max_active(1);
        assert_eq!(stats.max_active(), 1);
        assert_eq!(stats.available_permits(), Some(1));

        let held = stats.admit(Duration::ZERO).await;
        assert!(held.is_granted());
        assert_eq!(stats.available_permits(), Some(0));

        stats.set_max_active(2);
        assert_eq!(stats.available_permits(), Some(2));

        // Releasing a permit from the replaced gate leaves the new gate alone.
        drop(held);
        assert_eq!(stats.available_permits(), Some(2));
    }

    #[tokio::test]
    async fn zero_max_active_disables_gate() {
        let stats = make_stats();
        stats.set_max_active(4);
        assert_eq!(stats.available_permits(), Some(4));

        stats.set_max_active(0);
        assert!(stats.available_permits().is_none());
        let admission = stats.admit(Duration::ZERO).await;
        assert!(matches!(admission, Admission::Unbounded));
    }

    #[tokio::test(start_paused = true)]
    async fn acquisition_latency_gauge_survives_gate_replacement() {
        let stats = make_stats();
        stats.set_max_active(1);
        let _held = stats.admit(Duration::ZERO).await;

        let denied = stats.admit(Duration::from_secs(1)).await;
        assert!(!denied.is_granted());
        assert!(stats.acquisition_latency_max() >= Duration::from_millis(900));

        stats.set_max_active(5);
        assert!(stats.acquisition_latency_max() >= Duration::from_millis(900));
    }

    #[test]
    fn snapshot_serializes() {
        let stats = make_stats();
        stats.set_max_active(2);
        stats.record_completion(Duration::from_millis(5));

        let snapshot = stats.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["name"], "test");
        assert_eq!(json["invocation_count"], 1);
        assert_eq!(json["max_active"], 2);
        assert_eq!(json["available_permits"], 2);
    }

    #[test]
    fn debug_includes_name_and_counts() {
        let stats = make_stats();
        stats.record_completion(Duration::from_millis(5));
        let rendered = format!("{stats:?}");
        assert!(rendered.contains("\"test\""));
        assert!(rendered.contains("invocation_count: 1"));
    }
}
