//! Invocation profiling: wraps a unit of work with admission control, timing,
//! and fault classification against a named statistics entry.
//!
//! The profiler drives the whole per-call protocol: fetch-or-create the named
//! entry, re-apply the descriptor's configuration, acquire admission, time the
//! wrapped future, and record the outcome. Exit bookkeeping (active gauge,
//! permit release, completion recording) lives in a drop guard, so it runs on
//! every path out of the call, including panics and cancellation of the
//! caller's future.

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use floodgate_core::fault::{FaultMatcher, ServiceUnavailable};

use crate::config::CallDescriptor;
use crate::gate::{Admission, AdmissionPermit};
use crate::registry::StatisticsRegistry;
use crate::statistics::ServiceStatistics;

// ---------------------------------------------------------------------------
// Profiler
// ---------------------------------------------------------------------------

/// Wraps units of work with per-name statistics and admission control.
///
/// The business/communication matcher lists are fixed at construction and
/// seed every statistics entry this profiler creates; entries can still be
/// re-taxonomized individually through their setters.
pub struct Profiler {
    registry: Arc<StatisticsRegistry>,
    business: Vec<FaultMatcher>,
    communication: Vec<FaultMatcher>,
}

impl Profiler {
    /// Profiler with empty fault taxonomies: every fault classifies as other.
    #[must_use]
    pub fn new(registry: Arc<StatisticsRegistry>) -> Self {
        Self::with_taxonomy(registry, Vec::new(), Vec::new())
    }

    /// Profiler with the given business and communication matcher lists.
    #[must_use]
    pub fn with_taxonomy(
        registry: Arc<StatisticsRegistry>,
        business: Vec<FaultMatcher>,
        communication: Vec<FaultMatcher>,
    ) -> Self {
        Self {
            registry,
            business,
            communication,
        }
    }

    /// Registry this profiler records into.
    #[must_use]
    pub fn registry(&self) -> &Arc<StatisticsRegistry> {
        &self.registry
    }

    /// Run `work` under the statistics entry named by `descriptor`.
    ///
    /// On admission denial the work is never started and a
    /// [`ServiceUnavailable`] error is returned (downcastable for backoff
    /// handling); the denial shows up in the entry's service-unavailable
    /// counter but not in its invocation count. Otherwise the work's own
    /// result is returned unchanged after recording.
    ///
    /// Descriptor configuration is re-applied on every call when it differs
    /// from the entry's current values, so when several call sites share one
    /// name with different descriptors, the last caller wins.
    ///
    /// # Errors
    ///
    /// Returns the work's error after classifying it, a [`ServiceUnavailable`]
    /// on admission denial, or a [`floodgate_core::naming::NameError`] when
    /// the descriptor's name is not a valid export identifier.
    pub async fn profile<T, F, Fut>(
        &self,
        descriptor: &CallDescriptor,
        work: F,
    ) -> anyhow::Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let stats = self.registry.get_or_create(&descriptor.name, || {
            ServiceStatistics::new(
                descriptor.name.clone(),
                self.business.clone(),
                self.communication.clone(),
            )
        })?;
        apply_descriptor(&stats, descriptor);

        let permit = match stats.admit(descriptor.acquisition_max_wait).await {
            Admission::Denied { waited } => {
                let denial = ServiceUnavailable {
                    name: descriptor.name.clone(),
                    max_active: stats.max_active(),
                    waited,
                };
                stats.record_fault(&denial);
                tracing::warn!(
                    service = %descriptor.name,
                    waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    "admission denied"
                );
                return Err(denial.into());
            }
            Admission::Granted(permit) => Some(permit),
            Admission::Unbounded => None,
        };

        stats.record_enter();
        let started = Instant::now();
        let guard = InFlightGuard {
            stats: &stats,
            permit,
            started,
        };

        let result = work().await;
        drop(guard);

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(_) => {
                tracing::debug!(
                    service = %descriptor.name,
                    duration_ms,
                    outcome = "ok",
                    "invocation complete"
                );
            }
            Err(error) => {
                let fault: &(dyn StdError + 'static) = error.as_ref();
                let category = stats.record_fault(fault);
                tracing::debug!(
                    service = %descriptor.name,
                    duration_ms,
                    outcome = category.as_str(),
                    "invocation failed"
                );
            }
        }
        result
    }
}

/// Re-apply descriptor configuration, writing only what actually changed so
/// steady-state traffic never rebuilds the gate or touches config atomics.
fn apply_descriptor(stats: &ServiceStatistics, descriptor: &CallDescriptor) {
    if stats.slow_invocation_threshold() != descriptor.slow_invocation_threshold {
        stats.set_slow_invocation_threshold(descriptor.slow_invocation_threshold);
    }
    if stats.very_slow_invocation_threshold() != descriptor.very_slow_invocation_threshold {
        stats.set_very_slow_invocation_threshold(descriptor.very_slow_invocation_threshold);
    }
    if stats.acquisition_max_wait() != descriptor.acquisition_max_wait {
        stats.set_acquisition_max_wait(descriptor.acquisition_max_wait);
    }
    if stats.max_active() != descriptor.max_active {
        stats.set_max_active(descriptor.max_active);
    }
}

/// Exit bookkeeping for one in-flight invocation. Dropping the guard
/// decrements the active gauge, releases the admission permit, and records
/// the completion, in that order, no matter how the invocation ended.
struct InFlightGuard<'a> {
    stats: &'a ServiceStatistics,
    permit: Option<AdmissionPermit>,
    started: Instant,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.stats.record_exit();
        drop(self.permit.take());
        self.stats.record_completion(self.started.elapsed());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
