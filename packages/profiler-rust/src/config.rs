use std::time::Duration;

/// Slow-invocation threshold applied when a descriptor does not override it.
pub const DEFAULT_SLOW_INVOCATION_THRESHOLD: Duration = Duration::from_secs(1);

/// Very-slow-invocation threshold applied when a descriptor does not override it.
pub const DEFAULT_VERY_SLOW_INVOCATION_THRESHOLD: Duration = Duration::from_secs(5);

/// How long an admitted-capped call waits for a permit by default.
pub const DEFAULT_ACQUISITION_MAX_WAIT: Duration = Duration::from_millis(100);

/// Resolved per-call configuration for one profiled invocation.
///
/// All dynamic resolution (deriving the name or the concurrency limit from
/// call arguments, configuration files, or runtime expressions) happens before
/// a descriptor is built; the profiler only consumes resolved scalars.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    /// Statistics name the invocation is recorded under.
    pub name: String,
    /// Completed calls at or above this duration count as slow.
    pub slow_invocation_threshold: Duration,
    /// Completed calls at or above this duration count as very slow instead.
    pub very_slow_invocation_threshold: Duration,
    /// Maximum concurrent in-flight calls for this name. Zero disables the
    /// admission gate entirely.
    pub max_active: u32,
    /// Maximum time to wait for an admission permit. Zero means a single
    /// non-blocking attempt.
    pub acquisition_max_wait: Duration,
}

impl CallDescriptor {
    /// Descriptor for `name` with the shipped defaults: slow at 1s, very slow
    /// at 5s, unlimited concurrency, 100ms acquisition wait.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slow_invocation_threshold: DEFAULT_SLOW_INVOCATION_THRESHOLD,
            very_slow_invocation_threshold: DEFAULT_VERY_SLOW_INVOCATION_THRESHOLD,
            max_active: 0,
            acquisition_max_wait: DEFAULT_ACQUISITION_MAX_WAIT,
        }
    }

    /// Sets the concurrency limit (zero disables the gate).
    #[must_use]
    pub fn max_active(mut self, max_active: u32) -> Self {
        self.max_active = max_active;
        self
    }

    /// Sets the slow and very-slow thresholds together.
    #[must_use]
    pub fn thresholds(mut self, slow: Duration, very_slow: Duration) -> Self {
        self.slow_invocation_threshold = slow;
        self.very_slow_invocation_threshold = very_slow;
        self
    }

    /// Sets the admission wait budget.
    #[must_use]
    pub fn acquisition_max_wait(mut self, max_wait: Duration) -> Self {
        self.acquisition_max_wait = max_wait;
        self
    }
}
