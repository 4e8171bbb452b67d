//! Fault taxonomy and source-chain classification.
//!
//! Errors raised by an instrumented invocation are bucketed into four
//! categories: business (declared expected failures), communication (declared
//! transient/infrastructure failures), service-unavailable (the admission gate
//! rejected the call), and other (everything else).
//!
//! Classification walks the error's [`std::error::Error::source`] chain.
//! Membership in the business/communication categories is decided by
//! [`FaultMatcher`] predicates supplied by the host application; the
//! service-unavailable category is reserved for [`ServiceUnavailable`] raised
//! by the admission gate, and only applies when the raised error itself is of
//! that kind, never a nested cause.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FaultCategory
// ---------------------------------------------------------------------------

/// Category assigned to a fault by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// The admission gate denied the call ([`ServiceUnavailable`]).
    ServiceUnavailable,
    /// A declared transient/infrastructure failure (timeouts, connection errors).
    Communication,
    /// A declared expected-failure category of the application.
    Business,
    /// Anything no matcher claimed.
    Other,
}

impl FaultCategory {
    /// Stable lowercase label, suitable for structured log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "service_unavailable",
            Self::Communication => "communication",
            Self::Business => "business",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FaultMatcher
// ---------------------------------------------------------------------------

/// Predicate over a single node of an error source chain.
///
/// A matcher decides whether one error value belongs to a category. The usual
/// constructor is [`FaultMatcher::of`], which matches a concrete error type by
/// downcast; [`FaultMatcher::new`] accepts an arbitrary predicate for cases
/// where the category is carried by a field rather than a type (e.g. an HTTP
/// status embedded in a shared error enum).
#[derive(Clone)]
pub struct FaultMatcher {
    label: &'static str,
    predicate: Arc<dyn Fn(&(dyn StdError + 'static)) -> bool + Send + Sync>,
}

impl FaultMatcher {
    /// Matcher accepting any error that downcasts to `E`.
    #[must_use]
    pub fn of<E: StdError + 'static>() -> Self {
        Self {
            label: std::any::type_name::<E>(),
            predicate: Arc::new(|error| error.downcast_ref::<E>().is_some()),
        }
    }

    /// Matcher backed by a custom predicate.
    pub fn new(
        label: &'static str,
        predicate: impl Fn(&(dyn StdError + 'static)) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label,
            predicate: Arc::new(predicate),
        }
    }

    /// Whether this matcher accepts the given error node.
    #[must_use]
    pub fn matches(&self, error: &(dyn StdError + 'static)) -> bool {
        (self.predicate)(error)
    }

    /// Human-readable label, typically the matched type's path.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for FaultMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultMatcher")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ServiceUnavailable
// ---------------------------------------------------------------------------

/// Error raised when the admission gate denies a call.
///
/// Callers can downcast to this type to apply backoff. It classifies as
/// [`FaultCategory::ServiceUnavailable`] only when it is the raised error
/// itself; wrapped as a nested cause it is treated like any other error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("service '{name}' unavailable: {max_active} invocations already active, gave up after {waited:?}")]
pub struct ServiceUnavailable {
    /// Name of the statistics entry whose gate denied the call.
    pub name: String,
    /// Configured concurrency limit at the time of denial.
    pub max_active: u32,
    /// Time actually spent waiting for a permit before giving up.
    pub waited: Duration,
}

// ---------------------------------------------------------------------------
// Chain walking & classification
// ---------------------------------------------------------------------------

/// Returns `true` if the error or one of its transitive sources is accepted
/// by any of the given matchers.
///
/// The walk starts at the error itself and follows `source()` links. A node
/// already visited ends the walk (cyclic source graphs terminate with no
/// match beyond what was found earlier), as does the end of the chain.
#[must_use]
pub fn chain_contains(error: &(dyn StdError + 'static), matchers: &[FaultMatcher]) -> bool {
    let mut visited: Vec<*const ()> = Vec::new();
    let mut current = Some(error);
    while let Some(node) = current {
        let node_id = std::ptr::from_ref(node).cast::<()>();
        if visited.contains(&node_id) {
            // Cycle in the source graph.
            return false;
        }
        if matchers.iter().any(|matcher| matcher.matches(node)) {
            return true;
        }
        visited.push(node_id);
        current = node.source();
    }
    false
}

/// Classify a raised error into a [`FaultCategory`].
///
/// Order of precedence:
/// 1. the raised error itself is [`ServiceUnavailable`] (sources are not
///    consulted for this category),
/// 2. any node in the source chain matches `communication`,
/// 3. any node in the source chain matches `business`,
/// 4. otherwise [`FaultCategory::Other`].
///
/// The communication scan of the whole chain runs before the business scan,
/// so a business-typed error caused by a communication-typed error counts as
/// communication.
#[must_use]
pub fn classify(
    error: &(dyn StdError + 'static),
    business: &[FaultMatcher],
    communication: &[FaultMatcher],
) -> FaultCategory {
    let category = if error.downcast_ref::<ServiceUnavailable>().is_some() {
        FaultCategory::ServiceUnavailable
    } else if chain_contains(error, communication) {
        FaultCategory::Communication
    } else if chain_contains(error, business) {
        FaultCategory::Business
    } else {
        FaultCategory::Other
    };
    tracing::trace!(category = category.as_str(), error = %error, "classified fault");
    category
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use proptest::prelude::*;

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

    fn business_matchers() -> Vec<FaultMatcher> {
        vec![
            FaultMatcher::of::<FirstBusinessError>(),
            FaultMatcher::of::<SecondBusinessError>(),
        ]
    }

    fn communication_matchers() -> Vec<FaultMatcher> {
        vec![FaultMatcher::of::<ConnectTimeout>()]
    }

    /// Test error whose cause can be set after construction, allowing cyclic
    /// source graphs to be tied together.
    #[derive(Debug)]
    struct ChainLink {
        label: u8,
        cause: OnceLock<Arc<ChainLink>>,
    }

    impl ChainLink {
        fn new(label: u8) -> Arc<Self> {
            Arc::new(Self {
                label,
                cause: OnceLock::new(),
            })
        }
    }

    impl fmt::Display for ChainLink {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "chain link {}", self.label)
        }
    }

    impl StdError for ChainLink {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.cause
                .get()
                .map(|cause| cause.as_ref() as &(dyn StdError + 'static))
        }
    }

    fn label_matcher(wanted: u8) -> FaultMatcher {
        FaultMatcher::new("chain-link-label", move |error| {
            error
                .downcast_ref::<ChainLink>()
                .is_some_and(|link| link.label == wanted)
        })
    }

    #[test]
    fn chain_contains_false_when_no_node_matches() {
        let err = FirstBusinessError {
            cause: Some(ConnectTimeout),
        };
        assert!(!chain_contains(
            &err,
            &[FaultMatcher::of::<ConstraintViolation>()]
        ));
    }

    #[test]
    fn chain_contains_finds_nested_source() {
        let err = FirstBusinessError {
            cause: Some(ConnectTimeout),
        };
        assert!(chain_contains(&err, &communication_matchers()));
    }

    #[test]
    fn chain_contains_terminates_on_cycle_without_match() {
        let parent = ChainLink::new(1);
        let child = ChainLink::new(2);
        parent.cause.set(child.clone()).unwrap();
        child.cause.set(parent.clone()).unwrap();

        let head: &(dyn StdError + 'static) = parent.as_ref();
        assert!(!chain_contains(head, &[label_matcher(9)]));
    }

    #[test]
    fn chain_contains_finds_match_before_cycle_closes() {
        let parent = ChainLink::new(1);
        let child = ChainLink::new(2);
        parent.cause.set(child.clone()).unwrap();
        child.cause.set(parent.clone()).unwrap();

        let head: &(dyn StdError + 'static) = parent.as_ref();
        assert!(chain_contains(head, &[label_matcher(2)]));
    }

    #[test]
    fn classify_buckets_each_category() {
        let business = business_matchers();
        let communication = communication_matchers();

        let first = FirstBusinessError { cause: None };
        assert_eq!(
            classify(&first, &business, &communication),
            FaultCategory::Business
        );
        assert_eq!(
            classify(&SecondBusinessError, &business, &communication),
            FaultCategory::Business
        );
        assert_eq!(
            classify(&ConnectTimeout, &business, &communication),
            FaultCategory::Communication
        );
        assert_eq!(
            classify(&ConstraintViolation, &business, &communication),
            FaultCategory::Other
        );
    }

    #[test]
    fn business_error_caused_by_communication_classifies_as_communication() {
        let err = FirstBusinessError {
            cause: Some(ConnectTimeout),
        };
        assert_eq!(
            classify(&err, &business_matchers(), &communication_matchers()),
            FaultCategory::Communication
        );
    }

    #[test]
    fn service_unavailable_only_matches_outermost() {
        let denial = ServiceUnavailable {
            name: "checkout".to_string(),
            max_active: 4,
            waited: Duration::from_millis(100),
        };
        assert_eq!(
            classify(&denial, &business_matchers(), &communication_matchers()),
            FaultCategory::ServiceUnavailable
        );

        // Wrapped as a cause, the denial no longer claims the category.
        let wrapped = anyhow::Error::new(denial).context("calling checkout");
        let outer: &(dyn StdError + 'static) = &*wrapped;
        assert_eq!(
            classify(outer, &business_matchers(), &communication_matchers()),
            FaultCategory::Other
        );
    }

    #[test]
    fn classify_walks_anyhow_context_layers() {
        let err = anyhow::Error::new(ConnectTimeout)
            .context("fetching rates")
            .context("processing payment");
        let outer: &(dyn StdError + 'static) = &*err;
        assert_eq!(
            classify(outer, &business_matchers(), &communication_matchers()),
            FaultCategory::Communication
        );
    }

    #[test]
    fn matcher_debug_shows_label_only() {
        let matcher = FaultMatcher::of::<ConnectTimeout>();
        let rendered = format!("{matcher:?}");
        assert!(rendered.contains("ConnectTimeout"));
    }

    proptest! {
        /// The walk terminates and finds a marked node exactly when one
        /// exists, for arbitrary chain shapes, with or without a cycle from
        /// the tail back to the head.
        #[test]
        fn chain_walk_terminates(labels in prop::collection::vec(0u8..4, 1..12), close_cycle: bool) {
            let links: Vec<Arc<ChainLink>> = labels.iter().map(|&label| ChainLink::new(label)).collect();
            for window in links.windows(2) {
                window[0].cause.set(window[1].clone()).unwrap();
            }
            if close_cycle && links.len() > 1 {
                links.last().unwrap().cause.set(links[0].clone()).unwrap();
            }

            let head: &(dyn StdError + 'static) = links[0].as_ref();
            let expected = labels.contains(&0);
            prop_assert_eq!(chain_contains(head, &[label_matcher(0)]), expected);
        }
    }
}
