//! Floodgate Profiler — named invocation statistics with bulkhead admission
//! control, plus a `tower` middleware adaptation.

pub mod config;
pub mod gate;
pub mod middleware;
pub mod profiler;
pub mod registry;
pub mod statistics;

pub use config::CallDescriptor;
pub use gate::{Admission, AdmissionGate, AdmissionPermit};
pub use middleware::{DescriptorFn, ProfileLayer, ProfileService};
pub use profiler::Profiler;
pub use registry::StatisticsRegistry;
pub use statistics::{ServiceStatistics, StatisticsSnapshot};

// Part of this crate's public contract, defined in floodgate-core.
pub use floodgate_core::fault::{FaultCategory, FaultMatcher, ServiceUnavailable};
