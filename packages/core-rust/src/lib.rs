//! Floodgate Core — fault taxonomy, source-chain classification, and
//! operation naming for invocation statistics.

pub mod fault;
pub mod naming;

pub use fault::{chain_contains, classify, FaultCategory, FaultMatcher, ServiceUnavailable};
pub use naming::{qualified_operation_name, validate_statistics_name, NameError, NameStyle};
