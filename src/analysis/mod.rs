//! Analysis modules.
//!
//! Aggregation of a loaded table into portfolio, company and sector
//! statistics, risk flags, and the self-test integrity checks.

pub mod aggregator;
pub mod integrity;

pub use aggregator::*;
pub use integrity::integrity_checks;
