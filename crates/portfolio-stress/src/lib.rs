//! Portfolio stress aggregation
//!
//! Left-merges caller-supplied holdings onto firm crash probabilities and
//! sums weight x probability into a single stress score with a severity
//! tier. Holdings with no probability are excluded from the sum but listed
//! so callers can warn about understated risk.

pub mod aggregator;
pub mod models;
#[cfg(test)]
mod tests;

pub use aggregator::aggregate_stress;
pub use models::*;
