//! Checks and summaries that sit beside the partition core.
pub mod topology;
pub mod totals;
