//! Partition engine, time-step driver and their result types.
pub mod driver;
pub mod error;
pub mod partition;
pub mod result;

pub use driver::{PartitionReport, PartitionRequest, Partitioner, StepFailure};
pub use error::PartitionError;
pub use partition::PartitionEngine;
pub use result::ResultTable;
