//! Per-time-step flow graph and the traversal orders derived from it.
pub mod graph;
pub mod order;

pub use graph::{FlowGraph, Orientation};
pub use order::{plan, PartitionOrder};
