//! Arena storage for the static tree and the current tables.
pub mod currents;
pub mod network;
pub mod registry;
pub mod types;

pub use currents::{Column, EdgeCurrents, EdgeRow, NodeCurrents, NodeRow};
pub use network::Network;
pub use registry::SegmentRegistry;
pub use types::{ComponentId, Pass, SegmentId};
