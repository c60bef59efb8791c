//! Failure taxonomy for one (child, parent, time index) unit of work.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    /// Duplicate edge, second parent, self-loop or cycle.
    #[error("Topology violation: {message}")]
    Topology { message: String },

    #[error("Sign precondition violated at segment '{segment}', component '{component}': value {value}")]
    SignPrecondition { segment: String, component: String, value: f64 },

    #[error("Degenerate ratio for pair '{child}' -> '{parent}': subset sums to zero but edge current is {edge_value}")]
    DegenerateRatio { child: String, parent: String, edge_value: f64 },

    #[error("Segment '{0}' is missing from the node current table")]
    MissingSegment(String),

    #[error("No edge current recorded between '{child}' and '{parent}'")]
    MissingEdge { child: String, parent: String },

    #[error("Time index {index} is out of range (table has {available} columns)")]
    MissingTimeIndex { index: usize, available: usize },

    #[error("Target segment '{0}' is not part of the topology")]
    UnknownTarget(String),

    #[error("Structural mismatch: {msg}")]
    Mismatch { msg: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl PartitionError {
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology { message: message.into() }
    }
}
