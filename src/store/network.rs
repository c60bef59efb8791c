use super::currents::{EdgeCurrents, EdgeRow, NodeCurrents, NodeRow};
use super::registry::SegmentRegistry;
use crate::analysis::topology;
use crate::compute::error::PartitionError;

/// The validated inputs of a partition run: static tree plus both current tables.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub registry: SegmentRegistry,
    pub edges: EdgeCurrents,
    pub nodes: NodeCurrents,
}

impl Network {
    /// Derives the tree from the edge relation, checks it, then attaches the
    /// node table. Every row must carry `n_times` columns.
    pub fn from_rows(
        edge_rows: &[EdgeRow],
        node_rows: &[NodeRow],
        n_times: usize,
    ) -> Result<Self, PartitionError> {
        let mut registry = SegmentRegistry::new();
        let mut edges = EdgeCurrents::with_times(n_times);

        for row in edge_rows {
            let child = registry.intern(&row.child);
            let parent = registry.intern(&row.parent);
            registry.link(child, parent)?;
            edges.insert(child, &row.values)?;
        }
        topology::check_tree(&registry)?;

        let nodes = NodeCurrents::from_rows(&mut registry, node_rows, n_times)?;
        Ok(Self { registry, edges, nodes })
    }

    pub fn n_times(&self) -> usize { self.edges.n_times() }
}
