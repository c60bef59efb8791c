//! The proportional split of one edge current across a child's node currents.
use crate::compute::error::PartitionError;
use crate::flow::FlowGraph;
use crate::store::{Column, ComponentId, Network, SegmentId};
use smallvec::SmallVec;

type Split = SmallVec<[(ComponentId, f64); 8]>;

/// Each value's share of the subset total, `None` when the total is zero.
pub fn shares(values: &[f64]) -> Option<SmallVec<[f64; 8]>> {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return None;
    }
    Some(values.iter().map(|v| v / total).collect())
}

pub struct PartitionEngine<'a> {
    network: &'a Network,
}

impl<'a> PartitionEngine<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }

    /// Runs `apply` over `order`, threading the column through each pair.
    /// The first failing pair aborts the pass.
    pub fn run(
        &self,
        graph: &FlowGraph<'_>,
        order: &[(SegmentId, SegmentId)],
        column: Column,
    ) -> Result<Column, PartitionError> {
        order.iter().try_fold(column, |mut column, &(child, parent)| {
            self.apply(graph, child, parent, &mut column)?;
            Ok(column)
        })
    }

    /// Splits the current on `child -> parent` across the child's same-signed
    /// components and adds the pieces onto the parent's matching components.
    ///
    /// Ratios come from the child's row as it stands in `column`, i.e. after any
    /// earlier pair in the same pass has accumulated into it. Only the parent's
    /// row is written.
    pub fn apply(
        &self,
        graph: &FlowGraph<'_>,
        child: SegmentId,
        parent: SegmentId,
        column: &mut Column,
    ) -> Result<(), PartitionError> {
        let registry = &self.network.registry;
        let nodes = &self.network.nodes;

        // NaN edges never reach a planned order (they carry no orientation),
        // but `apply` is public and can be handed any pair.
        let edge_value = graph.pair_value(child, parent)?;
        if !edge_value.is_finite() {
            return Err(PartitionError::SignPrecondition {
                segment: format!("{}->{}", registry.name(child), registry.name(parent)),
                component: "axial".to_string(),
                value: edge_value,
            });
        }
        if edge_value == 0.0 {
            return Ok(());
        }

        let child_rows = nodes.rows_of(child)
            .ok_or_else(|| PartitionError::MissingSegment(registry.name(child).to_string()))?;
        let parent_rows = nodes.rows_of(parent)
            .ok_or_else(|| PartitionError::MissingSegment(registry.name(parent).to_string()))?;

        // 1. Select the source subset by the sign of the edge current.
        let outgoing = edge_value >= 0.0;
        let mut subset: Split = SmallVec::new();
        for row in child_rows {
            let v = f64::from(column.values[row]);
            let comp = nodes.row_component(row);
            if !v.is_finite() {
                return Err(PartitionError::SignPrecondition {
                    segment: registry.name(child).to_string(),
                    component: nodes.component_name(comp).to_string(),
                    value: v,
                });
            }
            if (v >= 0.0) == outgoing {
                subset.push((comp, v));
            }
        }

        // 2. Shares of the subset, scaled by the signed edge current.
        let values: SmallVec<[f64; 8]> = subset.iter().map(|&(_, v)| v).collect();
        let ratios = shares(&values).ok_or_else(|| PartitionError::DegenerateRatio {
            child: registry.name(child).to_string(),
            parent: registry.name(parent).to_string(),
            edge_value,
        })?;
        let split: Split = subset.iter().zip(&ratios)
            .map(|(&(comp, _), &r)| (comp, r * edge_value))
            .collect();

        // 3. Align to the parent's components and accumulate at f32 resolution.
        let parent_components = nodes.components_of(parent).unwrap_or_default();
        for &(comp, _) in split.iter().filter(|(c, _)| !parent_components.contains(c)) {
            tracing::trace!(
                child = registry.name(child),
                parent = registry.name(parent),
                component = nodes.component_name(comp),
                "parent has no matching component; contribution dropped"
            );
        }
        for row in parent_rows {
            let comp = nodes.row_component(row);
            let delta = split.iter().find(|(c, _)| *c == comp).map_or(0.0, |&(_, d)| d);
            let slot = &mut column.values[row];
            *slot = (f64::from(*slot) + delta) as f32;
        }
        Ok(())
    }
}
