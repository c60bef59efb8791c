//! Summaries computed alongside a partition run: whole-cell totals, the
//! target's own baseline, and a conservation check against the report.

use crate::compute::driver::PartitionReport;
use crate::compute::error::PartitionError;
use crate::compute::result::ResultTable;
use crate::flow::{plan, FlowGraph};
use crate::store::{Network, Pass};

/// Per component, the sum over all segments of its non-negative values
/// (`.0`) and of its negative values (`.1`).
pub fn total_currents(
    network: &Network,
    time_indices: &[usize],
) -> Result<(ResultTable, ResultTable), PartitionError> {
    let nodes = &network.nodes;
    let names = nodes.component_names().to_vec();
    let mut positive = ResultTable::new(names.clone());
    let mut negative = ResultTable::new(names);

    for &t in time_indices {
        let column = nodes.column(t)?;
        let width = nodes.component_names().len();
        let mut pos = vec![0.0f64; width];
        let mut neg = vec![0.0f64; width];
        for (row, &v) in column.values.iter().enumerate() {
            let comp = nodes.row_component(row).index();
            if v >= 0.0 {
                pos[comp] += f64::from(v);
            } else {
                neg[comp] += f64::from(v);
            }
        }
        positive.push_column(t, &pos.iter().map(|&v| v as f32).collect::<Vec<_>>())?;
        negative.push_column(t, &neg.iter().map(|&v| v as f32).collect::<Vec<_>>())?;
    }
    Ok((positive, negative))
}

/// The target's un-partitioned row split into its non-negative and negative parts.
pub fn target_baseline(
    network: &Network,
    target: &str,
    time_indices: &[usize],
) -> Result<(ResultTable, ResultTable), PartitionError> {
    let nodes = &network.nodes;
    let id = network.registry.id_of(target)
        .ok_or_else(|| PartitionError::UnknownTarget(target.to_string()))?;
    let rows = nodes.rows_of(id)
        .ok_or_else(|| PartitionError::MissingSegment(target.to_string()))?;
    let names = rows.clone().map(|r| nodes.component_name(nodes.row_component(r)).to_string()).collect();

    let mut positive = ResultTable::new(names);
    let mut negative = positive.clone();
    for &t in time_indices {
        let column = nodes.column(t)?;
        let row = column.slice(rows.clone());
        positive.push_column(t, &row.iter().map(|&v| v.max(0.0)).collect::<Vec<_>>())?;
        negative.push_column(t, &row.iter().map(|&v| v.min(0.0)).collect::<Vec<_>>())?;
    }
    Ok((positive, negative))
}

/// Conservation residual of one completed time index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    pub time_index: usize,
    pub positive: f64,
    pub negative: f64,
}

/// For each completed time index: the target's partitioned total minus its
/// original total minus the edge currents delivered straight into it by that
/// pass. Zero (up to f32 rounding) whenever every child component also exists
/// on its parent.
pub fn conservation_residuals(
    network: &Network,
    report: &PartitionReport,
) -> Result<Vec<Residual>, PartitionError> {
    let target = network.registry.id_of(&report.target)
        .ok_or_else(|| PartitionError::UnknownTarget(report.target.clone()))?;
    let rows = network.nodes.rows_of(target)
        .ok_or_else(|| PartitionError::MissingSegment(report.target.clone()))?;

    let mut residuals = Vec::with_capacity(report.positive.column_count());
    for &t in &report.positive.time_indices {
        let graph = FlowGraph::build(network, t)?;
        let original: f64 = network.nodes.column(t)?.slice(rows.clone())
            .iter().map(|&v| f64::from(v)).sum();

        let mut delivered = [0.0f64; 2];
        for (slot, pass) in Pass::ALL.into_iter().enumerate() {
            for (child, parent) in plan(&graph, target, pass)? {
                if parent == target {
                    delivered[slot] += graph.pair_value(child, parent)?;
                }
            }
        }

        let missing = || PartitionError::MissingTimeIndex { index: t, available: network.n_times() };
        let pos_total = report.positive.column_sum(t).ok_or_else(missing)?;
        let neg_total = report.negative.column_sum(t).ok_or_else(missing)?;
        residuals.push(Residual {
            time_index: t,
            positive: pos_total - original - delivered[0],
            negative: neg_total - original - delivered[1],
        });
    }
    Ok(residuals)
}
