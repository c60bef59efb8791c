//! currents.rs
//! Dense row-major storage for edge (axial) and node (membrane) currents.

use super::registry::SegmentRegistry;
use super::types::{ComponentId, SegmentId};
use crate::compute::error::PartitionError;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::ops::Range;

/// One input row of the edge table: signed current from `child` to `parent`
/// at each time index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub child: String,
    pub parent: String,
    pub values: Vec<f32>,
}

/// One input row of the node table: a single current component of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub segment: String,
    pub component: String,
    pub values: Vec<f32>,
}

/// Edge currents keyed by the child segment of each tree edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeCurrents {
    n_times: usize,
    row_of_child: Vec<u32>,
    values: Vec<f32>,
}

impl EdgeCurrents {
    pub fn with_times(n_times: usize) -> Self {
        Self { n_times, ..Self::default() }
    }

    pub fn n_times(&self) -> usize { self.n_times }

    pub fn insert(&mut self, child: SegmentId, values: &[f32]) -> Result<(), PartitionError> {
        if values.len() != self.n_times {
            return Err(PartitionError::Mismatch {
                msg: format!("edge row has {} columns, expected {}", values.len(), self.n_times),
            });
        }
        let idx = child.index();
        if idx >= self.row_of_child.len() {
            self.row_of_child.resize(idx + 1, u32::MAX);
        }
        self.row_of_child[idx] = (self.values.len() / self.n_times.max(1)) as u32;
        self.values.extend_from_slice(values);
        Ok(())
    }

    /// Current on the edge from `child` to its parent at `time_index`.
    #[inline(always)]
    pub fn get(&self, child: SegmentId, time_index: usize) -> Option<f32> {
        if time_index >= self.n_times {
            return None;
        }
        let row = *self.row_of_child.get(child.index())?;
        if row == u32::MAX {
            return None;
        }
        self.values.get(row as usize * self.n_times + time_index).copied()
    }
}

/// Node currents: each segment owns a contiguous block of component rows.
#[derive(Debug, Clone, Default)]
pub struct NodeCurrents {
    n_times: usize,
    component_names: Vec<String>,
    component_lookup: HashMap<String, ComponentId>,

    // CSR layout: segment -> (first flat row, row count)
    row_ranges: Vec<Option<(u32, u32)>>,
    row_components: Vec<ComponentId>,

    values: Vec<f32>,
}

impl NodeCurrents {
    /// Builds the table, interning any segment the topology has not seen yet
    /// (e.g. an isolated target without edges).
    pub fn from_rows(
        registry: &mut SegmentRegistry,
        rows: &[NodeRow],
        n_times: usize,
    ) -> Result<Self, PartitionError> {
        let mut table = Self { n_times, ..Self::default() };

        // Group rows per segment, keeping first-seen order of segments and components.
        let mut order: Vec<SegmentId> = Vec::new();
        let mut grouped: HashMap<SegmentId, Vec<&NodeRow>> = HashMap::new();
        for row in rows {
            if row.values.len() != n_times {
                return Err(PartitionError::Mismatch {
                    msg: format!(
                        "node row '{}'/'{}' has {} columns, expected {}",
                        row.segment, row.component, row.values.len(), n_times
                    ),
                });
            }
            let seg = registry.intern(&row.segment);
            grouped.entry(seg).or_insert_with(|| { order.push(seg); Vec::new() }).push(row);
        }

        table.row_ranges = vec![None; registry.count()];
        for seg in order {
            let group = &grouped[&seg];
            let start = table.row_components.len() as u32;
            for row in group {
                let comp = table.intern_component(&row.component);
                let existing = &table.row_components[start as usize..];
                if existing.contains(&comp) {
                    return Err(PartitionError::Mismatch {
                        msg: format!("duplicate component '{}' for segment '{}'", row.component, row.segment),
                    });
                }
                table.row_components.push(comp);
                table.values.extend_from_slice(&row.values);
            }
            table.row_ranges[seg.index()] = Some((start, group.len() as u32));
        }
        Ok(table)
    }

    fn intern_component(&mut self, name: &str) -> ComponentId {
        if let Some(&id) = self.component_lookup.get(name) {
            return id;
        }
        let id = ComponentId::new(self.component_names.len());
        self.component_names.push(name.to_string());
        self.component_lookup.insert(name.to_string(), id);
        id
    }

    pub fn n_times(&self) -> usize { self.n_times }
    pub fn row_count(&self) -> usize { self.row_components.len() }

    pub fn component_name(&self, id: ComponentId) -> &str {
        &self.component_names[id.index()]
    }

    pub fn component_names(&self) -> &[String] { &self.component_names }

    /// Flat row range of a segment, `None` if the segment has no rows.
    #[inline(always)]
    pub fn rows_of(&self, segment: SegmentId) -> Option<Range<usize>> {
        let (start, count) = (*self.row_ranges.get(segment.index())?)?;
        Some(start as usize..(start + count) as usize)
    }

    pub fn components_of(&self, segment: SegmentId) -> Option<&[ComponentId]> {
        self.rows_of(segment).map(|r| &self.row_components[r])
    }

    pub fn row_component(&self, flat_row: usize) -> ComponentId { self.row_components[flat_row] }

    #[inline(always)]
    pub fn get(&self, flat_row: usize, time_index: usize) -> f32 {
        self.values[flat_row * self.n_times + time_index]
    }

    /// Copies one time index out of the table.
    pub fn column(&self, time_index: usize) -> Result<Column, PartitionError> {
        if time_index >= self.n_times {
            return Err(PartitionError::MissingTimeIndex { index: time_index, available: self.n_times });
        }
        let values = (0..self.row_count()).map(|r| self.get(r, time_index)).collect();
        Ok(Column { time_index, values })
    }
}

/// Owned snapshot of one time index of a `NodeCurrents` table.
///
/// The partition passes mutate columns, never the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub time_index: usize,
    pub values: Vec<f32>,
}

impl Column {
    pub fn slice(&self, rows: Range<usize>) -> &[f32] { &self.values[rows] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(seg: &str, comp: &str, values: &[f32]) -> NodeRow {
        NodeRow { segment: seg.into(), component: comp.into(), values: values.to_vec() }
    }

    #[test]
    fn test_node_table_groups_rows_per_segment() {
        let mut reg = SegmentRegistry::new();
        let rows = vec![
            row("soma", "ina", &[1.0, 2.0]),
            row("dend", "ina", &[3.0, 4.0]),
            row("soma", "ik", &[-1.0, -2.0]),
        ];
        let table = NodeCurrents::from_rows(&mut reg, &rows, 2).unwrap();
        let soma = reg.id_of("soma").unwrap();
        let dend = reg.id_of("dend").unwrap();

        let soma_rows = table.rows_of(soma).unwrap();
        assert_eq!(soma_rows.len(), 2);
        let names: Vec<_> = table.components_of(soma).unwrap().iter()
            .map(|&c| table.component_name(c).to_string()).collect();
        assert_eq!(names, vec!["ina", "ik"]);

        let col = table.column(1).unwrap();
        assert_eq!(col.slice(soma_rows), &[2.0, -2.0]);
        assert_eq!(col.slice(table.rows_of(dend).unwrap()), &[4.0]);
    }

    #[test]
    fn test_node_table_rejects_bad_rows() {
        let mut reg = SegmentRegistry::new();
        let short = vec![row("soma", "ina", &[1.0])];
        assert!(matches!(
            NodeCurrents::from_rows(&mut reg, &short, 2),
            Err(PartitionError::Mismatch { .. })
        ));

        let dup = vec![row("soma", "ina", &[1.0]), row("soma", "ina", &[2.0])];
        let err = NodeCurrents::from_rows(&mut reg, &dup, 1).unwrap_err();
        assert!(err.to_string().contains("duplicate component"), "{}", err);
    }

    #[test]
    fn test_column_out_of_range() {
        let mut reg = SegmentRegistry::new();
        let table = NodeCurrents::from_rows(&mut reg, &[row("soma", "ina", &[1.0])], 1).unwrap();
        assert_eq!(
            table.column(3).unwrap_err(),
            PartitionError::MissingTimeIndex { index: 3, available: 1 }
        );
    }

    #[test]
    fn test_edge_table_lookup() {
        let mut edges = EdgeCurrents::with_times(3);
        edges.insert(SegmentId(2), &[0.5, -1.0, 0.0]).unwrap();
        assert_eq!(edges.get(SegmentId(2), 1), Some(-1.0));
        assert_eq!(edges.get(SegmentId(2), 3), None);
        assert_eq!(edges.get(SegmentId(0), 0), None);
        assert_eq!(edges.get(SegmentId(1), 0), None);
        assert!(edges.insert(SegmentId(1), &[1.0]).is_err());
    }
}
