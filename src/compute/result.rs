use crate::compute::error::PartitionError;
use serde::{Serialize, Deserialize};

/// Component-by-time table handed back to the I/O layer.
///
/// `values[row][col]` is component `rows[row]` at time index `time_indices[col]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub rows: Vec<String>,
    pub time_indices: Vec<usize>,
    pub values: Vec<Vec<f32>>,
}

impl ResultTable {
    pub fn new(rows: Vec<String>) -> Self {
        let values = vec![Vec::new(); rows.len()];
        Self { rows, time_indices: Vec::new(), values }
    }

    pub fn push_column(&mut self, time_index: usize, column: &[f32]) -> Result<(), PartitionError> {
        if column.len() != self.rows.len() {
            return Err(PartitionError::Mismatch {
                msg: format!("column has {} entries, table has {} rows", column.len(), self.rows.len()),
            });
        }
        self.time_indices.push(time_index);
        for (row, &v) in self.values.iter_mut().zip(column) {
            row.push(v);
        }
        Ok(())
    }

    pub fn column_count(&self) -> usize { self.time_indices.len() }

    pub fn get(&self, row: &str, time_index: usize) -> Option<f32> {
        let r = self.rows.iter().position(|n| n == row)?;
        let c = self.time_indices.iter().position(|&t| t == time_index)?;
        Some(self.values[r][c])
    }

    pub fn column(&self, time_index: usize) -> Option<Vec<f32>> {
        let c = self.time_indices.iter().position(|&t| t == time_index)?;
        Some(self.values.iter().map(|row| row[c]).collect())
    }

    /// Sum over all rows of one column.
    pub fn column_sum(&self, time_index: usize) -> Option<f64> {
        self.column(time_index).map(|col| col.iter().map(|&v| f64::from(v)).sum())
    }

    pub fn to_json(&self) -> Result<String, PartitionError> {
        serde_json::to_string(self).map_err(|e| PartitionError::Mismatch { msg: e.to_string() })
    }
}
