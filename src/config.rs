//! Run configuration, read from JSON by the orchestration layer.
use crate::compute::error::PartitionError;
use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use std::path::Path;

/// Which time indices to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeSelection {
    #[default]
    All,
    List(Vec<usize>),
    /// Half-open range `start..end`.
    Range { start: usize, end: usize },
}

impl TimeSelection {
    /// Expands the selection against a table with `n_times` columns.
    /// Indices past the table are kept so the driver can report them; repeats
    /// in a list keep their first position only.
    pub fn resolve(&self, n_times: usize) -> Vec<usize> {
        match self {
            TimeSelection::All => (0..n_times).collect(),
            TimeSelection::List(v) => {
                let mut seen = HashSet::with_capacity(v.len());
                v.iter().copied().filter(|&t| seen.insert(t)).collect()
            }
            TimeSelection::Range { start, end } => (*start..*end).collect(),
        }
    }
}

fn default_target() -> String { "soma".to_string() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub time_indices: TimeSelection,
    /// Spread time indices over the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { target: default_target(), time_indices: TimeSelection::All, parallel: false }
    }
}

impl PartitionConfig {
    pub fn from_json_str(s: &str) -> Result<Self, PartitionError> {
        serde_json::from_str(s).map_err(|e| PartitionError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PartitionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PartitionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case(TimeSelection::All, 3, vec![0, 1, 2])]
    #[case(TimeSelection::List(vec![5, 1]), 3, vec![5, 1])]
    #[case(TimeSelection::List(vec![2, 0, 2, 1, 0]), 3, vec![2, 0, 1])]
    #[case(TimeSelection::Range { start: 50, end: 52 }, 100, vec![50, 51])]
    #[case(TimeSelection::Range { start: 4, end: 4 }, 10, vec![])]
    fn test_resolve(#[case] sel: TimeSelection, #[case] n_times: usize, #[case] expected: Vec<usize>) {
        assert_eq!(sel.resolve(n_times), expected);
    }

    #[test]
    fn test_defaults_fill_in() {
        let cfg = PartitionConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, PartitionConfig::default());
        assert_eq!(cfg.target, "soma");
    }

    #[test]
    fn test_parse_range() {
        let cfg = PartitionConfig::from_json_str(
            r#"{"target": "dend_3", "time_indices": {"range": {"start": 50, "end": 52}}, "parallel": true}"#,
        ).unwrap();
        assert_eq!(cfg.target, "dend_3");
        assert_eq!(cfg.time_indices, TimeSelection::Range { start: 50, end: 52 });
        assert!(cfg.parallel);
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"time_indices": {{"list": [3, 9]}}}}"#).unwrap();
        let cfg = PartitionConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.time_indices.resolve(10), vec![3, 9]);
    }

    #[test]
    fn test_bad_config_reported() {
        let err = PartitionConfig::from_json_str(r#"{"parallel": "yes"}"#).unwrap_err();
        assert!(matches!(err, PartitionError::Config(_)));
        let missing = PartitionConfig::from_path("/nonexistent/partition.json").unwrap_err();
        assert!(missing.to_string().contains("partition.json"));
    }
}
