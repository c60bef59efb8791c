use crate::compute::driver::{PartitionReport, PartitionRequest, Partitioner};
use crate::compute::error::PartitionError;
use crate::analysis::totals;
use crate::config::PartitionConfig;
use crate::display::trace;
use crate::flow::{plan, FlowGraph};
use crate::store::{EdgeRow, Network, NodeRow, Pass};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

/// `(child, parent, values)` as handed over by the loader.
type PyEdgeRow = (String, String, Vec<f32>);
/// `(segment, component, values)`.
type PyNodeRow = (String, String, Vec<f32>);

/// `(components, time_indices, positive, negative, failures)`
type PyPartitionResult = (Vec<String>, Vec<usize>, Vec<Vec<f32>>, Vec<Vec<f32>>, Vec<String>);

fn to_py_err(e: PartitionError) -> PyErr {
    match e {
        PartitionError::Topology { .. }
        | PartitionError::Mismatch { .. }
        | PartitionError::Config(_)
        | PartitionError::UnknownTarget(_) => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

fn build_network(edges: Vec<PyEdgeRow>, nodes: Vec<PyNodeRow>, n_times: usize) -> Result<Network, PartitionError> {
    let edge_rows: Vec<EdgeRow> = edges.into_iter()
        .map(|(child, parent, values)| EdgeRow { child, parent, values })
        .collect();
    let node_rows: Vec<NodeRow> = nodes.into_iter()
        .map(|(segment, component, values)| NodeRow { segment, component, values })
        .collect();
    Network::from_rows(&edge_rows, &node_rows, n_times)
}

fn parse_pass(pass: &str) -> PyResult<Pass> {
    match pass {
        "out" | "outward" => Ok(Pass::Outward),
        "in" | "inward" => Ok(Pass::Inward),
        other => Err(PyValueError::new_err(format!("Unknown pass '{}'", other))),
    }
}

fn report_to_py(report: PartitionReport) -> PyPartitionResult {
    let failures = report.failures.iter().map(|f| f.to_string()).collect();
    (
        report.positive.rows,
        report.positive.time_indices,
        report.positive.values,
        report.negative.values,
        failures,
    )
}

/// Redistributes axial currents onto `target` for every requested time index.
#[pyfunction]
#[pyo3(signature = (edges, nodes, n_times, target, time_indices, parallel = false))]
pub fn partition(
    edges: Vec<PyEdgeRow>,
    nodes: Vec<PyNodeRow>,
    n_times: usize,
    target: String,
    time_indices: Vec<usize>,
    parallel: bool,
) -> PyResult<PyPartitionResult> {
    let network = build_network(edges, nodes, n_times).map_err(to_py_err)?;
    let request = PartitionRequest { target, time_indices };
    let partitioner = Partitioner::new(&network);
    let report = if parallel {
        partitioner.run_parallel(&request)
    } else {
        partitioner.run(&request)
    }
    .map_err(to_py_err)?;
    Ok(report_to_py(report))
}

/// Same as `partition`, with target, time indices and parallelism read from a
/// JSON run configuration given inline or as a file path.
#[pyfunction]
#[pyo3(signature = (edges, nodes, n_times, config_json = None, config_path = None))]
pub fn partition_config(
    edges: Vec<PyEdgeRow>,
    nodes: Vec<PyNodeRow>,
    n_times: usize,
    config_json: Option<&str>,
    config_path: Option<PathBuf>,
) -> PyResult<PyPartitionResult> {
    let config = match (config_json, config_path) {
        (Some(json), None) => PartitionConfig::from_json_str(json),
        (None, Some(path)) => PartitionConfig::from_path(path),
        (None, None) => Ok(PartitionConfig::default()),
        (Some(_), Some(_)) => Err(PartitionError::Config(
            "pass either config_json or config_path, not both".to_string(),
        )),
    }
    .map_err(to_py_err)?;

    let network = build_network(edges, nodes, n_times).map_err(to_py_err)?;
    let report = Partitioner::new(&network).run_config(&config).map_err(to_py_err)?;
    Ok(report_to_py(report))
}

/// The target's own rows before partitioning, split by sign:
/// `(components, time_indices, positive, negative)`.
#[pyfunction]
pub fn target_baseline(
    nodes: Vec<PyNodeRow>,
    n_times: usize,
    target: String,
    time_indices: Vec<usize>,
) -> PyResult<(Vec<String>, Vec<usize>, Vec<Vec<f32>>, Vec<Vec<f32>>)> {
    let network = build_network(Vec::new(), nodes, n_times).map_err(to_py_err)?;
    let (pos, neg) = totals::target_baseline(&network, &target, &time_indices).map_err(to_py_err)?;
    Ok((pos.rows, pos.time_indices, pos.values, neg.values))
}

/// Runs the partition and returns `(time_index, positive, negative)`
/// conservation residuals for every completed time index.
#[pyfunction]
pub fn conservation_residuals(
    edges: Vec<PyEdgeRow>,
    nodes: Vec<PyNodeRow>,
    n_times: usize,
    target: String,
    time_indices: Vec<usize>,
) -> PyResult<Vec<(usize, f64, f64)>> {
    let network = build_network(edges, nodes, n_times).map_err(to_py_err)?;
    let report = Partitioner::new(&network)
        .run(&PartitionRequest { target, time_indices })
        .map_err(to_py_err)?;
    let residuals = totals::conservation_residuals(&network, &report).map_err(to_py_err)?;
    Ok(residuals.into_iter().map(|r| (r.time_index, r.positive, r.negative)).collect())
}

/// Directed `(donor, recipient, current)` edges of one time index.
#[pyfunction]
pub fn flow_edges(edges: Vec<PyEdgeRow>, n_times: usize, time_index: usize) -> PyResult<Vec<(String, String, f64)>> {
    let network = build_network(edges, Vec::new(), n_times).map_err(to_py_err)?;
    let graph = FlowGraph::build(&network, time_index).map_err(to_py_err)?;
    let registry = &network.registry;
    Ok(graph.edges()
        .map(|(from, to, w)| (registry.name(from).to_string(), registry.name(to).to_string(), w))
        .collect())
}

/// Whole-cell positive and negative totals per component.
#[pyfunction]
pub fn total_currents(
    nodes: Vec<PyNodeRow>,
    n_times: usize,
    time_indices: Vec<usize>,
) -> PyResult<(Vec<String>, Vec<Vec<f32>>, Vec<Vec<f32>>)> {
    let network = build_network(Vec::new(), nodes, n_times).map_err(to_py_err)?;
    let (pos, neg) = totals::total_currents(&network, &time_indices).map_err(to_py_err)?;
    Ok((pos.rows, pos.values, neg.values))
}

/// Human-readable partition order for one time index.
#[pyfunction]
pub fn trace_order(edges: Vec<PyEdgeRow>, n_times: usize, target: String, time_index: usize, pass: &str) -> PyResult<String> {
    let pass = parse_pass(pass)?;
    let network = build_network(edges, Vec::new(), n_times).map_err(to_py_err)?;
    let target_id = network.registry.id_of(&target)
        .ok_or_else(|| to_py_err(PartitionError::UnknownTarget(target.clone())))?;
    let graph = FlowGraph::build(&network, time_index).map_err(to_py_err)?;
    let order = plan(&graph, target_id, pass).map_err(to_py_err)?;
    Ok(trace::format_order(&graph, target_id, pass, &order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn star_edges() -> Vec<PyEdgeRow> {
        vec![
            ("dend1".into(), "soma".into(), vec![3.0, 0.0]),
            ("dend2".into(), "soma".into(), vec![-2.0, 0.0]),
        ]
    }

    fn star_nodes() -> Vec<PyNodeRow> {
        vec![
            ("soma".into(), "ina".into(), vec![2.0, 0.5]),
            ("soma".into(), "ik".into(), vec![-1.0, -0.5]),
            ("dend1".into(), "ina".into(), vec![1.0, 0.25]),
            ("dend1".into(), "ik".into(), vec![2.0, -0.25]),
            ("dend2".into(), "ina".into(), vec![-1.0, 0.1]),
            ("dend2".into(), "ik".into(), vec![-3.0, -0.1]),
        ]
    }

    #[test]
    fn test_partition_config_inline_and_file() {
        let json = r#"{"target": "soma", "time_indices": {"list": [0]}}"#;
        let (rows, times, pos, neg, failures) =
            partition_config(star_edges(), star_nodes(), 2, Some(json), None).unwrap();
        assert_eq!(rows, vec!["ina", "ik"]);
        assert_eq!(times, vec![0]);
        assert_eq!(pos, vec![vec![3.0], vec![1.0]]);
        assert_eq!(neg, vec![vec![1.5], vec![-2.5]]);
        assert!(failures.is_empty());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"time_indices": {{"range": {{"start": 0, "end": 2}}}}, "parallel": true}}"#).unwrap();
        let (_, times, ..) =
            partition_config(star_edges(), star_nodes(), 2, None, Some(file.path().to_path_buf())).unwrap();
        assert_eq!(times, vec![0, 1]);
    }

    #[test]
    fn test_target_baseline_splits_by_sign() {
        let (rows, times, pos, neg) = target_baseline(star_nodes(), 2, "soma".into(), vec![0, 1]).unwrap();
        assert_eq!(rows, vec!["ina", "ik"]);
        assert_eq!(times, vec![0, 1]);
        assert_eq!(pos, vec![vec![2.0, 0.5], vec![0.0, 0.0]]);
        assert_eq!(neg, vec![vec![0.0, 0.0], vec![-1.0, -0.5]]);
    }

    #[test]
    fn test_conservation_residuals_vanish_on_star() {
        let residuals = conservation_residuals(star_edges(), star_nodes(), 2, "soma".into(), vec![0, 1]).unwrap();
        assert_eq!(residuals.len(), 2);
        for (_, pos, neg) in residuals {
            assert!(pos.abs() < 1e-5 && neg.abs() < 1e-5, "{} {}", pos, neg);
        }
    }

    #[test]
    fn test_flow_edges_follow_sign() {
        let mut edges = flow_edges(star_edges(), 2, 0).unwrap();
        edges.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(edges, vec![
            ("dend2".to_string(), "soma".to_string(), -2.0),
            ("soma".to_string(), "dend1".to_string(), 3.0),
        ]);
    }
}
