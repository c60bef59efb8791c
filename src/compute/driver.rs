//! Drives both partition passes over every requested time index.
use crate::compute::error::PartitionError;
use crate::compute::partition::PartitionEngine;
use crate::compute::result::ResultTable;
use crate::config::PartitionConfig;
use crate::flow::{plan, FlowGraph};
use crate::store::{Network, Pass, SegmentId};
use rayon::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRequest {
    pub target: String,
    pub time_indices: Vec<usize>,
}

impl PartitionRequest {
    pub fn from_config(config: &PartitionConfig, n_times: usize) -> Self {
        Self { target: config.target.clone(), time_indices: config.time_indices.resolve(n_times) }
    }

    /// Requested time indices in first-seen order, each once.
    pub fn distinct_time_indices(&self) -> Vec<usize> {
        let mut seen = HashSet::with_capacity(self.time_indices.len());
        self.time_indices.iter().copied().filter(|&t| seen.insert(t)).collect()
    }
}

/// A time index that could not be completed. `pass` is `None` when the
/// failure happened before either pass started.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub time_index: usize,
    pub pass: Option<Pass>,
    pub error: PartitionError,
}

impl std::fmt::Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.pass {
            Some(pass) => write!(f, "time index {} ({} pass): {}", self.time_index, pass, self.error),
            None => write!(f, "time index {}: {}", self.time_index, self.error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionReport {
    pub target: String,
    pub positive: ResultTable,
    pub negative: ResultTable,
    pub failures: Vec<StepFailure>,
    pub pairs_processed: usize,
}

impl PartitionReport {
    pub fn is_complete(&self) -> bool { self.failures.is_empty() }
}

/// Target rows of both copies after one time index.
#[derive(Debug, Clone)]
struct StepOutcome {
    time_index: usize,
    positive: Vec<f32>,
    negative: Vec<f32>,
    pairs: usize,
}

pub struct Partitioner<'a> {
    network: &'a Network,
    engine: PartitionEngine<'a>,
}

impl<'a> Partitioner<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network, engine: PartitionEngine::new(network) }
    }

    /// Runs per `config`, sequentially or on the rayon pool.
    pub fn run_config(&self, config: &PartitionConfig) -> Result<PartitionReport, PartitionError> {
        let request = PartitionRequest::from_config(config, self.network.n_times());
        if config.parallel {
            self.run_parallel(&request)
        } else {
            self.run(&request)
        }
    }

    /// Processes the requested time indices one after another.
    ///
    /// Only an unknown target fails the whole run; per-time-index failures are
    /// collected in the report and the remaining indices still run.
    pub fn run(&self, request: &PartitionRequest) -> Result<PartitionReport, PartitionError> {
        let target = self.resolve_target(&request.target)?;
        let time_indices = request.distinct_time_indices();
        let total = time_indices.len();
        tracing::info!(segment = %request.target, time_indices = total, "starting partition run");

        let mut results = Vec::with_capacity(total);
        for (done, &t) in time_indices.iter().enumerate() {
            results.push(self.step(target, t));
            tracing::debug!(time_index = t, progress = done + 1, total, "time index processed");
        }
        self.assemble(&request.target, target, results)
    }

    /// Same as `run`, with time indices spread across the rayon pool. Each
    /// worker owns its own columns, so no state is shared between indices.
    pub fn run_parallel(&self, request: &PartitionRequest) -> Result<PartitionReport, PartitionError> {
        let target = self.resolve_target(&request.target)?;
        let time_indices = request.distinct_time_indices();
        tracing::info!(
            segment = %request.target,
            time_indices = time_indices.len(),
            threads = rayon::current_num_threads(),
            "starting parallel partition run"
        );

        let results: Vec<_> = time_indices
            .par_iter()
            .map(|&t| self.step(target, t))
            .collect();
        self.assemble(&request.target, target, results)
    }

    fn resolve_target(&self, name: &str) -> Result<SegmentId, PartitionError> {
        let id = self.network.registry.id_of(name)
            .ok_or_else(|| PartitionError::UnknownTarget(name.to_string()))?;
        if self.network.nodes.rows_of(id).is_none() {
            return Err(PartitionError::MissingSegment(name.to_string()));
        }
        Ok(id)
    }

    /// One time index: build the flow graph, then run the outward pass on a
    /// fresh positive copy and the inward pass on a fresh negative copy.
    ///
    /// Both passes always run; the index fails if either does, and every
    /// failing pass is returned.
    fn step(&self, target: SegmentId, time_index: usize) -> Result<StepOutcome, Vec<StepFailure>> {
        let fail = |pass: Option<Pass>| move |error: PartitionError| StepFailure { time_index, pass, error };

        let graph = FlowGraph::build(self.network, time_index).map_err(|e| vec![fail(None)(e)])?;
        let rows = self.network.nodes.rows_of(target)
            .ok_or_else(|| vec![fail(None)(PartitionError::MissingSegment(
                self.network.registry.name(target).to_string(),
            ))])?;

        let run_pass = |pass: Pass| -> Result<(Vec<f32>, usize), PartitionError> {
            let order = plan(&graph, target, pass)?;
            let column = self.network.nodes.column(time_index)?;
            let column = self.engine.run(&graph, &order, column)?;
            Ok((column.slice(rows.clone()).to_vec(), order.len()))
        };

        match (run_pass(Pass::Outward), run_pass(Pass::Inward)) {
            (Ok((positive, out_pairs)), Ok((negative, in_pairs))) => Ok(StepOutcome {
                time_index,
                positive,
                negative,
                pairs: out_pairs + in_pairs,
            }),
            (outward, inward) => Err([(Pass::Outward, outward.err()), (Pass::Inward, inward.err())]
                .into_iter()
                .filter_map(|(pass, error)| error.map(fail(Some(pass))))
                .collect()),
        }
    }

    fn assemble(
        &self,
        target_name: &str,
        target: SegmentId,
        results: Vec<Result<StepOutcome, Vec<StepFailure>>>,
    ) -> Result<PartitionReport, PartitionError> {
        let nodes = &self.network.nodes;
        let components: Vec<String> = nodes.components_of(target)
            .unwrap_or_default()
            .iter()
            .map(|&c| nodes.component_name(c).to_string())
            .collect();

        let mut positive = ResultTable::new(components.clone());
        let mut negative = ResultTable::new(components);
        let mut failures = Vec::new();
        let mut pairs_processed = 0;

        for result in results {
            match result {
                Ok(step) => {
                    positive.push_column(step.time_index, &step.positive)?;
                    negative.push_column(step.time_index, &step.negative)?;
                    pairs_processed += step.pairs;
                }
                Err(step_failures) => {
                    for failure in step_failures {
                        tracing::warn!(%failure, "time index failed");
                        failures.push(failure);
                    }
                }
            }
        }

        tracing::info!(
            completed = positive.column_count(),
            failed = failures.len(),
            pairs_processed,
            "partition run finished"
        );
        Ok(PartitionReport {
            target: target_name.to_string(),
            positive,
            negative,
            failures,
            pairs_processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeSelection;
    use crate::store::{EdgeRow, NodeRow};

    fn edge(child: &str, parent: &str, values: &[f32]) -> EdgeRow {
        EdgeRow { child: child.into(), parent: parent.into(), values: values.to_vec() }
    }

    fn node(seg: &str, comp: &str, values: &[f32]) -> NodeRow {
        NodeRow { segment: seg.into(), component: comp.into(), values: values.to_vec() }
    }

    /// soma with two dendrites over three time steps.
    fn star() -> Network {
        let edges = vec![
            edge("dend1", "soma", &[3.0, 0.0, 1.0]),
            edge("dend2", "soma", &[-2.0, 0.0, 1.0]),
        ];
        let nodes = vec![
            node("soma", "ina", &[2.0, 0.5, 1.0]),
            node("soma", "ik", &[-1.0, -0.5, -1.0]),
            node("dend1", "ina", &[1.0, 0.25, 0.0]),
            node("dend1", "ik", &[2.0, -0.25, 0.0]),
            node("dend2", "ina", &[-1.0, 0.1, 1.0]),
            node("dend2", "ik", &[-3.0, -0.1, 3.0]),
        ];
        Network::from_rows(&edges, &nodes, 3).unwrap()
    }

    fn request(target: &str, times: &[usize]) -> PartitionRequest {
        PartitionRequest { target: target.into(), time_indices: times.to_vec() }
    }

    #[test]
    fn test_star_both_passes() {
        let net = star();
        let report = Partitioner::new(&net).run(&request("soma", &[0])).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.positive.rows, vec!["ina", "ik"]);
        assert_eq!(report.positive.column(0), Some(vec![3.0, 1.0]));
        assert_eq!(report.negative.column(0), Some(vec![1.5, -2.5]));
        assert_eq!(report.pairs_processed, 2);
    }

    #[test]
    fn test_zero_edges_leave_target_unchanged() {
        let net = star();
        let report = Partitioner::new(&net).run(&request("soma", &[1])).unwrap();
        assert_eq!(report.positive.column(1), Some(vec![0.5, -0.5]));
        assert_eq!(report.negative.column(1), Some(vec![0.5, -0.5]));
    }

    #[test]
    fn test_failures_do_not_abort_run() {
        // t=2: dend1 has no positive current to carry the +1.0 edge.
        let net = star();
        let report = Partitioner::new(&net).run(&request("soma", &[0, 2, 9, 1])).unwrap();

        assert_eq!(report.positive.time_indices, vec![0, 1]);
        assert_eq!(report.failures.len(), 2);

        let degenerate = &report.failures[0];
        assert_eq!(degenerate.time_index, 2);
        assert_eq!(degenerate.pass, Some(Pass::Outward));
        assert!(matches!(degenerate.error, PartitionError::DegenerateRatio { .. }));

        let missing = &report.failures[1];
        assert_eq!(missing.time_index, 9);
        assert_eq!(missing.pass, None);
        assert_eq!(missing.error, PartitionError::MissingTimeIndex { index: 9, available: 3 });
        assert!(missing.to_string().starts_with("time index 9:"));
    }

    #[test]
    fn test_both_pass_failures_reported() {
        // dend1 has nothing positive for its outward edge, dend2 nothing
        // negative for its inward edge.
        let edges = vec![edge("dend1", "soma", &[1.0]), edge("dend2", "soma", &[-1.0])];
        let nodes = vec![
            node("soma", "ina", &[1.0]),
            node("dend1", "ina", &[-1.0]),
            node("dend2", "ina", &[2.0]),
        ];
        let net = Network::from_rows(&edges, &nodes, 1).unwrap();

        for report in [
            Partitioner::new(&net).run(&request("soma", &[0])).unwrap(),
            Partitioner::new(&net).run_parallel(&request("soma", &[0])).unwrap(),
        ] {
            assert_eq!(report.positive.column_count(), 0);
            assert_eq!(report.negative.column_count(), 0);
            let passes: Vec<_> = report.failures.iter().map(|f| (f.time_index, f.pass)).collect();
            assert_eq!(passes, vec![(0, Some(Pass::Outward)), (0, Some(Pass::Inward))]);
            assert!(matches!(
                &report.failures[1].error,
                PartitionError::DegenerateRatio { child, .. } if child == "dend2"
            ));
        }
    }

    #[test]
    fn test_infinite_edge_fails_time_index() {
        let edges = vec![edge("dend", "soma", &[f32::INFINITY, 1.0])];
        let nodes = vec![
            node("soma", "ina", &[1.0, 1.0]),
            node("soma", "ik", &[1.0, 1.0]),
            node("dend", "ina", &[1.0, 1.0]),
            node("dend", "ik", &[0.0, 0.0]),
        ];
        let net = Network::from_rows(&edges, &nodes, 2).unwrap();
        let report = Partitioner::new(&net).run(&request("soma", &[0, 1])).unwrap();

        assert_eq!(report.positive.time_indices, vec![1]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].pass, Some(Pass::Outward));
        assert!(matches!(report.failures[0].error, PartitionError::SignPrecondition { .. }));
    }

    #[test]
    fn test_duplicate_time_indices_run_once() {
        let net = star();
        let report = Partitioner::new(&net).run(&request("soma", &[1, 0, 1, 0])).unwrap();
        assert_eq!(report.positive.time_indices, vec![1, 0]);
        assert_eq!(report.negative.time_indices, vec![1, 0]);
        assert_eq!(report.pairs_processed, 4);
    }

    #[test]
    fn test_unknown_target_fails_run() {
        let net = star();
        let err = Partitioner::new(&net).run(&request("axon", &[0])).unwrap_err();
        assert_eq!(err, PartitionError::UnknownTarget("axon".into()));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let edges = vec![
            edge("a", "soma", &[1.0, -1.0, 0.5, 2.0]),
            edge("b", "a", &[0.5, -0.5, 0.25, -1.0]),
            edge("c", "soma", &[-2.0, 2.0, 0.5, 1.0]),
        ];
        let mut nodes = Vec::new();
        for (seg, scale) in [("soma", 1.0f32), ("a", 2.0), ("b", 0.5), ("c", 3.0)] {
            nodes.push(node(seg, "ina", &[scale, -scale, scale, -scale]));
            nodes.push(node(seg, "ik", &[-scale, scale, 2.0 * scale, scale]));
        }
        let net = Network::from_rows(&edges, &nodes, 4).unwrap();
        let p = Partitioner::new(&net);

        let req = request("soma", &[0, 1, 2, 3]);
        let seq = p.run(&req).unwrap();
        let par = p.run_parallel(&req).unwrap();
        assert_eq!(seq, par);
        assert!(seq.is_complete(), "{:?}", seq.failures);
    }

    #[test]
    fn test_run_config_selects_range() {
        let net = star();
        let cfg = PartitionConfig {
            target: "soma".into(),
            time_indices: TimeSelection::Range { start: 0, end: 2 },
            parallel: true,
        };
        let report = Partitioner::new(&net).run_config(&cfg).unwrap();
        assert_eq!(report.positive.time_indices, vec![0, 1]);
    }
}
