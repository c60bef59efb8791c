use crate::analysis::topology;
use crate::flow::FlowGraph;
use crate::store::{Pass, SegmentId};
use std::fmt::Write;

/// Renders a planned order, one pair per line, indented by tree depth.
pub fn format_order(
    graph: &FlowGraph<'_>,
    target: SegmentId,
    pass: Pass,
    order: &[(SegmentId, SegmentId)],
) -> String {
    let registry = graph.registry();
    let mut output = String::new();

    if target.index() >= registry.count() {
        let _ = writeln!(output, "Error: Invalid Segment ID {:?}", target);
        return output;
    }

    let _ = writeln!(
        output,
        "PARTITION ORDER for '{}' ({} pass, time index {}):",
        registry.name(target), pass, graph.time_index()
    );
    let _ = writeln!(output, "--------------------------------------------------");
    if order.is_empty() {
        let _ = writeln!(output, "(no contributing segments)");
        return output;
    }

    let target_depth = topology::path_to_root(registry, target).len();
    for (step, &(child, parent)) in order.iter().enumerate() {
        let depth = topology::path_to_root(registry, child).len().abs_diff(target_depth);
        let value = graph.pair_value(child, parent)
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|e| format!("<{}>", e));
        let _ = writeln!(
            output,
            "[{:>3}] {}{} -> {}  iax={}",
            step,
            "  ".repeat(depth.saturating_sub(1)),
            registry.name(child),
            registry.name(parent),
            value
        );
    }
    output
}
