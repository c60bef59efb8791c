use crate::compute::error::PartitionError;
use crate::store::{SegmentId, SegmentRegistry};
use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::UnGraph;

/// Undirected view of the parent pointers.
pub fn undirected(registry: &SegmentRegistry) -> UnGraph<(), ()> {
    let edges = registry.parent.iter().enumerate()
        .filter_map(|(i, p)| p.map(|p| (i as u32, p.0)));
    let mut graph = UnGraph::<(), ()>::from_edges(edges);
    // from_edges only sizes the graph up to the largest endpoint seen.
    while graph.node_count() < registry.count() {
        graph.add_node(());
    }
    graph
}

/// Rejects any topology that is not a forest.
///
/// Self-loops, duplicate edges and second parents are already refused while
/// linking, so the remaining failure is a cycle through parent pointers.
pub fn check_tree(registry: &SegmentRegistry) -> Result<(), PartitionError> {
    let graph = undirected(registry);
    if is_cyclic_undirected(&graph) {
        let culprit = find_cycle_member(registry)
            .map(|id| registry.name(id).to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        return Err(PartitionError::topology(format!("cycle detected involving segment '{}'", culprit)));
    }
    tracing::debug!(
        segments = registry.count(),
        components = connected_components(&graph),
        "topology validated"
    );
    Ok(())
}

/// Walks parent pointers from every segment; a walk longer than the segment
/// count has entered a loop.
fn find_cycle_member(registry: &SegmentRegistry) -> Option<SegmentId> {
    let count = registry.count();
    for start in 0..count {
        let mut node = SegmentId::new(start);
        for _ in 0..=count {
            match registry.get_parent(node) {
                Some(p) => node = p,
                None => break,
            }
        }
        if registry.get_parent(node).is_some() {
            return Some(node);
        }
    }
    None
}

/// Segments on the path from `segment` up to its root, `segment` first.
pub fn path_to_root(registry: &SegmentRegistry, segment: SegmentId) -> Vec<SegmentId> {
    let mut path = vec![segment];
    let mut node = segment;
    while let Some(p) = registry.get_parent(node) {
        if path.len() > registry.count() {
            break;
        }
        path.push(p);
        node = p;
    }
    path
}
