use super::graph::FlowGraph;
use crate::compute::error::PartitionError;
use crate::store::{Pass, SegmentId};
use smallvec::SmallVec;

/// A leaf-first sequence of `(child, parent)` pairs for one time index and pass.
pub type PartitionOrder = Vec<(SegmentId, SegmentId)>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting,
    Visited,
}

/// Computes the processing order for redistributing current toward `target`.
///
/// Explores the flow graph depth-first from `target` (on the reversed graph for
/// `Pass::Inward`), records the tree edges in discovery order, swaps each edge
/// to `(child, parent)` and reverses the list. Every segment therefore shows up
/// as a child before it is ever used as a parent, and the list ends with the
/// target's immediate neighbours. Segments without a path from `target` in the
/// pass orientation are left out.
///
/// Reaching a segment twice means the flow graph is not a tree; that is
/// reported instead of producing a partial order.
pub fn plan(graph: &FlowGraph<'_>, target: SegmentId, pass: Pass) -> Result<PartitionOrder, PartitionError> {
    let registry = graph.registry();
    let count = registry.count();
    if target.index() >= count {
        return Err(PartitionError::UnknownTarget(format!("#{}", target.index())));
    }

    let mut state = vec![VisitState::None; count];
    let mut discovered: Vec<(SegmentId, SegmentId)> = Vec::new();

    // Explicit stack: dendritic trees can be thousands of segments deep.
    let mut stack: Vec<(SegmentId, SmallVec<[SegmentId; 4]>, usize)> =
        vec![(target, graph.successors(target, pass), 0)];
    state[target.index()] = VisitState::Visiting;

    while let Some(frame) = stack.last_mut() {
        if frame.2 < frame.1.len() {
            let from = frame.0;
            let next = frame.1[frame.2];
            frame.2 += 1;

            match state[next.index()] {
                VisitState::None => {}
                VisitState::Visiting => {
                    return Err(PartitionError::topology(format!(
                        "cycle through segment '{}' in {} pass at time index {}",
                        registry.name(next), pass, graph.time_index()
                    )));
                }
                VisitState::Visited => {
                    return Err(PartitionError::topology(format!(
                        "segment '{}' reached along two paths in {} pass at time index {}",
                        registry.name(next), pass, graph.time_index()
                    )));
                }
            }
            state[next.index()] = VisitState::Visiting;
            discovered.push((from, next));
            stack.push((next, graph.successors(next, pass), 0));
        } else if let Some((node, _, _)) = stack.pop() {
            state[node.index()] = VisitState::Visited;
        }
    }

    Ok(discovered.into_iter().rev().map(|(u, v)| (v, u)).collect())
}

/// True if no pair uses a segment as parent before that segment has been
/// processed as a child, and no segment is processed as a child twice.
pub fn is_leaf_first(order: &[(SegmentId, SegmentId)]) -> bool {
    use std::collections::HashSet;
    let mut done: HashSet<SegmentId> = HashSet::new();
    let children: HashSet<SegmentId> = order.iter().map(|&(c, _)| c).collect();
    if children.len() != order.len() {
        return false;
    }
    for &(child, parent) in order {
        // `parent` already handed its current on; this contribution would be lost.
        if done.contains(&parent) {
            return false;
        }
        done.insert(child);
    }
    true
}
