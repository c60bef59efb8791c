//! graph.rs
//! Per-time-step direction map over the static tree.
//!
//! The tree itself never changes; a `FlowGraph` only records, for one time
//! index, the signed current on each edge. Edge direction follows the sign:
//! `v >= 0` points parent -> child, `v < 0` points child -> parent.

use crate::compute::error::PartitionError;
use crate::store::{Network, Pass, SegmentId, SegmentRegistry};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    ParentToChild,
    ChildToParent,
}

impl Orientation {
    /// `None` for NaN: such an edge carries no direction and is left out of the graph.
    pub fn from_value(value: f64) -> Option<Self> {
        if value >= 0.0 {
            Some(Orientation::ParentToChild)
        } else if value < 0.0 {
            Some(Orientation::ChildToParent)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowGraph<'a> {
    registry: &'a SegmentRegistry,
    time_index: usize,
    // Signed edge current, indexed by the child segment of each tree edge.
    weights: Vec<Option<f64>>,
}

impl<'a> FlowGraph<'a> {
    /// Reads one time column of the edge table.
    pub fn build(network: &'a Network, time_index: usize) -> Result<Self, PartitionError> {
        let n_times = network.edges.n_times();
        if time_index >= n_times {
            return Err(PartitionError::MissingTimeIndex { index: time_index, available: n_times });
        }
        let registry = &network.registry;
        let weights = (0..registry.count())
            .map(|i| network.edges.get(SegmentId::new(i), time_index).map(f64::from))
            .collect();
        Ok(Self { registry, time_index, weights })
    }

    pub fn registry(&self) -> &'a SegmentRegistry { self.registry }
    pub fn time_index(&self) -> usize { self.time_index }

    /// Signed current on the edge `child -> parent(child)`.
    #[inline(always)]
    pub fn weight(&self, child: SegmentId) -> Option<f64> {
        self.weights.get(child.index()).copied().flatten()
    }

    pub fn orientation(&self, child: SegmentId) -> Option<Orientation> {
        self.weight(child).and_then(Orientation::from_value)
    }

    /// All directed edges as `(donor, recipient, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (SegmentId, SegmentId, f64)> + '_ {
        (0..self.registry.count()).filter_map(move |i| {
            let child = SegmentId::new(i);
            let parent = self.registry.get_parent(child)?;
            let w = self.weight(child)?;
            match Orientation::from_value(w)? {
                Orientation::ParentToChild => Some((parent, child, w)),
                Orientation::ChildToParent => Some((child, parent, w)),
            }
        })
    }

    /// Out-neighbours of `node`. For `Pass::Inward` every edge is reversed first.
    pub fn successors(&self, node: SegmentId, pass: Pass) -> SmallVec<[SegmentId; 4]> {
        // Outward keeps edges as built; inward flips them.
        let (down, up) = match pass {
            Pass::Outward => (Orientation::ParentToChild, Orientation::ChildToParent),
            Pass::Inward => (Orientation::ChildToParent, Orientation::ParentToChild),
        };

        let mut out = SmallVec::new();
        for child in self.registry.children(node) {
            if self.orientation(child) == Some(down) {
                out.push(child);
            }
        }
        if let Some(parent) = self.registry.get_parent(node) {
            if self.orientation(node) == Some(up) {
                out.push(parent);
            }
        }
        out
    }

    /// Signed current flowing from `child` into `parent` for a traversal pair.
    ///
    /// When the pair runs against the stored orientation the value is negated.
    pub fn pair_value(&self, child: SegmentId, parent: SegmentId) -> Result<f64, PartitionError> {
        let stored = if self.registry.get_parent(child) == Some(parent) {
            self.weight(child)
        } else if self.registry.get_parent(parent) == Some(child) {
            self.weight(parent).map(|w| -w)
        } else {
            None
        };
        stored.ok_or_else(|| PartitionError::MissingEdge {
            child: self.registry.name(child).to_string(),
            parent: self.registry.name(parent).to_string(),
        })
    }
}
