use super::types::SegmentId;
use crate::compute::error::PartitionError;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Static tree topology: interned segment names, one parent pointer per
/// segment and an intrusive child list for outward traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentRegistry {
    pub names: Vec<String>,
    pub parent: Vec<Option<SegmentId>>,

    // Downstream traversal helpers (linked list per segment)
    pub first_child: Vec<u32>,
    pub child_targets: Vec<SegmentId>,
    pub next_child: Vec<u32>,

    // Rebuilt on load
    #[serde(skip)]
    pub lookup: HashMap<String, SegmentId>,
}

impl SegmentRegistry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.names.len() }

    /// Rebuilds the `lookup` map after deserialization.
    pub fn rebuild_name_cache(&mut self) {
        self.lookup = self.names.iter().enumerate()
            .map(|(i, n)| (n.clone(), SegmentId::new(i)))
            .collect();
    }

    /// Returns the id for `name`, registering it if unseen.
    pub fn intern(&mut self, name: &str) -> SegmentId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = SegmentId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.parent.push(None);
        self.first_child.push(u32::MAX);
        self.lookup.insert(name.to_string(), id);
        id
    }

    /// Records `child -> parent`. Rejects self-loops, repeated edges and a
    /// second parent for the same child.
    pub fn link(&mut self, child: SegmentId, parent: SegmentId) -> Result<(), PartitionError> {
        if child == parent {
            return Err(PartitionError::topology(format!(
                "self-loop on segment '{}'", self.name(child)
            )));
        }
        match self.parent[child.index()] {
            Some(existing) if existing == parent => {
                return Err(PartitionError::topology(format!(
                    "duplicate edge '{}' -> '{}'", self.name(child), self.name(parent)
                )));
            }
            Some(existing) => {
                return Err(PartitionError::topology(format!(
                    "segment '{}' has two parents: '{}' and '{}'",
                    self.name(child), self.name(existing), self.name(parent)
                )));
            }
            None => {}
        }
        self.parent[child.index()] = Some(parent);

        let head = self.first_child[parent.index()];
        let new_edge = self.child_targets.len() as u32;
        self.child_targets.push(child);
        self.next_child.push(head);
        self.first_child[parent.index()] = new_edge;
        Ok(())
    }

    #[inline(always)]
    pub fn get_parent(&self, id: SegmentId) -> Option<SegmentId> {
        self.parent[id.index()]
    }

    pub fn children(&self, id: SegmentId) -> Children<'_> {
        Children { registry: self, edge_idx: self.first_child[id.index()] }
    }

    pub fn id_of(&self, name: &str) -> Option<SegmentId> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, id: SegmentId) -> &str {
        &self.names[id.index()]
    }
}

/// Iterator over the linked child list of one segment.
pub struct Children<'a> {
    registry: &'a SegmentRegistry,
    edge_idx: u32,
}

impl Iterator for Children<'_> {
    type Item = SegmentId;

    fn next(&mut self) -> Option<SegmentId> {
        if self.edge_idx == u32::MAX {
            return None;
        }
        let child = self.registry.child_targets[self.edge_idx as usize];
        self.edge_idx = self.registry.next_child[self.edge_idx as usize];
        Some(child)
    }
}
