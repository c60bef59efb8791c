use serde::{Serialize, Deserialize};

/// Dense index of a segment in the static topology arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl SegmentId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// Dense index of an interned current-component label (e.g. `ina`, `ik`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl ComponentId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// Which redistribution pass is running.
///
/// `Outward` follows non-negative edge currents away from the target and writes
/// into the non-negative copy of the node table; `Inward` runs on the reversed
/// graph and writes into the negative copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pass {
    Outward,
    Inward,
}

impl Pass {
    pub const ALL: [Pass; 2] = [Pass::Outward, Pass::Inward];

    pub fn label(&self) -> &'static str {
        match self {
            Pass::Outward => "outward",
            Pass::Inward => "inward",
        }
    }
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
