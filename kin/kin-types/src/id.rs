//! Frame identifiers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a frame in a scene.
///
/// Ids are dense arena indices: the frame with id `i` is the `i`-th frame of
/// its scene. They stay stable under ordinary edits; only explicit compaction
/// (prune) or `clear` reassigns them. Bridges exploit the density to keep
/// actor maps as plain arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameId(pub u32);

impl FrameId {
    /// Create a new frame ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index value.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for FrameId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_id() {
        let id = FrameId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "Frame(7)");
        assert_eq!(FrameId::from(7u32), id);
    }
}
