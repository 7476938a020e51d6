use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an object registered with the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense zone identifier. Zone ids are allocated in contiguous ranges,
/// one range per zone-owning object.
pub type ZoneId = u32;

/// The global outside zone. Always present, always owned by the scene root.
pub const OUTSIDE_ZONE: ZoneId = 0;

/// Upper bound on how many zones a single object may occupy at once.
/// Rezoning truncates (with an error log) rather than aborting when an
/// object straddles more zones than this.
pub const MAX_OBJECT_ZONES: usize = 128;

/// Object type masks used to filter broad-phase queries and render passes.
pub mod mask {
    /// Static level geometry.
    pub const STATIC: u32 = 1 << 0;
    /// Dynamic simulation objects.
    pub const DYNAMIC: u32 = 1 << 1;
    /// Zone-owning objects (rooms, interiors).
    pub const ZONE: u32 = 1 << 2;
    /// Matches every object type.
    pub const ALL: u32 = !0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_uniqueness() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn object_ids_are_ordered() {
        let mut ids: Vec<ObjectId> = (0..16).map(|_| ObjectId::new()).collect();
        ids.sort();
        for w in ids.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn masks_are_disjoint() {
        assert_eq!(mask::STATIC & mask::DYNAMIC, 0);
        assert_eq!(mask::STATIC & mask::ZONE, 0);
        assert_eq!(mask::ALL & mask::ZONE, mask::ZONE);
    }
}
