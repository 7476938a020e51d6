//! Scene object traits and the plain occupant type.

use serde::{Deserialize, Serialize};
use zonespace_common::{mask, ObjectId};
use zonespace_geom::Aabb;

use crate::portal::PortalId;

/// Base trait for everything registered with the scene graph.
///
/// Zone-owning capability is exposed through the `as_zone_owner` accessors
/// rather than on the base trait, so plain occupants pay nothing for it.
pub trait SceneObject {
    fn id(&self) -> ObjectId;

    /// Type mask used to filter broad-phase queries and render passes.
    fn type_mask(&self) -> u32;

    fn world_bounds(&self) -> Aabb;

    /// Move/resize the object. The registry calls `rezone_object` afterwards;
    /// implementations only update their own geometry.
    fn set_world_bounds(&mut self, bounds: Aabb);

    /// Notification hook fired after the registry reassigned this object's
    /// zone membership.
    fn on_rezone(&mut self) {}

    fn as_zone_owner(&self) -> Option<&dyn crate::zone::ZoneOwner> {
        None
    }

    fn as_zone_owner_mut(&mut self) -> Option<&mut dyn crate::zone::ZoneOwner> {
        None
    }

    fn as_portal_owner_mut(&mut self) -> Option<&mut dyn PortalOwner> {
        None
    }
}

/// Render-context hooks for objects that own transform portals (mirrors,
/// remote viewpoints). The actual rendering context is an external
/// collaborator; these hooks only bracket a subsidiary visibility record's
/// lifetime.
pub trait PortalOwner {
    fn open_portal(&mut self, portal: PortalId);
    fn close_portal(&mut self, portal: PortalId);
}

/// A plain occupant: a bounded object with no zones of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidObject {
    id: ObjectId,
    bounds: Aabb,
    type_mask: u32,
}

impl SolidObject {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            id: ObjectId::new(),
            bounds,
            type_mask: mask::DYNAMIC,
        }
    }

    pub fn with_mask(bounds: Aabb, type_mask: u32) -> Self {
        Self {
            id: ObjectId::new(),
            bounds,
            type_mask,
        }
    }
}

impl SceneObject for SolidObject {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_mask(&self) -> u32 {
        self.type_mask
    }

    fn world_bounds(&self) -> Aabb {
        self.bounds
    }

    fn set_world_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn solid_object_defaults() {
        let obj = SolidObject::new(Aabb::from_center_extents(Vec3::ZERO, Vec3::ONE));
        assert_eq!(obj.type_mask(), mask::DYNAMIC);
        assert!(obj.as_zone_owner().is_none());
    }

    #[test]
    fn set_world_bounds_moves_box() {
        let mut obj = SolidObject::new(Aabb::from_center_extents(Vec3::ZERO, Vec3::ONE));
        let moved = Aabb::from_center_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE);
        obj.set_world_bounds(moved);
        assert_eq!(obj.world_bounds(), moved);
    }
}
