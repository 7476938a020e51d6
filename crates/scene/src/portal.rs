//! Portals: plane-bounded connectors between two zones.

use glam::Vec3;
use zonespace_common::ZoneId;
use zonespace_geom::{polygon_centroid, polygon_normal, Plane};

/// Stable index of a portal in the scene graph's portal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub u32);

/// A convex planar polygon connecting exactly two zones (one of which may
/// be the outside zone). Holds zone ids only — it owns neither zone.
#[derive(Debug, Clone)]
pub struct Portal {
    zones: [ZoneId; 2],
    points: Vec<Vec3>,
    plane: Plane,
}

impl Portal {
    /// Panics on degenerate polygons (< 3 points or no usable normal);
    /// portal geometry is assumed structurally valid by the time it reaches
    /// the graph.
    pub fn new(zone_a: ZoneId, zone_b: ZoneId, points: Vec<Vec3>) -> Self {
        assert!(points.len() >= 3, "portal polygon needs at least 3 points");
        assert_ne!(zone_a, zone_b, "portal must connect two distinct zones");
        let normal = polygon_normal(&points);
        assert!(normal != Vec3::ZERO, "degenerate portal polygon");
        let plane = Plane::from_point_normal(polygon_centroid(&points), normal);
        Self {
            zones: [zone_a, zone_b],
            points,
            plane,
        }
    }

    pub fn zones(&self) -> [ZoneId; 2] {
        self.zones
    }

    pub fn connects(&self, zone: ZoneId) -> bool {
        self.zones[0] == zone || self.zones[1] == zone
    }

    /// The zone on the other side of the portal from `from`.
    pub fn other_zone(&self, from: ZoneId) -> ZoneId {
        if self.zones[0] == from {
            self.zones[1]
        } else {
            self.zones[0]
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn center(&self) -> Vec3 {
        polygon_centroid(&self.points)
    }
}
