use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// A box that contains every finite point. Used for the scene root.
    pub fn everything() -> Self {
        Self {
            min: Vec3::splat(f32::MIN),
            max: Vec3::splat(f32::MAX),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Smallest sphere enclosing the box.
    pub fn bounding_sphere(&self) -> Sphere {
        Sphere {
            center: self.center(),
            radius: self.half_extents().length(),
        }
    }

    /// Distance from `point` to the box surface; zero inside.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        point.distance(point.clamp(self.min, self.max))
    }

    /// The corner of the box farthest along `direction`.
    pub fn support_point(&self, direction: Vec3) -> Vec3 {
        Vec3::new(
            if direction.x >= 0.0 { self.max.x } else { self.min.x },
            if direction.y >= 0.0 { self.max.y } else { self.min.y },
            if direction.z >= 0.0 { self.max.z } else { self.min.z },
        )
    }
}

/// Bounding sphere used by scoping distance tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Distance from `point` to the sphere surface; negative inside.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.center.distance(point) - self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_and_overlaps() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(4.0));
        let c = Aabb::new(Vec3::splat(9.0), Vec3::splat(12.0));
        assert!(a.contains_aabb(&b));
        assert!(!a.contains_aabb(&c));
        assert!(a.overlaps(&c));
        assert!(!b.overlaps(&c));
    }

    #[test]
    fn everything_contains_everything() {
        let all = Aabb::everything();
        assert!(all.contains_point(Vec3::splat(1.0e30)));
        assert!(all.overlaps(&Aabb::new(Vec3::ZERO, Vec3::ONE)));
    }

    #[test]
    fn bounding_sphere_encloses_corners() {
        let b = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0));
        let s = b.bounding_sphere();
        assert!(s.distance_to_point(b.min) <= 1.0e-4);
        assert!(s.distance_to_point(b.max) <= 1.0e-4);
    }

    #[test]
    fn distance_to_point_zero_inside() {
        let b = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        assert_eq!(b.distance_to_point(Vec3::ONE), 0.0);
        assert!((b.distance_to_point(Vec3::new(5.0, 1.0, 1.0)) - 3.0).abs() < 1.0e-6);
    }

    #[test]
    fn support_point_picks_corner() {
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(b.support_point(Vec3::new(1.0, -1.0, 1.0)), Vec3::new(1.0, 0.0, 1.0));
    }
}
