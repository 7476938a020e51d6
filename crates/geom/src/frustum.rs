use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::{clip_polygon, polygon_centroid, polygon_normal, Aabb, Plane, Sphere, EPSILON};

/// A convex viewing volume described by inward-facing planes.
///
/// Camera frusta carry the usual six planes; portal frusta carry one plane
/// per portal edge plus the portal's own support plane, so the plane count
/// is variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    planes: Vec<Plane>,
}

impl Frustum {
    pub fn from_planes(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Extract the six clip planes from a view-projection matrix
    /// (Gribb/Hartmann). Assumes `[0, 1]` clip depth as produced by
    /// `Mat4::perspective_rh`.
    pub fn from_view_projection(vp: Mat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let left = r3 + r0;
        let right = r3 - r0;
        let bottom = r3 + r1;
        let top = r3 - r1;
        let near = r2;
        let far = r3 - r2;

        let planes = [left, right, bottom, top, near, far]
            .iter()
            .map(|v| Plane::from_coefficients(v.x, v.y, v.z, v.w))
            .collect();
        Self { planes }
    }

    /// Standard perspective camera frustum. `fov_y` in radians.
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::from_view_projection(proj * view)
    }

    /// Build the narrowed frustum seen through a portal polygon from `apex`.
    ///
    /// One plane per polygon edge passes through the apex; the portal's own
    /// support plane is flipped so the half-space on the far side of the
    /// portal (away from the apex) is inside. Returns `None` for degenerate
    /// polygons or when the apex lies in the portal plane.
    pub fn through_portal(apex: Vec3, polygon: &[Vec3]) -> Option<Self> {
        if polygon.len() < 3 {
            return None;
        }
        let centroid = polygon_centroid(polygon);
        let normal = polygon_normal(polygon);
        if normal == Vec3::ZERO {
            return None;
        }

        let mut support = Plane::from_point_normal(centroid, normal);
        let apex_dist = support.distance(apex);
        if apex_dist.abs() < EPSILON {
            return None;
        }
        // Invert so the inside is the side opposite the apex.
        if apex_dist > 0.0 {
            support = support.flipped();
        }

        let mut planes = Vec::with_capacity(polygon.len() + 1);
        planes.push(support);
        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            let n = (a - apex).cross(b - apex);
            if n.length_squared() < EPSILON {
                continue;
            }
            let mut plane = Plane::from_point_normal(apex, n.normalize());
            if plane.distance(centroid) < 0.0 {
                plane = plane.flipped();
            }
            planes.push(plane);
        }

        if planes.len() < 4 {
            return None;
        }
        Some(Self { planes })
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|pl| pl.distance(p) >= -EPSILON)
    }

    /// Conservative box test: rejects only when the box is fully outside
    /// one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes
            .iter()
            .all(|pl| pl.distance(aabb.support_point(pl.normal)) >= -EPSILON)
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|pl| pl.distance(sphere.center) >= -(sphere.radius + EPSILON))
    }

    /// Conservative polygon test: rejects only when every vertex is outside
    /// one plane.
    pub fn intersects_points(&self, points: &[Vec3]) -> bool {
        !points.is_empty()
            && self
                .planes
                .iter()
                .all(|pl| points.iter().any(|p| pl.distance(*p) >= -EPSILON))
    }

    /// Clip a convex polygon against every frustum plane. Empty when the
    /// polygon falls entirely outside.
    pub fn clip_polygon(&self, points: &[Vec3]) -> Vec<Vec3> {
        let mut current = points.to_vec();
        for plane in &self.planes {
            current = clip_polygon(&current, plane);
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Frustum {
        Frustum::perspective(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            60.0_f32.to_radians(),
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }

    #[test]
    fn camera_contains_look_target() {
        let f = test_camera();
        assert!(f.contains_point(Vec3::ZERO));
        assert!(f.contains_point(Vec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn camera_rejects_behind() {
        let f = test_camera();
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn aabb_test_is_conservative() {
        let f = test_camera();
        let visible = Aabb::from_center_extents(Vec3::ZERO, Vec3::ONE);
        let behind = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 50.0), Vec3::ONE);
        assert!(f.intersects_aabb(&visible));
        assert!(!f.intersects_aabb(&behind));
    }

    #[test]
    fn portal_frustum_narrows_view() {
        // Camera at origin looking down -Z through a small window at z=-5.
        let window = vec![
            Vec3::new(-1.0, -1.0, -5.0),
            Vec3::new(1.0, -1.0, -5.0),
            Vec3::new(1.0, 1.0, -5.0),
            Vec3::new(-1.0, 1.0, -5.0),
        ];
        let f = Frustum::through_portal(Vec3::ZERO, &window).unwrap();

        // Directly behind the window: visible.
        assert!(f.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        // In front of the window (camera side): not inside.
        assert!(!f.contains_point(Vec3::new(0.0, 0.0, -1.0)));
        // Far off to the side: clipped by an edge plane.
        assert!(!f.contains_point(Vec3::new(30.0, 0.0, -10.0)));
        // The cone widens with distance.
        assert!(f.contains_point(Vec3::new(3.0, 0.0, -20.0)));
    }

    #[test]
    fn portal_frustum_degenerate_inputs() {
        assert!(Frustum::through_portal(Vec3::ZERO, &[]).is_none());
        // Apex in the portal plane.
        let quad = vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ];
        assert!(Frustum::through_portal(Vec3::ZERO, &quad).is_none());
    }

    #[test]
    fn clip_polygon_against_camera() {
        let f = test_camera();
        // A huge quad crossing the whole view at z=0.
        let quad = vec![
            Vec3::new(-100.0, -100.0, 0.0),
            Vec3::new(100.0, -100.0, 0.0),
            Vec3::new(100.0, 100.0, 0.0),
            Vec3::new(-100.0, 100.0, 0.0),
        ];
        let clipped = f.clip_polygon(&quad);
        assert!(clipped.len() >= 3);
        for p in &clipped {
            for pl in f.planes() {
                assert!(pl.distance(*p) >= -1.0e-3);
            }
        }
    }
}
