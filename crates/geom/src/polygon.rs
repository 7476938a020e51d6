use glam::Vec3;

use crate::{Plane, EPSILON};

/// Clip a convex polygon against a plane, keeping the side the plane's
/// normal points toward. Returns an empty vector when the polygon lies
/// entirely behind the plane.
pub fn clip_polygon(points: &[Vec3], plane: &Plane) -> Vec<Vec3> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(points.len() + 1);
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let da = plane.distance(a);
        let db = plane.distance(b);

        if da >= -EPSILON {
            out.push(a);
        }
        // Edge crosses the plane: emit the intersection point.
        if (da > EPSILON && db < -EPSILON) || (da < -EPSILON && db > EPSILON) {
            let t = da / (da - db);
            out.push(a + (b - a) * t);
        }
    }

    if out.len() < 3 {
        Vec::new()
    } else {
        out
    }
}

/// Arithmetic mean of the polygon vertices. Good enough as an interior
/// point for convex polygons, which is all the portal graph carries.
pub fn polygon_centroid(points: &[Vec3]) -> Vec3 {
    let mut sum = Vec3::ZERO;
    for p in points {
        sum += *p;
    }
    sum / points.len().max(1) as f32
}

/// Newell-method polygon normal. More robust than a single cross product
/// for nearly collinear leading vertices. Not normalized when degenerate.
pub fn polygon_normal(points: &[Vec3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n.normalize_or_zero()
}
