use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An infinite oriented plane: all points `p` with `normal·p + d == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Plane with the given unit normal passing through `point`.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points, normal following the right-hand winding.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize();
        Self {
            normal,
            d: -normal.dot(a),
        }
    }

    /// Build from raw coefficients `(a, b, c, d)`, normalizing so the
    /// normal is unit length.
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let len = normal.length();
        Self {
            normal: normal / len,
            d: d / len,
        }
    }

    /// Signed distance from `point` to the plane. Positive is the side the
    /// normal points toward.
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// The same plane facing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }
}
