//! Geometry kit for the zone/portal subsystem.
//!
//! # Invariants
//! - Plane normals are unit length; signed distance is `n·p + d`.
//! - Frustum planes point inward: a point is inside when every signed
//!   distance is non-negative (within `EPSILON`).
//! - All tests against bounds are conservative: they may report an
//!   intersection that a finer test would reject, never the reverse.

mod bounds;
mod frustum;
mod plane;
mod polygon;

pub use bounds::{Aabb, Sphere};
pub use frustum::Frustum;
pub use plane::Plane;
pub use polygon::{clip_polygon, polygon_centroid, polygon_normal};

/// Tolerance used by containment and clipping tests.
pub const EPSILON: f32 = 1.0e-5;
