//! Portal-frustum visibility: per-pass visibility records, the recursive
//! portal traversal, and transform-portal resolution.
//!
//! A pass builds a [`SceneState`] over the scene graph, traverses the
//! portal graph narrowing the camera frustum through each portal, then
//! collects the objects admitted by the per-zone frusta. Transform portals
//! (mirrors, remote viewpoints) spawn subsidiary records owned by their
//! parent.
//!
//! # Invariants
//! - Records are per-pass and never outlive the frame that built them.
//! - Each zone and portal is processed at most once per traversal.
//! - A zone's stored frustum is exact only while `clip_planes_valid`
//!   holds; consumers fall back to the camera frustum otherwise.

pub mod render;
pub mod state;
pub mod traverse;

pub use render::{collect_visible, render_current_images, render_scene};
pub use state::{
    CameraState, RenderPass, SceneState, TransformPortal, Viewport, ZoneState,
};
pub use traverse::traverse_portals;
