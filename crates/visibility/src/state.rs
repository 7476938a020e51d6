//! Per-pass visibility records.
//!
//! A [`SceneState`] is built fresh for every render pass and discarded
//! after it. It records, per zone, whether the zone is renderable this
//! pass and under which (possibly narrowed) frustum; it also collects the
//! transform portals discovered during traversal and owns the subsidiary
//! records rendered through them.

use glam::Vec3;
use zonespace_common::{ObjectId, ZoneId};
use zonespace_geom::Frustum;
use zonespace_scene::PortalId;

/// Render target rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Camera parameters a pass traverses with.
#[derive(Debug, Clone)]
pub struct CameraState {
    pub position: Vec3,
    pub frustum: Frustum,
    pub viewport: Viewport,
}

/// Which kind of pass this record was built for. Shadow and reflection
/// passes traverse the same way but consumers filter differently on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    Standard,
    Reflection,
    Shadow,
}

/// Per-zone slice of a visibility record.
#[derive(Debug, Clone)]
pub struct ZoneState {
    /// Whether the traversal reached this zone at all.
    pub render: bool,
    /// Frustum the zone was entered under, narrowed through every portal
    /// on the path. `None` until the zone is reached.
    pub frustum: Option<Frustum>,
    pub viewport: Viewport,
    /// False once a zone is reached along more than one portal path; the
    /// stored frustum then under-approximates the visible region and
    /// consumers must fall back to the root frustum.
    pub clip_planes_valid: bool,
}

/// A portal that re-projects the viewpoint rather than merely connecting
/// adjacent zones (mirrors, remote cameras). Resolved after the main
/// traversal into a subsidiary [`SceneState`].
#[derive(Debug, Clone)]
pub struct TransformPortal {
    pub owner: ObjectId,
    pub portal: PortalId,
    /// Zone the subsidiary traversal starts in.
    pub target_zone: ZoneId,
    /// Transformed viewpoint the subsidiary camera sits at.
    pub start: Vec3,
    /// Mirrored viewpoints flip triangle winding.
    pub flip_cull: bool,
}

/// Visibility record for one pass: camera, per-zone states, transform
/// portals, and the subsidiary records rendered through them.
#[derive(Debug)]
pub struct SceneState {
    camera: CameraState,
    pass: RenderPass,
    object_mask: u32,
    flip_cull: bool,
    zone_states: Vec<ZoneState>,
    transform_portals: Vec<TransformPortal>,
    subsidiaries: Vec<SceneState>,
}

impl SceneState {
    pub fn new(camera: CameraState, pass: RenderPass, object_mask: u32, zone_count: u32) -> Self {
        let viewport = camera.viewport;
        Self {
            camera,
            pass,
            object_mask,
            flip_cull: false,
            zone_states: vec![
                ZoneState {
                    render: false,
                    frustum: None,
                    viewport,
                    clip_planes_valid: true,
                };
                zone_count as usize
            ],
            transform_portals: Vec::new(),
            subsidiaries: Vec::new(),
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    pub fn object_mask(&self) -> u32 {
        self.object_mask
    }

    pub fn flip_cull(&self) -> bool {
        self.flip_cull
    }

    pub fn set_flip_cull(&mut self, flip: bool) {
        self.flip_cull = flip;
    }

    pub fn zone_state(&self, zone: ZoneId) -> &ZoneState {
        &self.zone_states[zone as usize]
    }

    /// Mutable access for consumers that post-process a record (e.g.
    /// assigning sub-rect viewports to subsidiary zones).
    pub fn zone_state_mut(&mut self, zone: ZoneId) -> &mut ZoneState {
        &mut self.zone_states[zone as usize]
    }

    /// Zones the traversal reached, in id order.
    pub fn rendered_zones(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zone_states
            .iter()
            .enumerate()
            .filter(|(_, z)| z.render)
            .map(|(i, _)| i as ZoneId)
    }

    /// Mark `zone` renderable under `frustum`. First arrival wins; later
    /// arrivals along other portal paths invalidate the stored clip planes
    /// instead of widening them.
    pub(crate) fn enter_zone(&mut self, zone: ZoneId, frustum: Frustum) {
        let state = &mut self.zone_states[zone as usize];
        if state.render {
            state.clip_planes_valid = false;
        } else {
            state.render = true;
            state.frustum = Some(frustum);
        }
    }

    /// Frustum to cull against inside `zone`: the narrowed one when it is
    /// still exact, the camera frustum otherwise.
    pub fn culling_frustum(&self, zone: ZoneId) -> &Frustum {
        let state = &self.zone_states[zone as usize];
        match &state.frustum {
            Some(f) if state.clip_planes_valid => f,
            _ => &self.camera.frustum,
        }
    }

    /// Register a transform portal discovered this pass; resolved into a
    /// subsidiary record after the main traversal.
    pub fn insert_transform_portal(&mut self, portal: TransformPortal) {
        self.transform_portals.push(portal);
    }

    pub fn transform_portals(&self) -> &[TransformPortal] {
        &self.transform_portals
    }

    pub(crate) fn take_transform_portals(&mut self) -> Vec<TransformPortal> {
        std::mem::take(&mut self.transform_portals)
    }

    pub fn push_subsidiary(&mut self, state: SceneState) {
        self.subsidiaries.push(state);
    }

    pub fn subsidiaries(&self) -> &[SceneState] {
        &self.subsidiaries
    }
}
