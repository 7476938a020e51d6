//! Pass assembly: run the traversal, collect the visible set, and resolve
//! transform portals into subsidiary records.

use std::collections::BTreeSet;

use zonespace_common::ObjectId;
use zonespace_geom::Frustum;
use zonespace_scene::{SceneGraph, TraversalKeys};

use crate::state::{CameraState, RenderPass, SceneState};
use crate::traverse::{traverse_from, traverse_portals};

/// Build the visibility record for one pass and collect the objects it
/// admits. The record is returned alongside the visible set so callers can
/// inspect per-zone frusta or resolve transform portals afterwards.
pub fn render_scene(
    graph: &SceneGraph,
    keys: &mut TraversalKeys,
    camera: CameraState,
    pass: RenderPass,
    object_mask: u32,
) -> (SceneState, Vec<ObjectId>) {
    let mut state = SceneState::new(camera, pass, object_mask, graph.zone_count());
    traverse_portals(graph, keys, &mut state);
    let visible = collect_visible(graph, &state);
    (state, visible)
}

/// Objects in rendered zones that pass the zone's culling frustum and the
/// pass mask. An object spanning several rendered zones is tested against
/// each zone's frustum until one admits it, and reported once.
pub fn collect_visible(graph: &SceneGraph, state: &SceneState) -> Vec<ObjectId> {
    let mut accepted = BTreeSet::new();
    let mut out = Vec::new();
    for zone in state.rendered_zones() {
        let frustum = state.culling_frustum(zone);
        for id in graph.objects_in_zone(zone) {
            if accepted.contains(&id) {
                continue;
            }
            let Some(obj) = graph.object(id) else {
                continue;
            };
            if obj.type_mask() & state.object_mask() == 0 {
                continue;
            }
            if frustum.intersects_aabb(&obj.world_bounds()) {
                accepted.insert(id);
                out.push(id);
            }
        }
    }
    out
}

/// Resolve the record's transform portals depth-first.
///
/// Each one spawns a subsidiary [`SceneState`] traversed from the target
/// zone with the transformed viewpoint, bracketed by the owner's
/// `open_portal`/`close_portal` hooks. Subsidiaries are owned by the
/// parent record and die with it.
pub fn render_current_images(
    graph: &mut SceneGraph,
    keys: &mut TraversalKeys,
    state: &mut SceneState,
) {
    let portals = state.take_transform_portals();
    for tp in &portals {
        let Some(portal) = graph.portal(tp.portal) else {
            continue;
        };
        let points = portal.points().to_vec();
        let Some(frustum) = Frustum::through_portal(tp.start, &points) else {
            continue;
        };

        let camera = CameraState {
            position: tp.start,
            frustum,
            viewport: state.camera().viewport,
        };
        let mut sub =
            SceneState::new(camera, state.pass(), state.object_mask(), graph.zone_count());
        sub.set_flip_cull(state.flip_cull() ^ tp.flip_cull);

        open_portal_hook(graph, tp.owner, tp.portal, true);
        traverse_from(graph, keys, &mut sub, tp.target_zone, false);
        render_current_images(graph, keys, &mut sub);
        open_portal_hook(graph, tp.owner, tp.portal, false);

        state.push_subsidiary(sub);
    }
    for tp in portals {
        state.insert_transform_portal(tp);
    }
}

fn open_portal_hook(
    graph: &mut SceneGraph,
    owner: ObjectId,
    portal: zonespace_scene::PortalId,
    open: bool,
) {
    if let Some(obj) = graph.object_mut(owner) {
        if let Some(hooks) = obj.as_portal_owner_mut() {
            if open {
                hooks.open_portal(portal);
            } else {
                hooks.close_portal(portal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{TransformPortal, Viewport};
    use glam::Vec3;
    use std::cell::Cell;
    use std::rc::Rc;
    use zonespace_common::{mask, OUTSIDE_ZONE};
    use zonespace_geom::Aabb;
    use zonespace_scene::{PortalId, PortalOwner, RoomZone, SceneObject, SolidObject};

    fn camera_at(eye: Vec3, target: Vec3) -> CameraState {
        CameraState {
            position: eye,
            frustum: Frustum::perspective(
                eye,
                target,
                Vec3::Y,
                60.0_f32.to_radians(),
                16.0 / 9.0,
                0.1,
                500.0,
            ),
            viewport: Viewport::new(1280, 720),
        }
    }

    fn window(x0: f32, x1: f32, y0: f32, y1: f32, z: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(x0, y0, z),
            Vec3::new(x1, y0, z),
            Vec3::new(x1, y1, z),
            Vec3::new(x0, y1, z),
        ]
    }

    /// One room (zone 1) with a window to the outside, an occupant inside
    /// it, and a second room (zone 2) with no portals at all.
    fn scene() -> (SceneGraph, ObjectId, ObjectId) {
        let mut graph = SceneGraph::new();
        let a = graph.add_object(Box::new(RoomZone::new(Aabb::new(
            Vec3::ZERO,
            Vec3::new(10.0, 10.0, 10.0),
        ))));
        graph.register_zones(a, 1);
        let dark = graph.add_object(Box::new(RoomZone::new(Aabb::new(
            Vec3::new(50.0, 0.0, 0.0),
            Vec3::new(60.0, 10.0, 10.0),
        ))));
        graph.register_zones(dark, 1);
        graph.add_portal(OUTSIDE_ZONE, 1, window(4.0, 6.0, 4.0, 6.0, 0.0));

        let lit = graph.add_object(Box::new(SolidObject::new(Aabb::from_center_extents(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::splat(0.5),
        ))));
        let hidden = graph.add_object(Box::new(SolidObject::new(Aabb::from_center_extents(
            Vec3::new(55.0, 5.0, 5.0),
            Vec3::splat(0.5),
        ))));
        (graph, lit, hidden)
    }

    #[test]
    fn visible_set_honors_portal_reachability() {
        let (graph, lit, hidden) = scene();
        let mut keys = TraversalKeys::new();
        let camera = camera_at(Vec3::new(5.0, 5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));

        let (state, visible) =
            render_scene(&graph, &mut keys, camera, RenderPass::Standard, mask::ALL);
        assert!(state.zone_state(1).render);
        assert!(visible.contains(&lit));
        assert!(!visible.contains(&hidden));
    }

    #[test]
    fn narrowed_frustum_culls_inside_reached_zone() {
        let (mut graph, _, _) = scene();
        // In the room but far off the window's sight line.
        let corner = graph.add_object(Box::new(SolidObject::new(Aabb::from_center_extents(
            Vec3::new(9.5, 0.5, 9.5),
            Vec3::splat(0.2),
        ))));
        let mut keys = TraversalKeys::new();
        let camera = camera_at(Vec3::new(5.0, 5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));

        let (_, visible) =
            render_scene(&graph, &mut keys, camera, RenderPass::Standard, mask::ALL);
        assert!(!visible.contains(&corner));
    }

    #[test]
    fn object_mask_filters_visible_set() {
        let (mut graph, lit, _) = scene();
        let marker = graph.add_object(Box::new(SolidObject::with_mask(
            Aabb::from_center_extents(Vec3::new(5.0, 5.0, 4.0), Vec3::splat(0.3)),
            mask::STATIC,
        )));
        let mut keys = TraversalKeys::new();
        let camera = camera_at(Vec3::new(5.0, 5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));

        let (_, visible) =
            render_scene(&graph, &mut keys, camera, RenderPass::Standard, mask::STATIC);
        assert!(visible.contains(&marker));
        assert!(!visible.contains(&lit));
    }

    #[test]
    fn straddling_object_reported_once() {
        let (mut graph, _, _) = scene();
        // Sits half in the room, half outside; both zones render.
        let straddler = graph.add_object(Box::new(SolidObject::new(Aabb::from_center_extents(
            Vec3::new(5.0, 5.0, 0.0),
            Vec3::splat(0.5),
        ))));
        let mut keys = TraversalKeys::new();
        let camera = camera_at(Vec3::new(5.0, 5.0, -5.0), Vec3::new(5.0, 5.0, 5.0));

        let (_, visible) =
            render_scene(&graph, &mut keys, camera, RenderPass::Standard, mask::ALL);
        assert_eq!(visible.iter().filter(|&&id| id == straddler).count(), 1);
    }

    struct Mirror {
        inner: SolidObject,
        opens: Rc<Cell<u32>>,
        closes: Rc<Cell<u32>>,
    }

    impl SceneObject for Mirror {
        fn id(&self) -> ObjectId {
            self.inner.id()
        }
        fn type_mask(&self) -> u32 {
            self.inner.type_mask()
        }
        fn world_bounds(&self) -> Aabb {
            self.inner.world_bounds()
        }
        fn set_world_bounds(&mut self, bounds: Aabb) {
            self.inner.set_world_bounds(bounds);
        }
        fn as_portal_owner_mut(&mut self) -> Option<&mut dyn PortalOwner> {
            Some(self)
        }
    }

    impl PortalOwner for Mirror {
        fn open_portal(&mut self, _portal: PortalId) {
            self.opens.set(self.opens.get() + 1);
        }
        fn close_portal(&mut self, _portal: PortalId) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    #[test]
    fn transform_portal_spawns_subsidiary() {
        // Two rooms joined by a single door; no path to the outside.
        let mut graph = SceneGraph::new();
        let a = graph.add_object(Box::new(RoomZone::new(Aabb::new(
            Vec3::ZERO,
            Vec3::new(10.0, 10.0, 10.0),
        ))));
        graph.register_zones(a, 1);
        let b = graph.add_object(Box::new(RoomZone::new(Aabb::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 10.0, 20.0),
        ))));
        graph.register_zones(b, 1);
        let pid = graph.add_portal(1, 2, window(4.0, 6.0, 4.0, 6.0, 10.0));

        let opens = Rc::new(Cell::new(0));
        let closes = Rc::new(Cell::new(0));
        let mirror = graph.add_object(Box::new(Mirror {
            inner: SolidObject::new(Aabb::from_center_extents(
                Vec3::new(5.0, 5.0, 9.9),
                Vec3::new(1.0, 1.0, 0.1),
            )),
            opens: Rc::clone(&opens),
            closes: Rc::clone(&closes),
        }));

        let mut keys = TraversalKeys::new();
        let camera = camera_at(Vec3::new(5.0, 5.0, 5.0), Vec3::new(5.0, 5.0, 10.0));
        let (mut state, _) =
            render_scene(&graph, &mut keys, camera, RenderPass::Standard, mask::ALL);
        state.insert_transform_portal(TransformPortal {
            owner: mirror,
            portal: pid,
            target_zone: 1,
            start: Vec3::new(5.0, 5.0, 15.0),
            flip_cull: true,
        });

        render_current_images(&mut graph, &mut keys, &mut state);

        assert_eq!(state.subsidiaries().len(), 1);
        let sub = &state.subsidiaries()[0];
        assert!(sub.flip_cull());
        assert!(sub.zone_state(1).render);
        // Subsidiary traversals never seed the outside zone.
        assert!(!sub.zone_state(OUTSIDE_ZONE).render);
        assert_eq!(opens.get(), 1);
        assert_eq!(closes.get(), 1);
        // The transform portal list survives resolution.
        assert_eq!(state.transform_portals().len(), 1);
    }
}
