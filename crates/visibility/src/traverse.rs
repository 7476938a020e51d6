//! Portal-frustum traversal.
//!
//! Depth-first walk over the portal graph: pop a portal, test it against
//! the frustum it was queued under, clip the portal polygon, derive the
//! narrowed frustum through it, and enter the zone on the far side. Each
//! stack entry carries its own parent frustum, so a branch can never be
//! admitted or culled against a sibling's frustum.
//!
//! # Invariants
//! - Every zone and portal is processed at most once per traversal
//!   (generation-keyed visited checks, cycle-safe).
//! - The camera's own zone and the outside zone render under the unclipped
//!   camera frustum; all other zones only under a portal-narrowed one.

use std::cmp::Ordering;

use glam::Vec3;
use zonespace_common::{ZoneId, OUTSIDE_ZONE};
use zonespace_geom::Frustum;
use zonespace_scene::{PortalId, SceneGraph, TraversalKeys};

use crate::state::SceneState;

struct StackEntry {
    portal: PortalId,
    from_zone: ZoneId,
    /// Frustum of the zone this portal was queued from.
    frustum: Frustum,
}

/// Top-level traversal for a pass: locate the camera's zone, seed it and
/// the outside zone, then walk every reachable portal.
pub fn traverse_portals(graph: &SceneGraph, keys: &mut TraversalKeys, state: &mut SceneState) {
    let (_, camera_zone) = graph.find_zone(state.camera().position);
    traverse_from(graph, keys, state, camera_zone, true);
}

/// Traversal body, shared with subsidiary (transform-portal) passes, which
/// start in an interior zone and must not seed the outside.
pub(crate) fn traverse_from(
    graph: &SceneGraph,
    keys: &mut TraversalKeys,
    state: &mut SceneState,
    camera_zone: ZoneId,
    seed_outside: bool,
) {
    let span = tracing::debug_span!("traverse_portals", camera_zone);
    let _guard = span.enter();

    let key = keys.begin_render(graph.zone_count() as usize, graph.portal_count());
    let camera_pos = state.camera().position;
    let base = state.camera().frustum.clone();
    let mut stack: Vec<StackEntry> = Vec::new();

    keys.visit_zone(camera_zone, key);
    state.enter_zone(camera_zone, base.clone());

    if seed_outside && camera_zone != OUTSIDE_ZONE {
        keys.visit_zone(OUTSIDE_ZONE, key);
        state.enter_zone(OUTSIDE_ZONE, base.clone());
    }

    // Camera-zone portals go in first so the outside portals, sorted
    // nearest-first, end up on top of the stack.
    if camera_zone != OUTSIDE_ZONE {
        push_zone_portals(graph, &mut stack, camera_zone, &base, camera_pos, false);
    }
    if seed_outside || camera_zone == OUTSIDE_ZONE {
        push_zone_portals(graph, &mut stack, OUTSIDE_ZONE, &base, camera_pos, true);
    }

    while let Some(entry) = stack.pop() {
        let Some(portal) = graph.portal(entry.portal) else {
            continue;
        };
        if !keys.visit_portal(entry.portal, key) {
            continue;
        }
        let target = portal.other_zone(entry.from_zone);
        if target == camera_zone {
            // The camera's zone keeps the unclipped frustum.
            continue;
        }

        if !entry.frustum.intersects_points(portal.points()) {
            continue;
        }
        let clipped = entry.frustum.clip_polygon(portal.points());
        if clipped.len() < 3 {
            continue;
        }
        let Some(narrowed) = Frustum::through_portal(camera_pos, &clipped) else {
            continue;
        };

        if keys.visit_zone(target, key) {
            state.enter_zone(target, narrowed.clone());
            push_zone_portals(graph, &mut stack, target, &narrowed, camera_pos, false);
        } else {
            // Second visible path into the zone: the stored frustum no
            // longer bounds everything visible there.
            state.enter_zone(target, narrowed);
        }
    }

    tracing::debug!(
        rendered = state.rendered_zones().count(),
        "portal traversal complete"
    );
}

fn push_zone_portals(
    graph: &SceneGraph,
    stack: &mut Vec<StackEntry>,
    zone: ZoneId,
    frustum: &Frustum,
    camera_pos: Vec3,
    sort_nearest: bool,
) {
    let mut ids: Vec<PortalId> = graph.portals_of_zone(zone).to_vec();
    if sort_nearest {
        // Farthest first in the vector, so the nearest portal pops first.
        // Affects traversal order only, never the visited set.
        let dist = |id: PortalId| {
            graph
                .portal(id)
                .map(|p| p.center().distance_squared(camera_pos))
                .unwrap_or(f32::INFINITY)
        };
        ids.sort_by(|&a, &b| dist(b).partial_cmp(&dist(a)).unwrap_or(Ordering::Equal));
    }
    for id in ids {
        stack.push(StackEntry {
            portal: id,
            from_zone: zone,
            frustum: frustum.clone(),
        });
    }
}
