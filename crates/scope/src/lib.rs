//! Network scoping: decide which objects a connection must replicate.
//!
//! Scoping reuses the zone topology the render traversal walks, but with a
//! distance test instead of a frustum test. From the connection's control
//! point it flags reachable zones in three steps, then runs one
//! bounding-sphere test per object in the flagged bins.
//!
//! # Invariants
//! - Each manager contributes its zone flags at most once per traversal.
//! - Each object is distance-tested at most once per traversal, however
//!   many flagged zones it occupies.
//! - Objects absent from every bin are never scoped; the minimum valid
//!   state is "everything in zone 0 within range".

use glam::Vec3;
use zonespace_common::{ObjectId, ZoneId};
use zonespace_scene::{SceneGraph, TraversalKeys};

/// Receiver for scoping decisions, one per network connection.
pub trait ScopeConnection {
    /// Called exactly once per traversal for every object the connection
    /// should replicate.
    fn object_in_scope(&mut self, object: ObjectId);
}

/// Flag all zones reachable from `point` within `distance` and report
/// every object in them whose bounding sphere lies within `distance`.
///
/// Walks upward from the zone containing `point` through enclosing
/// owners, then gives every remaining manager occupying an already
/// flagged zone one chance to contribute, so sibling rooms reachable
/// through a shared enclosing zone propagate.
pub fn scope_scene(
    graph: &SceneGraph,
    keys: &mut TraversalKeys,
    point: Vec3,
    distance: f32,
    conn: &mut dyn ScopeConnection,
) {
    let span = tracing::debug_span!("scope_scene", distance);
    let _guard = span.enter();

    let key = keys.begin_scope();
    let mut flags = vec![false; graph.zone_count() as usize];

    // Upward walk through enclosing owners.
    let (mut owner, _) = graph.find_zone(point);
    loop {
        if !keys.visit_manager(owner, key) {
            break;
        }
        let Some(zo) = graph.object(owner).and_then(|o| o.as_zone_owner()) else {
            break;
        };
        if !zo.scope_zones(point, distance, &mut flags) {
            break;
        }
        // Ascend to the owner of a zone this manager itself occupies.
        let enclosing = graph
            .zones_of_object(owner)
            .into_iter()
            .find_map(|z| graph.zone_owner_of(z).filter(|&o| o != owner));
        match enclosing {
            Some(next) => owner = next,
            None => break,
        }
    }

    // Sibling propagation: a manager sitting in a flagged zone may flag
    // its own zones too. Registration order is outer-first, so one pass
    // reaches nested managers.
    for record in graph.managers().to_vec() {
        if keys.manager_visited(record.owner, key) {
            continue;
        }
        let reachable = graph
            .zones_of_object(record.owner)
            .iter()
            .any(|&z| flags[z as usize]);
        if !reachable {
            continue;
        }
        keys.visit_manager(record.owner, key);
        if let Some(zo) = graph.object(record.owner).and_then(|o| o.as_zone_owner()) {
            zo.scope_zones(point, distance, &mut flags);
        }
    }

    // Distance test, once per object across all flagged bins.
    let mut scoped = 0usize;
    for zone in 0..flags.len() {
        if !flags[zone] {
            continue;
        }
        for id in graph.objects_in_zone(zone as ZoneId) {
            if !keys.scope_object(id, key) {
                continue;
            }
            let Some(obj) = graph.object(id) else {
                continue;
            };
            let sphere = obj.world_bounds().bounding_sphere();
            if sphere.distance_to_point(point) <= distance {
                conn.object_in_scope(id);
                scoped += 1;
            }
        }
    }
    tracing::debug!(scoped, "scope traversal complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonespace_geom::Aabb;
    use zonespace_scene::{RoomZone, SolidObject};

    #[derive(Default)]
    struct Recorder {
        scoped: Vec<ObjectId>,
    }

    impl ScopeConnection for Recorder {
        fn object_in_scope(&mut self, object: ObjectId) {
            self.scoped.push(object);
        }
    }

    fn solid(center: Vec3, half: f32) -> Box<SolidObject> {
        Box::new(SolidObject::new(Aabb::from_center_extents(
            center,
            Vec3::splat(half),
        )))
    }

    fn room(min: Vec3, max: Vec3) -> Box<RoomZone> {
        Box::new(RoomZone::new(Aabb::new(min, max)))
    }

    /// Rooms A (zone 1) and B (zone 2) nested inside A.
    fn nested_scene() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let a = graph.add_object(room(Vec3::ZERO, Vec3::splat(20.0)));
        graph.register_zones(a, 1);
        let b = graph.add_object(room(Vec3::splat(2.0), Vec3::splat(8.0)));
        graph.register_zones(b, 1);
        graph
    }

    #[test]
    fn near_object_scoped_far_object_not() {
        let mut graph = nested_scene();
        let near = graph.add_object(solid(Vec3::splat(5.0), 0.5));
        let far = graph.add_object(solid(Vec3::new(18.0, 18.0, 18.0), 0.5));

        let mut keys = TraversalKeys::new();
        let mut conn = Recorder::default();
        // Point inside B; distance reaches `near` but not `far`.
        scope_scene(&graph, &mut keys, Vec3::splat(4.0), 5.0, &mut conn);

        assert!(conn.scoped.contains(&near));
        assert!(!conn.scoped.contains(&far));
    }

    #[test]
    fn straddling_object_scoped_once() {
        let mut graph = nested_scene();
        // Straddles B's wall: member of zones 1 and 2, both flagged.
        let id = graph.add_object(solid(Vec3::new(8.0, 5.0, 5.0), 1.0));

        let mut keys = TraversalKeys::new();
        let mut conn = Recorder::default();
        scope_scene(&graph, &mut keys, Vec3::splat(5.0), 10.0, &mut conn);

        assert_eq!(conn.scoped.iter().filter(|&&x| x == id).count(), 1);
    }

    #[test]
    fn outdoor_point_scopes_zone_zero_by_distance() {
        let mut graph = SceneGraph::new();
        let near = graph.add_object(solid(Vec3::new(100.0, 0.0, 0.0), 1.0));
        let far = graph.add_object(solid(Vec3::new(200.0, 0.0, 0.0), 1.0));

        let mut keys = TraversalKeys::new();
        let mut conn = Recorder::default();
        scope_scene(&graph, &mut keys, Vec3::new(95.0, 0.0, 0.0), 10.0, &mut conn);

        assert_eq!(conn.scoped, vec![near]);
        assert!(!conn.scoped.contains(&far));
    }

    #[test]
    fn sibling_room_reached_through_enclosing_zone() {
        let mut graph = SceneGraph::new();
        let a = graph.add_object(room(Vec3::ZERO, Vec3::splat(10.0)));
        graph.register_zones(a, 1);
        let b = graph.add_object(room(
            Vec3::new(12.0, 0.0, 0.0),
            Vec3::new(22.0, 10.0, 10.0),
        ));
        graph.register_zones(b, 1);
        let inside_b = graph.add_object(solid(Vec3::new(13.0, 5.0, 5.0), 0.5));

        let mut keys = TraversalKeys::new();
        let mut conn = Recorder::default();
        // Point in A; the walk reaches root, root flags zone 0, and B (an
        // occupant of zone 0) contributes its own zone.
        scope_scene(&graph, &mut keys, Vec3::new(9.0, 5.0, 5.0), 8.0, &mut conn);

        assert!(conn.scoped.contains(&inside_b));
    }

    #[test]
    fn unflagged_zone_bins_are_never_tested() {
        let mut graph = SceneGraph::new();
        let a = graph.add_object(room(Vec3::ZERO, Vec3::splat(10.0)));
        graph.register_zones(a, 1);
        let far_room = graph.add_object(room(
            Vec3::new(500.0, 0.0, 0.0),
            Vec3::new(510.0, 10.0, 10.0),
        ));
        graph.register_zones(far_room, 1);
        let hidden = graph.add_object(solid(Vec3::new(505.0, 5.0, 5.0), 0.5));

        let mut keys = TraversalKeys::new();
        let mut conn = Recorder::default();
        scope_scene(&graph, &mut keys, Vec3::splat(5.0), 8.0, &mut conn);

        assert!(!conn.scoped.contains(&hidden));
    }

    #[test]
    fn repeated_traversals_stay_independent() {
        let mut graph = nested_scene();
        let id = graph.add_object(solid(Vec3::splat(5.0), 0.5));

        let mut keys = TraversalKeys::new();
        for _ in 0..3 {
            let mut conn = Recorder::default();
            scope_scene(&graph, &mut keys, Vec3::splat(4.0), 5.0, &mut conn);
            assert_eq!(conn.scoped.iter().filter(|&&x| x == id).count(), 1);
        }
    }
}
