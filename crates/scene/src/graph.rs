//! The scene graph: object table, zone registry, membership bins, and the
//! portal table.
//!
//! Membership is kept in a slab pool of ref nodes. Each zone id has a bin
//! of node indices; each object has a chain of the nodes it holds. A node
//! records its position inside its bin (`bin_slot`) so removal is a
//! swap-remove plus one back-patch — no pointer surgery.

use std::collections::BTreeMap;

use glam::Vec3;
use zonespace_common::{ObjectId, ZoneId, MAX_OBJECT_ZONES, OUTSIDE_ZONE};
use zonespace_geom::Aabb;

use crate::object::SceneObject;
use crate::pool::SlabPool;
use crate::portal::{Portal, PortalId};
use crate::zone::{SceneRoot, ZoneRange};

/// One unit of membership: object `object` currently occupies zone `zone`.
#[derive(Debug)]
struct RefNode {
    zone: ZoneId,
    object: ObjectId,
    /// Index of this node's entry inside its zone bin.
    bin_slot: usize,
}

/// Authoritative container for objects, zones, membership, and portals.
///
/// All mutations go through explicit operations; traversals read the graph
/// immutably. Single-threaded by design — registration/rezoning and
/// traversals never interleave within a tick.
pub struct SceneGraph {
    objects: BTreeMap<ObjectId, Box<dyn SceneObject>>,
    root_id: ObjectId,
    /// Zone range records in registration order. Rezoning walks this in
    /// reverse so later (presumed more nested) owners win the
    /// fully-contains short-circuit.
    managers: Vec<ZoneRange>,
    /// One past the highest allocated zone id. Never shrinks.
    zone_end: ZoneId,
    /// Per zone id: pool indices of the refs currently in that zone.
    bins: Vec<Vec<u32>>,
    /// Per object: pool indices of all refs the object holds.
    chains: BTreeMap<ObjectId, Vec<u32>>,
    pool: SlabPool<RefNode>,
    /// Portal table; tombstoned on removal so `PortalId`s stay stable.
    portals: Vec<Option<Portal>>,
    /// Per zone id: portals attached to that zone.
    zone_portals: Vec<Vec<PortalId>>,
}

impl SceneGraph {
    /// Create a graph containing only the scene root, owning zone 0.
    pub fn new() -> Self {
        let root = SceneRoot::new();
        let root_id = root.id();
        let mut graph = Self {
            objects: BTreeMap::new(),
            root_id,
            managers: Vec::new(),
            zone_end: 0,
            bins: Vec::new(),
            chains: BTreeMap::new(),
            pool: SlabPool::new(),
            portals: Vec::new(),
            zone_portals: Vec::new(),
        };
        graph.objects.insert(root_id, Box::new(root));
        graph.register_zones(root_id, 1);
        graph
    }

    pub fn root_id(&self) -> ObjectId {
        self.root_id
    }

    /// One past the highest allocated zone id.
    pub fn zone_count(&self) -> u32 {
        self.zone_end
    }

    pub fn object(&self, id: ObjectId) -> Option<&dyn SceneObject> {
        self.objects.get(&id).map(|b| b.as_ref())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut (dyn SceneObject + 'static)> {
        self.objects.get_mut(&id).map(|b| b.as_mut())
    }

    /// All object ids in deterministic order, the root included.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn managers(&self) -> &[ZoneRange] {
        &self.managers
    }

    pub fn is_manager(&self, id: ObjectId) -> bool {
        self.manager_index(id).is_some()
    }

    /// Owner of `zone`, or `None` for a freed range.
    pub fn zone_owner_of(&self, zone: ZoneId) -> Option<ObjectId> {
        self.managers
            .iter()
            .find(|r| r.contains(zone))
            .map(|r| r.owner)
    }

    /// Objects currently occupying `zone`, in bin order.
    pub fn objects_in_zone(&self, zone: ZoneId) -> impl Iterator<Item = ObjectId> + '_ {
        self.bins[zone as usize]
            .iter()
            .map(|&idx| self.pool.get(idx).object)
    }

    /// Zone ids currently containing `object`.
    pub fn zones_of_object(&self, object: ObjectId) -> Vec<ZoneId> {
        self.chains
            .get(&object)
            .map(|chain| chain.iter().map(|&idx| self.pool.get(idx).zone).collect())
            .unwrap_or_default()
    }

    /// Live ref nodes (leak detector for tests and teardown).
    pub fn outstanding_refs(&self) -> usize {
        self.pool.live()
    }

    // --- object lifecycle ---

    /// Add an object to the scene and compute its initial membership.
    pub fn add_object(&mut self, object: Box<dyn SceneObject>) -> ObjectId {
        let id = object.id();
        let previous = self.objects.insert(id, object);
        assert!(previous.is_none(), "object {id:?} added twice");
        self.rezone_object(id);
        id
    }

    /// Remove an object, unregistering its zones first when it is a
    /// manager.
    pub fn remove_object(&mut self, id: ObjectId) {
        assert_ne!(id, self.root_id, "cannot remove the scene root");
        if self.is_manager(id) {
            self.unregister_zones(id);
        }
        self.detach_refs(id);
        self.objects
            .remove(&id)
            .unwrap_or_else(|| panic!("removing unknown object {id:?}"));
    }

    /// Move/resize an object and repair membership. A moving manager drags
    /// every object in the union of its old and new bounds through a
    /// rezone.
    pub fn update_object_bounds(&mut self, id: ObjectId, bounds: Aabb) {
        let old = self
            .objects
            .get(&id)
            .unwrap_or_else(|| panic!("updating unknown object {id:?}"))
            .world_bounds();
        self.objects
            .get_mut(&id)
            .expect("checked above")
            .set_world_bounds(bounds);

        if self.is_manager(id) {
            let region = old.union(&bounds);
            for other in self.find_objects(&region, zonespace_common::mask::ALL) {
                self.rezone_object(other);
            }
        } else {
            self.rezone_object(id);
        }
    }

    /// Remove every non-root object and assert the ref pool drained — the
    /// built-in leak detector for teardown.
    pub fn clear(&mut self) {
        let ids: Vec<ObjectId> = self
            .objects
            .keys()
            .copied()
            .filter(|&id| id != self.root_id)
            .collect();
        for id in ids {
            self.remove_object(id);
        }
        assert_eq!(self.pool.live(), 0, "ref pool leaked nodes at teardown");
    }

    // --- zone registration ---

    /// Allocate `count` contiguous zone ids for `owner` and rezone every
    /// object its bounds touch.
    pub fn register_zones(&mut self, owner: ObjectId, count: u32) {
        assert!(count > 0, "zone registration needs at least one zone");
        assert!(
            self.manager_index(owner).is_none(),
            "object {owner:?} is already a zone manager"
        );

        let start = self.zone_end;
        self.zone_end += count;
        self.bins.resize(self.zone_end as usize, Vec::new());
        self.zone_portals.resize(self.zone_end as usize, Vec::new());

        let obj = self
            .objects
            .get_mut(&owner)
            .unwrap_or_else(|| panic!("registering zones for unknown object {owner:?}"));
        obj.as_zone_owner_mut()
            .expect("zone registration requires a zone-owning object")
            .set_zone_range(Some((start, count)));

        self.managers.push(ZoneRange {
            owner,
            start,
            count,
        });
        tracing::debug!(?owner, start, count, "registered zone range");

        let bounds = self.objects[&owner].world_bounds();
        for id in self.find_objects(&bounds, zonespace_common::mask::ALL) {
            self.rezone_object(id);
        }
    }

    /// Tear down `owner`'s zone range: detach every ref bound to its ids,
    /// erase the record, and rezone the affected neighborhood.
    pub fn unregister_zones(&mut self, owner: ObjectId) {
        let index = self
            .manager_index(owner)
            .unwrap_or_else(|| panic!("object {owner:?} is not a zone manager"));
        let range = self.managers[index];

        for zone in range.start..range.start + range.count {
            let bin = std::mem::take(&mut self.bins[zone as usize]);
            for idx in bin {
                let node = self.pool.free(idx);
                if let Some(chain) = self.chains.get_mut(&node.object) {
                    chain.retain(|&i| i != idx);
                }
            }
            // Portals into a dead zone are dead too.
            let attached = std::mem::take(&mut self.zone_portals[zone as usize]);
            for pid in attached {
                self.remove_portal(pid);
            }
        }

        self.managers.remove(index);
        if let Some(obj) = self.objects.get_mut(&owner) {
            if let Some(zo) = obj.as_zone_owner_mut() {
                zo.set_zone_range(None);
            }
        }
        self.compact_zone_ids();
        tracing::debug!(?owner, start = range.start, count = range.count, "unregistered zone range");

        // The root only unregisters when the whole scene goes away; no one
        // is left to rezone.
        if owner != self.root_id {
            let bounds = self.objects[&owner].world_bounds();
            for id in self.find_objects(&bounds, zonespace_common::mask::ALL) {
                self.rezone_object(id);
            }
        }
    }

    /// Reclaim freed zone id ranges.
    ///
    /// Deliberately a no-op: `zone_end` only grows and freed ranges leave
    /// gaps. TODO: remap surviving ranges downward once visibility records
    /// index zone states by a stable handle instead of the raw id.
    fn compact_zone_ids(&mut self) {}

    // --- membership ---

    /// Recompute which zones contain `id` from scratch.
    ///
    /// Detaches everything first, then walks the manager list in reverse
    /// registration order accumulating overlapped zone ids, stopping at the
    /// first owner that fully contains the object. The root always reports
    /// containment, so the walk cannot finish empty-handed.
    pub fn rezone_object(&mut self, id: ObjectId) {
        if id == self.root_id {
            return;
        }
        self.detach_refs(id);

        let bounds = self
            .objects
            .get(&id)
            .unwrap_or_else(|| panic!("rezoning unknown object {id:?}"))
            .world_bounds();

        let mut zones: Vec<ZoneId> = Vec::new();
        let mut truncated = false;
        for record in self.managers.iter().rev() {
            if record.owner == id {
                continue;
            }
            let manager = self
                .objects
                .get(&record.owner)
                .expect("manager record without object");
            if !manager.world_bounds().overlaps(&bounds) {
                continue;
            }
            let owner = manager
                .as_zone_owner()
                .expect("manager record for non-owner object");

            let mut overlapped = Vec::new();
            let outside_included = owner.overlapping_zones(&bounds, &mut overlapped);
            for zone in overlapped {
                if zones.len() == MAX_OBJECT_ZONES {
                    truncated = true;
                    break;
                }
                if !zones.contains(&zone) {
                    zones.push(zone);
                }
            }
            if truncated {
                // Soft failure: a mis-zoned object renders wrong, a crash
                // takes the whole scene down.
                tracing::error!(object = ?id, "object overlaps more than MAX_OBJECT_ZONES zones; truncating");
                break;
            }
            if !outside_included {
                // This owner fully contains the object; nothing farther out
                // can also contain it.
                break;
            }
        }

        assert!(
            !zones.is_empty(),
            "object {id:?} accumulated zero zones; is the scene root registered?"
        );

        let mut chain = Vec::with_capacity(zones.len());
        for zone in zones {
            let slot = self.bins[zone as usize].len();
            let idx = self.pool.alloc(RefNode {
                zone,
                object: id,
                bin_slot: slot,
            });
            self.bins[zone as usize].push(idx);
            chain.push(idx);
        }
        tracing::trace!(object = ?id, refs = chain.len(), "rezoned object");
        self.chains.insert(id, chain);

        self.objects
            .get_mut(&id)
            .expect("checked above")
            .on_rezone();
    }

    /// Remove all of `id`'s refs from their bins and return the nodes to
    /// the pool.
    fn detach_refs(&mut self, id: ObjectId) {
        let Some(chain) = self.chains.remove(&id) else {
            return;
        };
        for idx in chain {
            let node = self.pool.free(idx);
            let bin = &mut self.bins[node.zone as usize];
            bin.swap_remove(node.bin_slot);
            if node.bin_slot < bin.len() {
                let moved = bin[node.bin_slot];
                self.pool.get_mut(moved).bin_slot = node.bin_slot;
            }
        }
    }

    // --- queries ---

    /// Broad-phase query: every non-root object whose bounds overlap
    /// `bounds` and whose type matches `type_mask`. Deterministic order.
    pub fn find_objects(&self, bounds: &Aabb, type_mask: u32) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(id, obj)| {
                **id != self.root_id
                    && obj.type_mask() & type_mask != 0
                    && obj.world_bounds().overlaps(bounds)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Locate the innermost zone containing `point`.
    ///
    /// Starts at zone 0 and descends: whenever a zone-owning object
    /// occupying the candidate zone reports the point inside one of its own
    /// zones, that zone becomes the candidate. The owner hierarchy is
    /// implicit in membership — a nested room occupies its parent's zone.
    pub fn find_zone(&self, point: Vec3) -> (ObjectId, ZoneId) {
        let mut owner = self.root_id;
        let mut zone = OUTSIDE_ZONE;
        let mut seen = vec![zone];

        loop {
            let mut descended = false;
            for &idx in &self.bins[zone as usize] {
                let node = self.pool.get(idx);
                if node.object == owner {
                    continue;
                }
                let Some(candidate) = self.objects[&node.object].as_zone_owner() else {
                    continue;
                };
                if let Some(sub) = candidate.point_zone(point) {
                    if seen.contains(&sub) {
                        continue;
                    }
                    owner = node.object;
                    zone = sub;
                    seen.push(sub);
                    descended = true;
                    break;
                }
            }
            if !descended {
                return (owner, zone);
            }
        }
    }

    // --- portals ---

    /// Add a portal connecting `zone_a` and `zone_b` (zone 0 = outside).
    pub fn add_portal(&mut self, zone_a: ZoneId, zone_b: ZoneId, points: Vec<Vec3>) -> PortalId {
        assert!(zone_a < self.zone_end, "portal references unallocated zone {zone_a}");
        assert!(zone_b < self.zone_end, "portal references unallocated zone {zone_b}");
        let portal = Portal::new(zone_a, zone_b, points);
        let id = PortalId(self.portals.len() as u32);
        self.portals.push(Some(portal));
        self.zone_portals[zone_a as usize].push(id);
        self.zone_portals[zone_b as usize].push(id);
        tracing::debug!(?id, zone_a, zone_b, "added portal");
        id
    }

    pub fn remove_portal(&mut self, id: PortalId) {
        let Some(portal) = self.portals[id.0 as usize].take() else {
            return;
        };
        for zone in portal.zones() {
            self.zone_portals[zone as usize].retain(|&p| p != id);
        }
    }

    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.portals
            .get(id.0 as usize)
            .and_then(|slot| slot.as_ref())
    }

    /// Portal table size (including tombstones) — the bound for visited-key
    /// arrays.
    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    pub fn portals_of_zone(&self, zone: ZoneId) -> &[PortalId] {
        &self.zone_portals[zone as usize]
    }

    /// Live portals, in id order.
    pub fn portals(&self) -> impl Iterator<Item = (PortalId, &Portal)> + '_ {
        self.portals
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|p| (PortalId(i as u32), p)))
    }

    fn manager_index(&self, id: ObjectId) -> Option<usize> {
        self.managers.iter().position(|r| r.owner == id)
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
