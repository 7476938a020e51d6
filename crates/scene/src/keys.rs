//! Session-owned generation counters for traversal visited checks.
//!
//! Each zone, portal, manager, and object remembers the key of the last
//! traversal that touched it; a traversal begins by bumping its counter, so
//! "visited" checks need no per-node resets between frames. The whole
//! struct is passed by reference into every traversal call — there is no
//! global state.

use std::collections::BTreeMap;

use zonespace_common::{ObjectId, ZoneId};

use crate::portal::PortalId;

#[derive(Debug, Default)]
pub struct TraversalKeys {
    render_key: u64,
    scope_key: u64,
    zone_visited: Vec<u64>,
    portal_visited: Vec<u64>,
    manager_visited: BTreeMap<ObjectId, u64>,
    object_scoped: BTreeMap<ObjectId, u64>,
}

impl TraversalKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render traversal. Sizes the per-zone/per-portal key arrays
    /// (new entries start unvisited) and returns the fresh key.
    pub fn begin_render(&mut self, zone_count: usize, portal_count: usize) -> u64 {
        self.render_key += 1;
        if self.zone_visited.len() < zone_count {
            self.zone_visited.resize(zone_count, 0);
        }
        if self.portal_visited.len() < portal_count {
            self.portal_visited.resize(portal_count, 0);
        }
        self.render_key
    }

    /// Start a scope traversal and return its key.
    pub fn begin_scope(&mut self) -> u64 {
        self.scope_key += 1;
        self.scope_key
    }

    /// Mark a zone visited under `key`. Returns true on the first visit.
    pub fn visit_zone(&mut self, zone: ZoneId, key: u64) -> bool {
        let slot = &mut self.zone_visited[zone as usize];
        if *slot == key {
            false
        } else {
            *slot = key;
            true
        }
    }

    pub fn zone_visited(&self, zone: ZoneId, key: u64) -> bool {
        self.zone_visited[zone as usize] == key
    }

    /// Mark a portal visited under `key`. Returns true on the first visit.
    pub fn visit_portal(&mut self, portal: PortalId, key: u64) -> bool {
        let slot = &mut self.portal_visited[portal.0 as usize];
        if *slot == key {
            false
        } else {
            *slot = key;
            true
        }
    }

    /// Mark a manager's scoping contribution done under `key`. Returns true
    /// on the first visit.
    pub fn visit_manager(&mut self, owner: ObjectId, key: u64) -> bool {
        let slot = self.manager_visited.entry(owner).or_insert(0);
        if *slot == key {
            false
        } else {
            *slot = key;
            true
        }
    }

    pub fn manager_visited(&self, owner: ObjectId, key: u64) -> bool {
        self.manager_visited.get(&owner) == Some(&key)
    }

    /// Mark an object's scope distance test done under `key`. Returns true
    /// the first time, so objects in several flagged zones test once.
    pub fn scope_object(&mut self, object: ObjectId, key: u64) -> bool {
        let slot = self.object_scoped.entry(object).or_insert(0);
        if *slot == key {
            false
        } else {
            *slot = key;
            true
        }
    }
}
