//! Zone registry and membership engine: the authoritative record of which
//! object occupies which zones, plus the portal graph connecting zones.
//!
//! # Invariants
//! - Zone 0 (the global outside zone) always exists and belongs to the
//!   scene root; the root manages exactly one zone.
//! - An object's live refs equal the set of zones containing it, bounded by
//!   `MAX_OBJECT_ZONES`.
//! - Membership mutation is two-phase (full detach, then reinsert), so no
//!   partially-updated state is observable between calls.
//! - Iteration over objects is deterministic (`BTreeMap` keyed by
//!   `ObjectId`).

pub mod graph;
pub mod keys;
pub mod object;
pub mod pool;
pub mod portal;
pub mod zone;

pub use graph::SceneGraph;
pub use keys::TraversalKeys;
pub use object::{PortalOwner, SceneObject, SolidObject};
pub use pool::SlabPool;
pub use portal::{Portal, PortalId};
pub use zone::{RoomZone, SceneRoot, ZoneOwner, ZoneRange};
