//! JSON scene descriptions for the CLI.
//!
//! A scene file lists rooms, portals, and plain objects by name. Rooms are
//! registered in file order, so enclosing rooms must come before the rooms
//! nested inside them. Portal endpoints name a room or the literal
//! `"outside"`.

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zonespace_common::{ObjectId, ZoneId, OUTSIDE_ZONE};
use zonespace_geom::Aabb;
use zonespace_scene::{RoomZone, SceneGraph, SolidObject};

#[derive(Debug, Error)]
pub enum SceneFileError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scene file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("portal references unknown room {0:?}")]
    UnknownRoom(String),
    #[error("room {0:?} defined twice")]
    DuplicateRoom(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub rooms: Vec<RoomDesc>,
    #[serde(default)]
    pub portals: Vec<PortalDesc>,
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDesc {
    pub name: String,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalDesc {
    pub zone_a: String,
    pub zone_b: String,
    pub points: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDesc {
    pub name: String,
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
}

/// A scene graph built from a description, with name lookups both ways.
pub struct BuiltScene {
    pub graph: SceneGraph,
    pub names: BTreeMap<ObjectId, String>,
    pub zones: BTreeMap<String, ZoneId>,
}

impl BuiltScene {
    pub fn zone_name(&self, zone: ZoneId) -> String {
        if zone == OUTSIDE_ZONE {
            return "outside".to_string();
        }
        self.zones
            .iter()
            .find(|&(_, &z)| z == zone)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| format!("zone-{zone}"))
    }

    pub fn object_name(&self, id: ObjectId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("{id:?}"))
    }
}

pub fn load(path: &Path) -> Result<SceneFile, SceneFileError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn build(desc: &SceneFile) -> Result<BuiltScene, SceneFileError> {
    let mut graph = SceneGraph::new();
    let mut names = BTreeMap::new();
    let mut zones: BTreeMap<String, ZoneId> = BTreeMap::new();

    for room in &desc.rooms {
        if zones.contains_key(&room.name) {
            return Err(SceneFileError::DuplicateRoom(room.name.clone()));
        }
        let id = graph.add_object(Box::new(RoomZone::new(Aabb::new(
            Vec3::from(room.min),
            Vec3::from(room.max),
        ))));
        graph.register_zones(id, 1);
        let zone = graph
            .object(id)
            .and_then(|o| o.as_zone_owner())
            .and_then(|z| z.zone_range())
            .map(|(start, _)| start)
            .ok_or_else(|| SceneFileError::UnknownRoom(room.name.clone()))?;
        names.insert(id, room.name.clone());
        zones.insert(room.name.clone(), zone);
    }

    let resolve = |name: &str| -> Result<ZoneId, SceneFileError> {
        if name == "outside" {
            return Ok(OUTSIDE_ZONE);
        }
        zones
            .get(name)
            .copied()
            .ok_or_else(|| SceneFileError::UnknownRoom(name.to_string()))
    };
    for portal in &desc.portals {
        let a = resolve(&portal.zone_a)?;
        let b = resolve(&portal.zone_b)?;
        let points = portal.points.iter().map(|&p| Vec3::from(p)).collect();
        graph.add_portal(a, b, points);
    }

    for obj in &desc.objects {
        let id = graph.add_object(Box::new(SolidObject::new(Aabb::from_center_extents(
            Vec3::from(obj.center),
            Vec3::from(obj.half_extents),
        ))));
        names.insert(id, obj.name.clone());
    }

    Ok(BuiltScene {
        graph,
        names,
        zones,
    })
}

/// Built-in two-room house used when no scene file is given: a hall with
/// a window to the outside, a den behind a door, and a few props.
pub fn demo_scene() -> SceneFile {
    SceneFile {
        rooms: vec![
            RoomDesc {
                name: "hall".to_string(),
                min: [0.0, 0.0, 0.0],
                max: [10.0, 10.0, 10.0],
            },
            RoomDesc {
                name: "den".to_string(),
                min: [0.0, 0.0, 10.0],
                max: [10.0, 10.0, 20.0],
            },
        ],
        portals: vec![
            PortalDesc {
                zone_a: "outside".to_string(),
                zone_b: "hall".to_string(),
                points: vec![
                    [4.0, 4.0, 0.0],
                    [6.0, 4.0, 0.0],
                    [6.0, 6.0, 0.0],
                    [4.0, 6.0, 0.0],
                ],
            },
            PortalDesc {
                zone_a: "hall".to_string(),
                zone_b: "den".to_string(),
                points: vec![
                    [4.0, 0.0, 10.0],
                    [6.0, 0.0, 10.0],
                    [6.0, 7.0, 10.0],
                    [4.0, 7.0, 10.0],
                ],
            },
        ],
        objects: vec![
            ObjectDesc {
                name: "crate".to_string(),
                center: [5.0, 0.5, 5.0],
                half_extents: [0.5, 0.5, 0.5],
            },
            ObjectDesc {
                name: "lamp".to_string(),
                center: [5.0, 1.0, 15.0],
                half_extents: [0.3, 1.0, 0.3],
            },
            ObjectDesc {
                name: "tree".to_string(),
                center: [30.0, 3.0, 5.0],
                half_extents: [1.0, 3.0, 1.0],
            },
        ],
    }
}
