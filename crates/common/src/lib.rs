//! Shared identifiers, type masks, and constants for the zonespace
//! workspace.

pub mod types;

pub use types::{mask, ObjectId, ZoneId, MAX_OBJECT_ZONES, OUTSIDE_ZONE};
