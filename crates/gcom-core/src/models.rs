//! Core data models for the ground control backend.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wire value of an identifier that has not been assigned by the store.
pub const SENTINEL_ID: i64 = -1;

/// Identity of a stored entity.
///
/// Serialized as a bare integer so existing clients keep sending `-1` for
/// new records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// Not written to the store yet
    #[default]
    Unpersisted,
    /// Row identifier assigned by the store
    Persisted(i64),
}

impl EntityId {
    pub fn from_raw(raw: i64) -> Self {
        if raw == SENTINEL_ID {
            EntityId::Unpersisted
        } else {
            EntityId::Persisted(raw)
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            EntityId::Unpersisted => SENTINEL_ID,
            EntityId::Persisted(id) => id,
        }
    }

    pub fn persisted(self) -> Option<i64> {
        match self {
            EntityId::Unpersisted => None,
            EntityId::Persisted(id) => Some(id),
        }
    }

    pub fn is_persisted(self) -> bool {
        matches!(self, EntityId::Persisted(_))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Unpersisted => f.write_str("unpersisted"),
            EntityId::Persisted(id) => write!(f, "{}", id),
        }
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(EntityId::from_raw)
    }
}

// ========== STORED ENTITIES ==========

/// A named geographic point registered for the competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            id: EntityId::Unpersisted,
            name: name.into(),
            longitude,
            latitude,
            altitude,
        }
    }

    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: EntityId::Persisted(id),
            ..self
        }
    }

    /// Two waypoints are duplicates when every field but the identifier matches.
    pub fn same_fields(&self, other: &Waypoint) -> bool {
        self.name == other.name
            && self.longitude == other.longitude
            && self.latitude == other.latitude
            && self.altitude == other.altitude
    }
}

/// A point-to-point competition task between two named waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub id: EntityId,
    /// Competition-assigned route number
    pub number: u32,
    /// Waypoint name, not a store reference
    pub start_waypoint: String,
    /// Waypoint name, not a store reference
    pub end_waypoint: String,
    pub passengers: u32,
    pub max_vehicle_weight: f64,
    pub value: f64,
    #[serde(default)]
    pub remarks: String,
    /// Position in the computed flight plan, unset until planned
    #[serde(default, with = "route_order")]
    pub order: Option<u32>,
}

impl Route {
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: EntityId::Persisted(id),
            ..self
        }
    }

    pub fn with_order(self, order: u32) -> Self {
        Self {
            order: Some(order),
            ..self
        }
    }

    /// Duplicate check used by create: ignores the identifier and the order.
    pub fn same_fields(&self, other: &Route) -> bool {
        self.number == other.number
            && self.start_waypoint == other.start_waypoint
            && self.end_waypoint == other.end_waypoint
            && self.passengers == other.passengers
            && self.max_vehicle_weight == other.max_vehicle_weight
            && self.value == other.value
            && self.remarks == other.remarks
    }
}

/// `order` travels as `-1` while unset.
mod route_order {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(order: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match order {
            Some(order) => serializer.serialize_i64(i64::from(*order)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| u32::try_from(value).ok()))
    }
}

// ========== MISSION PLANNER ==========

/// Live aircraft telemetry reported by Mission Planner. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftStatus {
    pub velocity: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub heading: f64,
    #[serde(rename = "voltage")]
    pub battery_voltage: f64,
}

/// Ordered waypoints the aircraft is currently flying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub queue: Vec<Waypoint>,
}
