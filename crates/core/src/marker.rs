//! Marker data model and the authoritative marker store
//!
//! A marker is one placed sensor. Creation is gated on a containing zone;
//! moving is permissive and lets a marker float outside every zone with a
//! null zone association.

use crate::error::{PlacementError, PlacementResult};
use crate::geometry::DocumentPoint;
use crate::zone::{ZoneId, ZoneIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a marker
///
/// Assigned monotonically by the owning [`MarkerStore`], starting at 1.
/// Persisted as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MarkerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl TryFrom<String> for MarkerId {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarkerId> for String {
    fn from(id: MarkerId) -> Self {
        id.to_string()
    }
}

/// A placed sensor
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: MarkerId,
    sensor_type: String,
    position: DocumentPoint,
    zone_id: Option<ZoneId>,
    label: Option<String>,
}

impl Marker {
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Sensor type, e.g. "Light" or "Temperature"
    pub fn sensor_type(&self) -> &str {
        &self.sensor_type
    }

    /// Position in document space
    pub fn position(&self) -> DocumentPoint {
        self.position
    }

    /// Zone the marker was last placed in; `None` while floating
    pub fn zone_id(&self) -> Option<&ZoneId> {
        self.zone_id.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_floating(&self) -> bool {
        self.zone_id.is_none()
    }

    /// Persisted form of this marker
    pub fn to_record(&self) -> MarkerRecord {
        MarkerRecord {
            id: self.id,
            sensor_type: self.sensor_type.clone(),
            x: self.position.x,
            y: self.position.y,
            zone_id: self.zone_id.clone(),
            label: self.label.clone(),
        }
    }
}

/// Persisted form of a marker
///
/// Field names follow the stored encoding: `{id, type, x, y, zoneId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub id: MarkerId,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "zoneId", default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MarkerRecord {
    pub fn position(&self) -> DocumentPoint {
        DocumentPoint::new(self.x, self.y)
    }
}

/// Ordered export of every marker, used only for persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutSnapshot {
    records: Vec<MarkerRecord>,
}

impl LayoutSnapshot {
    pub fn new(records: Vec<MarkerRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Owns every placed marker and the id counter
#[derive(Debug, Clone)]
pub struct MarkerStore {
    markers: BTreeMap<MarkerId, Marker>,
    next_id: u64,
}

impl MarkerStore {
    /// Create an empty store whose first marker will get id 1
    pub fn new() -> Self {
        Self { markers: BTreeMap::new(), next_id: 1 }
    }

    /// Place a new marker
    ///
    /// # Errors
    /// - `NonFinitePosition` if `position` has NaN or infinite components
    /// - `InvalidZone` if no zone contains `position`; markers are never
    ///   created unassigned
    /// - `IdSpaceExhausted` if every marker id has been handed out
    pub fn create(
        &mut self,
        sensor_type: impl Into<String>,
        position: DocumentPoint,
        zones: &ZoneIndex,
    ) -> PlacementResult<Marker> {
        ensure_finite(position)?;

        let zone_id = zones
            .find_containing_zone(&position)
            .cloned()
            .ok_or(PlacementError::InvalidZone { x: position.x, y: position.y })?;

        let id = MarkerId(self.next_id);
        let next_id = self.next_id.checked_add(1).ok_or(PlacementError::IdSpaceExhausted)?;
        self.next_id = next_id;

        let marker = Marker {
            id,
            sensor_type: sensor_type.into(),
            position,
            zone_id: Some(zone_id),
            label: None,
        };

        log::debug!(
            "created marker {} ({}) in zone {:?}",
            marker.id,
            marker.sensor_type,
            marker.zone_id
        );
        self.markers.insert(id, marker.clone());
        Ok(marker)
    }

    /// Reposition an existing marker and re-resolve its zone
    ///
    /// A position outside every zone is accepted; the marker's zone becomes
    /// `None`.
    ///
    /// # Errors
    /// - `MarkerNotFound` if `id` is unknown
    /// - `NonFinitePosition` if `position` has NaN or infinite components
    pub fn move_marker(
        &mut self,
        id: MarkerId,
        position: DocumentPoint,
        zones: &ZoneIndex,
    ) -> PlacementResult<Marker> {
        ensure_finite(position)?;

        let marker = self.markers.get_mut(&id).ok_or(PlacementError::MarkerNotFound(id))?;

        marker.zone_id = zones.find_containing_zone(&position).cloned();
        marker.position = position;

        if marker.zone_id.is_none() {
            log::debug!("marker {id} moved outside all zones");
        }

        Ok(marker.clone())
    }

    /// Set or clear a marker's display label
    pub fn relabel(&mut self, id: MarkerId, label: Option<String>) -> PlacementResult<Marker> {
        let marker = self.markers.get_mut(&id).ok_or(PlacementError::MarkerNotFound(id))?;
        marker.label = label;
        Ok(marker.clone())
    }

    /// Delete a marker
    pub fn remove(&mut self, id: MarkerId) -> PlacementResult<Marker> {
        self.markers.remove(&id).ok_or(PlacementError::MarkerNotFound(id))
    }

    /// Delete every marker
    ///
    /// The id counter keeps running so ids are never reused within the
    /// store's lifetime.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.markers.contains_key(&id)
    }

    /// Markers in id order
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    /// Markers currently associated with `zone_id`, in id order
    pub fn markers_in_zone<'a>(&'a self, zone_id: &'a ZoneId) -> impl Iterator<Item = &'a Marker> {
        self.markers.values().filter(move |marker| marker.zone_id.as_ref() == Some(zone_id))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Id the next created marker will receive
    pub fn next_id(&self) -> MarkerId {
        MarkerId(self.next_id)
    }

    /// Export every marker in id order
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::new(self.markers.values().map(Marker::to_record).collect())
    }

    /// Rebuild a store from a snapshot by direct insertion
    ///
    /// Stored zone associations are authoritative and are not checked against
    /// any zone index. The id counter resumes one past the largest restored id.
    ///
    /// # Errors
    /// Returns `StorageCorrupt` (with an empty key) on duplicate ids or
    /// non-finite positions; callers attach the key they read from.
    pub fn restore(snapshot: &LayoutSnapshot) -> PlacementResult<Self> {
        let mut store = Self::new();

        for record in snapshot.records() {
            if !record.position().is_finite() {
                return Err(corrupt(format!("marker {} has a non-finite position", record.id)));
            }

            let marker = Marker {
                id: record.id,
                sensor_type: record.sensor_type.clone(),
                position: record.position(),
                zone_id: record.zone_id.clone(),
                label: record.label.clone(),
            };

            if store.markers.insert(record.id, marker).is_some() {
                return Err(corrupt(format!("duplicate marker id {}", record.id)));
            }
        }

        store.next_id = match store.markers.keys().next_back() {
            Some(id) => id
                .0
                .checked_add(1)
                .ok_or_else(|| corrupt("marker id space exhausted".to_owned()))?,
            None => 1,
        };
        Ok(store)
    }
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_finite(position: DocumentPoint) -> PlacementResult<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(PlacementError::NonFinitePosition { x: position.x, y: position.y })
    }
}

fn corrupt(reason: String) -> PlacementError {
    PlacementError::StorageCorrupt { key: String::new(), reason }
}
