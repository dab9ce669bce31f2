//! Sensor Layout Core Library
//!
//! Placement engine for dropping sensor markers onto floor-plan documents:
//! coordinate mapping, zone indexing, the drag state machine, the marker
//! store and layout persistence.

pub mod config;
pub mod coordinates;
pub mod document;
pub mod drag;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod marker;
pub mod persistence;
pub mod snapping;
pub mod zone;

pub use config::{ConfigError, PlacementConfig, DEFAULT_STORAGE_KEY};
pub use coordinates::{CoordinateMapper, DEFAULT_TRANSFORM_EPSILON};
pub use document::{DocumentRenderer, StaticDocument};
pub use drag::{
    CancelReason, DragController, DragKind, DragPayload, DragSession, DragState,
    PlacementRequest, PlacementTarget,
};
pub use engine::{DocumentLoad, PlacementEngine};
pub use error::{PlacementError, PlacementResult, StorageError};
pub use events::{PlacementEvent, RejectionReason};
pub use geometry::{BoundingBox, DocumentPoint, PointerOffset, ScreenPoint, ViewportTransform};
pub use marker::{LayoutSnapshot, Marker, MarkerId, MarkerRecord, MarkerStore};
pub use persistence::{KeyValueStore, LayoutPersistence, MemoryStore};
pub use snapping::{GridSnapper, SnapConfig};
pub use zone::{Zone, ZoneElement, ZoneId, ZoneIndex, ZoneSelector};
