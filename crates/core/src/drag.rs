//! Drag-and-drop state machine
//!
//! ```text
//!            pick_sensor_type            pointer_up
//!   Idle ─────────────────────▶ Previewing ─────────┐
//!    ▲  ╲   pick_marker                             ▼
//!    │   ╲──────────────────▶ Moving ──────────▶ Settling ──▶ Idle
//!    │                          │ cancel
//!    └──────────────────────────┘
//! ```
//!
//! Only one session can be in flight. The controller never mutates the marker
//! store; a successful release yields a [`PlacementRequest`] for the caller to
//! apply.

use crate::coordinates::CoordinateMapper;
use crate::error::{PlacementError, PlacementResult};
use crate::geometry::{DocumentPoint, PointerOffset, ScreenPoint, ViewportTransform};
use crate::marker::MarkerId;
use crate::snapping::GridSnapper;
use crate::zone::{ZoneId, ZoneIndex};

/// What is being dragged
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// A new sensor of this type, picked from the palette
    SensorType(String),
    /// An already placed marker
    Marker(MarkerId),
}

/// Kind of drag session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Palette item not yet attached to the store
    Preview,
    /// Existing marker picked up
    Move,
}

/// Why a drag was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Pointer left the drop surface
    LeftDropSurface,
    /// Host sent an explicit cancel (e.g. Escape)
    Explicit,
}

/// Ephemeral state of one pick-up-to-release interaction
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    payload: DragPayload,
    pointer_offset: PointerOffset,
    last_pointer: ScreenPoint,
}

impl DragSession {
    pub fn kind(&self) -> DragKind {
        match self.payload {
            DragPayload::SensorType(_) => DragKind::Preview,
            DragPayload::Marker(_) => DragKind::Move,
        }
    }

    pub fn payload(&self) -> &DragPayload {
        &self.payload
    }

    pub fn pointer_offset(&self) -> PointerOffset {
        self.pointer_offset
    }

    /// Most recent pointer position seen by the session
    pub fn last_pointer(&self) -> ScreenPoint {
        self.last_pointer
    }
}

/// Controller state
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Previewing(DragSession),
    Moving(DragSession),
    /// Pointer released; placement is being decided
    Settling,
}

/// Store operation requested by a completed drag
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementTarget {
    Create { sensor_type: String },
    Move { marker_id: MarkerId },
}

/// Resolved drop, ready for the marker store
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    pub target: PlacementTarget,
    pub document_point: DocumentPoint,
    /// Zone found at `document_point` when the drop was resolved
    pub zone_id: Option<ZoneId>,
}

/// Drag-and-drop state machine
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    mapper: CoordinateMapper,
    snapper: GridSnapper,
}

impl DragController {
    /// Create an idle controller with default mapping and no snapping
    pub fn new() -> Self {
        Self::with_parts(CoordinateMapper::new(), GridSnapper::default())
    }

    pub fn with_parts(mapper: CoordinateMapper, snapper: GridSnapper) -> Self {
        Self { state: DragState::Idle, mapper, snapper }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// Active session, if any
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Previewing(session) | DragState::Moving(session) => Some(session),
            DragState::Idle | DragState::Settling => None,
        }
    }

    /// Pick a sensor type from the palette
    ///
    /// # Errors
    /// `SessionBusy` if a drag is already in flight.
    pub fn pick_sensor_type(
        &mut self,
        sensor_type: impl Into<String>,
        pointer: ScreenPoint,
        pointer_offset: PointerOffset,
    ) -> PlacementResult<()> {
        self.ensure_idle()?;

        let session = DragSession {
            payload: DragPayload::SensorType(sensor_type.into()),
            pointer_offset,
            last_pointer: pointer,
        };
        log::debug!("drag started: preview {:?}", session.payload);
        self.state = DragState::Previewing(session);
        Ok(())
    }

    /// Pick up an existing marker
    ///
    /// The controller does not know which markers exist; the caller checks
    /// that before picking.
    ///
    /// # Errors
    /// `SessionBusy` if a drag is already in flight.
    pub fn pick_marker(
        &mut self,
        marker_id: MarkerId,
        pointer: ScreenPoint,
        pointer_offset: PointerOffset,
    ) -> PlacementResult<()> {
        self.ensure_idle()?;

        log::debug!("drag started: move marker {marker_id}");
        self.state = DragState::Moving(DragSession {
            payload: DragPayload::Marker(marker_id),
            pointer_offset,
            last_pointer: pointer,
        });
        Ok(())
    }

    /// Track pointer motion; returns `false` when no session is active
    pub fn pointer_move(&mut self, pointer: ScreenPoint) -> bool {
        match &mut self.state {
            DragState::Previewing(session) | DragState::Moving(session) => {
                session.last_pointer = pointer;
                true
            }
            DragState::Idle | DragState::Settling => false,
        }
    }

    /// Release the pointer and resolve the drop
    ///
    /// The controller passes through `Settling` and always ends in `Idle`,
    /// whether the drop resolves or is rejected. Returns `Ok(None)` when no
    /// session was active.
    ///
    /// # Errors
    /// - `DegenerateTransform` if the viewport cannot be inverted
    /// - `NonFinitePosition` if the mapped point is not finite
    /// - `InvalidZone` if a palette item is dropped outside every zone
    pub fn pointer_up(
        &mut self,
        pointer: ScreenPoint,
        transform: &ViewportTransform,
        zones: &ZoneIndex,
    ) -> PlacementResult<Option<PlacementRequest>> {
        let session = match std::mem::replace(&mut self.state, DragState::Settling) {
            DragState::Previewing(session) | DragState::Moving(session) => session,
            idle => {
                self.state = idle;
                return Ok(None);
            }
        };

        let result = self.resolve(session, pointer, transform, zones);
        self.state = DragState::Idle;

        match &result {
            Ok(request) => log::debug!("drop resolved: {:?}", request),
            Err(error) => log::debug!("drop rejected: {error}"),
        }

        result.map(Some)
    }

    /// Abandon the active session without touching any marker
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel(&mut self, reason: CancelReason) -> bool {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Previewing(session) | DragState::Moving(session) => {
                log::debug!("drag cancelled ({reason:?}): {:?}", session.payload);
                true
            }
            DragState::Idle | DragState::Settling => false,
        }
    }

    fn ensure_idle(&self) -> PlacementResult<()> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(PlacementError::SessionBusy)
        }
    }

    fn resolve(
        &self,
        session: DragSession,
        pointer: ScreenPoint,
        transform: &ViewportTransform,
        zones: &ZoneIndex,
    ) -> PlacementResult<PlacementRequest> {
        let anchor = pointer.minus_offset(session.pointer_offset);
        let mapped = self.mapper.to_document_space(anchor, transform)?;
        if !mapped.is_finite() {
            return Err(PlacementError::NonFinitePosition { x: mapped.x, y: mapped.y });
        }

        let snapped = self.snapper.snap_to_grid(mapped);
        let zone = zones.find_containing(&snapped);
        let document_point = self.snapper.settle_in_zone(snapped, zone);

        let target = match session.payload {
            DragPayload::SensorType(sensor_type) => {
                if zone.is_none() {
                    return Err(PlacementError::InvalidZone { x: snapped.x, y: snapped.y });
                }
                PlacementTarget::Create { sensor_type }
            }
            DragPayload::Marker(marker_id) => PlacementTarget::Move { marker_id },
        };

        Ok(PlacementRequest {
            target,
            document_point,
            zone_id: zone.map(|zone| zone.id().clone()),
        })
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}
