//! Events emitted for the surrounding UI

use crate::error::PlacementError;
use crate::marker::{Marker, MarkerId};

/// Reason a user action was refused
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectionReason {
    DegenerateTransform,
    InvalidZone,
    NonFinitePosition,
    MarkerNotFound(MarkerId),
    IdSpaceExhausted,
    SessionBusy,
}

impl RejectionReason {
    /// Map an error to the rejection it represents
    ///
    /// Storage and document errors are not user-action rejections and map to
    /// `None`.
    pub fn from_error(error: &PlacementError) -> Option<Self> {
        match error {
            PlacementError::DegenerateTransform { .. } => Some(Self::DegenerateTransform),
            PlacementError::InvalidZone { .. } => Some(Self::InvalidZone),
            PlacementError::NonFinitePosition { .. } => Some(Self::NonFinitePosition),
            PlacementError::MarkerNotFound(id) => Some(Self::MarkerNotFound(*id)),
            PlacementError::IdSpaceExhausted => Some(Self::IdSpaceExhausted),
            PlacementError::SessionBusy => Some(Self::SessionBusy),
            PlacementError::InvalidDocument
            | PlacementError::StorageCorrupt { .. }
            | PlacementError::Storage(_) => None,
        }
    }
}

/// Something the UI should react to
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementEvent {
    PlacementRejected { reason: RejectionReason },
    MarkerPlaced { marker: Marker },
    MarkerMoved { marker: Marker },
    MarkerRemoved { id: MarkerId },
    /// All markers were dropped and the persisted layout removed
    LayoutCleared,
}
