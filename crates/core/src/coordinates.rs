//! Screen-to-document coordinate mapping
//!
//! The viewport transform is owned by whoever drives pan and zoom. The mapper
//! never holds it: every call receives the transform that is current at the
//! moment of the pointer event.

use crate::error::{PlacementError, PlacementResult};
use crate::geometry::{DocumentPoint, ScreenPoint, ViewportTransform};

/// Determinant magnitude below which a transform counts as non-invertible
pub const DEFAULT_TRANSFORM_EPSILON: f64 = 1e-9;

/// Converts pointer coordinates into document coordinates and back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    epsilon: f64,
}

impl CoordinateMapper {
    /// Create a mapper with the default degeneracy threshold
    pub fn new() -> Self {
        Self { epsilon: DEFAULT_TRANSFORM_EPSILON }
    }

    /// Create a mapper with a custom degeneracy threshold
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self { epsilon: epsilon.abs() }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Map a screen point into document space by inverting `transform`
    ///
    /// # Errors
    /// Returns `DegenerateTransform` when the matrix has a (near-)zero
    /// determinant or non-finite components. Callers treat this as a rejected
    /// drop; nothing is ever placed at a fallback origin.
    pub fn to_document_space(
        &self,
        screen: ScreenPoint,
        transform: &ViewportTransform,
    ) -> PlacementResult<DocumentPoint> {
        let det = transform.determinant();
        if !transform.is_finite() || !det.is_finite() || det.abs() < self.epsilon {
            return Err(PlacementError::DegenerateTransform { determinant: det });
        }

        let ViewportTransform { a, b, c, d, e, f } = *transform;

        // Inverse of [a c e; b d f; 0 0 1]
        let inv_a = d / det;
        let inv_b = -b / det;
        let inv_c = -c / det;
        let inv_d = a / det;
        let inv_e = (c * f - d * e) / det;
        let inv_f = (b * e - a * f) / det;

        Ok(DocumentPoint::new(
            inv_a * screen.x + inv_c * screen.y + inv_e,
            inv_b * screen.x + inv_d * screen.y + inv_f,
        ))
    }

    /// Map a document point into screen space with the forward transform
    pub fn to_screen_space(
        &self,
        document: DocumentPoint,
        transform: &ViewportTransform,
    ) -> ScreenPoint {
        transform.apply(document)
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new()
    }
}
