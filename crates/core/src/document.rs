//! Document renderer port
//!
//! The engine never parses or draws the floor plan. A renderer that owns the
//! loaded document answers two queries: which elements exist (with their
//! bounding boxes in document space) and what the current viewport matrix is.

use crate::geometry::ViewportTransform;
use crate::zone::ZoneElement;
use serde::{Deserialize, Serialize};

/// Queries the engine needs from whatever renders the floor plan
pub trait DocumentRenderer {
    /// Elements of the document that may be zones, in declaration order
    fn query_zone_elements(&self) -> Vec<ZoneElement>;

    /// Current document-to-screen matrix, if the document has a viewport
    fn current_viewport_transform(&self) -> Option<ViewportTransform>;
}

/// Pre-resolved document, for hosts that compute element boxes up front
///
/// Deserializes from `{"elements": [...], "viewport": {...}}`; both fields are
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticDocument {
    #[serde(default)]
    elements: Vec<ZoneElement>,
    #[serde(default)]
    viewport: Option<ViewportTransform>,
}

impl StaticDocument {
    /// Create a document with elements and a viewport
    pub fn new(elements: Vec<ZoneElement>, viewport: ViewportTransform) -> Self {
        Self { elements, viewport: Some(viewport) }
    }

    /// Document with nothing in it and no viewport
    pub fn empty() -> Self {
        Self::default()
    }

    /// Document built from bare elements with an identity viewport
    pub fn from_elements(elements: Vec<ZoneElement>) -> Self {
        Self::new(elements, ViewportTransform::IDENTITY)
    }

    pub fn elements(&self) -> &[ZoneElement] {
        &self.elements
    }

    /// Replace the viewport, as a pan/zoom controller would
    pub fn set_viewport(&mut self, viewport: Option<ViewportTransform>) {
        self.viewport = viewport;
    }
}

impl DocumentRenderer for StaticDocument {
    fn query_zone_elements(&self) -> Vec<ZoneElement> {
        self.elements.clone()
    }

    fn current_viewport_transform(&self) -> Option<ViewportTransform> {
        self.viewport
    }
}
