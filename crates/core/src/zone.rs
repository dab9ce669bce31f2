//! Zone containment index
//!
//! Zones are the rooms of a floor plan. The index is built once per document
//! from the renderer's element list and answers "which zone contains this
//! point" in declaration order. There is no incremental update: a new
//! document means a full rebuild.

use crate::document::DocumentRenderer;
use crate::error::{PlacementError, PlacementResult};
use crate::geometry::{BoundingBox, DocumentPoint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a zone, taken from the document markup
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ZoneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One element reported by the document renderer
///
/// Only the attributes needed to decide zone membership are carried: the
/// element's id, tag name and class list, plus its bounding box already
/// resolved into document space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneElement {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(flatten)]
    pub bounds: BoundingBox,
}

impl ZoneElement {
    /// Create an element with the given tag and no id or classes
    pub fn new(tag: impl Into<String>, bounds: BoundingBox) -> Self {
        Self { id: None, tag: tag.into(), classes: Vec::new(), bounds }
    }

    /// Create a `rect` element with an id
    pub fn rect(id: impl Into<String>, bounds: BoundingBox) -> Self {
        Self::new("rect", bounds).with_id(id)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }
}

/// Attribute query deciding which document elements are zones
///
/// An element is a zone when any rule matches: its id starts with one of
/// `id_prefixes`, it carries one of `classes`, or its tag is one of `tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSelector {
    pub id_prefixes: Vec<String>,
    pub classes: Vec<String>,
    pub tags: Vec<String>,
}

impl ZoneSelector {
    /// Selector that accepts every element
    pub fn any() -> Self {
        Self { id_prefixes: vec![String::new()], classes: Vec::new(), tags: Vec::new() }
    }

    pub fn matches(&self, element: &ZoneElement) -> bool {
        let id_match = element
            .id
            .as_deref()
            .is_some_and(|id| self.id_prefixes.iter().any(|prefix| id.starts_with(prefix.as_str())));
        let class_match =
            element.classes.iter().any(|class| self.classes.iter().any(|wanted| wanted == class));
        let tag_match = self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(&element.tag));

        id_match || class_match || tag_match
    }
}

impl Default for ZoneSelector {
    /// Rooms by id prefix, anything classed `zone`, and plain rectangles
    fn default() -> Self {
        Self {
            id_prefixes: vec!["room".to_owned()],
            classes: vec!["zone".to_owned()],
            tags: vec!["rect".to_owned()],
        }
    }
}

/// A named region of the floor plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    id: ZoneId,
    bounds: BoundingBox,
}

impl Zone {
    pub fn new(id: impl Into<ZoneId>, bounds: BoundingBox) -> Self {
        Self { id: id.into(), bounds }
    }

    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn contains(&self, point: &DocumentPoint) -> bool {
        self.bounds.contains(point)
    }
}

/// Bounding-box index over a document's zones, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
}

impl ZoneIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from renderer elements, keeping those the selector accepts
    ///
    /// Elements without an id are named `zone-<n>` after their position among
    /// the selected zones. Elements with an unusable bounding box are skipped.
    pub fn from_elements(elements: &[ZoneElement], selector: &ZoneSelector) -> Self {
        let mut zones = Vec::new();

        for element in elements.iter().filter(|element| selector.matches(element)) {
            if !element.bounds.is_valid() {
                log::warn!(
                    "skipping zone element {:?} with unusable bounds {:?}",
                    element.id,
                    element.bounds
                );
                continue;
            }

            let id = match element.id.as_deref() {
                Some(id) if !id.is_empty() => ZoneId::new(id),
                _ => ZoneId::new(format!("zone-{}", zones.len())),
            };

            if zones.iter().any(|zone: &Zone| zone.id == id) {
                log::debug!("duplicate zone id {id}; earlier declaration wins lookups");
            }

            zones.push(Zone { id, bounds: element.bounds });
        }

        Self { zones }
    }

    /// Build an index from a document
    pub fn build(document: &dyn DocumentRenderer, selector: &ZoneSelector) -> Self {
        Self::from_elements(&document.query_zone_elements(), selector)
    }

    /// Discard the current index and rebuild it from `document`
    ///
    /// # Errors
    /// Returns `InvalidDocument` when the renderer reports neither zone
    /// elements nor a viewport. The index is left empty in that case, which is
    /// also how callers are expected to treat it.
    pub fn rebuild(
        &mut self,
        document: &dyn DocumentRenderer,
        selector: &ZoneSelector,
    ) -> PlacementResult<()> {
        let elements = document.query_zone_elements();
        let has_viewport = document.current_viewport_transform().is_some();

        *self = Self::from_elements(&elements, selector);

        if elements.is_empty() && !has_viewport {
            return Err(PlacementError::InvalidDocument);
        }

        log::debug!("zone index rebuilt with {} zones", self.zones.len());
        Ok(())
    }

    /// Return the first zone, in declaration order, whose box contains `point`
    pub fn find_containing(&self, point: &DocumentPoint) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(point))
    }

    /// Return the id of the first zone containing `point`
    pub fn find_containing_zone(&self, point: &DocumentPoint) -> Option<&ZoneId> {
        self.find_containing(point).map(Zone::id)
    }

    /// Look up a zone by id
    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| &zone.id == id)
    }

    pub fn contains_zone(&self, id: &ZoneId) -> bool {
        self.get(id).is_some()
    }

    /// All zones in declaration order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
