//! Placement engine facade
//!
//! Wires the components along the interaction flow:
//! document load → zone index rebuild → drag → coordinate mapping and zone
//! lookup → marker store mutation → persistence on demand.
//!
//! Every public operation either fully succeeds or leaves the engine as it
//! was. Outcomes are also queued as [`PlacementEvent`]s for the UI to drain.

use crate::config::PlacementConfig;
use crate::coordinates::CoordinateMapper;
use crate::document::DocumentRenderer;
use crate::drag::{CancelReason, DragController, PlacementRequest, PlacementTarget};
use crate::error::{PlacementError, PlacementResult};
use crate::events::{PlacementEvent, RejectionReason};
use crate::geometry::{DocumentPoint, PointerOffset, ScreenPoint, ViewportTransform};
use crate::marker::{Marker, MarkerId, MarkerStore};
use crate::persistence::{KeyValueStore, LayoutPersistence};
use crate::snapping::GridSnapper;
use crate::zone::ZoneIndex;

/// Outcome of loading a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentLoad {
    /// Zones found in the new document
    pub zone_count: usize,
    /// Markers restored from storage
    pub restored_markers: usize,
    /// The persisted layout was unreadable and was ignored
    pub layout_corrupt: bool,
}

/// Sensor placement engine
pub struct PlacementEngine<S> {
    config: PlacementConfig,
    document: Option<Box<dyn DocumentRenderer>>,
    zones: ZoneIndex,
    drag: DragController,
    markers: MarkerStore,
    persistence: LayoutPersistence<S>,
    events: Vec<PlacementEvent>,
}

impl<S: KeyValueStore> PlacementEngine<S> {
    /// Create an engine with no document loaded
    pub fn new(storage: S, config: PlacementConfig) -> Self {
        let drag = DragController::with_parts(
            CoordinateMapper::with_epsilon(config.transform_epsilon),
            GridSnapper::new(config.snap),
        );

        Self {
            config,
            document: None,
            zones: ZoneIndex::new(),
            drag,
            markers: MarkerStore::new(),
            persistence: LayoutPersistence::new(storage),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn zones(&self) -> &ZoneIndex {
        &self.zones
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn storage(&self) -> &S {
        self.persistence.storage()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<PlacementEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the current document and restore the persisted layout
    ///
    /// The zone index is always rebuilt. An active drag is cancelled. With
    /// `reset_markers_on_document_change` the marker store is replaced by the
    /// persisted layout; otherwise existing markers are kept and the layout is
    /// only restored into an empty store.
    ///
    /// A document with neither zones nor a viewport, and an unreadable stored
    /// layout, both degrade to empty state with a warning.
    ///
    /// # Errors
    /// `Storage` if the storage port fails; nothing is changed in that case.
    pub fn load_document(
        &mut self,
        document: Box<dyn DocumentRenderer>,
    ) -> PlacementResult<DocumentLoad> {
        let mut zones = ZoneIndex::new();
        if let Err(error) = zones.rebuild(document.as_ref(), &self.config.zone_selector) {
            log::warn!("{error}; continuing with no zones");
        }

        let restore = self.config.reset_markers_on_document_change || self.markers.is_empty();
        let mut layout_corrupt = false;
        let restored = if restore {
            match self.persistence.load(&self.config.storage_key, &zones) {
                Ok(store) => Some(store),
                Err(error @ PlacementError::StorageCorrupt { .. }) => {
                    log::warn!("{error}; starting with an empty layout");
                    layout_corrupt = true;
                    Some(MarkerStore::new())
                }
                Err(error) => return Err(error),
            }
        } else {
            None
        };

        self.drag.cancel(CancelReason::Explicit);
        self.document = Some(document);
        self.zones = zones;

        let restored_markers = match restored {
            Some(store) => {
                let count = store.len();
                self.markers = store;
                count
            }
            None => 0,
        };

        log::debug!(
            "document loaded: {} zones, {} markers restored",
            self.zones.len(),
            restored_markers
        );

        Ok(DocumentLoad { zone_count: self.zones.len(), restored_markers, layout_corrupt })
    }

    /// Pick a sensor type from the palette
    pub fn begin_palette_drag(
        &mut self,
        sensor_type: impl Into<String>,
        pointer: ScreenPoint,
        pointer_offset: PointerOffset,
    ) -> PlacementResult<()> {
        let result = self.drag.pick_sensor_type(sensor_type, pointer, pointer_offset);
        self.reject_on_error(result)
    }

    /// Pick up a placed marker
    pub fn begin_marker_drag(
        &mut self,
        marker_id: MarkerId,
        pointer: ScreenPoint,
        pointer_offset: PointerOffset,
    ) -> PlacementResult<()> {
        let result = if self.drag.is_idle() && !self.markers.contains(marker_id) {
            Err(PlacementError::MarkerNotFound(marker_id))
        } else {
            self.drag.pick_marker(marker_id, pointer, pointer_offset)
        };
        self.reject_on_error(result)
    }

    /// Forward pointer motion to the active drag
    pub fn pointer_move(&mut self, pointer: ScreenPoint) -> bool {
        self.drag.pointer_move(pointer)
    }

    /// Release the pointer, resolve the drop and apply it
    ///
    /// Returns the created or moved marker, or `None` when no drag was active.
    pub fn pointer_up(&mut self, pointer: ScreenPoint) -> PlacementResult<Option<Marker>> {
        let transform = self.current_transform();
        let resolved = self.drag.pointer_up(pointer, &transform, &self.zones);

        let result = match resolved {
            Ok(Some(request)) => self.apply(request).map(Some),
            Ok(None) => Ok(None),
            Err(error) => Err(error),
        };
        self.reject_on_error(result)
    }

    /// Abandon the active drag; markers are never touched
    pub fn cancel_drag(&mut self, reason: CancelReason) -> bool {
        self.drag.cancel(reason)
    }

    /// Place a marker directly at a document point, bypassing the drag flow
    pub fn place(
        &mut self,
        sensor_type: impl Into<String>,
        position: DocumentPoint,
    ) -> PlacementResult<Marker> {
        let result = self.markers.create(sensor_type, position, &self.zones);
        let marker = self.reject_on_error(result)?;
        self.events.push(PlacementEvent::MarkerPlaced { marker: marker.clone() });
        Ok(marker)
    }

    /// Move a marker directly to a document point
    pub fn move_marker(&mut self, id: MarkerId, position: DocumentPoint) -> PlacementResult<Marker> {
        let result = self.markers.move_marker(id, position, &self.zones);
        let marker = self.reject_on_error(result)?;
        self.events.push(PlacementEvent::MarkerMoved { marker: marker.clone() });
        Ok(marker)
    }

    /// Set or clear a marker's label
    pub fn relabel_marker(&mut self, id: MarkerId, label: Option<String>) -> PlacementResult<Marker> {
        let result = self.markers.relabel(id, label);
        self.reject_on_error(result)
    }

    /// Delete a marker
    pub fn remove_marker(&mut self, id: MarkerId) -> PlacementResult<Marker> {
        let result = self.markers.remove(id);
        let marker = self.reject_on_error(result)?;
        self.events.push(PlacementEvent::MarkerRemoved { id });
        Ok(marker)
    }

    /// Persist the current layout under the configured key
    pub fn save_layout(&mut self) -> PlacementResult<()> {
        self.persistence.save(&self.markers, &self.config.storage_key)
    }

    /// Replace the in-memory markers with the persisted layout
    ///
    /// # Errors
    /// `StorageCorrupt` or `Storage`; the current markers are kept on error.
    pub fn reload_layout(&mut self) -> PlacementResult<usize> {
        let store = self.persistence.load(&self.config.storage_key, &self.zones)?;
        self.markers = store;
        Ok(self.markers.len())
    }

    /// Remove every marker and the persisted layout
    pub fn clear_layout(&mut self) -> PlacementResult<()> {
        self.persistence.clear(&self.config.storage_key)?;
        self.drag.cancel(CancelReason::Explicit);
        self.markers.clear();
        self.events.push(PlacementEvent::LayoutCleared);
        Ok(())
    }

    fn current_transform(&self) -> ViewportTransform {
        self.document
            .as_ref()
            .and_then(|document| document.current_viewport_transform())
            .unwrap_or(ViewportTransform::IDENTITY)
    }

    fn apply(&mut self, request: PlacementRequest) -> PlacementResult<Marker> {
        match request.target {
            PlacementTarget::Create { sensor_type } => {
                let marker = self.markers.create(sensor_type, request.document_point, &self.zones)?;
                self.events.push(PlacementEvent::MarkerPlaced { marker: marker.clone() });
                Ok(marker)
            }
            PlacementTarget::Move { marker_id } => {
                let marker =
                    self.markers.move_marker(marker_id, request.document_point, &self.zones)?;
                self.events.push(PlacementEvent::MarkerMoved { marker: marker.clone() });
                Ok(marker)
            }
        }
    }

    fn reject_on_error<T>(&mut self, result: PlacementResult<T>) -> PlacementResult<T> {
        if let Err(error) = &result {
            if let Some(reason) = RejectionReason::from_error(error) {
                log::debug!("placement rejected: {error}");
                self.events.push(PlacementEvent::PlacementRejected { reason });
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StaticDocument;
    use crate::geometry::BoundingBox;
    use crate::persistence::MemoryStore;
    use crate::zone::{ZoneElement, ZoneId};

    fn floor_plan() -> Box<StaticDocument> {
        Box::new(StaticDocument::from_elements(vec![
            ZoneElement::rect("A", BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            ZoneElement::rect("B", BoundingBox::new(100.0, 0.0, 100.0, 100.0)),
        ]))
    }

    fn engine() -> PlacementEngine<MemoryStore> {
        let mut engine = PlacementEngine::new(MemoryStore::new(), PlacementConfig::default());
        engine.load_document(floor_plan()).unwrap();
        engine
    }

    fn drop_palette(engine: &mut PlacementEngine<MemoryStore>, x: f64, y: f64) -> PlacementResult<Option<Marker>> {
        engine.begin_palette_drag("Light", ScreenPoint::new(0.0, 0.0), PointerOffset::default())?;
        engine.pointer_move(ScreenPoint::new(x / 2.0, y / 2.0));
        engine.pointer_up(ScreenPoint::new(x, y))
    }

    #[test]
    fn test_drag_from_palette_places_marker() {
        let mut engine = engine();

        let marker = drop_palette(&mut engine, 50.0, 50.0).unwrap().unwrap();

        assert_eq!(marker.zone_id(), Some(&ZoneId::from("A")));
        assert_eq!(engine.drain_events(), vec![PlacementEvent::MarkerPlaced { marker }]);
        assert!(engine.drag().is_idle());
    }

    #[test]
    fn test_rejected_drop_emits_reason_and_keeps_store() {
        let mut engine = engine();

        let result = drop_palette(&mut engine, 250.0, 50.0);

        assert!(matches!(result, Err(PlacementError::InvalidZone { .. })));
        assert!(engine.markers().is_empty());
        assert_eq!(
            engine.drain_events(),
            vec![PlacementEvent::PlacementRejected { reason: RejectionReason::InvalidZone }]
        );
        assert!(engine.drag().is_idle());
    }

    #[test]
    fn test_drag_existing_marker_between_zones() {
        let mut engine = engine();
        let marker = engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        engine.drain_events();

        engine.begin_marker_drag(marker.id(), ScreenPoint::new(50.0, 50.0), PointerOffset::default()).unwrap();
        let moved = engine.pointer_up(ScreenPoint::new(150.0, 50.0)).unwrap().unwrap();

        assert_eq!(moved.id(), marker.id());
        assert_eq!(moved.zone_id(), Some(&ZoneId::from("B")));
        assert_eq!(engine.drain_events(), vec![PlacementEvent::MarkerMoved { marker: moved }]);
    }

    #[test]
    fn test_begin_drag_on_unknown_marker() {
        let mut engine = engine();

        let result = engine.begin_marker_drag(MarkerId::new(42), ScreenPoint::new(0.0, 0.0), PointerOffset::default());

        assert!(matches!(result, Err(PlacementError::MarkerNotFound(_))));
        assert!(engine.drag().is_idle());
    }

    #[test]
    fn test_second_drag_is_busy() {
        let mut engine = engine();
        engine.begin_palette_drag("Light", ScreenPoint::new(0.0, 0.0), PointerOffset::default()).unwrap();

        let result = engine.begin_palette_drag("Smoke", ScreenPoint::new(0.0, 0.0), PointerOffset::default());

        assert!(matches!(result, Err(PlacementError::SessionBusy)));
        assert_eq!(
            engine.drain_events(),
            vec![PlacementEvent::PlacementRejected { reason: RejectionReason::SessionBusy }]
        );
    }

    #[test]
    fn test_cancelled_drag_leaves_snapshot_unchanged() {
        let mut engine = engine();
        let marker = engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        let before = engine.markers().snapshot();

        engine.begin_marker_drag(marker.id(), ScreenPoint::new(50.0, 50.0), PointerOffset::default()).unwrap();
        engine.pointer_move(ScreenPoint::new(180.0, 20.0));
        assert!(engine.cancel_drag(CancelReason::LeftDropSurface));

        engine.begin_palette_drag("Smoke", ScreenPoint::new(0.0, 0.0), PointerOffset::default()).unwrap();
        engine.pointer_move(ScreenPoint::new(10.0, 10.0));
        assert!(engine.cancel_drag(CancelReason::Explicit));

        assert_eq!(engine.markers().snapshot(), before);
        assert_eq!(engine.pointer_up(ScreenPoint::new(10.0, 10.0)).unwrap(), None);
    }

    #[test]
    fn test_degenerate_viewport_rejects_drop() {
        let mut engine = PlacementEngine::new(MemoryStore::new(), PlacementConfig::default());
        let mut document = StaticDocument::from_elements(vec![ZoneElement::rect(
            "A",
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
        )]);
        document.set_viewport(Some(ViewportTransform::pan_zoom(0.0, 0.0, 0.0)));
        engine.load_document(Box::new(document)).unwrap();

        let result = drop_palette(&mut engine, 50.0, 50.0);

        assert!(matches!(result, Err(PlacementError::DegenerateTransform { .. })));
        assert!(engine.markers().is_empty());
        assert!(engine.drag().is_idle());
    }

    #[test]
    fn test_remove_emits_event() {
        let mut engine = engine();
        let marker = engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        engine.drain_events();

        engine.remove_marker(marker.id()).unwrap();

        assert!(engine.markers().is_empty());
        assert_eq!(engine.drain_events(), vec![PlacementEvent::MarkerRemoved { id: marker.id() }]);
        assert!(matches!(engine.remove_marker(marker.id()), Err(PlacementError::MarkerNotFound(_))));
    }

    #[test]
    fn test_document_change_restores_persisted_layout() {
        let mut engine = engine();
        engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        engine.save_layout().unwrap();
        engine.place("Light", DocumentPoint::new(60.0, 50.0)).unwrap();

        let load = engine.load_document(floor_plan()).unwrap();

        assert_eq!(load, DocumentLoad { zone_count: 2, restored_markers: 1, layout_corrupt: false });
        assert_eq!(engine.markers().len(), 1);
    }

    #[test]
    fn test_document_change_can_keep_markers() {
        let config = PlacementConfig::default().with_reset_on_document_change(false);
        let mut engine = PlacementEngine::new(MemoryStore::new(), config);
        engine.load_document(floor_plan()).unwrap();
        engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        engine.place("Light", DocumentPoint::new(60.0, 50.0)).unwrap();

        let load = engine.load_document(floor_plan()).unwrap();

        assert_eq!(load.restored_markers, 0);
        assert_eq!(engine.markers().len(), 2);
    }

    #[test]
    fn test_corrupt_layout_degrades_to_empty() {
        let mut storage = MemoryStore::new();
        storage.set("svg-items", "][").unwrap();
        let mut engine = PlacementEngine::new(storage, PlacementConfig::default());

        let load = engine.load_document(floor_plan()).unwrap();

        assert!(load.layout_corrupt);
        assert!(engine.markers().is_empty());
        assert_eq!(engine.zones().len(), 2);
    }

    #[test]
    fn test_exhausted_id_layout_degrades_to_empty() {
        let mut storage = MemoryStore::new();
        storage
            .set("svg-items", r#"[{"id": "18446744073709551615", "type": "Light", "x": 1, "y": 1, "zoneId": "A"}]"#)
            .unwrap();
        let mut engine = PlacementEngine::new(storage, PlacementConfig::default());

        let load = engine.load_document(floor_plan()).unwrap();

        assert!(load.layout_corrupt);
        assert!(engine.markers().is_empty());
    }

    #[test]
    fn test_invalid_document_degrades_to_empty_index() {
        let mut engine = engine();

        let load = engine.load_document(Box::new(StaticDocument::empty())).unwrap();

        assert_eq!(load.zone_count, 0);
        assert!(engine.zones().is_empty());
        assert!(matches!(
            engine.place("Light", DocumentPoint::new(50.0, 50.0)),
            Err(PlacementError::InvalidZone { .. })
        ));
    }

    #[test]
    fn test_load_document_cancels_active_drag() {
        let mut engine = engine();
        engine.begin_palette_drag("Light", ScreenPoint::new(0.0, 0.0), PointerOffset::default()).unwrap();

        engine.load_document(floor_plan()).unwrap();

        assert!(engine.drag().is_idle());
    }

    #[test]
    fn test_clear_layout_removes_markers_and_storage() {
        let mut engine = engine();
        engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        engine.save_layout().unwrap();
        engine.drain_events();

        engine.clear_layout().unwrap();

        assert!(engine.markers().is_empty());
        assert!(engine.storage().is_empty());
        assert_eq!(engine.drain_events(), vec![PlacementEvent::LayoutCleared]);
    }

    #[test]
    fn test_reload_layout_keeps_markers_on_corruption() {
        let mut engine = engine();
        engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
        engine.persistence.storage_mut().set("svg-items", "nope").unwrap();

        assert!(matches!(engine.reload_layout(), Err(PlacementError::StorageCorrupt { .. })));
        assert_eq!(engine.markers().len(), 1);
    }
}
