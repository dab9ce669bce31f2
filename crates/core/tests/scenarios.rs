use sensor_layout_core::{
    BoundingBox, CancelReason, DocumentPoint, KeyValueStore, MarkerId, MemoryStore,
    PlacementConfig, PlacementEngine, PlacementError, PlacementEvent, PointerOffset,
    RejectionReason, ScreenPoint, SnapConfig, StaticDocument, ViewportTransform, ZoneElement,
    ZoneId,
};

fn two_rooms(viewport: ViewportTransform) -> Box<StaticDocument> {
    Box::new(StaticDocument::new(
        vec![
            ZoneElement::rect("A", BoundingBox::new(0.0, 0.0, 100.0, 100.0)),
            ZoneElement::rect("B", BoundingBox::new(100.0, 0.0, 100.0, 100.0)),
        ],
        viewport,
    ))
}

fn engine_with(storage: MemoryStore, config: PlacementConfig) -> PlacementEngine<MemoryStore> {
    let mut engine = PlacementEngine::new(storage, config);
    engine
        .load_document(two_rooms(ViewportTransform::IDENTITY))
        .expect("document should load");
    engine
}

fn engine() -> PlacementEngine<MemoryStore> {
    engine_with(MemoryStore::new(), PlacementConfig::default().with_storage_key("layout-1"))
}

fn drop_sensor(engine: &mut PlacementEngine<MemoryStore>, sensor_type: &str, at: ScreenPoint) {
    engine
        .begin_palette_drag(sensor_type, ScreenPoint::new(-20.0, -20.0), PointerOffset::default())
        .expect("palette drag should start");
    engine.pointer_move(at);
}

#[test]
fn drop_inside_room_a_creates_marker_in_a() {
    let mut engine = engine();

    drop_sensor(&mut engine, "Light", ScreenPoint::new(50.0, 50.0));
    let marker = engine.pointer_up(ScreenPoint::new(50.0, 50.0)).unwrap().unwrap();

    assert_eq!(marker.sensor_type(), "Light");
    assert_eq!(marker.position(), DocumentPoint::new(50.0, 50.0));
    assert_eq!(marker.zone_id(), Some(&ZoneId::from("A")));
}

#[test]
fn drop_inside_room_b_creates_marker_in_b() {
    let mut engine = engine();

    drop_sensor(&mut engine, "Light", ScreenPoint::new(150.0, 50.0));
    let marker = engine.pointer_up(ScreenPoint::new(150.0, 50.0)).unwrap().unwrap();

    assert_eq!(marker.zone_id(), Some(&ZoneId::from("B")));
}

#[test]
fn drop_outside_rooms_is_rejected() {
    let mut engine = engine();
    engine.place("Light", DocumentPoint::new(10.0, 10.0)).unwrap();
    engine.drain_events();

    drop_sensor(&mut engine, "Light", ScreenPoint::new(250.0, 50.0));
    let result = engine.pointer_up(ScreenPoint::new(250.0, 50.0));

    assert!(matches!(result, Err(PlacementError::InvalidZone { .. })));
    assert_eq!(engine.markers().len(), 1);
    assert_eq!(
        engine.drain_events(),
        vec![PlacementEvent::PlacementRejected { reason: RejectionReason::InvalidZone }]
    );
}

#[test]
fn zoomed_and_panned_viewport_maps_back_to_document() {
    let mut engine = PlacementEngine::new(MemoryStore::new(), PlacementConfig::default());
    engine.load_document(two_rooms(ViewportTransform::pan_zoom(2.0, 30.0, 10.0))).unwrap();

    // Document (150, 50) renders at (2 * 150 + 30, 2 * 50 + 10)
    drop_sensor(&mut engine, "Motion", ScreenPoint::new(330.0, 110.0));
    let marker = engine.pointer_up(ScreenPoint::new(330.0, 110.0)).unwrap().unwrap();

    assert_eq!(marker.position(), DocumentPoint::new(150.0, 50.0));
    assert_eq!(marker.zone_id(), Some(&ZoneId::from("B")));
}

#[test]
fn pointer_offset_is_removed_before_mapping() {
    let mut engine = engine();

    engine
        .begin_palette_drag("Light", ScreenPoint::new(0.0, 0.0), PointerOffset::new(8.0, 8.0))
        .unwrap();
    let marker = engine.pointer_up(ScreenPoint::new(58.0, 58.0)).unwrap().unwrap();

    assert_eq!(marker.position(), DocumentPoint::new(50.0, 50.0));
}

#[test]
fn saved_layout_restores_in_a_fresh_engine() {
    let mut engine = engine();
    for (x, y) in [(50.0, 50.0), (150.0, 50.0), (20.0, 80.0)] {
        engine.place("Light", DocumentPoint::new(x, y)).unwrap();
    }
    engine.save_layout().unwrap();
    let saved = engine.markers().snapshot();

    let storage = engine.storage().clone();
    let restored = engine_with(storage, PlacementConfig::default().with_storage_key("layout-1"));

    assert_eq!(restored.markers().snapshot(), saved);
    let zones: Vec<_> = restored
        .markers()
        .iter()
        .map(|marker| marker.zone_id().map(ZoneId::as_str))
        .collect();
    assert_eq!(zones, vec![Some("A"), Some("B"), Some("A")]);
    assert_eq!(restored.markers().next_id(), MarkerId::new(4));
}

#[test]
fn marker_moved_outside_rooms_floats_and_survives_round_trip() {
    let mut engine = engine();
    engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
    let second = engine.place("Smoke", DocumentPoint::new(60.0, 60.0)).unwrap();
    engine.place("Light", DocumentPoint::new(70.0, 70.0)).unwrap();

    engine
        .begin_marker_drag(second.id(), ScreenPoint::new(60.0, 60.0), PointerOffset::default())
        .unwrap();
    let moved = engine.pointer_up(ScreenPoint::new(250.0, 50.0)).unwrap().unwrap();

    assert!(moved.is_floating());
    assert_eq!(moved.position(), DocumentPoint::new(250.0, 50.0));
    assert_eq!(engine.markers().len(), 3);

    engine.save_layout().unwrap();
    let raw = engine.storage().get("layout-1").unwrap().unwrap();
    assert!(raw.contains(r#""id":"2","type":"Smoke","x":250.0,"y":50.0,"zoneId":null"#));

    let restored = engine_with(
        engine.storage().clone(),
        PlacementConfig::default().with_storage_key("layout-1"),
    );
    assert!(restored.markers().get(second.id()).unwrap().is_floating());
}

#[test]
fn cancelled_drags_never_change_the_layout() {
    let mut engine = engine();
    let marker = engine.place("Light", DocumentPoint::new(50.0, 50.0)).unwrap();
    let before = engine.markers().snapshot();

    for reason in [CancelReason::LeftDropSurface, CancelReason::Explicit] {
        engine
            .begin_marker_drag(marker.id(), ScreenPoint::new(50.0, 50.0), PointerOffset::default())
            .unwrap();
        engine.pointer_move(ScreenPoint::new(150.0, 50.0));
        assert!(engine.cancel_drag(reason));

        drop_sensor(&mut engine, "Smoke", ScreenPoint::new(20.0, 20.0));
        assert!(engine.cancel_drag(reason));
    }

    assert_eq!(engine.markers().snapshot(), before);
    assert!(engine.drag().is_idle());
}

#[test]
fn grid_snap_and_centering_apply_to_drops() {
    let config = PlacementConfig::default()
        .with_snap(SnapConfig::disabled().with_grid(10.0).with_zone_centering(true));
    let mut engine = engine_with(MemoryStore::new(), config);

    drop_sensor(&mut engine, "Light", ScreenPoint::new(148.0, 12.0));
    let centered = engine.pointer_up(ScreenPoint::new(148.0, 12.0)).unwrap().unwrap();
    assert_eq!(centered.position(), DocumentPoint::new(150.0, 50.0));
    assert_eq!(centered.zone_id(), Some(&ZoneId::from("B")));

    let config = PlacementConfig::default().with_snap(SnapConfig::disabled().with_grid(10.0));
    let mut engine = engine_with(MemoryStore::new(), config);

    drop_sensor(&mut engine, "Light", ScreenPoint::new(43.0, 57.0));
    let snapped = engine.pointer_up(ScreenPoint::new(43.0, 57.0)).unwrap().unwrap();
    assert_eq!(snapped.position(), DocumentPoint::new(40.0, 60.0));
}

#[test]
fn shared_edge_resolves_to_first_declared_room() {
    let mut engine = engine();

    let marker = engine.place("Light", DocumentPoint::new(100.0, 50.0)).unwrap();

    assert_eq!(marker.zone_id(), Some(&ZoneId::from("A")));
}
