#![allow(clippy::unwrap_used)]
// Integration tests for `MapView` props handling, fed from a `CameraStore`.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tokio_test::{assert_pending, assert_ready, task};

use citywatch_core::surface::{MapSurface, RecordingFactory, RecordingSurface, SurfaceCall};
use citywatch_core::{
    CameraStatus, CameraStore, EntityId, LatLng, MapConfig, MapProps, MapView, NewCamera,
    RadiusBounds, SearchResult,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn store_with(names: &[(&str, f64, f64)]) -> CameraStore {
    let bounds = RadiusBounds::default();
    let store = CameraStore::new();
    for (name, lat, lng) in names {
        let mut draft = NewCamera::new(&bounds);
        draft.name = (*name).to_owned();
        draft.position = Some(LatLng::new(*lat, *lng));
        store.insert(draft.build(&bounds).unwrap());
    }
    store
}

fn mounted_view() -> (MapView<RecordingSurface>, RecordingFactory) {
    let mut factory = RecordingFactory::new();
    let mut view = MapView::new(MapConfig::default());
    view.mount(&mut factory);
    (view, factory)
}

// ── Props diffing ───────────────────────────────────────────────────

#[test]
fn test_props_before_mount_are_applied_on_mount() {
    let store = store_with(&[("North gate", 52.29, 104.28), ("Bridge", 52.30, 104.29)]);
    let mut factory = RecordingFactory::new();
    let mut view: MapView<RecordingSurface> = MapView::new(MapConfig::default());

    let report = view.update(MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    });
    assert_eq!(report.reconciled, None);
    assert!(factory.log.is_empty());

    let report = view.mount(&mut factory);
    assert_eq!(report.reconciled.unwrap().created, 2);
    assert!(report.placement);
    assert!(report.search);
    assert_eq!(view.engine().pair_count(), 2);
}

#[test]
fn test_unchanged_snapshot_skips_reconcile() {
    let store = store_with(&[("North gate", 52.29, 104.28)]);
    let (mut view, factory) = mounted_view();
    let props = MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    };
    view.update(props.clone());

    let from = factory.log.len();
    let report = view.update(props);
    assert_eq!(report.reconciled, None);
    assert!(!report.placement);
    assert!(!report.search);
    assert_eq!(factory.log.len(), from);
}

#[test]
fn test_store_mutation_flows_through_to_pairs() {
    let store = store_with(&[("North gate", 52.29, 104.28), ("Bridge", 52.30, 104.29)]);
    let (mut view, _factory) = mounted_view();
    view.update(MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    });

    let bridge = store.snapshot()[1].id.clone();
    store.remove(&bridge).unwrap();
    let first = store.snapshot()[0].id.clone();
    store
        .update(&first, |c| c.status = CameraStatus::Inactive)
        .unwrap();

    let report = view.update(MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    });
    let stats = report.reconciled.unwrap();
    assert_eq!((stats.created, stats.updated, stats.removed), (0, 1, 1));
    assert!(view.engine().pair(&bridge).is_none());
}

#[test]
fn test_add_mode_off_removes_preview_in_same_update() {
    let (mut view, _factory) = mounted_view();
    let candidate = Some(LatLng::new(52.30, 104.28));

    view.update(MapProps {
        add_mode: true,
        candidate,
        ..MapProps::default()
    });
    assert!(view.engine().placement_marker().is_some());

    let report = view.update(MapProps {
        add_mode: false,
        candidate,
        ..MapProps::default()
    });
    assert!(report.placement);
    assert!(view.engine().placement_marker().is_none());
}

#[test]
fn test_search_prop_change_rebuilds_only_search_slot() {
    let store = store_with(&[("North gate", 52.29, 104.28)]);
    let (mut view, factory) = mounted_view();
    let base = MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    };
    view.update(base.clone());

    let from = factory.log.len();
    let report = view.update(MapProps {
        search: Some(Arc::new(SearchResult::new(LatLng::new(52.31, 104.29), "Test St"))),
        ..base
    });

    assert_eq!(report.reconciled, None);
    assert!(!report.placement);
    assert!(report.search);
    let structural: Vec<_> = factory
        .log
        .since(from)
        .into_iter()
        .filter(SurfaceCall::is_structural)
        .collect();
    assert_eq!(structural.len(), 1);
}

#[test]
fn test_resubmitting_equal_search_recenters_again() {
    let (mut view, factory) = mounted_view();
    let target = LatLng::new(52.31, 104.29);
    view.update(MapProps {
        search: Some(Arc::new(SearchResult::new(target, "Test St"))),
        ..MapProps::default()
    });

    view.surface_mut().unwrap().set_view(LatLng::new(10.0, 10.0), 5);
    let from = factory.log.len();

    let again = SearchResult::parse("52.31, 104.29 Test St").unwrap();
    let props = MapProps {
        search: Some(Arc::new(again)),
        ..view.props().clone()
    };
    let report = view.update(props);

    assert!(report.search);
    assert!(factory.log.since(from).contains(&SurfaceCall::SetView(target, 15)));
    assert_eq!(view.surface().unwrap().view(), (target, 15));
    assert!(view.engine().search_marker().is_some());

    // Re-rendering with the same submission leaves the pin alone.
    let from = factory.log.len();
    let same = view.props().clone();
    let report = view.update(same);
    assert!(!report.search);
    assert!(factory.log.since(from).is_empty());
}

#[test]
fn test_changing_click_handler_reruns_reconcile() {
    let store = store_with(&[("North gate", 52.29, 104.28)]);
    let (mut view, factory) = mounted_view();
    view.update(MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    });

    let from = factory.log.len();
    let clicked = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&clicked);
    view.on_camera_click(move |c| *sink.lock().unwrap() = Some(c.name.clone()));

    let calls = factory.log.since(from);
    assert!(calls.iter().any(|c| matches!(c, SurfaceCall::SetMarkerIcon(..))));
    assert!(!calls.iter().any(SurfaceCall::is_structural));

    let id = store.snapshot()[0].id.clone();
    let marker = view.engine().pair(&id).unwrap().marker;
    view.surface().unwrap().click_marker(marker);
    assert_eq!(clicked.lock().unwrap().as_deref(), Some("North gate"));
}

#[test]
fn test_map_click_reads_latest_add_mode() {
    let (mut view, _factory) = mounted_view();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    view.on_map_click(move |at| sink.lock().unwrap().push(at));

    view.surface().unwrap().click_map(LatLng::new(1.0, 1.0));
    view.update(MapProps {
        add_mode: true,
        ..MapProps::default()
    });
    view.surface().unwrap().click_map(LatLng::new(2.0, 2.0));

    assert_eq!(*seen.lock().unwrap(), vec![LatLng::new(2.0, 2.0)]);
}

#[test]
fn test_unmount_then_remount_reapplies_props() {
    let store = store_with(&[("North gate", 52.29, 104.28)]);
    let (mut view, mut factory) = mounted_view();
    view.update(MapProps {
        cameras: store.snapshot(),
        ..MapProps::default()
    });

    view.unmount();
    assert!(view.surface().is_none());
    assert_eq!(view.engine().pair_count(), 0);

    let report = view.mount(&mut factory);
    assert_eq!(report.reconciled.unwrap().created, 1);
    assert_eq!(factory.log.count(|c| *c == SurfaceCall::Destroy), 1);
}

// ── Store subscription ──────────────────────────────────────────────

#[test]
fn test_stream_changed_waits_for_mutation() {
    let store = store_with(&[("North gate", 52.29, 104.28)]);
    let mut stream = store.subscribe();
    let id = stream.current()[0].id.clone();

    let mut changed = task::spawn(stream.changed());
    assert_pending!(changed.poll());

    store.remove(&id).unwrap();
    assert!(changed.is_woken());
    let snap = assert_ready!(changed.poll()).unwrap();
    assert!(snap.is_empty());
    assert!(store.get(&EntityId::from("missing")).is_none());
}
