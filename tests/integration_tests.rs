use clustermap::ingest::{self, ContentRecord};
use clustermap::prelude::*;
use clustermap::{BuildOutcome, ViewportPhase, ViewportState};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic uniform generator so scenario counts are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn uniform_world(n: u64, seed: u64) -> Vec<PointFeature> {
    let mut rng = Lcg(seed);
    (0..n)
        .map(|id| {
            let lng = -180.0 + 360.0 * rng.next_f64();
            let lat = -85.0 + 170.0 * rng.next_f64();
            PointFeature::new(id, LngLat::new(lng, lat))
        })
        .collect()
}

fn total_count(features: &[RenderableFeature]) -> usize {
    features.iter().map(RenderableFeature::point_count).sum()
}

#[test]
fn test_ten_thousand_points_scenario() {
    init_logging();
    let points = uniform_world(10_000, 42);
    let index = SpatialIndex::build(&points, &SpatialIndexConfig::default()).unwrap();

    let world = index.query(Bbox::WORLD, 0);
    assert!(world.len() < 50, "{} items at zoom 0", world.len());
    assert!(world.iter().any(RenderableFeature::is_cluster));
    assert_eq!(total_count(&world), 10_000);

    let finest = index.query(Bbox::WORLD, 16);
    assert_eq!(finest.len(), 10_000);
    assert!(finest.iter().all(|feature| !feature.is_cluster()));
}

#[test]
fn test_counts_are_conserved_at_every_zoom() {
    let points = uniform_world(2_000, 7);
    let index = SpatialIndex::build(&points, &SpatialIndexConfig::default()).unwrap();

    for zoom in 0..=16 {
        assert_eq!(total_count(&index.query(Bbox::WORLD, zoom)), 2_000, "zoom {}", zoom);
    }
}

#[test]
fn test_build_and_query_are_deterministic() {
    let points = uniform_world(1_500, 99);
    let config = SpatialIndexConfig::default();
    let a = SpatialIndex::build(&points, &config).unwrap();
    let b = SpatialIndex::build(&points.clone(), &config).unwrap();

    let bbox = Bbox::new(-60.0, -30.0, 45.0, 60.0);
    for zoom in [0, 3, 7, 12, 16] {
        let first = a.query(bbox, zoom);
        assert_eq!(first, a.query(bbox, zoom));
        assert_eq!(first, b.query(bbox, zoom));
    }
}

#[test]
fn test_higher_zoom_never_returns_fewer_items() {
    let points = uniform_world(3_000, 5);
    let index = SpatialIndex::build(&points, &SpatialIndexConfig::default()).unwrap();
    let extent = ingest::bounds_of_points(&points).unwrap();

    let mut rng = Lcg(17);
    let mut boxes = vec![Bbox::WORLD, extent, Bbox::new(-0.5, -0.5, 0.5, 0.5)];
    for _ in 0..40 {
        let west = -180.0 + 350.0 * rng.next_f64();
        let south = -80.0 + 150.0 * rng.next_f64();
        let size = 0.5 + 9.5 * rng.next_f64();
        boxes.push(Bbox::new(west, south, west + size, south + size));
    }

    for bbox in boxes {
        let mut previous = 0;
        for zoom in 0..=16 {
            let len = index.query(bbox, zoom).len();
            assert!(len >= previous, "{:?} zoom {} returned {} < {}", bbox, zoom, len, previous);
            previous = len;
        }
    }
}

#[test]
fn test_empty_input_law() {
    let index = SpatialIndex::build(&[], &SpatialIndexConfig::default()).unwrap();
    for zoom in [-5, 0, 8, 16, 40] {
        assert!(index.query(Bbox::WORLD, zoom).is_empty());
    }

    let viewport = ViewportController::with_config(ViewportConfig::default()).unwrap();
    let mut service = ClusterQueryService::new();
    assert!(
        service
            .get_renderable_features(&[], &SpatialIndexConfig::default(), &viewport)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_cache_returns_same_index_for_equal_inputs() {
    let mut cache = IndexCache::new();
    let config = SpatialIndexConfig::default();
    let points = uniform_world(500, 3);

    let first = cache.get_or_build(&points, &config).unwrap();
    let second = cache.get_or_build(&points.to_vec(), &config.clone()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let mut changed = points.clone();
    changed[250] = changed[250].clone().with_property("featured", true);
    let third = cache.get_or_build(&changed, &config).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(cache.builds(), 2);
}

#[test]
fn test_background_build_round_trip() {
    let mut cache = IndexCache::new();
    let config = SpatialIndexConfig::default();
    let points = uniform_world(800, 11);

    let ticket = cache.begin_build(&points, &config);
    let finished = std::thread::spawn(move || ticket.run()).join().unwrap();

    match cache.complete_build(finished).unwrap() {
        BuildOutcome::Applied(index) => assert_eq!(index.len(), 800),
        BuildOutcome::Stale => panic!("only build in flight must apply"),
    }
    assert!(cache.lookup(&points, &config).is_some());
}

#[test]
fn test_two_fly_timing_scenario() {
    init_logging();
    let mut viewport = ViewportController::with_config(ViewportConfig::default()).unwrap();
    let a = Bbox::new(-10.0, -10.0, 10.0, 10.0);
    let b = Bbox::new(20.0, 20.0, 30.0, 30.0);

    let first = viewport
        .request_fly(
            FlyRequest::new(a).with_options(FlyOptions::default().with_duration(Duration::from_millis(500))),
            Duration::ZERO,
        )
        .unwrap();
    let second = viewport
        .request_fly(
            FlyRequest::new(b).with_options(FlyOptions::default().with_duration(Duration::from_millis(300))),
            Duration::from_millis(100),
        )
        .unwrap();

    let mut finished = Vec::new();
    let mut now = Duration::ZERO;
    while now <= Duration::from_millis(1_000) {
        for event in viewport.tick(now) {
            if let ViewportEvent::FlyFinished { request_id } = event {
                finished.push((request_id, now));
            }
        }
        now += Duration::from_millis(10);
    }

    assert_eq!(finished, vec![(second, Duration::from_millis(400))]);
    assert!(!finished.iter().any(|(id, _)| *id == first));
    assert_eq!(viewport.state(), ViewportPhase::Idle);

    let (shown, _) = viewport.bounds_and_zoom_int();
    assert!(shown.contains(LngLat::new(20.5, 20.5)));
    assert!(shown.contains(LngLat::new(29.5, 29.5)));
}

#[test]
fn test_debounced_pan_publishes_once() {
    let mut viewport = ViewportController::with_config(ViewportConfig::default()).unwrap();
    let mut published = Vec::new();

    // A 200 ms drag, one frame every 16 ms
    for frame in 0..13u64 {
        let now = Duration::from_millis(frame * 16);
        for event in viewport.tick(now) {
            if let ViewportEvent::Published(state) = event {
                published.push(state);
            }
        }
        viewport.apply_raw_update(
            ViewportUpdate::new().center(LngLat::new(frame as f64, frame as f64 / 2.0)),
            now,
        );
    }

    let deadline = viewport.next_deadline().unwrap();
    assert_eq!(deadline, Duration::from_millis(12 * 16 + 250));
    for event in viewport.tick(deadline) {
        if let ViewportEvent::Published(state) = event {
            published.push(state);
        }
    }

    assert_eq!(published.len(), 1);
    assert_eq!(published[0].center, LngLat::new(12.0, 6.0));
}

#[test]
fn test_query_follows_published_viewport() {
    init_logging();
    let records: Vec<ContentRecord> = (0..200u64)
        .map(|id| {
            let lng = 2.0 + (id % 20) as f64 * 0.05;
            let lat = 48.0 + (id / 20) as f64 * 0.05;
            ContentRecord::new(id, Some(lng), Some(lat)).with_property("category", "climate")
        })
        .chain([
            ContentRecord::new(900, None, None),
            ContentRecord::new(901, Some(f64::NAN), Some(1.0)),
        ])
        .collect();
    let points = ingest::to_point_features(&records);
    assert_eq!(points.len(), 200);

    let config = Config::default();
    let mut viewport =
        ViewportController::new(config.viewport.clone(), ViewportState::default()).unwrap();
    let mut service = ClusterQueryService::new();

    let overview = service
        .get_renderable_features(&points, &config.index, &viewport)
        .unwrap()
        .to_vec();
    assert_eq!(overview.len(), 1);
    let cluster = overview[0].as_cluster().unwrap().clone();
    assert_eq!(cluster.point_count, 200);

    // Click the cluster and fly into it
    let request = service
        .fly_request_for_cluster(cluster.id, FlyOptions::default())
        .unwrap();
    viewport.request_fly(request, Duration::ZERO).unwrap();
    assert!(!viewport.interaction().any_enabled());

    // Nothing changes for the query until the flight lands
    service
        .get_renderable_features(&points, &config.index, &viewport)
        .unwrap();
    assert_eq!(service.recomputations(), 1);

    viewport.tick(Duration::from_millis(1_000));
    let (_, zoom) = viewport.bounds_and_zoom_int();
    assert!(zoom <= i32::from(cluster.expansion_zoom));

    let expanded = service
        .get_renderable_features(&points, &config.index, &viewport)
        .unwrap();
    assert!(expanded.len() > 1);
    assert_eq!(service.recomputations(), 2);
    assert_eq!(service.builds(), 1);
}

#[cfg(feature = "geojson")]
#[test]
fn test_geojson_output_carries_cluster_properties() {
    let points = uniform_world(300, 21);
    let index = SpatialIndex::build(&points, &SpatialIndexConfig::default()).unwrap();
    let features = index.query(Bbox::WORLD, 0);
    let collection = clustermap::to_feature_collection(&features);

    assert_eq!(collection.features.len(), features.len());
    let clustered = collection
        .features
        .iter()
        .find(|feature| feature.contains_property("cluster"))
        .unwrap();
    assert!(clustered.contains_property("point_count"));
    assert!(clustered.contains_property("point_count_abbreviated"));
    assert!(clustered.contains_property("cluster_id"));
}
