use obsmap::filter::filter_visible;
use obsmap::grid::{bucket, GridScale};
use obsmap::worker::GridWorker;
use obsmap::{CacheConfig, GridPipeline, MemoryStore, TileCache, GRID_TTL, REGION_TTL};
use obsmap_types::{Marker, Source, Viewport};
use std::time::Duration;

fn jakarta_markers() -> Vec<Marker> {
    vec![
        Marker::new(1, Source::Fobi, -6.20, 106.80),
        Marker::new(2, Source::Burungnesia, -6.19, 106.81),
        Marker::new(3, Source::Kupunesia, -6.35, 106.95),
        Marker::new(4, Source::Taxa, -6.90, 107.60),
    ]
}

#[test]
fn test_pipeline_end_to_end() {
    let cache = TileCache::open(
        MemoryStore::new(),
        CacheConfig::new("grids").with_ttl(GRID_TTL),
    )
    .unwrap();
    let pipeline = GridPipeline::new(cache);
    let markers = jakarta_markers();

    let resolution = GridScale::for_zoom(7.0).degrees();
    assert_eq!(resolution, 0.2);

    let cells = pipeline.cells(&markers, resolution).unwrap();
    let total: usize = cells.iter().map(|c| c.count).sum();
    assert_eq!(total, markers.len());

    // Second request is served from cache and identical.
    let again = pipeline.cells(&markers, resolution).unwrap();
    assert_eq!(cells, again);
    assert_eq!(pipeline.cache().stats().unwrap().hits, 1);

    pipeline.close().unwrap();
}

#[test]
fn test_cache_ttl_expiry() {
    let cache = TileCache::open(
        MemoryStore::new(),
        CacheConfig::new("grids").with_ttl(Duration::from_millis(100)),
    )
    .unwrap();
    let markers = jakarta_markers();
    let cells = bucket(&markers, 0.2).unwrap();

    cache.put(&markers, 0.2, &cells).unwrap();
    assert!(cache.get(&markers, 0.2).unwrap().is_some());

    // Wait for expiration.
    std::thread::sleep(Duration::from_millis(150));

    // Expired entry reads as a miss but is still stored.
    assert!(cache.get(&markers, 0.2).unwrap().is_none());
    assert_eq!(cache.stats().unwrap().record_count, 1);

    // Purging actually removes it.
    assert_eq!(cache.purge_expired().unwrap(), 1);
    assert_eq!(cache.stats().unwrap().record_count, 0);
}

#[test]
fn test_two_cache_instances_are_independent() {
    let grids = TileCache::open(
        MemoryStore::new(),
        CacheConfig::new("grids").with_ttl(GRID_TTL),
    )
    .unwrap();
    let regions = TileCache::open(
        MemoryStore::new(),
        CacheConfig::new("regions").with_ttl(REGION_TTL),
    )
    .unwrap();

    let markers = jakarta_markers();
    let cells = bucket(&markers, 0.5).unwrap();

    grids.put(&markers, 0.5, &cells).unwrap();
    assert!(grids.get(&markers, 0.5).unwrap().is_some());
    assert!(regions.get(&markers, 0.5).unwrap().is_none());

    grids.close().unwrap();
    // Closing one instance leaves the other usable.
    regions.put(&markers, 0.5, &cells).unwrap();
    assert!(regions.get(&markers, 0.5).unwrap().is_some());
}

#[test]
fn test_worker_feeds_pipeline_results() {
    let worker = GridWorker::spawn().unwrap();
    let cache = TileCache::open(
        MemoryStore::new(),
        CacheConfig::new("grids").with_ttl(GRID_TTL),
    )
    .unwrap();
    let markers = jakarta_markers();

    // Host flow: compute off-thread, store, then read back from cache.
    let cells = worker.call(markers.clone(), 0.2).unwrap();
    cache.put(&markers, 0.2, &cells).unwrap();

    let cached = cache.get(&markers, 0.2).unwrap().unwrap();
    let total: usize = cached.iter().map(|c| c.count).sum();
    assert_eq!(total, markers.len());
}

#[test]
fn test_viewport_flow_gates_before_bucketing() {
    let markers = jakarta_markers();

    // Zoomed out: no individual markers, grid clusters only.
    let wide = Viewport::new(-11.0, 6.0, 95.0, 141.0, 5.0);
    assert!(filter_visible(&wide, &markers).is_empty());
    let scale = GridScale::for_zoom(wide.zoom);
    assert_eq!(scale, GridScale::ExtraLarge);

    // Zoomed in on Jakarta: markers 1-3 are in the box, 4 (Bandung) is not.
    let close = Viewport::new(-6.5, -6.0, 106.5, 107.0, 13.0);
    let visible = filter_visible(&close, &markers);
    let ids: Vec<u64> = visible.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_marker_wire_parity() {
    // Markers as the REST API sends them, including sparse fields.
    let json = r#"[
        {"id": 1, "checklist_id": 10, "source": "fobi", "latitude": -6.2, "longitude": 106.8},
        {"id": 2, "source": "burungnesia", "latitude": -6.19, "longitude": 106.81}
    ]"#;

    let markers: Vec<Marker> = serde_json::from_str(json).unwrap();
    assert_eq!(markers[0].checklist(), 10);
    assert_eq!(markers[1].checklist(), 2);

    let cells = bucket(&markers, 0.2).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].source, Source::Fobi);

    // Grid payloads keep the nested-array bounds shape.
    let payload = serde_json::to_value(&cells).unwrap();
    assert!(payload[0]["bounds"].is_array());
    assert!(payload[0]["bounds"][0].is_array());
}

#[cfg(feature = "persist")]
#[test]
fn test_persistent_cache_survives_reopen() {
    use obsmap::FileStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grids.bin");
    let markers = jakarta_markers();
    let cells = bucket(&markers, 0.2).unwrap();

    {
        let cache = TileCache::open(
            FileStore::new(&path),
            CacheConfig::new("grids").with_ttl(GRID_TTL),
        )
        .unwrap();
        cache.put(&markers, 0.2, &cells).unwrap();
        cache.close().unwrap();
    }

    let cache = TileCache::open(
        FileStore::new(&path),
        CacheConfig::new("grids").with_ttl(GRID_TTL),
    )
    .unwrap();
    assert_eq!(cache.get(&markers, 0.2).unwrap(), Some(cells));
}
