extern crate fra_atlas_geo;

use fra_atlas_geo::output::Output;
use fra_atlas_geo::{
    features_bounds, load_features, Bounds, Config, GeoFeature, LayerOrchestrator, LngLat,
};
use geojson::{feature::Id, GeoJson, Value};
use std::fs::File;
use std::sync::Arc;

fn fixture(name: &str) -> Vec<GeoFeature> {
    let file = File::open(format!("./tests/data/{}.geojson", name)).unwrap();
    load_features(file).unwrap()
}

fn parse_collection(out: Vec<u8>) -> Vec<geojson::Feature> {
    let string = String::from_utf8(out).unwrap();
    match string.parse::<GeoJson>().unwrap() {
        GeoJson::FeatureCollection(collection) => collection.features,
        other => panic!("expected a feature collection, got {:?}", other),
    }
}

fn ring_len(feature: &geojson::Feature) -> usize {
    match &feature.geometry.as_ref().unwrap().value {
        Value::Polygon(rings) => rings[0].len(),
        other => panic!("expected a polygon, got {:?}", other),
    }
}

#[test]
fn state_boundaries_are_simplified() {
    let source = fixture("states");
    let mut orchestrator = LayerOrchestrator::default();
    let features = orchestrator.get_optimized_layer_data("state_boundaries", 5., &source, None);

    let mut out = Vec::new();
    features.write_geojson(&mut out).unwrap();
    let parsed = parse_collection(out);
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0].id, Some(Id::String("madhya_pradesh".to_string())));
    assert!(ring_len(&parsed[0]) < 401);
    assert!(ring_len(&parsed[0]) >= 4);
    assert_eq!(
        parsed[1].properties.as_ref().unwrap()["name"],
        serde_json::json!("Odisha")
    );
}

#[test]
fn detail_grows_with_zoom() {
    let source = fixture("states");
    let mut orchestrator = LayerOrchestrator::default();
    let coarse = orchestrator.get_optimized_layer_data("state_boundaries", 4., &source, None);
    let fine = orchestrator.get_optimized_layer_data("state_boundaries", 12., &source, None);
    for (coarse, fine) in coarse.iter().zip(fine.iter()) {
        assert!(coarse.vertex_count() <= fine.vertex_count());
    }
}

#[test]
fn viewport_selects_states() {
    let source = fixture("states");
    let mut orchestrator = LayerOrchestrator::default();
    let bounds: Bounds = "19,82,23,87".parse().unwrap();
    let features =
        orchestrator.get_optimized_layer_data("state_boundaries", 6., &source, Some(&bounds));
    let ids: Vec<&str> = features.iter().map(|feature| feature.id.as_str()).collect();
    assert_eq!(ids, vec!["odisha"]);
}

#[test]
fn settlements_are_zoom_gated() {
    let source = fixture("settlements");
    let mut orchestrator = LayerOrchestrator::default();
    assert!(orchestrator
        .get_optimized_layer_data("settlements", 8., &source, None)
        .is_empty());
    let features = orchestrator.get_optimized_layer_data("settlements", 11., &source, None);
    assert_eq!(features.len(), 3);

    let mut out = Vec::new();
    features.write_json_lines(&mut out).unwrap();
    let string = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = string.trim().split('\n').collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        match line.parse::<GeoJson>().unwrap() {
            GeoJson::Feature(feature) => assert!(feature.geometry.is_some()),
            other => panic!("expected a feature, got {:?}", other),
        }
    }
}

#[test]
fn repeated_requests_hit_the_cache() {
    let source = fixture("settlements");
    let mut orchestrator = LayerOrchestrator::default();
    let bounds: Bounds = "22,80,23,81".parse().unwrap();
    let first = orchestrator.get_optimized_layer_data("settlements", 12., &source, Some(&bounds));
    let second = orchestrator.get_optimized_layer_data("settlements", 12.5, &source, Some(&bounds));
    assert_eq!(first.len(), 2);
    assert!(Arc::ptr_eq(&first, &second));

    orchestrator.clear_all_caches();
    let third = orchestrator.get_optimized_layer_data("settlements", 12., &source, Some(&bounds));
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(orchestrator.metrics().cache_hit_rate, 0.);
}

#[test]
fn broken_geometries_pass_through() {
    let source = fixture("broken");
    let mut orchestrator = LayerOrchestrator::default();
    assert_eq!(source.len(), 5);
    let features = orchestrator.get_optimized_layer_data("water_bodies", 12., &source, None);
    assert_eq!(features.len(), 5);
    assert_eq!(features[0], source[0]);
    assert_eq!(features[1], source[1]);
    assert_eq!(features[3].id, "17");
    assert_eq!(features[3].geometry, None);
    assert_eq!(features[4].positions(), Some(vec![LngLat(80.63, 22.31)]));
    assert!(features[2].vertex_count() < source[2].vertex_count());

    let mut out = Vec::new();
    features.write_json_lines(&mut out).unwrap();
    let string = String::from_utf8(out).unwrap();
    assert!(string.contains(r#""coordinates":null"#));
    assert!(string.contains(r#""geometry":null"#));
}

#[test]
fn extent_of_loaded_data() {
    let source = fixture("settlements");
    let bounds = features_bounds(&source).unwrap();
    assert_eq!(bounds.to_string(), "21.82,80.61,22.33,86.35");

    let mut orchestrator = LayerOrchestrator::default();
    let features = orchestrator.get_optimized_layer_data("settlements", 12., &source, Some(&bounds));
    assert_eq!(features.len(), 3);
    assert_eq!(features_bounds(&fixture("broken")).is_some(), true);
}

#[test]
fn config_file_replaces_catalog() {
    let file = File::open("./tests/data/config.json").unwrap();
    let config = Config::from_reader(file).unwrap();
    let mut orchestrator = LayerOrchestrator::new(&config);
    assert_eq!(orchestrator.layers().len(), 2);

    let settlements = fixture("settlements");
    let features = orchestrator.get_optimized_layer_data("settlements", 8., &settlements, None);
    assert_eq!(features.len(), 3);

    let states = fixture("states");
    orchestrator.preload_layer_data("state_boundaries", &[4., 5., 6.], &states);
    assert_eq!(orchestrator.cache_stats().size, 2);
    assert_eq!(orchestrator.cache_stats().max_size, 2);
}
