//! Tests for layer construction and cache reuse.

use std::rc::Rc;

use map_common::{AppConfig, LayerId, MapError, TileCoord};
use map_ui::{CreateOptions, LayerFactory, MapModel, SelectionState, TileSource};
use test_utils::fixtures::{self, ymd};

fn setup(config: AppConfig) -> (LayerFactory, SelectionState) {
    let config = Rc::new(config);
    let factory = LayerFactory::new(Rc::clone(&config)).unwrap();
    let state = SelectionState::new(config, fixtures::date());
    (factory, state)
}

fn create(
    factory: &mut LayerFactory,
    state: &SelectionState,
    id: &str,
) -> Result<map_ui::LayerHandle, MapError> {
    let def = state.config().layer(id).cloned().unwrap();
    factory.create_layer(&def, state, CreateOptions::default())
}

// ============================================================================
// Cache reuse
// ============================================================================

#[test]
fn test_static_layer_shared_across_dates() {
    let (mut factory, mut state) = setup(fixtures::config());

    let first = create(&mut factory, &state, "mask").unwrap();
    state.select_date(ymd(2014, 1, 2));
    let second = create(&mut factory, &state, "mask").unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(factory.cache_len(), 1);
    assert!(first.key().date.is_none());
}

#[test]
fn test_daily_layer_per_date_and_reuse_on_revert() {
    let (mut factory, mut state) = setup(fixtures::config());

    let h1 = create(&mut factory, &state, "terra-cr").unwrap();
    state.select_date(ymd(2014, 1, 2));
    let h2 = create(&mut factory, &state, "terra-cr").unwrap();
    assert!(!Rc::ptr_eq(&h1, &h2));
    assert_eq!(h2.date_id(), "2014-01-02");

    state.select_date(fixtures::date());
    let again = create(&mut factory, &state, "terra-cr").unwrap();
    assert!(Rc::ptr_eq(&h1, &again));
    assert_eq!(factory.cache_stats().hits, 1);
}

#[test]
fn test_capacity_two_evicts_least_recent() {
    let (mut factory, mut state) = setup(fixtures::config_with_capacity(2));

    let h1 = create(&mut factory, &state, "terra-cr").unwrap();
    state.select_date(ymd(2014, 1, 2));
    create(&mut factory, &state, "terra-cr").unwrap();
    state.select_date(ymd(2014, 1, 3));
    create(&mut factory, &state, "terra-cr").unwrap();
    assert_eq!(factory.cache_len(), 2);

    state.select_date(fixtures::date());
    let rebuilt = create(&mut factory, &state, "terra-cr").unwrap();
    assert!(!Rc::ptr_eq(&h1, &rebuilt));
    assert_eq!(factory.cache_stats().evictions, 2);
}

#[test]
fn test_override_date_does_not_touch_selection() {
    let (mut factory, state) = setup(fixtures::config());
    let def = state.config().layer("terra-cr").cloned().unwrap();

    let layer = factory
        .create_layer(&def, &state, CreateOptions::for_date(ymd(2013, 12, 31)))
        .unwrap();
    assert_eq!(layer.date_id(), "2013-12-31");
    assert_eq!(layer.source().time(), Some("2013-12-31"));
    assert_eq!(state.selected_date(), fixtures::date());
}

#[test]
fn test_opacity_reapplied_on_hit() {
    let (mut factory, state) = setup(fixtures::config());

    let layer = create(&mut factory, &state, "terra-cr").unwrap();
    layer.set_opacity(0.25);
    let again = create(&mut factory, &state, "terra-cr").unwrap();
    assert_eq!(again.opacity(), 1.0);
}

#[test]
fn test_model_opacity_applied_on_build_and_hit() {
    let (mut factory, mut state) = setup(fixtures::config());
    state.add_layer("terra-cr").unwrap();
    state.set_opacity(&LayerId::from("terra-cr"), 0.4).unwrap();

    let built = create(&mut factory, &state, "terra-cr").unwrap();
    assert_eq!(built.opacity(), 0.4);

    built.set_opacity(0.9);
    state.set_opacity(&LayerId::from("terra-cr"), 0.2).unwrap();
    let hit = create(&mut factory, &state, "terra-cr").unwrap();
    assert!(Rc::ptr_eq(&built, &hit));
    assert_eq!(hit.opacity(), 0.2);
}

#[test]
fn test_new_layers_start_hidden() {
    let (mut factory, state) = setup(fixtures::config());
    assert!(!create(&mut factory, &state, "terra-cr").unwrap().is_visible());
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_wmts_source_from_definition() {
    let (mut factory, state) = setup(fixtures::config());
    let layer = create(&mut factory, &state, "terra-cr").unwrap();

    let TileSource::Wmts(source) = layer.source() else {
        panic!("expected a WMTS source");
    };
    assert_eq!(source.layer, "MODIS_Terra_CorrectedReflectance_TrueColor");
    assert_eq!(source.matrix_set, "EPSG4326_250m");
    assert_eq!(source.format, "image/jpeg");
    assert_eq!(source.grid.origin, (-180.0, 90.0));
    assert_eq!(source.grid.matrix_ids[..3], ["0", "1", "2"]);
    assert_eq!(source.grid.tile_size, 512);
    assert_eq!(source.time.as_deref(), Some("2014-01-01"));
}

#[test]
fn test_projection_overrides_applied() {
    let (mut factory, mut state) = setup(fixtures::config());
    state.select_projection("arctic").unwrap();
    let layer = create(&mut factory, &state, "terra-cr").unwrap();

    let TileSource::Wmts(source) = layer.source() else {
        panic!("expected a WMTS source");
    };
    assert!(source.url.contains("epsg3413"));
    assert_eq!(source.matrix_set, "EPSG3413_250m");
    assert_eq!(source.grid.origin, (-4194304.0, 4194304.0));
    assert_eq!(layer.projection().as_str(), "arctic");
}

#[test]
fn test_static_layer_has_no_time() {
    let (mut factory, state) = setup(fixtures::config());
    let layer = create(&mut factory, &state, "mask").unwrap();
    assert!(layer.source().time().is_none());
}

#[test]
fn test_wms_source_parameters() {
    let (mut factory, state) = setup(fixtures::config());
    let layer = create(&mut factory, &state, "combo-aod").unwrap();

    let TileSource::Wms(source) = layer.source() else {
        panic!("expected a WMS source");
    };
    assert_eq!(source.layers, "MODIS_Combined_Aerosol");
    assert!(source.transparent);
    assert_eq!(source.version, "1.1.1");
    assert_eq!(source.grid.tile_size, 512);
    assert_eq!(source.grid.resolutions[0], 0.5625);
    assert!(source.time.is_none());
}

#[test]
fn test_daily_wms_source_carries_time() {
    let (mut factory, mut state) = setup(fixtures::config());
    let layer = create(&mut factory, &state, "combo-aod-daily").unwrap();

    let TileSource::Wms(source) = layer.source() else {
        panic!("expected a WMS source");
    };
    assert_eq!(source.time.as_deref(), Some("2014-01-01"));
    let url = layer.tile_url(&TileCoord::new(0, 0, 0)).unwrap();
    assert!(url.contains("REQUEST=GetMap"));
    assert!(url.ends_with("&TIME=2014-01-01"));

    state.select_date(ymd(2014, 1, 2));
    let next = create(&mut factory, &state, "combo-aod-daily").unwrap();
    assert!(!Rc::ptr_eq(&layer, &next));
    assert_eq!(next.source().time(), Some("2014-01-02"));
    let url = next.tile_url(&TileCoord::new(0, 0, 0)).unwrap();
    assert!(url.ends_with("&TIME=2014-01-02"));
}

#[test]
fn test_wms_jpeg_is_opaque() {
    let mut config = fixtures::config();
    config.layers.get_mut("combo-aod").unwrap().format = Some("image/jpeg".to_string());
    let (mut factory, state) = setup(config);

    let layer = create(&mut factory, &state, "combo-aod").unwrap();
    let TileSource::Wms(source) = layer.source() else {
        panic!("expected a WMS source");
    };
    assert!(!source.transparent);
}

// ============================================================================
// Palettes
// ============================================================================

#[test]
fn test_active_palette_attaches_lookup_and_keys_layer() {
    let (mut factory, mut state) = setup(fixtures::config());
    state.add_layer("terra-aod").unwrap();

    let plain = create(&mut factory, &state, "terra-aod").unwrap();
    assert!(plain.lookup().is_none());

    state
        .set_custom_palette(&LayerId::from("terra-aod"), "blue-1")
        .unwrap();
    let custom = create(&mut factory, &state, "terra-aod").unwrap();
    assert!(!Rc::ptr_eq(&plain, &custom));
    assert!(custom.lookup().is_some());
    assert!(custom.tile_loader().is_some());
    assert_eq!(
        custom.key().palette.as_ref().unwrap().custom.as_deref(),
        Some("blue-1")
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_source() {
    let mut config = fixtures::config();
    config.layers.get_mut("terra-cr").unwrap().source = Some("nowhere".to_string());
    let (mut factory, state) = setup(config);

    let err = create(&mut factory, &state, "terra-cr").unwrap_err();
    assert!(matches!(err, MapError::UnknownSource { .. }));
    assert!(err.is_configuration());
    assert_eq!(factory.cache_len(), 0);
}

#[test]
fn test_unknown_matrix_set() {
    let mut config = fixtures::config();
    config.layers.get_mut("terra-cr").unwrap().matrix_set = Some("EPSG4326_1km".to_string());
    let (mut factory, state) = setup(config);

    let err = create(&mut factory, &state, "terra-cr").unwrap_err();
    assert!(matches!(err, MapError::UnknownMatrixSet { .. }));
}

#[test]
fn test_unknown_layer_type() {
    let mut config = fixtures::config();
    config.layers.get_mut("mask").unwrap().layer_type = Some("xyz".to_string());
    let (mut factory, state) = setup(config);

    let err = create(&mut factory, &state, "mask").unwrap_err();
    assert!(matches!(err, MapError::UnknownLayerType { .. }));
    assert!(create(&mut factory, &state, "terra-cr").is_ok());
}

#[test]
fn test_graticule_has_no_tile_source() {
    let (mut factory, state) = setup(fixtures::config());
    let err = create(&mut factory, &state, "graticule").unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_zero_capacity_rejected() {
    let config = Rc::new(fixtures::config_with_capacity(0));
    assert!(LayerFactory::new(config).is_err());
}
