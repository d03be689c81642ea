//! End-to-end scenario replays over the fixture configuration.

use std::io::Write;
use std::path::PathBuf;

use map_common::AppConfig;
use map_replay::{Replay, Scenario};
use test_utils::fixtures;

async fn replay(yaml: &str) -> Replay {
    let scenario = Scenario::from_yaml(yaml).unwrap();
    let mut replay = Replay::new(fixtures::config(), &scenario).unwrap();
    replay.run(&scenario).await.unwrap();
    replay
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[tokio::test]
async fn test_initial_selection_is_rendered() {
    let replay = replay("date: 2014-01-01\nlayers: [terra-cr, terra-aod, graticule]\n").await;
    let snapshot = replay.snapshot();

    assert_eq!(snapshot.projection.as_deref(), Some("geographic"));
    let ids: Vec<_> = snapshot.stack.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["terra-cr", "terra-aod"]);
    assert!(snapshot.stack.iter().all(|l| l.visible));
    assert!(snapshot.view.as_ref().unwrap().graticule);
    assert_eq!(snapshot.published_extents, 1);
    assert!(snapshot.extent.is_some());
    assert!(snapshot.failures.is_empty());
}

#[tokio::test]
async fn test_projection_switch_drops_unsupported_layers() {
    let replay = replay(
        r#"
date: 2014-01-01
layers: [terra-cr, terra-aod, graticule]
steps:
  - { action: select_projection, projection: arctic }
"#,
    )
    .await;
    let snapshot = replay.snapshot();

    assert_eq!(snapshot.projection.as_deref(), Some("arctic"));
    let ids: Vec<_> = snapshot.stack.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["terra-cr"]);
    assert!(snapshot.view.unwrap().graticule);
}

#[tokio::test]
async fn test_date_change_swaps_daily_layers() {
    let replay = replay(
        r#"
date: 2014-01-01
layers: [terra-cr, mask]
steps:
  - { action: select_date, date: 2014-01-02 }
"#,
    )
    .await;
    let snapshot = replay.snapshot();

    assert_eq!(snapshot.date, "2014-01-02");
    let terra = snapshot.stack.iter().find(|l| l.id == "terra-cr").unwrap();
    assert_eq!(terra.date, "2014-01-02");
    assert!(terra.key.contains("2014-01-02"));
    assert_eq!(snapshot.cache.len, 3);
}

#[tokio::test]
async fn test_rejected_steps_do_not_stop_the_run() {
    let replay = replay(
        r#"
date: 2014-01-01
layers: [terra-cr]
steps:
  - { action: add_layer, layer: no-such-layer }
  - { action: set_opacity, layer: terra-cr, opacity: 2.0 }
  - { action: add_layer, layer: mask }
"#,
    )
    .await;
    let snapshot = replay.snapshot();

    let rejected: Vec<_> = snapshot.step_errors.iter().map(|e| e.step).collect();
    assert_eq!(rejected, [0, 1]);
    assert_eq!(snapshot.step_errors[1].action, "set_opacity");
    assert_eq!(snapshot.stack.len(), 2);
}

#[tokio::test]
async fn test_pan_is_published_after_the_interval() {
    let replay = replay(
        r#"
date: 2014-01-01
layers: [terra-cr]
steps:
  - { action: pan, center: [-100.0, 40.0] }
"#,
    )
    .await;
    assert_eq!(replay.published_extents(), 1);

    let replay = self::replay(
        r#"
date: 2014-01-01
layers: [terra-cr]
steps:
  - { action: pan, center: [-100.0, 40.0] }
  - { action: wait, ms: 500 }
"#,
    )
    .await;
    assert_eq!(replay.published_extents(), 2);
    let center = replay.snapshot().view.unwrap().center;
    assert_eq!(center, [-100.0, 40.0]);
}

#[tokio::test]
async fn test_small_window_hides_controls() {
    let replay = replay(
        r#"
date: 2014-01-01
layers: [terra-cr]
steps:
  - { action: resize, width: 400, height: 600, small: true }
"#,
    )
    .await;
    let view = replay.snapshot().view.unwrap();

    assert!(view.controls.is_empty());
    assert_eq!(view.size, [400, 600]);
}

#[tokio::test]
async fn test_palette_steps_attach_lookup() {
    let replay = replay(
        r#"
date: 2014-01-01
layers: [terra-aod]
steps:
  - { action: set_custom_palette, layer: terra-aod, palette: blue-1 }
"#,
    )
    .await;
    let snapshot = replay.snapshot();

    assert!(snapshot.stack[0].lookup);
    assert!(snapshot.stack[0].key.ends_with("blue-1,,"));
}

#[tokio::test]
async fn test_picker_rejects_disabled_item() {
    let replay = replay(
        r#"
date: 2014-01-01
pickers:
  product:
    items:
      - { label: Terra, value: terra }
      - { label: Combined, value: combined, disabled: true }
    selected: terra
steps:
  - { action: select_item, picker: product, value: combined }
  - { action: select_item, picker: nowhere, value: terra }
"#,
    )
    .await;
    let snapshot = replay.snapshot();

    let product = &snapshot.pickers["product"];
    assert_eq!(product.value.as_deref(), Some("terra"));
    assert_eq!(product.status, "List item with value = combined is disabled");
    assert_eq!(snapshot.step_errors.len(), 2);
}

#[tokio::test]
async fn test_sample_scenario_files() {
    let config = AppConfig::from_file(data_dir().join("config.json")).unwrap();
    let scenario = Scenario::from_file(data_dir().join("scenario.yaml")).unwrap();

    let mut replay = Replay::new(config, &scenario).unwrap();
    replay.run(&scenario).await.unwrap();
    let snapshot = replay.snapshot();

    assert_eq!(snapshot.projection.as_deref(), Some("arctic"));
    assert!(snapshot.failures.is_empty());
    assert_eq!(snapshot.step_errors.len(), 1);
    serde_json::to_string(&snapshot).unwrap();
}

#[test]
fn test_scenario_from_json_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"date": "2014-01-01", "steps": [{{"action": "zoom", "delta": 1}}]}}"#)
        .unwrap();

    let scenario = Scenario::from_file(file.path()).unwrap();
    assert_eq!(scenario.steps.len(), 1);
}
