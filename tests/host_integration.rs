//! ---
//! fz_section: "15-testing-qa-runbook"
//! fz_subsection: "integration-tests"
//! fz_type: "source"
//! fz_scope: "code"
//! fz_description: "Cross-crate fleet scenarios for the FaultZero engine."
//! fz_version: "v0.1.0"
//! fz_owner: "tbd"
//! ---
use std::fs;
use std::time::Duration;

use fz_common::AppConfig;
use fz_core::{
    DashboardEngine, EngineOptions, JsonFilePreferenceStore, PreferenceStore, Preferences,
};
use fz_fleet::{MachineType, Plant, TypeFilter};
use fz_sim::Metric;
use tempfile::tempdir;

fn write_config(dir: &std::path::Path, prefs: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("fzd.toml");
    fs::write(
        &path,
        format!(
            r#"
[engine]
tick_interval = 250
sensor_window_days = 2
random_seed = 7
focus_machine = 9
focus_metric = "vibration"
default_user = "u-mgr"

[preferences]
path = "{}"
"#,
            prefs.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    path
}

#[test]
fn config_drives_engine_defaults() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("prefs.json"));
    let loaded = AppConfig::load_with_source(&[config_path.clone()]).unwrap();
    assert_eq!(loaded.source.as_deref(), Some(config_path.as_path()));
    let config = loaded.config;
    assert_eq!(config.engine.tick_interval, Duration::from_millis(250));

    let engine = DashboardEngine::new(EngineOptions::from_config(config.engine)).unwrap();
    assert_eq!(engine.current_user().id, "u-mgr");
    assert_eq!(engine.focus().machine_id, 9);
    assert_eq!(engine.focus().metric, Metric::Vibration);
    assert_eq!(engine.sensor_history().len(), 48);
    assert_eq!(engine.rul_prediction().machine_id, 9);
}

#[test]
fn same_seed_gives_same_views() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("prefs.json"));
    let config = AppConfig::load(&[config_path]).unwrap();

    let first = DashboardEngine::new(EngineOptions::from_config(config.engine.clone())).unwrap();
    let second = DashboardEngine::new(EngineOptions::from_config(config.engine)).unwrap();
    assert_eq!(first.production_insights(), second.production_insights());
    assert_eq!(
        first.energy_data().idle_time_waste,
        second.energy_data().idle_time_waste
    );
    assert_eq!(
        first.dashboard_summary().total_batches,
        second.dashboard_summary().total_batches
    );
}

#[test]
fn preferences_round_trip_through_the_file_store() {
    let dir = tempdir().unwrap();
    let prefs_path = dir.path().join("state").join("prefs.json");
    let config_path = write_config(dir.path(), &prefs_path);
    let config = AppConfig::load(&[config_path]).unwrap();
    let store = JsonFilePreferenceStore::new(config.preferences.path.clone().unwrap());
    assert_eq!(store.load().unwrap(), Preferences::default());

    let engine = DashboardEngine::from_preferences(
        EngineOptions::from_config(config.engine.clone()),
        &store.load().unwrap(),
    )
    .unwrap();
    engine.set_user("u-sup").unwrap();
    engine.set_selected_plant(Plant::PlantB);
    engine.set_selected_machine_type(TypeFilter::Only(MachineType::Inspection));
    store.save(&engine.preferences()).unwrap();
    assert!(prefs_path.exists());

    let restored = DashboardEngine::from_preferences(
        EngineOptions::from_config(config.engine),
        &store.load().unwrap(),
    )
    .unwrap();
    assert_eq!(restored.current_user().id, "u-sup");
    assert_eq!(restored.selection(), engine.selection());
    let ids: Vec<u32> = restored.machine_status().iter().map(|m| m.machine_id).collect();
    assert_eq!(ids, vec![7]);
}

#[test]
fn snapshot_serialises_with_flat_view_keys() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("prefs.json"));
    let config = AppConfig::load(&[config_path]).unwrap();
    let engine = DashboardEngine::new(EngineOptions::from_config(config.engine)).unwrap();
    engine.set_user("u-admin").unwrap();
    engine.set_selected_machine_type(TypeFilter::All);

    let value = serde_json::to_value(engine.snapshot()).unwrap();
    let views = &value["views"];
    for key in [
        "dashboard_summary",
        "machine_status",
        "all_machine_status",
        "alerts",
        "energy_data",
        "production_insights",
        "plant_overview",
        "sensor_history",
        "anomalies",
        "rul_prediction",
    ] {
        assert!(views.get(key).is_some(), "missing {key}");
    }
    assert_eq!(views["machine_status"].as_array().unwrap().len(), 14);
    assert_eq!(views["machine_status"][0]["type"], "Slitter");
    assert_eq!(views["machine_status"][4]["status"], "Critical");
    assert!(views["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .any(|alert| alert["type"] == "energy"));
    assert_eq!(value["selection"]["selected_plant"], "Plant A");
    assert_eq!(value["focus"]["metric"], "vibration");
}

#[tokio::test(start_paused = true)]
async fn hosted_engine_ticks_on_the_configured_period() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), &dir.path().join("prefs.json"));
    let config = AppConfig::load(&[config_path]).unwrap();
    let store = JsonFilePreferenceStore::new(config.preferences.path.clone().unwrap());

    let engine = DashboardEngine::from_preferences(
        EngineOptions::from_config(config.engine),
        &Preferences {
            simulated: true,
            ..Preferences::default()
        },
    )
    .unwrap();
    let mut snapshots = engine.subscribe();
    let start = snapshots.borrow_and_update().revision;
    engine.start().unwrap();

    for expected in 1..=3 {
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow_and_update().revision, start + expected);
    }
    let stats = engine.shutdown().await;
    assert_eq!(stats.ticks, 3);

    store.save(&engine.preferences()).unwrap();
    let saved = store.load().unwrap();
    assert!(saved.simulated);
    assert_eq!(saved.user_id.as_deref(), Some("u-mgr"));
}
