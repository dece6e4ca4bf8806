//! Commands run end to end against the in-memory host.

use std::fs;

use autorig_builder::PosePreset;
use autorig_cli::commands;

#[test]
fn every_command_succeeds_with_defaults() {
    assert!(commands::defaults::run().is_ok());
    assert!(commands::meta::run(None, false).is_ok());
    assert!(commands::meta::run(None, true).is_ok());
    assert!(commands::rig::run(None, false, None, 'L').is_ok());
    assert!(commands::layers::run(None).is_ok());
}

#[test]
fn rig_with_each_preset() {
    for preset in PosePreset::ALL {
        assert!(commands::rig::run(None, true, Some(preset), 'R').is_ok(), "{}", preset);
    }
}

#[test]
fn config_file_is_read() {
    let path = std::env::temp_dir().join(format!("autorig-cli-test-{}.json", std::process::id()));
    fs::write(&path, r#"{"body": {"num_fingers": 3, "use_thumb": false}}"#).unwrap();
    let result = commands::rig::run(path.to_str(), false, None, 'L');
    fs::remove_file(&path).unwrap();
    assert!(result.is_ok());
}

#[test]
fn invalid_config_is_an_error() {
    let path = std::env::temp_dir().join(format!("autorig-cli-invalid-{}.json", std::process::id()));
    fs::write(&path, r#"{"rig": {"unknown_knob": 1}}"#).unwrap();
    let result = commands::meta::run(path.to_str(), false);
    fs::remove_file(&path).unwrap();
    assert!(result.is_err());
}
