//! Configuration loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use autorig_builder::AutoRigConfig;
use log::debug;

/// Loads and validates a JSON configuration file, or returns the defaults.
///
/// Missing fields take their default values; unknown fields are rejected.
pub fn load_config(path: Option<&str>) -> Result<AutoRigConfig> {
    let config = match path {
        Some(path) => parse_config_file(Path::new(path))?,
        None => AutoRigConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<AutoRigConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Parses a configuration from a JSON string.
pub fn parse_config(text: &str) -> Result<AutoRigConfig> {
    let config: AutoRigConfig = serde_json::from_str(text).context("Failed to parse config")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(r#"{"body": {"num_fingers": 4}}"#).unwrap();
        assert_eq!(config.body.num_fingers, 4);
        assert_eq!(config.rig, AutoRigConfig::default().rig);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(parse_config(r#"{"body": {"num_arms": 4}}"#).is_err());
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let err = parse_config(r#"{"body": {"num_toes": 9}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("num_toes"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config(Some("/nonexistent/autorig.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
