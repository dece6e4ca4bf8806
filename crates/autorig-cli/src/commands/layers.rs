//! Layers command implementation
//!
//! Prints every rig bone with the layers it was classified into.

use anyhow::Result;
use autorig_meta::host::HostBone;
use autorig_meta::LayerSet;
use colored::Colorize;
use std::process::ExitCode;

use super::build_rig;
use crate::input::load_config;

/// Comma-separated layer labels.
fn layer_labels(layers: LayerSet) -> String {
    layers.iter().map(|layer| layer.label()).collect::<Vec<_>>().join(", ")
}

fn print_bone(bone: &HostBone) {
    println!("  {} {}", bone.name.bold(), layer_labels(bone.layers).dimmed());
}

/// Run the layers command
///
/// # Returns
/// Exit code: 0 on success
pub fn run(config_path: Option<&str>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let (rig, _) = build_rig(&config)?;

    println!("{} {}", "Layers:".cyan().bold(), rig.name);
    rig.bones().iter().for_each(print_bone);
    Ok(ExitCode::SUCCESS)
}
