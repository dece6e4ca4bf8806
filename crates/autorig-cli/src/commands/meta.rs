//! Meta command implementation
//!
//! Builds the meta-armature and prints a summary or the full host dump.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use super::build_meta;
use crate::input::load_config;

/// Run the meta command
///
/// # Arguments
/// * `config_path` - Optional path to a JSON configuration file
/// * `json_output` - Print the host armature as JSON instead of a summary
///
/// # Returns
/// Exit code: 0 on success
pub fn run(config_path: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let meta = build_meta(&config)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Meta-armature:".cyan().bold(), meta.name);
    println!("  {} {}", "Bones:".dimmed(), meta.bones().len());
    println!(
        "  {} {} fingers, {} toes{}",
        "Digits:".dimmed(),
        config.body.num_fingers,
        config.body.num_toes,
        if config.body.use_thumb { ", thumb" } else { "" }
    );
    for bone in meta.bones() {
        let parent = bone.parent.as_deref().unwrap_or("-");
        println!("  {} {} {}", "->".green(), bone.name, format!("(parent: {})", parent).dimmed());
    }
    Ok(ExitCode::SUCCESS)
}
