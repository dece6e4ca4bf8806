//! Rig command implementation
//!
//! Builds the meta-armature, rigs it and optionally applies a pose preset.

use anyhow::Result;
use autorig_builder::{PosePreset, PresetOutcome, RigReport};
use autorig_meta::MemoryArmature;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

use super::build_rig;
use crate::input::load_config;

/// JSON output of the rig command.
#[derive(Debug, Serialize)]
struct RigOutput<'a> {
    status: &'static str,
    report: &'a RigReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<PresetJson>,
    rig: &'a MemoryArmature,
}

#[derive(Debug, Serialize)]
struct PresetJson {
    name: &'static str,
    side: char,
    cancelled: bool,
    active: Option<String>,
}

impl PresetJson {
    fn new(preset: PosePreset, side: char, outcome: &PresetOutcome) -> Self {
        let (cancelled, active) = match outcome {
            PresetOutcome::Finished { active } => (false, active.clone()),
            PresetOutcome::Cancelled => (true, None),
        };
        Self {
            name: preset.as_str(),
            side,
            cancelled,
            active,
        }
    }
}

/// Run the rig command
///
/// # Arguments
/// * `config_path` - Optional path to a JSON configuration file
/// * `json_output` - Print the report and rig as JSON
/// * `preset` - Pose preset to apply after rigging
/// * `side` - Side the preset applies to
///
/// # Returns
/// Exit code: 0 on success, including rigs with warnings
pub fn run(config_path: Option<&str>, json_output: bool, preset: Option<PosePreset>, side: char) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let (mut rig, report) = build_rig(&config)?;
    let preset = preset.map(|p| {
        let outcome = p.apply(&mut rig, side);
        PresetJson::new(p, side, &outcome)
    });

    if json_output {
        let output = RigOutput {
            status: report.status_message(),
            report: &report,
            preset,
            rig: &rig,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Rig:".cyan().bold(), rig.name);
    println!("  {} {}", "Bones:".dimmed(), report.bone_count);
    println!("  {} {}", "Constraints:".dimmed(), report.constraint_count);

    for warning in &report.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }

    if let Some(preset) = &preset {
        if preset.cancelled {
            println!(
                "  {} preset {} cancelled: required bones missing on side {}",
                "!!".yellow(),
                preset.name,
                preset.side
            );
        } else {
            let active = preset.active.as_deref().unwrap_or("-");
            println!(
                "  {} preset {} applied on side {} (active: {})",
                "ok".green(),
                preset.name,
                preset.side,
                active
            );
        }
    }

    let status = report.status_message();
    if report.has_warnings() {
        println!("{}", status.yellow().bold());
    } else {
        println!("{}", status.green().bold());
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_json_reports_cancel() {
        let json = PresetJson::new(PosePreset::PivotHeel, 'L', &PresetOutcome::Cancelled);
        assert!(json.cancelled);
        assert_eq!(json.name, "pivot-heel");
        assert_eq!(json.active, None);
    }
}
