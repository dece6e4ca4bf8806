//! AutoRig CLI - Command-line interface for procedural humanoid rigs
//!
//! This binary builds meta-armatures and rigs against the in-memory host
//! and prints their contents.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

// Use modules from the library crate
use autorig_builder::PosePreset;
use autorig_cli::commands;

/// AutoRig - Procedural humanoid meta-armature and rig generator
#[derive(Parser)]
#[command(name = "autorig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration as JSON
    Defaults,

    /// Build the meta-armature and print its bones
    Meta {
        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Print the armature as JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Build the meta-armature, rig it and print the rig report
    Rig {
        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Print the report and rig as JSON (no colored output)
        #[arg(long)]
        json: bool,

        /// Pose preset to apply after rigging
        #[arg(long, value_parser = ["tweak-fingers", "pivot-heel", "pivot-toes"])]
        preset: Option<String>,

        /// Side the preset applies to
        #[arg(long, default_value = "L", value_parser = ["L", "R"])]
        side: String,
    },

    /// Build the rig and print each bone's layers
    Layers {
        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Defaults => commands::defaults::run(),
        Commands::Meta { config, json } => commands::meta::run(config.as_deref(), json),
        Commands::Rig {
            config,
            json,
            preset,
            side,
        } => {
            let preset = preset.map(|p| {
                p.parse::<PosePreset>()
                    .expect("clap should have validated preset")
            });
            let side = side.chars().next().unwrap_or('L');
            commands::rig::run(config.as_deref(), json, preset, side)
        }
        Commands::Layers { config } => commands::layers::run(config.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_rig_with_preset() {
        let cli = Cli::try_parse_from(["autorig", "rig", "--preset", "pivot-toes", "--side", "R"]).unwrap();
        match cli.command {
            Commands::Rig {
                config,
                json,
                preset,
                side,
            } => {
                assert_eq!(config, None);
                assert!(!json);
                assert_eq!(preset.as_deref(), Some("pivot-toes"));
                assert_eq!(side, "R");
            }
            _ => panic!("expected rig command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_preset() {
        assert!(Cli::try_parse_from(["autorig", "rig", "--preset", "pivot"]).is_err());
    }

    #[test]
    fn test_cli_parses_meta_json() {
        let cli = Cli::try_parse_from(["autorig", "meta", "--json", "-c", "body.json"]).unwrap();
        match cli.command {
            Commands::Meta { config, json } => {
                assert_eq!(config.as_deref(), Some("body.json"));
                assert!(json);
            }
            _ => panic!("expected meta command"),
        }
    }

    #[test]
    fn test_every_preset_name_parses() {
        for preset in PosePreset::ALL {
            assert_eq!(preset.as_str().parse::<PosePreset>().unwrap(), preset);
        }
    }
}
