//! Defaults command implementation
//!
//! Prints the default configuration.

use anyhow::Result;
use autorig_builder::AutoRigConfig;
use std::process::ExitCode;

/// Run the defaults command
///
/// # Returns
/// Exit code: always 0
pub fn run() -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(&AutoRigConfig::default())?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}
