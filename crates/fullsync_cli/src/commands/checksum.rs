//! Checksum command implementation.

use crate::error::{CliError, CliResult};
use fullsync_core::{checksum_json, Checksum};
use std::fs;
use std::path::Path;

/// Reads a JSON document.
pub fn read_json(path: &Path) -> CliResult<serde_json::Value> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| CliError::invalid_input(path, e))
}

/// Checksums the JSON document at `path`.
pub fn execute(path: &Path) -> CliResult<Checksum> {
    Ok(checksum_json(&read_json(path)?)?)
}

/// Runs the checksum command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", execute(path)?);
    Ok(())
}
