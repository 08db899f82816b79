//! Partition command implementation.

use super::{config_for, kind_for, load_configs, load_store, OutputFormat};
use crate::error::{CliError, CliResult};
use fullsync_core::{partition, BatchRange};
use std::path::Path;

/// Splits a module's matching ids into ascending windows.
pub fn execute(
    dataset: &Path,
    module: &str,
    batch_size: usize,
    config: Option<&Path>,
) -> CliResult<Vec<BatchRange>> {
    let store = load_store(dataset)?;
    let configs = load_configs(config)?;
    let kind = kind_for(&store, module)?;
    partition(&store, &kind, &config_for(&configs, module), batch_size)?
        .ok_or_else(|| CliError::Usage(format!("module '{module}' cannot be partitioned")))
}

/// Runs the partition command.
pub fn run(
    dataset: &Path,
    module: &str,
    batch_size: usize,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let windows = execute(dataset, module, batch_size, config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&windows)?),
        OutputFormat::Text => {
            println!("{module}: {} window(s) of up to {batch_size} ids", windows.len());
            for window in &windows {
                let marker = if window.approximate { "  (approximate)" } else { "" };
                println!("  [{}, {}]{marker}", window.min, window.max);
            }
        }
    }
    Ok(())
}
