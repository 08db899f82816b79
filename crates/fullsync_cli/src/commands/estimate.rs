//! Estimate command implementation.

use super::{config_for, kind_for, load_configs, load_limits, load_store, OutputFormat};
use crate::error::CliResult;
use fullsync_core::{estimate, LimitsSource};
use serde::Serialize;
use std::path::Path;

/// Estimate for one module.
#[derive(Debug, Serialize)]
pub struct EstimateRow {
    /// Module name.
    pub module: String,
    /// Matching records.
    pub records: u64,
    /// Chunks at the module's chunk size.
    pub chunks: u64,
    /// Invocations at the module's chunk budget.
    pub invocations: u64,
}

/// Estimates every listed module.
pub fn execute(
    dataset: &Path,
    limits: &Path,
    modules: &[String],
    config: Option<&Path>,
) -> CliResult<Vec<EstimateRow>> {
    let store = load_store(dataset)?;
    let limits = load_limits(limits)?;
    let configs = load_configs(config)?;

    modules
        .iter()
        .map(|module| -> CliResult<EstimateRow> {
            let kind = kind_for(&store, module)?;
            let module_limits = limits.limits_for(module)?;
            let estimate = estimate(
                &store,
                &kind,
                &config_for(&configs, module),
                &module_limits,
            )?;
            Ok(EstimateRow {
                module: module.clone(),
                records: estimate.records,
                chunks: estimate.chunks,
                invocations: estimate.invocations(&module_limits),
            })
        })
        .collect()
}

/// Runs the estimate command.
pub fn run(
    dataset: &Path,
    limits: &Path,
    modules: &[String],
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = execute(dataset, limits, modules, config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            println!(
                "{:<20} {:>10} {:>8} {:>12}",
                "MODULE", "RECORDS", "CHUNKS", "INVOCATIONS"
            );
            for row in &rows {
                println!(
                    "{:<20} {:>10} {:>8} {:>12}",
                    row.module, row.records, row.chunks, row.invocations
                );
            }
        }
    }
    Ok(())
}
