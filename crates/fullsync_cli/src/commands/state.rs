//! Status and reset command implementations.

use super::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::outbox::JsonLinesOutbox;
use fullsync_core::{ChecksumRegistry, SyncPhase, SyncStatus};
use fullsync_engine::{FileStatusStore, PlanState, StatusStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Persisted progress of one module.
#[derive(Debug, Serialize)]
pub struct ModuleRow {
    /// Module name.
    pub module: String,
    /// `not-started`, `in-progress` or `finished`.
    pub phase: &'static str,
    /// Ids transmitted.
    pub sent: u64,
    /// Smallest id transmitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sent: Option<u64>,
}

impl ModuleRow {
    fn new(module: String, status: &SyncStatus) -> Self {
        let phase = match status.phase() {
            SyncPhase::NotStarted => "not-started",
            SyncPhase::InProgress => "in-progress",
            SyncPhase::Finished => "finished",
        };
        Self {
            module,
            phase,
            sent: status.sent,
            last_sent: status.last_sent.map(|id| id.as_u64()),
        }
    }
}

/// Everything recorded in a status directory.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Plan markers, if a plan ever started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanState>,
    /// Per-module progress.
    pub modules: Vec<ModuleRow>,
    /// Snapshot checksums.
    pub snapshots: ChecksumRegistry,
    /// Outbox totals per action, if an outbox was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbox: Option<BTreeMap<String, OutboxTotals>>,
}

/// Messages and chunk ids found under one action.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutboxTotals {
    /// Lines.
    pub messages: usize,
    /// Ids across chunk messages.
    pub ids: usize,
}

/// Reads the status of `module`, or of every recorded module.
///
/// The status directory must already exist.
pub fn status(
    state_dir: &Path,
    module: Option<&str>,
    outbox: Option<&Path>,
) -> CliResult<StatusReport> {
    if !state_dir.is_dir() {
        return Err(CliError::invalid_input(state_dir, "no such status directory"));
    }
    let statuses = FileStatusStore::open(state_dir)?;
    let names = match module {
        Some(module) => vec![module.to_string()],
        None => statuses.modules()?,
    };

    let mut modules = Vec::with_capacity(names.len());
    for name in names {
        let status = statuses.load(&name)?.unwrap_or_default();
        modules.push(ModuleRow::new(name, &status));
    }

    let outbox = match outbox {
        Some(path) => {
            let mut totals: BTreeMap<String, OutboxTotals> = BTreeMap::new();
            for line in JsonLinesOutbox::read_all(path)? {
                let entry = totals.entry(line.action).or_default();
                entry.messages += 1;
                entry.ids += line.message.id_count();
            }
            Some(totals)
        }
        None => None,
    };

    Ok(StatusReport {
        plan: statuses.load_plan()?,
        modules,
        snapshots: statuses.load_checksums()?,
        outbox,
    })
}

/// Forgets the listed modules, or everything when none are listed.
///
/// Plan markers are always cleared so the next run re-announces the plan.
pub fn reset(state_dir: &Path, modules: &[String]) -> CliResult<Vec<String>> {
    let statuses = FileStatusStore::open(state_dir)?;
    let targets = if modules.is_empty() {
        statuses.save_checksums(&ChecksumRegistry::new())?;
        statuses.modules()?
    } else {
        modules.to_vec()
    };

    for module in &targets {
        statuses.clear(module)?;
        info!(module = %module, "reset full sync status");
    }
    statuses.clear_plan()?;
    Ok(targets)
}

/// Runs the status command.
pub fn run_status(
    state_dir: &Path,
    module: Option<&str>,
    outbox: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = status(state_dir, module, outbox)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if let Some(plan) = &report.plan {
                let stage = if plan.ended {
                    "ended"
                } else if plan.started {
                    "started"
                } else {
                    "not started"
                };
                println!("Plan: {stage}");
            }
            println!("{:<20} {:<12} {:>10} {:>12}", "MODULE", "PHASE", "SENT", "LAST SENT");
            for row in &report.modules {
                let last_sent = row
                    .last_sent
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                println!(
                    "{:<20} {:<12} {:>10} {:>12}",
                    row.module, row.phase, row.sent, last_sent
                );
            }
            if !report.snapshots.is_empty() {
                println!("Snapshots recorded: {}", report.snapshots.len());
            }
            if let Some(totals) = &report.outbox {
                println!("Outbox:");
                for (action, total) in totals {
                    println!(
                        "  {action:<30} {:>8} messages {:>10} ids",
                        total.messages, total.ids
                    );
                }
            }
        }
    }
    Ok(())
}

/// Runs the reset command.
pub fn run_reset(state_dir: &Path, modules: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let cleared = reset(state_dir, modules)?;
    println!("Reset {} module(s)", cleared.len());
    Ok(())
}
