//! Run command implementation.

use super::{config_for, kind_for, load_configs, load_limits, load_store};
use crate::error::{CliError, CliResult};
use crate::outbox::JsonLinesOutbox;
use fullsync_engine::{
    DriverConfig, FileStatusStore, FullSyncDriver, FullSyncPlan, Outcome, PauseReason, PlanReport,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Inputs of one `run` invocation.
pub struct RunArgs<'a> {
    /// Dataset JSON.
    pub dataset: &'a Path,
    /// Limits JSON.
    pub limits: &'a Path,
    /// Status directory.
    pub state_dir: &'a Path,
    /// Outbox file.
    pub outbox: &'a Path,
    /// Modules in plan order.
    pub modules: &'a [String],
    /// Time budget.
    pub budget: Duration,
    /// Per-module configurations.
    pub config: Option<&'a Path>,
}

/// Advances the full sync of `modules` by one time-boxed invocation.
pub fn execute(args: &RunArgs<'_>) -> CliResult<PlanReport> {
    if args.modules.is_empty() {
        return Err(CliError::Usage("at least one --module is required".into()));
    }

    let store = load_store(args.dataset)?;
    let limits = load_limits(args.limits)?;
    let configs = load_configs(args.config)?;

    let mut plan = FullSyncPlan::new();
    for module in args.modules {
        plan = plan.with_module(kind_for(&store, module)?, config_for(&configs, module));
    }

    let outbox = JsonLinesOutbox::open(args.outbox)?;
    info!(outbox = %outbox.path().display(), "appending to outbox");
    let driver = FullSyncDriver::new(
        DriverConfig::new().with_time_budget(args.budget),
        Arc::new(store),
        Arc::new(outbox),
        Arc::new(limits),
        Arc::new(FileStatusStore::open(args.state_dir)?),
    );

    let start = Instant::now();
    let deadline = start
        .checked_add(args.budget)
        .ok_or_else(|| CliError::Usage("time budget too large".into()))?;
    Ok(plan.run(&driver, deadline)?)
}

/// Runs the run command.
pub fn run(args: &RunArgs<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let report = execute(args)?;

    if report.started_now {
        println!("Sent start marker");
    }
    for invocation in &report.invocations {
        let outcome = match invocation.outcome {
            Outcome::Finished => "finished",
            Outcome::Paused(PauseReason::ChunkBudget) => "paused (chunk budget)",
            Outcome::Paused(PauseReason::Deadline) => "paused (deadline)",
        };
        println!(
            "{:<20} {:>6} chunks {:>10} ids  total {:>10}  {}",
            invocation.module,
            invocation.chunks_sent,
            invocation.ids_sent,
            invocation.status.sent,
            outcome
        );
    }
    if report.ended_now {
        println!("Sent end marker");
    }
    if report.complete {
        println!("Full sync complete");
    } else {
        println!("Full sync incomplete; run again to continue");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{write_dataset, write_limits};
    use fullsync_core::RecordId;
    use fullsync_protocol::SyncMessage;

    fn chunk_ids(outbox: &Path, action: &str) -> Vec<RecordId> {
        JsonLinesOutbox::read_all(outbox)
            .unwrap()
            .into_iter()
            .filter(|line| line.action == action)
            .filter_map(|line| match line.message {
                SyncMessage::Chunk(payload) => Some(payload.ids),
                _ => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn resumes_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), 25);
        let limits = write_limits(dir.path(), 10, 2);
        let state_dir = dir.path().join("state");
        let outbox = dir.path().join("outbox.jsonl");
        let modules = vec!["posts".to_string(), "comments".to_string()];
        let args = RunArgs {
            dataset: &dataset,
            limits: &limits,
            state_dir: &state_dir,
            outbox: &outbox,
            modules: &modules,
            budget: Duration::from_secs(60),
            config: None,
        };

        let first = execute(&args).unwrap();
        assert!(first.started_now);
        assert!(!first.complete);

        let second = execute(&args).unwrap();
        assert!(second.complete);

        assert_eq!(
            chunk_ids(&outbox, "full_sync_posts"),
            (1..=25).rev().map(RecordId).collect::<Vec<_>>()
        );
        assert_eq!(chunk_ids(&outbox, "full_sync_comments").len(), 3);

        let actions: Vec<String> = JsonLinesOutbox::read_all(&outbox)
            .unwrap()
            .into_iter()
            .map(|line| line.action)
            .collect();
        assert_eq!(actions.first().map(String::as_str), Some("full_sync_start"));
        assert_eq!(actions.last().map(String::as_str), Some("full_sync_end"));
    }

    #[test]
    fn filtered_module() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), 10);
        let limits = write_limits(dir.path(), 100, 1);
        let config = dir.path().join("config.json");
        std::fs::write(
            &config,
            r#"{"posts": {"filter": {"op": "eq", "field": "status", "value": "draft"}}}"#,
        )
        .unwrap();
        let state_dir = dir.path().join("state");
        let outbox = dir.path().join("outbox.jsonl");
        let modules = vec!["posts".to_string()];

        let report = execute(&RunArgs {
            dataset: &dataset,
            limits: &limits,
            state_dir: &state_dir,
            outbox: &outbox,
            modules: &modules,
            budget: Duration::from_secs(60),
            config: Some(&config),
        })
        .unwrap();
        assert!(report.complete);
        assert_eq!(
            chunk_ids(&outbox, "full_sync_posts"),
            vec![RecordId(10), RecordId(8), RecordId(6), RecordId(4), RecordId(2)]
        );
    }

    #[test]
    fn unknown_module_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path(), 5);
        let limits = write_limits(dir.path(), 10, 1);
        let state_dir = dir.path().join("state");
        let outbox = dir.path().join("outbox.jsonl");
        let modules = vec!["users".to_string()];

        let err = execute(&RunArgs {
            dataset: &dataset,
            limits: &limits,
            state_dir: &state_dir,
            outbox: &outbox,
            modules: &modules,
            budget: Duration::from_secs(60),
            config: None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::UnknownModule(_)));
        assert!(!outbox.exists());
    }
}
