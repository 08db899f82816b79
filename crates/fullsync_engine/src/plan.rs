//! Multi-module full syncs bracketed by start and end markers.

use crate::driver::{FullSyncDriver, Invocation};
use crate::error::{SyncError, SyncResult};
use crate::status_store::PlanState;
use crate::transport::TransportSender;
use fullsync_core::{checksum_of, estimate, Checksum, EntityKind, FullSyncConfig};
use fullsync_protocol::{
    action_name, FullSyncEnd, FullSyncStart, ModuleEstimate, ModuleTotal, SyncMessage, END, START,
};
use fullsync_store::RecordStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

struct PlannedModule {
    kind: Arc<dyn EntityKind>,
    config: FullSyncConfig,
}

/// An ordered set of modules synced as one unit.
///
/// The consumer sees exactly one start marker, then every module's chunks
/// in plan order, then exactly one end marker, however many invocations
/// that takes. Marker delivery is persisted as [`PlanState`].
#[derive(Default)]
pub struct FullSyncPlan {
    modules: Vec<PlannedModule>,
}

/// What one [`FullSyncPlan::run`] did.
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    /// Start marker sent by this run.
    pub started_now: bool,
    /// End marker sent by this run.
    pub ended_now: bool,
    /// Every module finished and the end marker is delivered.
    pub complete: bool,
    /// Driver invocations made by this run, in order.
    pub invocations: Vec<Invocation>,
}

impl FullSyncPlan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module.
    pub fn with_module(mut self, kind: impl EntityKind + 'static, config: FullSyncConfig) -> Self {
        self.modules.push(PlannedModule {
            kind: Arc::new(kind),
            config,
        });
        self
    }

    /// Module names in plan order.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.kind.name()).collect()
    }

    /// Checksum over every module's name and configuration.
    pub fn config_checksum(&self) -> SyncResult<Checksum> {
        let entries: Vec<(&str, &FullSyncConfig)> = self
            .modules
            .iter()
            .map(|m| (m.kind.name(), &m.config))
            .collect();
        Ok(checksum_of(&entries)?)
    }

    /// Advances the plan until it completes or `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PlanChanged`] if the plan's configuration
    /// differs from the one announced in its start marker, and otherwise
    /// propagates the first driver or transport failure.
    pub fn run<S: RecordStore, T: TransportSender>(
        &self,
        driver: &FullSyncDriver<S, T>,
        deadline: Instant,
    ) -> SyncResult<PlanReport> {
        self.validate()?;
        let current = self.config_checksum()?;
        let statuses = driver.statuses();
        let prefix = &driver.config().action_prefix;

        let mut state = statuses.load_plan()?.unwrap_or_default();
        if let Some(recorded) = state.config_checksum {
            if recorded != current {
                return Err(SyncError::PlanChanged { recorded, current });
            }
        }

        let mut report = PlanReport::default();
        if state.ended {
            report.complete = true;
            return Ok(report);
        }

        if !state.started {
            let start = FullSyncStart {
                modules: self.estimates(driver)?,
                config_checksum: current,
            };
            driver
                .transport()
                .send(&action_name(prefix, START), &SyncMessage::Start(start))?;
            state = PlanState {
                started: true,
                ended: false,
                config_checksum: Some(current),
            };
            statuses.save_plan(&state)?;
            report.started_now = true;
            info!(modules = self.modules.len(), checksum = %current, "full sync started");
        }

        for module in &self.modules {
            if driver.status(module.kind.name())?.finished {
                continue;
            }
            if Instant::now() >= deadline {
                return Ok(report);
            }
            let invocation = driver.run_until(module.kind.as_ref(), &module.config, deadline)?;
            let finished = invocation.outcome.is_finished();
            report.invocations.push(invocation);
            if !finished {
                return Ok(report);
            }
        }

        let mut totals = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            totals.push(ModuleTotal {
                module: module.kind.name().to_string(),
                sent: driver.status(module.kind.name())?.sent,
            });
        }
        let end = FullSyncEnd {
            modules: totals,
            config_checksum: current,
        };
        driver
            .transport()
            .send(&action_name(prefix, END), &SyncMessage::End(end))?;
        state.ended = true;
        statuses.save_plan(&state)?;
        info!(checksum = %current, "full sync ended");

        report.ended_now = true;
        report.complete = true;
        Ok(report)
    }

    /// Forgets the plan markers and every module's status.
    pub fn reset<S: RecordStore, T: TransportSender>(
        &self,
        driver: &FullSyncDriver<S, T>,
    ) -> SyncResult<()> {
        for module in &self.modules {
            driver.reset(module.kind.name())?;
        }
        driver.statuses().clear_plan()
    }

    fn validate(&self) -> SyncResult<()> {
        if self.modules.is_empty() {
            return Err(SyncError::invalid_module("", "plan has no modules"));
        }
        let mut seen = BTreeSet::new();
        for module in &self.modules {
            if !seen.insert(module.kind.name()) {
                return Err(SyncError::invalid_module(
                    module.kind.name(),
                    "listed twice in plan",
                ));
            }
        }
        Ok(())
    }

    /// Resolves every module's limits before anything is sent.
    fn estimates<S: RecordStore, T: TransportSender>(
        &self,
        driver: &FullSyncDriver<S, T>,
    ) -> SyncResult<Vec<ModuleEstimate>> {
        self.modules
            .iter()
            .map(|m| -> SyncResult<ModuleEstimate> {
                let limits = driver.limits().limits_for(m.kind.name())?;
                let estimate = estimate(&**driver.store(), m.kind.as_ref(), &m.config, &limits)?;
                Ok(ModuleEstimate::new(m.kind.name(), estimate))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::status_store::{MemoryStatusStore, StatusStore};
    use crate::transport::MockTransport;
    use fullsync_core::{CollectionKind, RecordId, StaticLimits};
    use fullsync_store::InMemoryStore;
    use std::time::Duration;

    fn driver(limits: StaticLimits) -> FullSyncDriver<InMemoryStore, MockTransport> {
        let store = InMemoryStore::new();
        store.insert_ids("posts", 1..=25).unwrap();
        store.insert_ids("users", 1..=5).unwrap();
        FullSyncDriver::new(
            DriverConfig::new(),
            Arc::new(store),
            Arc::new(MockTransport::new()),
            Arc::new(limits),
            Arc::new(MemoryStatusStore::new()),
        )
    }

    fn plan() -> FullSyncPlan {
        FullSyncPlan::new()
            .with_module(CollectionKind::new("posts"), FullSyncConfig::All)
            .with_module(CollectionKind::new("users"), FullSyncConfig::All)
    }

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[test]
    fn brackets_modules_with_markers() {
        let driver = driver(
            StaticLimits::new()
                .with_module("posts", 10, 2)
                .with_module("users", 10, 2),
        );
        let plan = plan();

        let first = plan.run(&driver, later()).unwrap();
        assert!(first.started_now);
        assert!(!first.complete);

        let second = plan.run(&driver, later()).unwrap();
        assert!(!second.started_now);
        assert!(second.ended_now);
        assert!(second.complete);

        let third = plan.run(&driver, later()).unwrap();
        assert!(third.complete);
        assert!(third.invocations.is_empty());

        let actions = driver.transport().actions();
        assert_eq!(actions.first().map(String::as_str), Some("full_sync_start"));
        assert_eq!(actions.last().map(String::as_str), Some("full_sync_end"));
        assert_eq!(actions.iter().filter(|a| *a == "full_sync_start").count(), 1);
        assert_eq!(actions.iter().filter(|a| *a == "full_sync_end").count(), 1);
        assert_eq!(driver.transport().sent_ids("full_sync_posts").len(), 25);
        assert_eq!(
            driver.transport().sent_ids("full_sync_users"),
            (1..=5).rev().map(RecordId).collect::<Vec<_>>()
        );

        let sent = driver.transport().sent();
        match &sent[0].message {
            SyncMessage::Start(start) => {
                assert_eq!(start.modules[0].records, 25);
                assert_eq!(start.modules[0].chunks, 3);
                assert_eq!(start.config_checksum, plan.config_checksum().unwrap());
            }
            other => panic!("unexpected message {other:?}"),
        }
        match &sent[sent.len() - 1].message {
            SyncMessage::End(end) => {
                assert_eq!(end.modules[0].sent, 25);
                assert_eq!(end.modules[1].sent, 5);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn missing_limits_send_no_start() {
        let driver = driver(StaticLimits::new().with_module("posts", 10, 2));
        assert!(plan().run(&driver, later()).is_err());
        assert!(driver.transport().sent().is_empty());
        assert_eq!(driver.statuses().load_plan().unwrap(), None);
    }

    #[test]
    fn changed_plan_is_rejected_until_reset() {
        let driver = driver(
            StaticLimits::new()
                .with_module("posts", 10, 1)
                .with_module("users", 10, 1),
        );
        plan().run(&driver, later()).unwrap();

        let narrowed = FullSyncPlan::new()
            .with_module(CollectionKind::new("posts"), FullSyncConfig::Ids(vec![RecordId(1)]))
            .with_module(CollectionKind::new("users"), FullSyncConfig::All);
        assert!(matches!(
            narrowed.run(&driver, later()),
            Err(SyncError::PlanChanged { .. })
        ));

        narrowed.reset(&driver).unwrap();
        let report = narrowed.run(&driver, later()).unwrap();
        assert!(report.started_now);
    }

    #[test]
    fn duplicate_modules_rejected() {
        let driver = driver(StaticLimits::new().with_module("posts", 10, 1));
        let plan = FullSyncPlan::new()
            .with_module(CollectionKind::new("posts"), FullSyncConfig::All)
            .with_module(CollectionKind::new("posts"), FullSyncConfig::All);
        assert!(matches!(
            plan.run(&driver, later()),
            Err(SyncError::InvalidModule { .. })
        ));
        assert!(FullSyncPlan::new().run(&driver, later()).is_err());
    }

    #[test]
    fn passed_deadline_only_starts() {
        let driver = driver(
            StaticLimits::new()
                .with_module("posts", 10, 1)
                .with_module("users", 10, 1),
        );
        let report = plan().run(&driver, Instant::now()).unwrap();
        assert!(report.started_now);
        assert!(report.invocations.is_empty());
        assert_eq!(driver.transport().actions(), vec!["full_sync_start"]);
    }
}
