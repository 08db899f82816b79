//! Configuration for the full-sync driver.

use fullsync_protocol::DEFAULT_ACTION_PREFIX;
use std::time::Duration;

/// Configuration for driver invocations.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Wall-clock budget for [`run`](crate::FullSyncDriver::run).
    pub time_budget: Duration,
    /// Prefix of every action name.
    pub action_prefix: String,
    /// Persist status after every chunk rather than once per invocation.
    pub persist_each_chunk: bool,
}

impl DriverConfig {
    /// Creates a configuration with a 10 second budget.
    pub fn new() -> Self {
        Self {
            time_budget: Duration::from_secs(10),
            action_prefix: DEFAULT_ACTION_PREFIX.to_string(),
            persist_each_chunk: true,
        }
    }

    /// Sets the time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Sets the action prefix.
    pub fn with_action_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.action_prefix = prefix.into();
        self
    }

    /// Sets whether status is persisted after every chunk.
    ///
    /// With `false`, a crash mid-invocation loses the invocation's progress
    /// and its chunks are sent again on the next run.
    pub fn with_persist_each_chunk(mut self, persist: bool) -> Self {
        self.persist_each_chunk = persist;
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_config_builder() {
        let config = DriverConfig::new()
            .with_time_budget(Duration::from_millis(250))
            .with_action_prefix("jp_full_sync_")
            .with_persist_each_chunk(false);

        assert_eq!(config.time_budget, Duration::from_millis(250));
        assert_eq!(config.action_prefix, "jp_full_sync_");
        assert!(!config.persist_each_chunk);
    }

    #[test]
    fn defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.time_budget, Duration::from_secs(10));
        assert_eq!(config.action_prefix, "full_sync_");
        assert!(config.persist_each_chunk);
    }
}
