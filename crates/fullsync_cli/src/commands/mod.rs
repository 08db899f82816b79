//! CLI command implementations.

pub mod checksum;
pub mod estimate;
pub mod partition;
pub mod run;
pub mod snapshot;
pub mod state;

use crate::error::{CliError, CliResult};
use clap::ValueEnum;
use fullsync_core::{CollectionKind, FullSyncConfig, StaticLimits};
use fullsync_store::{Dataset, InMemoryStore};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Output format for commands that print tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Per-module full-sync configuration; unlisted modules sync everything.
pub type ModuleConfigs = BTreeMap<String, FullSyncConfig>;

/// Loads a JSON dataset into a store.
pub fn load_store(path: &Path) -> CliResult<InMemoryStore> {
    Ok(Dataset::from_path(path)?.into_store()?)
}

/// Loads a limits table.
pub fn load_limits(path: &Path) -> CliResult<StaticLimits> {
    let text = fs::read_to_string(path)?;
    StaticLimits::from_json(&text).map_err(|e| CliError::invalid_input(path, e))
}

/// Loads per-module configurations, or none.
pub fn load_configs(path: Option<&Path>) -> CliResult<ModuleConfigs> {
    let Some(path) = path else {
        return Ok(ModuleConfigs::new());
    };
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| CliError::invalid_input(path, e))
}

/// Configuration for `module`.
pub fn config_for(configs: &ModuleConfigs, module: &str) -> FullSyncConfig {
    configs.get(module).cloned().unwrap_or_default()
}

/// Kind for a module backed by the dataset collection of the same name.
pub fn kind_for(store: &InMemoryStore, module: &str) -> CliResult<CollectionKind> {
    if !store.collection_names().iter().any(|name| name == module) {
        return Err(CliError::UnknownModule(module.to_string()));
    }
    Ok(CollectionKind::new(module))
}


#[cfg(test)]
mod tests {
    use super::*;
    use fullsync_core::{EntityKind, RecordId};

    #[test]
    fn inputs_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = load_store(&testing::write_dataset(dir.path(), 10)).unwrap();
        assert_eq!(store.len("posts"), 10);

        let limits = load_limits(&testing::write_limits(dir.path(), 5, 2)).unwrap();
        assert_eq!(limits.modules().collect::<Vec<_>>(), vec!["comments", "posts"]);

        assert_eq!(kind_for(&store, "posts").unwrap().name(), "posts");
        assert!(matches!(
            kind_for(&store, "users"),
            Err(CliError::UnknownModule(_))
        ));
    }

    #[test]
    fn configs_default_to_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"posts": {"ids": [3, 1]}}"#).unwrap();

        let configs = load_configs(Some(&path)).unwrap();
        assert_eq!(
            config_for(&configs, "posts"),
            FullSyncConfig::Ids(vec![RecordId(3), RecordId(1)])
        );
        assert_eq!(config_for(&configs, "comments"), FullSyncConfig::All);
        assert!(load_configs(None).unwrap().is_empty());
    }

    #[test]
    fn malformed_limits_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        fs::write(&path, r#"{"posts": {"chunk_size": "ten"}}"#).unwrap();
        assert!(matches!(
            load_limits(&path),
            Err(CliError::InvalidInput { .. })
        ));
    }
}
