//! Per-module transmission limits.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;

/// How much one driver invocation may send for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionLimits {
    /// Maximum ids per chunk.
    pub chunk_size: NonZeroU32,
    /// Maximum chunks per invocation.
    pub max_chunks: NonZeroU32,
}

impl TransmissionLimits {
    /// Validates raw limits for `module`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLimits`] if either value is zero; a zero
    /// chunk size would never make progress.
    pub fn new(module: &str, chunk_size: u32, max_chunks: u32) -> CoreResult<Self> {
        let chunk_size = NonZeroU32::new(chunk_size)
            .ok_or_else(|| CoreError::invalid_limits(module, "chunk_size must be positive"))?;
        let max_chunks = NonZeroU32::new(max_chunks)
            .ok_or_else(|| CoreError::invalid_limits(module, "max_chunks must be positive"))?;
        Ok(Self {
            chunk_size,
            max_chunks,
        })
    }

    /// Chunk size as a `usize` query limit.
    #[must_use]
    pub fn chunk_len(&self) -> usize {
        self.chunk_size.get() as usize
    }
}

/// Where limits come from. Absence is an error, never a default.
pub trait LimitsSource: Send + Sync {
    /// Resolves limits for a module.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigurationMissing`] when the module has no
    /// entry and [`CoreError::InvalidLimits`] when its entry is unusable.
    fn limits_for(&self, module: &str) -> CoreResult<TransmissionLimits>;
}

/// Limits as written in configuration, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLimits {
    /// Maximum ids per chunk.
    pub chunk_size: u32,
    /// Maximum chunks per invocation.
    pub max_chunks: u32,
}

/// A fixed table of limits, typically deserialized from JSON:
///
/// ```text
/// { "posts": { "chunk_size": 100, "max_chunks": 10 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticLimits {
    modules: BTreeMap<String, RawLimits>,
}

impl StaticLimits {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a module's limits.
    #[must_use]
    pub fn with_module(
        mut self,
        module: impl Into<String>,
        chunk_size: u32,
        max_chunks: u32,
    ) -> Self {
        self.modules.insert(
            module.into(),
            RawLimits {
                chunk_size,
                max_chunks,
            },
        );
        self
    }

    /// Parses a JSON table.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the table shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Module names with configured limits.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

impl LimitsSource for StaticLimits {
    fn limits_for(&self, module: &str) -> CoreResult<TransmissionLimits> {
        let raw = self
            .modules
            .get(module)
            .ok_or_else(|| CoreError::configuration_missing(module))?;
        TransmissionLimits::new(module, raw.chunk_size, raw.max_chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_module() {
        let limits = StaticLimits::new().with_module("posts", 10, 3);
        let resolved = limits.limits_for("posts").unwrap();
        assert_eq!(resolved.chunk_size.get(), 10);
        assert_eq!(resolved.max_chunks.get(), 3);
        assert_eq!(resolved.chunk_len(), 10);
    }

    #[test]
    fn missing_module_is_an_error() {
        let limits = StaticLimits::new();
        assert!(matches!(
            limits.limits_for("posts"),
            Err(CoreError::ConfigurationMissing { module }) if module == "posts"
        ));
    }

    #[test]
    fn zero_values_rejected() {
        let limits = StaticLimits::new()
            .with_module("posts", 0, 3)
            .with_module("users", 5, 0);
        assert!(matches!(
            limits.limits_for("posts"),
            Err(CoreError::InvalidLimits { .. })
        ));
        assert!(matches!(
            limits.limits_for("users"),
            Err(CoreError::InvalidLimits { .. })
        ));
    }

    #[test]
    fn parses_json_table() {
        let limits = StaticLimits::from_json(
            r#"{
                "posts": {"chunk_size": 100, "max_chunks": 10},
                "users": {"chunk_size": 50, "max_chunks": 2}
            }"#,
        )
        .unwrap();
        assert_eq!(limits.modules().collect::<Vec<_>>(), vec!["posts", "users"]);
        assert_eq!(limits.limits_for("users").unwrap().max_chunks.get(), 2);
        assert!(StaticLimits::from_json(r#"{"posts": {"chunk_size": 1}}"#).is_err());
    }
}
