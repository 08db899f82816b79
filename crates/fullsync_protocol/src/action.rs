//! Action names under which messages are sent.
//!
//! Every module's chunks go out as `<prefix><module>`. The bracketing
//! markers and snapshots share the same prefix, so the module names
//! `start`, `end` and `snapshot` are reserved.

/// Prefix used unless configured otherwise.
pub const DEFAULT_ACTION_PREFIX: &str = "full_sync_";

/// Suffix of the full-sync start marker.
pub const START: &str = "start";

/// Suffix of the full-sync end marker.
pub const END: &str = "end";

/// Suffix of snapshot messages.
pub const SNAPSHOT: &str = "snapshot";

const RESERVED: [&str; 3] = [START, END, SNAPSHOT];

/// Builds the action name for `module`.
pub fn action_name(prefix: &str, module: &str) -> String {
    format!("{prefix}{module}")
}

/// Returns true if `module` would collide with a marker action.
pub fn is_reserved_module(module: &str) -> bool {
    RESERVED.contains(&module)
}
