//! Persisted user configuration.
//!
//! Stored as `settings.json` in the data directory. On first start the
//! configuration is migrated from `last_directory.txt` and `settings.txt`.

pub mod migration;
pub mod shortcuts;
pub mod store;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use shortcuts::ShortcutRegistry;
pub use store::SettingsStore;

/// Display name used until the user picks one.
pub const DEFAULT_DISPLAY_NAME: &str = "Player";

/// A named quick launch ("private server"): the parameter is passed to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub name: String,
    pub parameter: String,
}

impl Shortcut {
    pub fn new(name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: parameter.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub last_directory: Option<PathBuf>,
    pub display_name: String,
    pub shortcuts: ShortcutRegistry,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            last_directory: None,
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            shortcuts: ShortcutRegistry::default(),
        }
    }
}
