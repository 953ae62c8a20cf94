use crate::error::AppError;
use crate::settings::migration::{self, LegacySource};
use crate::settings::{Configuration, Shortcut, ShortcutRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const SETTINGS_FILENAME: &str = "settings.json";

/// On-disk shape of `settings.json`. Field names are kept from the files
/// earlier releases wrote.
#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    last_directory: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "PrivateServers", default)]
    private_servers: Value,
    #[serde(default)]
    version: Option<String>,
}

/// Accepts `{"name": .., "parameter": ..}` or a two-element `[name, parameter]`;
/// anything else is dropped.
fn normalize_shortcut(entry: &Value) -> Option<Shortcut> {
    match entry {
        Value::Object(map) => Some(Shortcut::new(
            map.get("name")?.as_str()?,
            map.get("parameter")?.as_str()?,
        )),
        Value::Array(items) if items.len() == 2 => {
            Some(Shortcut::new(items[0].as_str()?, items[1].as_str()?))
        }
        _ => None,
    }
}

impl From<SettingsFile> for Configuration {
    fn from(file: SettingsFile) -> Self {
        let defaults = Configuration::default();
        let shortcuts = match &file.private_servers {
            Value::Array(entries) => entries.iter().filter_map(normalize_shortcut).collect(),
            _ => Vec::new(),
        };
        Configuration {
            last_directory: file
                .last_directory
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            display_name: file
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or(defaults.display_name),
            shortcuts: ShortcutRegistry::from_entries(shortcuts),
        }
    }
}

impl From<&Configuration> for SettingsFile {
    fn from(config: &Configuration) -> Self {
        SettingsFile {
            last_directory: config
                .last_directory
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            name: Some(config.display_name.clone()),
            private_servers: serde_json::to_value(&config.shortcuts)
                .unwrap_or(Value::Array(Vec::new())),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings_path: PathBuf,
    legacy_sources: Vec<LegacySource>,
}

impl SettingsStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            settings_path: data_dir.join(SETTINGS_FILENAME),
            legacy_sources: LegacySource::defaults_in(data_dir),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Loads the canonical file, or migrates from the legacy files and writes the
    /// result back. Never fails: problems fall back to defaults and are logged.
    #[instrument(skip(self), fields(path = %self.settings_path.display()))]
    pub fn load(&self) -> Configuration {
        if self.settings_path.exists() {
            return match self.read_canonical() {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "Settings file unreadable, using defaults");
                    Configuration::default()
                }
            };
        }

        let config = migration::migrate(&self.legacy_sources);
        info!(
            shortcuts = config.shortcuts.len(),
            has_directory = config.last_directory.is_some(),
            "Migrated legacy settings"
        );
        if let Err(e) = self.save(&config) {
            warn!(error = %e, "Could not persist migrated settings, continuing in memory");
        }
        config
    }

    fn read_canonical(&self) -> Result<Configuration, AppError> {
        let content = fs::read_to_string(&self.settings_path)?;
        let file: SettingsFile = serde_json::from_str(&content)?;
        debug!(version = ?file.version, "Loaded settings file");
        Ok(file.into())
    }

    /// Rewrites the whole settings file from `config`.
    #[instrument(skip(self, config), fields(path = %self.settings_path.display()))]
    pub fn save(&self, config: &Configuration) -> Result<(), AppError> {
        let serialized = serde_json::to_string_pretty(&SettingsFile::from(config))?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.settings_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&self.settings_path, serialized.as_bytes())
        };
        write().map_err(|source| AppError::SettingsWrite {
            path: self.settings_path.clone(),
            source,
        })?;
        debug!("Settings saved");
        Ok(())
    }
}
