use crate::settings::{Configuration, Shortcut, ShortcutRegistry};
use crate::utils::path_utils::absolutize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LEGACY_DIRECTORY_FILE: &str = "last_directory.txt";
pub const LEGACY_SETTINGS_FILE: &str = "settings.txt";

/// What one legacy source contributes. `None` (or an empty value) leaves the
/// field to earlier sources or the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialConfiguration {
    pub last_directory: Option<PathBuf>,
    pub display_name: Option<String>,
    pub shortcuts: Option<Vec<Shortcut>>,
}

impl PartialConfiguration {
    /// Overlays `later` onto `self`; non-empty values in `later` win.
    pub fn merge(self, later: PartialConfiguration) -> PartialConfiguration {
        PartialConfiguration {
            last_directory: later
                .last_directory
                .filter(|p| !p.as_os_str().is_empty())
                .or(self.last_directory),
            display_name: later.display_name.filter(|n| !n.is_empty()).or(self.display_name),
            shortcuts: later.shortcuts.filter(|s| !s.is_empty()).or(self.shortcuts),
        }
    }

    pub fn into_configuration(self) -> Configuration {
        let defaults = Configuration::default();
        Configuration {
            last_directory: self.last_directory,
            display_name: self.display_name.unwrap_or(defaults.display_name),
            shortcuts: self
                .shortcuts
                .map(ShortcutRegistry::from_entries)
                .unwrap_or(defaults.shortcuts),
        }
    }
}

/// Legacy inputs, listed lowest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacySource {
    /// Single line holding the last used base directory.
    DirectoryFile(PathBuf),
    /// `key=value` lines for `last_directory`, `Name` and `PrivateServers`.
    SettingsFile(PathBuf),
}

impl LegacySource {
    /// The fixed migration order for a data directory.
    pub fn defaults_in(data_dir: &Path) -> Vec<LegacySource> {
        vec![
            LegacySource::DirectoryFile(data_dir.join(LEGACY_DIRECTORY_FILE)),
            LegacySource::SettingsFile(data_dir.join(LEGACY_SETTINGS_FILE)),
        ]
    }

    fn path(&self) -> &Path {
        match self {
            LegacySource::DirectoryFile(p) | LegacySource::SettingsFile(p) => p,
        }
    }

    /// Reads the source. A missing or unreadable file contributes nothing.
    pub fn read(&self) -> PartialConfiguration {
        let content = match fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return PartialConfiguration::default(),
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "Skipping unreadable legacy file");
                return PartialConfiguration::default();
            }
        };
        debug!(path = %self.path().display(), "Reading legacy settings");
        match self {
            LegacySource::DirectoryFile(_) => PartialConfiguration {
                last_directory: legacy_directory(content.trim()),
                ..Default::default()
            },
            LegacySource::SettingsFile(_) => parse_legacy_settings(&content),
        }
    }
}

fn legacy_directory(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }
    let path = PathBuf::from(raw);
    Some(absolutize(&path).unwrap_or(path))
}

/// Parses `name|parameter` pairs joined by commas. Pairs without a `|` are dropped.
pub fn parse_legacy_shortcuts(raw: &str) -> Vec<Shortcut> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .filter_map(|pair| {
            let (name, parameter) = pair.split_once('|')?;
            Some(Shortcut::new(name.trim(), parameter.trim()))
        })
        .collect()
}

pub fn parse_legacy_settings(content: &str) -> PartialConfiguration {
    let mut partial = PartialConfiguration::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "last_directory" => partial.last_directory = legacy_directory(value),
            "Name" if !value.is_empty() => partial.display_name = Some(value.to_string()),
            "PrivateServers" => partial.shortcuts = Some(parse_legacy_shortcuts(value)),
            _ => {}
        }
    }
    partial
}

/// Folds `sources` left to right into a full configuration.
pub fn migrate(sources: &[LegacySource]) -> Configuration {
    sources
        .iter()
        .map(LegacySource::read)
        .fold(PartialConfiguration::default(), PartialConfiguration::merge)
        .into_configuration()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_DISPLAY_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_parse_legacy_settings() {
        let partial = parse_legacy_settings(
            "last_directory=/x\nName=Bob\nPrivateServers=A|p1,B|p2\nunknown=1\n",
        );
        assert_eq!(partial.last_directory, Some(PathBuf::from("/x")));
        assert_eq!(partial.display_name.as_deref(), Some("Bob"));
        assert_eq!(
            partial.shortcuts,
            Some(vec![Shortcut::new("A", "p1"), Shortcut::new("B", "p2")])
        );
    }

    #[test]
    fn test_parameter_may_contain_equals_and_pipes() {
        let partial = parse_legacy_settings("PrivateServers=Club|https://x/?a=1|b,broken,,");
        assert_eq!(partial.shortcuts, Some(vec![Shortcut::new("Club", "https://x/?a=1|b")]));
    }

    #[test]
    fn test_settings_file_overrides_directory_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(LEGACY_DIRECTORY_FILE), "/from/dirfile\n").unwrap();
        fs::write(
            temp_dir.path().join(LEGACY_SETTINGS_FILE),
            "last_directory=/from/settings\n",
        )
        .unwrap();

        let config = migrate(&LegacySource::defaults_in(temp_dir.path()));
        assert_eq!(config.last_directory, Some(PathBuf::from("/from/settings")));
        assert_eq!(config.display_name, DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_empty_settings_directory_keeps_directory_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(LEGACY_DIRECTORY_FILE), "/from/dirfile").unwrap();
        fs::write(
            temp_dir.path().join(LEGACY_SETTINGS_FILE),
            "last_directory=\nName=Ann\n",
        )
        .unwrap();

        let config = migrate(&LegacySource::defaults_in(temp_dir.path()));
        assert_eq!(config.last_directory, Some(PathBuf::from("/from/dirfile")));
        assert_eq!(config.display_name, "Ann");
    }

    #[test]
    fn test_no_legacy_files_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(migrate(&LegacySource::defaults_in(temp_dir.path())), Configuration::default());
    }
}
