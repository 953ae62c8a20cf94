use crate::config::Config;
use crate::error::AppError;
use crate::launch::client::{count_processes, run_crash_helper};
use crate::launch::link::deep_link;
use crate::launch::terminal::locate_terminal;
use crate::launch::{
    ClientKiller, CommandBuilder, LaunchMode, PathLocator, ProgramLocator, ShellSpawner, Spawner,
    SystemKiller,
};
use crate::profiles::{self, MAIN_PROFILE};
use crate::settings::{Configuration, SettingsStore, Shortcut};
use crate::supervisor::{BatchReport, ProcessSupervisor};
use crate::utils::path_utils::{check_profile_name, resolve_base_directory};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Host capabilities the manager needs: spawning, killing, finding programs.
#[derive(Debug)]
pub struct Platform {
    pub spawner: Box<dyn Spawner>,
    pub killer: Box<dyn ClientKiller>,
    pub locator: Box<dyn ProgramLocator>,
}

impl Platform {
    pub fn system(config: &Config) -> Self {
        let locator = PathLocator;
        Self {
            spawner: Box::new(ShellSpawner::default()),
            killer: Box::new(SystemKiller::from_config(config, &locator)),
            locator: Box::new(locator),
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub base_directory: Option<PathBuf>,
    pub display_name: String,
    pub profiles: Vec<String>,
    pub running: Vec<String>,
    pub missing: Vec<String>,
    pub shortcuts: Vec<Shortcut>,
}

/// Single owner of the launcher's state. Settings are loaded on construction
/// and written back after every mutation.
#[derive(Debug)]
pub struct Manager {
    config: Arc<Config>,
    store: SettingsStore,
    settings: Configuration,
    supervisor: ProcessSupervisor,
    locator: Box<dyn ProgramLocator>,
}

impl Manager {
    pub fn new(config: Arc<Config>) -> Self {
        let platform = Platform::system(&config);
        Self::with_platform(config, platform)
    }

    pub fn with_platform(config: Arc<Config>, platform: Platform) -> Self {
        let store = SettingsStore::new(&config.data_dir);
        let settings = store.load();
        Self {
            config,
            store,
            settings,
            supervisor: ProcessSupervisor::new(platform.spawner, platform.killer),
            locator: platform.locator,
        }
    }

    pub fn settings(&self) -> &Configuration {
        &self.settings
    }

    pub fn base_directory(&self) -> Option<&Path> {
        self.settings.last_directory.as_deref()
    }

    fn persist(&self) -> Result<(), AppError> {
        self.store.save(&self.settings).map_err(|e| {
            warn!(error = %e, "Settings not saved, keeping in-memory values");
            e
        })
    }

    // --- Profiles ---

    pub fn profiles(&self) -> Vec<String> {
        profiles::scan(self.base_directory())
    }

    #[instrument(skip(self))]
    pub fn select_base_directory(&mut self, path: &str) -> Result<PathBuf, AppError> {
        let resolved = resolve_base_directory(path)?;
        self.settings.last_directory = Some(resolved.clone());
        self.persist()?;
        info!(path = %resolved.display(), "Base directory selected");
        Ok(resolved)
    }

    #[instrument(skip(self))]
    pub fn create_profile(&mut self, name: &str) -> Result<PathBuf, AppError> {
        let base = self.base_directory().ok_or(AppError::BaseDirectoryNotSet)?;
        let created = profiles::create_profile(base, name)?;
        info!(path = %created.display(), "Profile created");
        Ok(created)
    }

    // --- Display name & shortcuts ---

    #[instrument(skip(self))]
    pub fn set_display_name(&mut self, name: &str) -> Result<(), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInputArgument("Name must not be empty".to_string()));
        }
        self.settings.display_name = name.to_string();
        self.persist()
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        self.settings.shortcuts.list()
    }

    fn require_shortcut_name(name: &str) -> Result<&str, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInputArgument(
                "Shortcut name must not be empty".to_string(),
            ));
        }
        Ok(name)
    }

    #[instrument(skip(self))]
    pub fn add_shortcut(&mut self, name: &str, parameter: &str) -> Result<(), AppError> {
        let name = Self::require_shortcut_name(name)?;
        self.settings.shortcuts.add(name, parameter.trim());
        self.persist()
    }

    /// Rewrites every shortcut named `old_name`; returns how many changed.
    #[instrument(skip(self))]
    pub fn edit_shortcut(
        &mut self,
        old_name: &str,
        old_parameter: &str,
        new_name: &str,
        new_parameter: &str,
    ) -> Result<usize, AppError> {
        let new_name = Self::require_shortcut_name(new_name)?;
        let changed = self
            .settings
            .shortcuts
            .edit(old_name, old_parameter, new_name, new_parameter.trim());
        if changed == 0 {
            return Err(AppError::ShortcutNotFound(old_name.to_string()));
        }
        self.persist()?;
        Ok(changed)
    }

    /// Removes every shortcut named `name`; returns how many went.
    #[instrument(skip(self))]
    pub fn remove_shortcut(&mut self, name: &str) -> Result<usize, AppError> {
        let removed = self.settings.shortcuts.remove(name);
        self.persist()?;
        Ok(removed)
    }

    // --- Launching ---

    /// Resolves everything shared by a batch; failures here abort before any spawn.
    fn command_builder(&self, mode: &LaunchMode) -> Result<CommandBuilder, AppError> {
        let builder = CommandBuilder::new(self.config.client_command.as_str());
        match mode {
            LaunchMode::Direct => Ok(builder),
            LaunchMode::Console => {
                let terminal = locate_terminal(&self.config.terminals, self.locator.as_ref())?;
                Ok(builder.in_terminal(terminal))
            }
            LaunchMode::GameLink(link) => {
                Ok(builder.with_argument(deep_link(&self.config.deep_link_scheme, link)?))
            }
            LaunchMode::RawArgument(argument) => Ok(builder.with_argument(argument.as_str())),
        }
    }

    /// `None` for the main profile, otherwise the directory named exactly `profile`.
    fn profile_home(&self, profile: &str) -> Result<Option<PathBuf>, AppError> {
        if profile == MAIN_PROFILE {
            return Ok(None);
        }
        let base = self.base_directory().ok_or(AppError::BaseDirectoryNotSet)?;
        let home = base.join(check_profile_name(profile)?);
        if !home.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "Profile directory missing: {}",
                home.display()
            )));
        }
        Ok(Some(home))
    }

    /// Launches each selected profile independently; duplicates in `profiles` launch once.
    #[instrument(skip(self))]
    pub fn launch(
        &mut self,
        profiles: &[String],
        mode: LaunchMode,
    ) -> Result<BatchReport, AppError> {
        if profiles.is_empty() {
            return Err(AppError::InvalidInputArgument("No profiles selected.".to_string()));
        }
        let builder = self.command_builder(&mode)?;

        let mut seen = BTreeSet::new();
        let mut report = BatchReport::default();
        for profile in profiles.iter().filter(|p| seen.insert(p.as_str())) {
            let result = self
                .profile_home(profile)
                .and_then(|home| self.supervisor.launch(profile, &builder.build(home.as_deref())));
            report.record(profile, result);
        }
        info!(
            launched = report.launched.len(),
            already_running = report.already_running.len(),
            failed = report.failed.len(),
            "Batch launch finished"
        );
        Ok(report)
    }

    pub fn launch_link(
        &mut self,
        profiles: &[String],
        link: &str,
    ) -> Result<BatchReport, AppError> {
        self.launch(profiles, LaunchMode::GameLink(link.to_string()))
    }

    /// Launches `profiles` with the parameter of the first shortcut named `shortcut`.
    pub fn launch_shortcut(
        &mut self,
        profiles: &[String],
        shortcut: &str,
    ) -> Result<BatchReport, AppError> {
        let parameter = self
            .settings
            .shortcuts
            .find(shortcut)
            .map(|s| s.parameter.clone())
            .ok_or_else(|| AppError::ShortcutNotFound(shortcut.to_string()))?;
        self.launch(profiles, LaunchMode::RawArgument(parameter))
    }

    /// Launches every missing profile again, optionally into a specific game.
    #[instrument(skip(self))]
    pub fn relaunch_missing(&mut self, link: Option<&str>) -> Result<BatchReport, AppError> {
        let missing: Vec<String> = self.missing().into_iter().collect();
        if missing.is_empty() {
            return Ok(BatchReport::default());
        }
        let mode = match link.map(str::trim).filter(|l| !l.is_empty()) {
            Some(link) => LaunchMode::GameLink(link.to_string()),
            None => LaunchMode::Direct,
        };
        self.launch(&missing, mode)
    }

    pub fn terminate_all(&mut self) -> Result<(), AppError> {
        self.supervisor.terminate_all()
    }

    // --- Reconciliation ---

    /// Drops exited processes; returns the profiles found exited.
    pub fn sweep(&mut self) -> Vec<String> {
        self.supervisor.sweep()
    }

    pub fn missing(&self) -> BTreeSet<String> {
        self.supervisor.missing()
    }

    pub fn running(&self) -> BTreeSet<String> {
        self.supervisor.running()
    }

    // --- Host helpers ---

    #[instrument(skip(self))]
    pub fn close_crash_windows(&self) -> Result<(), AppError> {
        let helper = self
            .locator
            .locate(&self.config.crash_helper)
            .ok_or_else(|| AppError::ToolUnavailable(self.config.crash_helper.clone()))?;
        run_crash_helper(&helper, &self.config.crash_window_title)
    }

    pub fn client_process_count(&self) -> usize {
        count_processes(&self.config.client_process_name)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            base_directory: self.settings.last_directory.clone(),
            display_name: self.settings.display_name.clone(),
            profiles: self.profiles(),
            running: self.running().into_iter().collect(),
            missing: self.missing().into_iter().collect(),
            shortcuts: self.shortcuts().to_vec(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{harness, Harness};
    use super::*;
    use crate::error::ErrorKind;
    use crate::settings::SettingsStore;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn with_base(temp_dir: &TempDir, available: &[&str]) -> Harness {
        let mut h = harness(Config::with_data_dir(temp_dir.path().join("data")), available);
        let base = temp_dir.path().join("alts");
        std::fs::create_dir_all(&base).unwrap();
        h.manager.select_base_directory(base.to_str().unwrap()).unwrap();
        h
    }

    #[test]
    fn test_launch_binds_home_per_profile() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = with_base(&temp_dir, &[]);
        let home = h.manager.create_profile("P1").unwrap();

        let report = h.manager.launch(&names(&["Main Profile", "P1"]), LaunchMode::Direct).unwrap();
        assert_eq!(report.launched.len(), 2);
        assert_eq!(
            h.spawner.commands(),
            vec![
                "flatpak run org.vinegarhq.Sober".to_string(),
                format!("env HOME=\"{}\" flatpak run org.vinegarhq.Sober", home.display()),
            ]
        );
    }

    #[test]
    fn test_idempotent_launch() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        h.manager.launch(&names(&["Main Profile"]), LaunchMode::Direct).unwrap();
        let second = h.manager.launch(&names(&["Main Profile"]), LaunchMode::Direct).unwrap();

        assert_eq!(second.already_running, vec!["Main Profile"]);
        assert_eq!(h.spawner.commands().len(), 1);
        assert_eq!(h.manager.running().len(), 1);
    }

    #[test]
    fn test_missing_instances_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = with_base(&temp_dir, &[]);
        h.manager.create_profile("P1").unwrap();
        h.manager.launch(&names(&["Main Profile", "P1"]), LaunchMode::Direct).unwrap();

        h.spawner.exit_matching("P1");
        assert_eq!(h.manager.sweep(), vec!["P1"]);
        assert_eq!(h.manager.missing(), BTreeSet::from(["P1".to_string()]));
        h.manager.sweep();
        assert_eq!(h.manager.missing(), BTreeSet::from(["P1".to_string()]));

        let report = h.manager.relaunch_missing(None).unwrap();
        assert_eq!(report.launched.len(), 1);
        assert!(h.manager.missing().is_empty());

        h.spawner.exit_matching("P1");
        h.manager.sweep();
        h.manager.terminate_all().unwrap();
        assert!(h.manager.missing().is_empty());
    }

    #[test]
    fn test_relaunch_missing_with_link() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        h.manager.launch(&names(&["Main Profile"]), LaunchMode::Direct).unwrap();
        h.spawner.exit_matching("Sober");
        h.manager.sweep();

        h.manager
            .relaunch_missing(Some("https://www.roblox.com/games/606849621/Jailbreak"))
            .unwrap();
        assert_eq!(
            h.spawner.commands().last().unwrap(),
            r#"flatpak run org.vinegarhq.Sober "roblox://experience?placeId=606849621""#
        );
    }

    #[test]
    fn test_invalid_link_spawns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        let err = h
            .manager
            .launch_link(&names(&["Main Profile"]), "https://site/nogames")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(h.spawner.commands().is_empty());
        assert!(h.manager.missing().is_empty());
    }

    #[test]
    fn test_console_without_terminal_aborts_batch() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        let err = h.manager.launch(&names(&["Main Profile"]), LaunchMode::Console).unwrap_err();
        assert!(matches!(err, AppError::NoTerminalAvailable(_)));
        assert!(h.spawner.commands().is_empty());
    }

    #[test]
    fn test_console_uses_first_available_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &["xterm", "gnome-terminal"]);
        h.manager.launch(&names(&["Main Profile"]), LaunchMode::Console).unwrap();
        assert_eq!(h.spawner.commands(), vec!["gnome-terminal -- flatpak run org.vinegarhq.Sober"]);
    }

    #[test]
    fn test_per_profile_failures_do_not_stop_batch() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        let report = h
            .manager
            .launch(&names(&["Ghost", "Main Profile", "Main Profile"]), LaunchMode::Direct)
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].profile, "Ghost");
        assert_eq!(report.launched.len(), 1);
        assert!(report.already_running.is_empty());
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        let err = h.manager.launch(&[], LaunchMode::Direct).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_shortcuts_persist_across_restart() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        h.manager.add_shortcut("Club", "p1").unwrap();
        h.manager.add_shortcut("Club", "p2").unwrap();
        h.manager.add_shortcut("Other", "p3").unwrap();
        assert_eq!(h.manager.edit_shortcut("Club", "p1", "Club2", "p9").unwrap(), 2);
        assert_eq!(h.manager.remove_shortcut("Other").unwrap(), 1);
        h.manager.set_display_name("Bob").unwrap();

        let reloaded = SettingsStore::new(temp_dir.path()).load();
        assert_eq!(reloaded.display_name, "Bob");
        assert_eq!(
            reloaded.shortcuts.list(),
            &[Shortcut::new("Club2", "p9"), Shortcut::new("Club2", "p9")]
        );
        assert!(matches!(
            h.manager.edit_shortcut("Nope", "", "X", ""),
            Err(AppError::ShortcutNotFound(_))
        ));
    }

    #[test]
    fn test_launch_shortcut_passes_parameter() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        let share = "roblox://navigation/share_links?code=abc&type=Server";
        h.manager.add_shortcut("Club", share).unwrap();
        h.manager
            .launch_shortcut(&names(&["Main Profile"]), "Club")
            .unwrap();
        assert_eq!(
            h.spawner.commands(),
            vec![format!(r#"flatpak run org.vinegarhq.Sober "{}""#, share)]
        );
        assert!(matches!(
            h.manager.launch_shortcut(&names(&["Main Profile"]), "Missing"),
            Err(AppError::ShortcutNotFound(_))
        ));
    }

    #[test]
    fn test_create_profile_requires_base_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        assert!(matches!(h.manager.create_profile("P1"), Err(AppError::BaseDirectoryNotSet)));
    }

    #[test]
    fn test_crash_helper_missing_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let h = harness(Config::with_data_dir(temp_dir.path()), &[]);
        let err = h.manager.close_crash_windows().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalTool);
    }

    #[test]
    fn test_whitespace_in_profile_name_selects_its_own_home() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = with_base(&temp_dir, &[]);
        let base = h.manager.base_directory().unwrap().to_path_buf();
        for name in ["Alt", "Alt "] {
            std::fs::create_dir_all(base.join(name).join(".local")).unwrap();
        }
        assert_eq!(h.manager.profiles(), vec!["Main Profile", "Alt", "Alt "]);

        h.manager.launch(&names(&["Alt "]), LaunchMode::Direct).unwrap();
        assert_eq!(
            h.spawner.commands(),
            vec![format!(
                "env HOME=\"{}\" flatpak run org.vinegarhq.Sober",
                base.join("Alt ").display()
            )]
        );
        assert_eq!(h.manager.running(), BTreeSet::from(["Alt ".to_string()]));
    }

    #[test]
    fn test_failed_save_keeps_in_memory_changes() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();
        let mut h = harness(Config::with_data_dir(&blocker), &[]);

        let err = h.manager.add_shortcut("Club", "p1").unwrap_err();
        assert!(matches!(err, AppError::SettingsWrite { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(h.manager.shortcuts(), &[Shortcut::new("Club", "p1")]);

        let err = h.manager.set_display_name("Bob").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(h.manager.settings().display_name, "Bob");
        assert_eq!(h.manager.snapshot().shortcuts, vec![Shortcut::new("Club", "p1")]);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut h = with_base(&temp_dir, &[]);
        h.manager.create_profile("Alt10").unwrap();
        h.manager.create_profile("Alt9").unwrap();
        h.manager.launch(&names(&["Alt9"]), LaunchMode::Direct).unwrap();

        let snap = h.manager.snapshot();
        assert_eq!(snap.profiles, vec!["Main Profile", "Alt9", "Alt10"]);
        assert_eq!(snap.running, vec!["Alt9"]);
        assert!(snap.missing.is_empty());
        assert!(snap.base_directory.is_some());
    }
}
