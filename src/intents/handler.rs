use crate::error::AppError;
use crate::launch::LaunchMode;
use crate::manager::Manager;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// A user intent from the presentation layer, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    State,
    ListProfiles,
    SelectBaseDirectory {
        path: String,
    },
    CreateProfile {
        name: String,
    },
    SetDisplayName {
        name: String,
    },
    Launch {
        profiles: Vec<String>,
        #[serde(default)]
        console: bool,
    },
    LaunchLink {
        profiles: Vec<String>,
        link: String,
    },
    LaunchShortcut {
        profiles: Vec<String>,
        shortcut: String,
    },
    RelaunchMissing {
        #[serde(default)]
        link: Option<String>,
    },
    TerminateAll,
    ListShortcuts,
    AddShortcut {
        name: String,
        parameter: String,
    },
    EditShortcut {
        old_name: String,
        #[serde(default)]
        old_parameter: String,
        new_name: String,
        new_parameter: String,
    },
    RemoveShortcut {
        name: String,
    },
    CloseCrashWindows,
    ClientProcesses,
    Shutdown,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::State => "state",
            Intent::ListProfiles => "list_profiles",
            Intent::SelectBaseDirectory { .. } => "select_base_directory",
            Intent::CreateProfile { .. } => "create_profile",
            Intent::SetDisplayName { .. } => "set_display_name",
            Intent::Launch { .. } => "launch",
            Intent::LaunchLink { .. } => "launch_link",
            Intent::LaunchShortcut { .. } => "launch_shortcut",
            Intent::RelaunchMissing { .. } => "relaunch_missing",
            Intent::TerminateAll => "terminate_all",
            Intent::ListShortcuts => "list_shortcuts",
            Intent::AddShortcut { .. } => "add_shortcut",
            Intent::EditShortcut { .. } => "edit_shortcut",
            Intent::RemoveShortcut { .. } => "remove_shortcut",
            Intent::CloseCrashWindows => "close_crash_windows",
            Intent::ClientProcesses => "client_processes",
            Intent::Shutdown => "shutdown",
        }
    }
}

pub fn parse_intent(line: &str) -> Result<Intent, AppError> {
    serde_json::from_str(line)
        .map_err(|e| AppError::InvalidInputArgument(format!("Malformed intent: {}", e)))
}

pub fn reply_ok(result: Value) -> Value {
    json!({ "ok": true, "result": result })
}

pub fn reply_err(err: &AppError) -> Value {
    json!({ "ok": false, "kind": err.kind(), "error": err.to_string() })
}

/// Applies `intent` to the manager and returns the result payload.
#[instrument(skip(manager, intent), fields(intent = %intent.name()))]
pub fn handle_intent(manager: &mut Manager, intent: Intent) -> Result<Value, AppError> {
    debug!("Handling intent");

    macro_rules! respond {
        ($value:expr) => {
            Ok(serde_json::to_value($value)?)
        };
    }

    match intent {
        Intent::State => respond!(manager.snapshot()),
        Intent::ListProfiles => respond!(manager.profiles()),
        Intent::SelectBaseDirectory { path } => {
            let base = manager.select_base_directory(&path)?;
            Ok(json!({ "base_directory": base, "profiles": manager.profiles() }))
        }
        Intent::CreateProfile { name } => {
            let path = manager.create_profile(&name)?;
            Ok(json!({ "path": path, "profiles": manager.profiles() }))
        }
        Intent::SetDisplayName { name } => {
            manager.set_display_name(&name)?;
            Ok(json!({ "display_name": manager.settings().display_name }))
        }
        Intent::Launch { profiles, console } => {
            let mode = if console { LaunchMode::Console } else { LaunchMode::Direct };
            respond!(manager.launch(&profiles, mode)?)
        }
        Intent::LaunchLink { profiles, link } => respond!(manager.launch_link(&profiles, &link)?),
        Intent::LaunchShortcut { profiles, shortcut } => {
            respond!(manager.launch_shortcut(&profiles, &shortcut)?)
        }
        Intent::RelaunchMissing { link } => respond!(manager.relaunch_missing(link.as_deref())?),
        Intent::TerminateAll => {
            manager.terminate_all()?;
            respond!(manager.snapshot())
        }
        Intent::ListShortcuts => respond!(manager.shortcuts()),
        Intent::AddShortcut { name, parameter } => {
            manager.add_shortcut(&name, &parameter)?;
            respond!(manager.shortcuts())
        }
        Intent::EditShortcut {
            old_name,
            old_parameter,
            new_name,
            new_parameter,
        } => {
            let changed =
                manager.edit_shortcut(&old_name, &old_parameter, &new_name, &new_parameter)?;
            Ok(json!({ "changed": changed, "shortcuts": manager.shortcuts() }))
        }
        Intent::RemoveShortcut { name } => {
            let removed = manager.remove_shortcut(&name)?;
            Ok(json!({ "removed": removed, "shortcuts": manager.shortcuts() }))
        }
        Intent::CloseCrashWindows => {
            manager.close_crash_windows()?;
            Ok(json!({ "closed": true }))
        }
        Intent::ClientProcesses => Ok(json!({ "count": manager.client_process_count() })),
        Intent::Shutdown => Ok(json!({ "shutdown": true })),
    }
}
