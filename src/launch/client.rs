use crate::config::Config;
use crate::error::AppError;
use crate::launch::ProgramLocator;
use std::path::Path;
use std::process::{Command, Stdio};
use sysinfo::System;
use tracing::{debug, info, instrument, warn};

/// Stops every running client instance, whoever spawned it.
pub trait ClientKiller: Send + std::fmt::Debug {
    fn kill_all(&self) -> Result<(), AppError>;
}

/// `flatpak kill <app id>` when the client runs under flatpak, otherwise a kill
/// of every process with the client's name.
#[derive(Debug, Clone)]
pub struct SystemKiller {
    app_id: String,
    process_name: String,
    use_flatpak: bool,
}

impl SystemKiller {
    pub fn from_config(config: &Config, locator: &dyn ProgramLocator) -> Self {
        let use_flatpak = config.client_command.trim_start().starts_with("flatpak ")
            && locator.locate("flatpak").is_some();
        Self {
            app_id: config.client_app_id.clone(),
            process_name: config.client_process_name.clone(),
            use_flatpak,
        }
    }

    fn flatpak_kill(&self) -> Result<(), AppError> {
        let status = Command::new("flatpak")
            .args(["kill", &self.app_id])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                AppError::CommandExecutionError(format!("Failed to run flatpak kill: {}", e))
            })?;
        // flatpak exits non-zero when no instance is running; nothing left to stop either way.
        debug!(app_id = %self.app_id, exit_code = ?status.code(), "flatpak kill finished");
        Ok(())
    }
}

impl ClientKiller for SystemKiller {
    #[instrument(skip(self), fields(app_id = %self.app_id, process = %self.process_name))]
    fn kill_all(&self) -> Result<(), AppError> {
        if self.use_flatpak {
            return self.flatpak_kill();
        }
        let killed = kill_by_name(&self.process_name);
        info!(killed, "Killed client processes by name");
        Ok(())
    }
}

fn kill_by_name(name: &str) -> usize {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes_by_exact_name(name)
        .filter(|process| {
            let sent = process.kill();
            if !sent {
                warn!(pid = %process.pid(), "Failed to send kill signal");
            }
            sent
        })
        .count()
}

/// Number of OS processes named `name`.
pub fn count_processes(name: &str) -> usize {
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes_by_exact_name(name).count()
}

/// Runs `<helper> -c <title>` to close the client's crash dialog.
#[instrument]
pub fn run_crash_helper(helper: &Path, window_title: &str) -> Result<(), AppError> {
    let tool = helper.display().to_string();
    let output = Command::new(helper)
        .args(["-c", window_title])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| AppError::ToolFailed {
            tool: tool.clone(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(AppError::ToolFailed {
            tool,
            message: if stderr.is_empty() {
                format!("exit status {:?}", output.status.code())
            } else {
                stderr
            },
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Debug)]
    struct Nothing;

    impl ProgramLocator for Nothing {
        fn locate(&self, _program: &str) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_falls_back_to_kill_by_name_without_flatpak() {
        let config = Config::with_data_dir("/tmp");
        let killer = SystemKiller::from_config(&config, &Nothing);
        assert!(!killer.use_flatpak);
    }

    #[test]
    fn test_non_flatpak_client_never_uses_flatpak() {
        #[derive(Debug)]
        struct Everything;
        impl ProgramLocator for Everything {
            fn locate(&self, program: &str) -> Option<PathBuf> {
                Some(PathBuf::from("/usr/bin").join(program))
            }
        }
        let mut config = Config::with_data_dir("/tmp");
        config.client_command = "/opt/sober/sober".to_string();
        assert!(!SystemKiller::from_config(&config, &Everything).use_flatpak);
        config.client_command = "flatpak run org.vinegarhq.Sober".to_string();
        assert!(SystemKiller::from_config(&config, &Everything).use_flatpak);
    }

    #[test]
    fn test_crash_helper_failure_is_reported() {
        let err = run_crash_helper(Path::new("false"), "Sober crashed").unwrap_err();
        assert!(matches!(err, AppError::ToolFailed { .. }));
        assert!(run_crash_helper(Path::new("true"), "Sober crashed").is_ok());
    }

    #[test]
    fn test_no_such_process_name() {
        assert_eq!(count_processes("no-such-process-name-xyz"), 0);
    }
}
