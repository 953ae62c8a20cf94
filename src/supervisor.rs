use crate::error::{AppError, ErrorKind};
use crate::launch::{ClientKiller, ShellCommand, Spawner};
use crate::reconciler::SessionTable;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Spawned { pid: Option<u32> },
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchedProfile {
    pub profile: String,
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedLaunch {
    pub profile: String,
    pub kind: ErrorKind,
    pub error: String,
}

/// Per-profile results of a batch launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub launched: Vec<LaunchedProfile>,
    pub already_running: Vec<String>,
    pub failed: Vec<FailedLaunch>,
}

impl BatchReport {
    pub fn record(&mut self, profile: &str, result: Result<LaunchOutcome, AppError>) {
        match result {
            Ok(LaunchOutcome::Spawned { pid }) => self.launched.push(LaunchedProfile {
                profile: profile.to_string(),
                pid,
            }),
            Ok(LaunchOutcome::AlreadyRunning) => self.already_running.push(profile.to_string()),
            Err(e) => self.failed.push(FailedLaunch {
                profile: profile.to_string(),
                kind: e.kind(),
                error: e.to_string(),
            }),
        }
    }
}

/// Sole owner of spawned client processes.
#[derive(Debug)]
pub struct ProcessSupervisor {
    spawner: Box<dyn Spawner>,
    killer: Box<dyn ClientKiller>,
    sessions: SessionTable,
}

impl ProcessSupervisor {
    pub fn new(spawner: Box<dyn Spawner>, killer: Box<dyn ClientKiller>) -> Self {
        Self {
            spawner,
            killer,
            sessions: SessionTable::default(),
        }
    }

    /// Spawns `command` for `profile` unless that profile already has a live process.
    #[instrument(skip(self, command), fields(command = %command))]
    pub fn launch(
        &mut self,
        profile: &str,
        command: &ShellCommand,
    ) -> Result<LaunchOutcome, AppError> {
        if self.sessions.is_live(profile) {
            debug!(
                pid = ?self.sessions.pid(profile),
                "Profile already running, not spawning again"
            );
            return Ok(LaunchOutcome::AlreadyRunning);
        }
        let handle = self.spawner.spawn(command)?;
        let pid = handle.pid();
        self.sessions.record(profile, handle);
        info!(pid = ?pid, "Launched instance");
        Ok(LaunchOutcome::Spawned { pid })
    }

    /// Kills every client process on the host and forgets what was launched this run.
    #[instrument(skip(self))]
    pub fn terminate_all(&mut self) -> Result<(), AppError> {
        if let Err(e) = self.killer.kill_all() {
            warn!(error = %e, "Terminate all failed");
            return Err(e);
        }
        self.sessions.clear_launched();
        info!("All client sessions terminated");
        Ok(())
    }

    pub fn sweep(&mut self) -> Vec<String> {
        self.sessions.sweep()
    }

    pub fn missing(&self) -> BTreeSet<String> {
        self.sessions.missing()
    }

    pub fn running(&self) -> BTreeSet<String> {
        self.sessions.running()
    }
}
