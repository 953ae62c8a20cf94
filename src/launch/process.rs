use crate::error::AppError;
use crate::launch::command::ShellCommand;
use std::fmt;
use std::process::{Child, Command, Stdio};
use tracing::{debug, error, warn};

/// A spawned process that can be polled for liveness without blocking.
pub trait ProcessHandle: Send + fmt::Debug {
    fn pid(&self) -> Option<u32>;

    /// `false` once the process has exited. Must not block.
    fn is_alive(&mut self) -> bool;
}

/// Runs a shell command line and hands back a handle, never waiting on the child.
pub trait Spawner: Send + fmt::Debug {
    fn spawn(&self, command: &ShellCommand) -> Result<Box<dyn ProcessHandle>, AppError>;
}

/// Exit is observed with `try_wait`, which also reaps the child.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
}

impl ProcessHandle for ChildHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(pid = self.child.id(), exit_code = ?status.code(), "Client process exited");
                false
            }
            Err(e) => {
                warn!(
                    pid = self.child.id(),
                    error = %e,
                    "Failed to poll client process, treating as exited"
                );
                false
            }
        }
    }
}

/// Spawns through `sh -c`. Works with or without an async runtime.
#[derive(Debug, Clone)]
pub struct ShellSpawner {
    shell: String,
}

impl Default for ShellSpawner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellSpawner {
    fn spawn_child(&self, command: &ShellCommand) -> Result<ChildHandle, AppError> {
        let mut command_process = Command::new(&self.shell);
        command_process.arg("-c").arg(command.as_str());
        // stdout carries the control protocol; the child must not write into it.
        command_process.stdin(Stdio::null());
        command_process.stdout(Stdio::null());
        command_process.stderr(Stdio::null());

        let child = command_process.spawn().map_err(|e| {
            error!(error = %e, command = %command, "Failed to spawn command");
            AppError::CommandExecutionError(format!(
                "Failed to spawn command '{}': {}",
                command, e
            ))
        })?;
        debug!(pid = child.id(), command = %command, "Spawned client command");
        Ok(ChildHandle { child })
    }
}

impl Spawner for ShellSpawner {
    fn spawn(&self, command: &ShellCommand) -> Result<Box<dyn ProcessHandle>, AppError> {
        Ok(Box::new(self.spawn_child(command)?))
    }
}
