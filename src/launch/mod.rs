//! Building and running client command lines.

pub mod client;
pub mod command;
pub mod link;
pub mod process;
pub mod terminal;

use std::path::PathBuf;

pub use client::{ClientKiller, SystemKiller};
pub use command::{CommandBuilder, LaunchMode, ShellCommand};
pub use process::{ProcessHandle, ShellSpawner, Spawner};
pub use terminal::TerminalSpec;

/// Finds programs on the host.
pub trait ProgramLocator: Send + std::fmt::Debug {
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Looks programs up on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLocator;

impl ProgramLocator for PathLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
