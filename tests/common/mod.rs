#![allow(dead_code)]

use sober_launcher::error::AppError;
use sober_launcher::launch::{ClientKiller, ProgramLocator, ShellSpawner};
use sober_launcher::{Config, Manager, Platform};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CountingKiller {
    pub calls: Arc<AtomicU32>,
}

impl CountingKiller {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClientKiller for CountingKiller {
    fn kill_all(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoPrograms;

impl ProgramLocator for NoPrograms {
    fn locate(&self, _program: &str) -> Option<PathBuf> {
        None
    }
}

/// Real shell spawning, but nothing on the host gets killed.
pub fn manager(config: Config) -> (Manager, CountingKiller) {
    let killer = CountingKiller::default();
    let platform = Platform {
        spawner: Box::new(ShellSpawner::default()),
        killer: Box::new(killer.clone()),
        locator: Box::new(NoPrograms),
    };
    (Manager::with_platform(Arc::new(config), platform), killer)
}
