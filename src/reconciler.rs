//! Tracks which profiles were launched this run and which are still alive.
//!
//! Exits are discovered by polling: [`SessionTable::sweep`] on a timer, or an
//! explicit [`SessionTable::is_live`] query before a launch.

use crate::launch::ProcessHandle;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

#[derive(Debug, Default)]
pub struct SessionTable {
    live: HashMap<String, Box<dyn ProcessHandle>>,
    launched: BTreeSet<String>,
}

impl SessionTable {
    /// Polls the handle for `profile`, dropping it if the process has exited.
    pub fn is_live(&mut self, profile: &str) -> bool {
        let alive = match self.live.get_mut(profile) {
            Some(handle) => handle.is_alive(),
            None => return false,
        };
        if !alive {
            self.live.remove(profile);
        }
        alive
    }

    /// Stores the handle of a fresh spawn and marks the profile launched this run.
    pub fn record(&mut self, profile: &str, handle: Box<dyn ProcessHandle>) {
        self.live.insert(profile.to_string(), handle);
        self.launched.insert(profile.to_string());
    }

    /// Drops every handle whose process has exited and returns those profiles, sorted.
    pub fn sweep(&mut self) -> Vec<String> {
        let mut exited: Vec<String> = Vec::new();
        self.live.retain(|profile, handle| {
            let alive = handle.is_alive();
            if !alive {
                exited.push(profile.clone());
            }
            alive
        });
        exited.sort();
        for profile in &exited {
            info!(profile = %profile, "Instance no longer running");
        }
        exited
    }

    /// Launched this run but not currently live.
    pub fn missing(&self) -> BTreeSet<String> {
        self.launched
            .iter()
            .filter(|p| !self.live.contains_key(*p))
            .cloned()
            .collect()
    }

    pub fn running(&self) -> BTreeSet<String> {
        self.live.keys().cloned().collect()
    }

    pub fn pid(&self, profile: &str) -> Option<u32> {
        self.live.get(profile).and_then(|h| h.pid())
    }

    pub fn clear_launched(&mut self) {
        self.launched.clear();
    }
}
