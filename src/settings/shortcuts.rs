use crate::settings::Shortcut;
use serde::{Deserialize, Serialize};

/// Ordered list of shortcuts. Names may repeat; edit and remove act on every
/// entry with the matching name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutRegistry {
    entries: Vec<Shortcut>,
}

impl ShortcutRegistry {
    pub fn from_entries(entries: Vec<Shortcut>) -> Self {
        Self { entries }
    }

    pub fn add(&mut self, name: &str, parameter: &str) {
        self.entries.push(Shortcut::new(name, parameter));
    }

    /// Removes all entries named `name`, returning how many went.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|s| s.name != name);
        before - self.entries.len()
    }

    /// Rewrites every entry named `old_name` to the new pair, returning how many changed.
    /// `_old_parameter` is accepted for callers that track it but does not narrow the match.
    pub fn edit(
        &mut self,
        old_name: &str,
        _old_parameter: &str,
        new_name: &str,
        new_parameter: &str,
    ) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut().filter(|s| s.name == old_name) {
            entry.name = new_name.to_string();
            entry.parameter = new_parameter.to_string();
            changed += 1;
        }
        changed
    }

    pub fn find(&self, name: &str) -> Option<&Shortcut> {
        self.entries.iter().find(|s| s.name == name)
    }

    pub fn list(&self) -> &[Shortcut] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
