//! Whitelist gate for study mode

use serde::{Deserialize, Serialize};

/// Snapshot of the policy as seen by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyState {
    pub study_mode_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    study_mode_active: bool,
    /// Url fragments; never contains empty or untrimmed entries
    whitelist: Vec<String>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitelist<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::new();
        policy.set_whitelist(entries);
        policy
    }

    /// Whether `url` may be navigated to under the current mode.
    ///
    /// Always true outside study mode. In study mode the url must contain at
    /// least one whitelist entry; an empty whitelist blocks everything.
    pub fn is_navigation_allowed(&self, url: &str) -> bool {
        if !self.study_mode_active {
            return true;
        }
        self.whitelist.iter().any(|entry| url.contains(entry.as_str()))
    }

    /// Replace the whitelist. Entries are trimmed and blanks dropped;
    /// duplicates are kept out so the stored list stays stable.
    pub fn set_whitelist<I, S>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if !entry.is_empty() && !next.iter().any(|e| e == entry) {
                next.push(entry.to_string());
            }
        }

        tracing::info!(entries = next.len(), "Whitelist updated");
        self.whitelist = next;
        self.whitelist.len()
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    pub fn set_study_mode(&mut self, active: bool) {
        if self.study_mode_active != active {
            tracing::info!(active, "Study mode toggled");
        }
        self.study_mode_active = active;
    }

    pub fn study_mode_active(&self) -> bool {
        self.study_mode_active
    }

    pub fn state(&self) -> PolicyState {
        PolicyState {
            study_mode_active: self.study_mode_active,
        }
    }
}
