//! Session snapshot
//!
//! Persisted shape:
//! `{ tabs: [{id, title, url, active}], activeTabId, studyModeActive, timerSeconds, lastSaved }`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nyx_policy::PolicyState;
use nyx_tabs::{Tab, TabId, TabRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTab {
    pub id: TabId,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

impl SessionTab {
    fn from_tab(tab: &Tab) -> Self {
        Self {
            id: tab.id,
            title: tab.title.clone(),
            url: tab.url.clone(),
            active: tab.is_active,
        }
    }

    pub fn to_tab(&self) -> Tab {
        Tab::restored(self.id, self.title.clone(), self.url.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub tabs: Vec<SessionTab>,
    #[serde(default)]
    pub active_tab_id: Option<TabId>,
    #[serde(default)]
    pub study_mode_active: bool,
    /// Remaining study timer seconds
    #[serde(default)]
    pub timer_seconds: u32,
    #[serde(default = "Utc::now")]
    pub last_saved: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Project the current state into a snapshot. Pure; always succeeds.
    pub fn capture(registry: &TabRegistry, policy: PolicyState, timer_seconds: u32) -> Self {
        Self {
            tabs: registry.tabs().iter().map(SessionTab::from_tab).collect(),
            active_tab_id: registry.active_id(),
            study_mode_active: policy.study_mode_active,
            timer_seconds,
            last_saved: Utc::now(),
        }
    }

    /// A snapshot without tabs has nothing to restore.
    pub fn is_restorable(&self) -> bool {
        !self.tabs.is_empty()
    }

    /// The active id, falling back to the tab flagged active.
    pub fn resolved_active_id(&self) -> Option<TabId> {
        self.active_tab_id
            .filter(|id| self.tabs.iter().any(|t| t.id == *id))
            .or_else(|| self.tabs.iter().find(|t| t.active).map(|t| t.id))
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}
