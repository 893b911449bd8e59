//! Tab data structure
//!
//! A tab is one logical browsing context. Title and url are folded in from
//! surface events; `can_go_back`/`can_go_forward` are a snapshot of the
//! surface capability taken at the last load-stop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::TabId;

/// Sentinel url for a tab that has never navigated.
pub const BLANK_URL: &str = "about:blank";
pub const DEFAULT_TITLE: &str = "New Tab";
/// Title used when a page reports an empty title.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub is_active: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub is_loading: bool,
    pub created_at: DateTime<Utc>,
    /// Last time the tab was made active
    pub last_accessed_at: DateTime<Utc>,
}

impl Tab {
    pub(crate) fn new(id: TabId, url: Option<String>) -> Self {
        let now = Utc::now();
        let url = url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| BLANK_URL.to_string());

        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            url,
            is_active: false,
            can_go_back: false,
            can_go_forward: false,
            is_loading: false,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Rebuild a tab from persisted fields. Navigation capability and
    /// loading state are not persisted and start cleared.
    pub fn restored(id: TabId, title: String, url: String) -> Self {
        let mut tab = Self::new(id, Some(url));
        if !title.is_empty() {
            tab.title = title;
        }
        tab
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        if active && !self.is_active {
            self.last_accessed_at = Utc::now();
        }
        self.is_active = active;
    }

    /// Apply a title-changed event; empty titles become "Untitled".
    pub fn set_title(&mut self, title: Option<&str>) {
        self.title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => UNTITLED.to_string(),
        };
    }

    pub fn is_blank(&self) -> bool {
        self.url == BLANK_URL
    }

    /// Text for the address bar: empty for the blank sentinel.
    pub fn address_text(&self) -> &str {
        if self.is_blank() {
            ""
        } else {
            &self.url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tab_defaults() {
        let tab = Tab::new(TabId::new(1), None);
        assert_eq!(tab.url, BLANK_URL);
        assert_eq!(tab.title, DEFAULT_TITLE);
        assert!(!tab.is_active);
        assert!(!tab.is_loading);
        assert!(tab.is_blank());
        assert_eq!(tab.address_text(), "");
    }

    #[test]
    fn test_blank_initial_url_falls_back_to_sentinel() {
        let tab = Tab::new(TabId::new(1), Some("   ".to_string()));
        assert_eq!(tab.url, BLANK_URL);

        let tab = Tab::new(TabId::new(2), Some("https://example.com".to_string()));
        assert_eq!(tab.address_text(), "https://example.com");
    }

    #[test]
    fn test_title_fallback() {
        let mut tab = Tab::new(TabId::new(1), None);
        tab.set_title(Some("Rust"));
        assert_eq!(tab.title, "Rust");

        tab.set_title(Some(""));
        assert_eq!(tab.title, UNTITLED);

        tab.set_title(None);
        assert_eq!(tab.title, UNTITLED);
    }
}
