//! Tab Registry
//!
//! Ordered sequence of tabs (insertion order is tab-bar order) plus the
//! active-tab pointer and the id allocator.

use crate::id::TabId;
use crate::tab::Tab;

#[derive(Debug)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    /// Must reference a member of `tabs`, or be `None` iff `tabs` is empty
    active_id: Option<TabId>,
    next_id: u64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active_id: None,
            next_id: 1,
        }
    }

    /// Append a new active tab and deactivate every other tab.
    pub fn create(&mut self, initial_url: Option<String>) -> TabId {
        let id = TabId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let tab = Tab::new(id, initial_url);
        tracing::info!(tab_id = %id, url = %tab.url, "Created new tab");

        self.tabs.push(tab);
        self.set_active(id);
        id
    }

    /// Remove a tab and return it.
    ///
    /// When the closed tab was active, activation moves to the tab just
    /// before it (or the new first tab). The registry never creates a
    /// replacement when it becomes empty; that is the caller's job.
    pub fn close(&mut self, id: TabId) -> Option<Tab> {
        let index = self.index_of(id)?;
        let removed = self.tabs.remove(index);

        if self.active_id == Some(id) {
            self.active_id = None;
            if !self.tabs.is_empty() {
                let next = self.tabs[index.saturating_sub(1)].id;
                self.set_active(next);
            }
        }

        tracing::info!(tab_id = %id, remaining = self.tabs.len(), "Closed tab");
        Some(removed)
    }

    /// Make `id` the single active tab. Unknown ids are ignored.
    pub fn activate(&mut self, id: TabId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.set_active(id);
        tracing::debug!(tab_id = %id, "Activated tab");
        true
    }

    /// Move `dragged` to the index currently held by `target`.
    ///
    /// No-op when either id is missing or both are the same tab.
    pub fn reorder(&mut self, dragged: TabId, target: TabId) -> bool {
        if dragged == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.index_of(dragged), self.index_of(target)) else {
            return false;
        };

        let tab = self.tabs.remove(from);
        let to = to.min(self.tabs.len());
        self.tabs.insert(to, tab);

        tracing::debug!(tab_id = %dragged, target = %target, index = to, "Reordered tab");
        true
    }

    /// Replace the whole sequence with restored tabs, preserving their order.
    ///
    /// Duplicate ids are dropped. `active_id` falls back to the first tab if
    /// it does not name a restored tab. The allocator is bumped past every
    /// restored id so later `create` calls never collide.
    pub fn restore<I>(&mut self, tabs: I, active_id: Option<TabId>)
    where
        I: IntoIterator<Item = Tab>,
    {
        self.tabs.clear();
        self.active_id = None;

        for mut tab in tabs {
            if tab.id.value() > TabId::MAX {
                tracing::warn!(tab_id = %tab.id, "Skipping restored tab with out-of-range id");
                continue;
            }
            if self.index_of(tab.id).is_some() {
                tracing::warn!(tab_id = %tab.id, "Skipping duplicate restored tab");
                continue;
            }
            tab.is_active = false;
            self.tabs.push(tab);
        }

        if let Some(next) = self
            .tabs
            .iter()
            .map(|t| t.id.value())
            .max()
            .and_then(|max| max.checked_add(1))
        {
            self.next_id = self.next_id.max(next);
        }

        let active = active_id
            .filter(|id| self.index_of(*id).is_some())
            .or_else(|| self.tabs.first().map(|t| t.id));
        if let Some(id) = active {
            self.set_active(id);
        }
    }

    /// Remove every tab, returning them in display order.
    pub fn drain(&mut self) -> Vec<Tab> {
        self.active_id = None;
        std::mem::take(&mut self.tabs)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active_id
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn is_active(&self, id: TabId) -> bool {
        self.active_id == Some(id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Value the next `create` call will allocate.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    fn set_active(&mut self, id: TabId) {
        for tab in &mut self.tabs {
            tab.set_active(tab.id == id);
        }
        self.active_id = Some(id);
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}
