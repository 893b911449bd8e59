//! Session store
//!
//! Writes snapshots into the settings table under [`SESSION_KEY`] and
//! rebuilds a registry from them.

use nyx_navigation::NavigationCoordinator;
use nyx_policy::PolicyState;
use nyx_storage::Database;
use nyx_tabs::TabRegistry;

use crate::mirror::SessionMirror;
use crate::snapshot::SessionSnapshot;
use crate::Result;

pub const SESSION_KEY: &str = "session";

pub struct SessionStore {
    db: Database,
    mirror: Option<SessionMirror>,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db, mirror: None }
    }

    pub fn with_mirror(mut self, mirror: SessionMirror) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn snapshot(registry: &TabRegistry, policy: PolicyState, timer_seconds: u32) -> SessionSnapshot {
        SessionSnapshot::capture(registry, policy, timer_seconds)
    }

    /// Write the snapshot, reporting failures.
    pub fn write(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.db.set_json(SESSION_KEY, snapshot)?;
        Ok(())
    }

    /// Best-effort write followed by the remote mirror.
    ///
    /// Failures are logged and swallowed; the in-memory state stays
    /// authoritative and the next mutation writes again.
    pub fn persist(&self, snapshot: &SessionSnapshot) -> bool {
        if let Err(e) = self.write(snapshot) {
            tracing::warn!(error = %e, "Failed to persist session");
            return false;
        }

        tracing::debug!(tabs = snapshot.tab_count(), "Persisted session");

        if let Some(mirror) = &self.mirror {
            mirror.upload(snapshot);
        }
        true
    }

    /// Read the stored snapshot. Absent, unreadable, malformed or tab-less
    /// data all mean there is nothing to restore.
    pub fn restore(&self) -> Option<SessionSnapshot> {
        let raw = match self.db.get_setting(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read saved session");
                return None;
            }
        };

        let snapshot: SessionSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed saved session");
                return None;
            }
        };

        if !snapshot.is_restorable() {
            tracing::info!("Saved session has no tabs");
            return None;
        }

        Some(snapshot)
    }

    /// Rebuild `registry` from `snapshot`, preserving order and the active
    /// tab, then re-issue every non-blank url. Re-navigation is not subject
    /// to the access policy. Returns the number of tabs restored.
    pub fn apply(
        snapshot: &SessionSnapshot,
        registry: &mut TabRegistry,
        coordinator: &mut NavigationCoordinator,
    ) -> usize {
        registry.restore(
            snapshot.tabs.iter().map(|t| t.to_tab()),
            snapshot.resolved_active_id(),
        );

        let pending: Vec<_> = registry
            .tabs()
            .iter()
            .filter(|t| !t.is_blank())
            .map(|t| (t.id, t.url.clone()))
            .collect();

        for (tab_id, url) in pending {
            if let Err(e) = coordinator.renavigate(registry, tab_id, &url) {
                tracing::warn!(tab_id = %tab_id, error = %e, "Failed to reload restored tab");
            }
        }

        coordinator.sync_address_bar(registry);

        tracing::info!(
            tabs = registry.len(),
            active = ?registry.active_id(),
            next_id = registry.next_id(),
            "Applied saved session"
        );

        registry.len()
    }

    /// Delete the stored snapshot. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        Ok(self.db.delete_setting(SESSION_KEY)?)
    }
}
