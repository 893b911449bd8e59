//! Lifecycle manager
//!
//! The single owner of shell state: tab registry, access policy, study
//! timer, navigation coordinator and session store. Every UI command goes
//! through here, on one thread. Mutating commands persist the session
//! afterwards; persistence failures are logged by the store and never
//! reach the caller.

use nyx_navigation::{
    DownloadLog, DownloadRecord, HistoryEntry, HistoryManager, InputResolver, NavigationCoordinator,
    NavigationError, SearchProvider, SurfaceFactory,
};
use nyx_policy::AccessPolicy;
use nyx_session::{SessionMirror, SessionSnapshot, SessionStore};
use nyx_storage::Database;
use nyx_tabs::{Tab, TabId, TabRegistry};

use crate::config::Config;
use crate::error::CoreError;
use crate::timer::{StudyTimer, TimerOutcome};
use crate::Result;

pub const WHITELIST_KEY: &str = "whitelist";
pub const SEARCH_ENGINE_KEY: &str = "search_engine";
pub const STUDY_SESSIONS_KEY: &str = "study_sessions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Uninitialized,
    /// Terminal for the process
    Ready,
}

/// Something the presentation layer should tell the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellNotice {
    NavigationBlocked { tab_id: TabId, url: String },
    SurfaceFailed { tab_id: TabId, reason: String },
    StudySessionCompleted { total: u64 },
    SessionRestored { tabs: usize },
}

/// What the content area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// No tab, or the active tab has no surface yet
    StartPage,
    Surface(TabId),
}

pub struct LifecycleManager {
    state: ShellState,
    db: Database,
    registry: TabRegistry,
    policy: AccessPolicy,
    coordinator: NavigationCoordinator,
    sessions: SessionStore,
    timer: StudyTimer,
    notices: Vec<ShellNotice>,
}

impl LifecycleManager {
    /// Open the database named by `config` and build an uninitialized shell.
    pub fn open(config: &Config, factory: Box<dyn SurfaceFactory>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(db, config, factory)
    }

    pub fn with_database(db: Database, config: &Config, factory: Box<dyn SurfaceFactory>) -> Result<Self> {
        config.validate()?;

        let coordinator = NavigationCoordinator::new(
            factory,
            InputResolver::with_search_provider(config.search_provider()?),
            HistoryManager::with_limit(db.clone(), config.history_limit),
            DownloadLog::new(db.clone()),
        );

        let mut sessions = SessionStore::new(db.clone());
        if let Some(endpoint) = &config.session_mirror_url {
            sessions = sessions.with_mirror(SessionMirror::new(endpoint)?);
        }

        Ok(Self {
            state: ShellState::Uninitialized,
            db,
            registry: TabRegistry::new(),
            policy: AccessPolicy::new(),
            coordinator,
            sessions,
            timer: StudyTimer::new(config.study_minutes),
            notices: Vec::new(),
        })
    }

    /// Enter `Ready`.
    ///
    /// Loads stored preferences, then offers any saved session to `confirm`.
    /// An accepted session is applied; otherwise a single default tab is
    /// created. Calling this again once ready does nothing.
    pub fn initialize<F>(&mut self, confirm: F) -> Result<()>
    where
        F: FnOnce(&SessionSnapshot) -> bool,
    {
        if self.state == ShellState::Ready {
            tracing::debug!("Shell already initialized");
            return Ok(());
        }

        self.load_preferences();
        self.state = ShellState::Ready;

        if let Some(snapshot) = self.sessions.restore() {
            if confirm(&snapshot) {
                self.apply_snapshot(&snapshot);
            } else {
                tracing::info!("Saved session declined");
            }
        }

        if self.registry.is_empty() {
            self.registry.create(None);
            self.coordinator.sync_address_bar(&self.registry);
        }

        self.persist();

        tracing::info!(tabs = self.registry.len(), "Shell ready");
        Ok(())
    }

    fn load_preferences(&mut self) {
        match self.db.get_json::<Vec<String>>(WHITELIST_KEY) {
            Ok(Some(entries)) => {
                self.policy.set_whitelist(entries);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable whitelist"),
        }

        match self.db.get_setting(SEARCH_ENGINE_KEY) {
            Ok(Some(name)) => match name.parse::<SearchProvider>() {
                Ok(provider) => self.coordinator.resolver_mut().set_search_provider(provider),
                Err(e) => tracing::warn!(error = %e, "Ignoring stored search engine"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read search engine"),
        }
    }

    fn apply_snapshot(&mut self, snapshot: &SessionSnapshot) {
        let tabs = SessionStore::apply(snapshot, &mut self.registry, &mut self.coordinator);

        if snapshot.study_mode_active {
            self.policy.set_study_mode(true);
            self.timer.restore_remaining(snapshot.timer_seconds);
        }

        self.notices.push(ShellNotice::SessionRestored { tabs });
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            ShellState::Ready => Ok(()),
            ShellState::Uninitialized => Err(CoreError::NotInitialized),
        }
    }

    /// Best-effort session write; failures are logged by the store.
    fn persist(&self) {
        self.sessions.persist(&self.snapshot());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionStore::snapshot(&self.registry, self.policy.state(), self.timer.remaining_secs())
    }

    // Tabs

    /// Open a new active tab, loading `url` if one is given.
    ///
    /// A rejected initial load leaves the tab blank and is reported as a
    /// notice; the tab itself is always created.
    pub fn create_tab(&mut self, url: Option<&str>) -> Result<TabId> {
        self.ensure_ready()?;

        let id = self.registry.create(None);
        self.coordinator.sync_address_bar(&self.registry);

        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            if let Err(e) = self.navigate_inner(id, url) {
                tracing::debug!(tab_id = %id, error = %e, "Initial load failed");
            }
        }

        self.persist();
        Ok(id)
    }

    /// Close a tab and destroy its surface. The last tab is replaced by a
    /// fresh default tab.
    pub fn close_tab(&mut self, id: TabId) -> Result<bool> {
        self.ensure_ready()?;

        if self.registry.close(id).is_none() {
            return Ok(false);
        }
        self.coordinator.release(id);

        if self.registry.is_empty() {
            self.registry.create(None);
        }
        self.coordinator.sync_address_bar(&self.registry);

        self.persist();
        Ok(true)
    }

    pub fn switch_tab(&mut self, id: TabId) -> Result<bool> {
        self.ensure_ready()?;

        if !self.registry.activate(id) {
            return Ok(false);
        }
        self.coordinator.sync_address_bar(&self.registry);

        self.persist();
        Ok(true)
    }

    pub fn reorder_tab(&mut self, dragged: TabId, target: TabId) -> Result<bool> {
        self.ensure_ready()?;

        let moved = self.registry.reorder(dragged, target);
        if moved {
            self.persist();
        }
        Ok(moved)
    }

    /// Destroy every surface and tab, then open one default tab. Ids keep
    /// counting up.
    pub fn close_all_tabs(&mut self) -> Result<TabId> {
        self.ensure_ready()?;

        let released = self.coordinator.release_all();
        let closed = self.registry.drain().len();
        let id = self.registry.create(None);
        self.coordinator.sync_address_bar(&self.registry);

        tracing::info!(closed, released, "Closed all tabs");

        self.persist();
        Ok(id)
    }

    // Navigation

    /// Load user input in a tab and return the normalized url.
    ///
    /// Blocked navigations and surface failures are also queued as notices.
    pub fn navigate(&mut self, id: TabId, input: &str) -> Result<String> {
        self.ensure_ready()?;

        let url = self.navigate_inner(id, input)?;
        self.persist();
        Ok(url)
    }

    fn navigate_inner(&mut self, id: TabId, input: &str) -> Result<String> {
        match self
            .coordinator
            .navigate(&mut self.registry, &self.policy, id, input)
        {
            Ok(url) => Ok(url),
            Err(e) => {
                match &e {
                    NavigationError::BlockedByPolicy { url } => {
                        self.notices.push(ShellNotice::NavigationBlocked {
                            tab_id: id,
                            url: url.clone(),
                        });
                    }
                    NavigationError::SurfaceCreationFailed { tab_id, reason } => {
                        self.notices.push(ShellNotice::SurfaceFailed {
                            tab_id: *tab_id,
                            reason: reason.clone(),
                        });
                    }
                    _ => {}
                }
                Err(e.into())
            }
        }
    }

    pub fn go_back(&mut self, id: TabId) -> Result<bool> {
        self.ensure_ready()?;
        Ok(self.coordinator.go_back(id))
    }

    pub fn go_forward(&mut self, id: TabId) -> Result<bool> {
        self.ensure_ready()?;
        Ok(self.coordinator.go_forward(id))
    }

    pub fn reload(&mut self, id: TabId) -> Result<bool> {
        self.ensure_ready()?;
        Ok(self.coordinator.reload(id))
    }

    /// Replace the search provider and remember the choice.
    pub fn set_search_engine(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;

        let provider: SearchProvider = name.parse()?;
        self.db.set_setting(SEARCH_ENGINE_KEY, &provider.to_string())?;
        tracing::info!(engine = provider.display_name(), "Search engine changed");
        self.coordinator.resolver_mut().set_search_provider(provider);
        Ok(())
    }

    // Study mode

    /// Arm study mode and start the countdown. Returns false if it was
    /// already running.
    pub fn start_study_timer(&mut self) -> Result<bool> {
        self.ensure_ready()?;

        if !self.timer.start()? {
            return Ok(false);
        }
        self.policy.set_study_mode(true);

        self.persist();
        Ok(true)
    }

    /// Freeze the countdown. Study mode stays armed.
    pub fn pause_study_timer(&mut self) -> Result<bool> {
        self.ensure_ready()?;

        let paused = self.timer.pause();
        if paused {
            self.persist();
        }
        Ok(paused)
    }

    /// Reset the countdown and leave study mode.
    pub fn stop_study_timer(&mut self) -> Result<()> {
        self.ensure_ready()?;

        self.timer.stop();
        self.policy.set_study_mode(false);

        self.persist();
        Ok(())
    }

    pub fn set_study_minutes(&mut self, minutes: u32) -> Result<bool> {
        self.ensure_ready()?;
        if !self.timer.set_minutes(minutes) {
            return Ok(false);
        }
        self.persist();
        Ok(true)
    }

    /// Replace the whitelist and store it. Returns the number of entries kept.
    pub fn save_whitelist<I, S>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_ready()?;

        let count = self.policy.set_whitelist(entries);
        self.db.set_json(WHITELIST_KEY, self.policy.whitelist())?;
        Ok(count)
    }

    pub fn study_sessions_completed(&self) -> u64 {
        match self.db.get_setting(STUDY_SESSIONS_KEY) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read study session count");
                0
            }
        }
    }

    fn record_study_session(&self) -> u64 {
        let total = self.study_sessions_completed() + 1;
        if let Err(e) = self.db.set_setting(STUDY_SESSIONS_KEY, &total.to_string()) {
            tracing::warn!(error = %e, "Failed to store study session count");
        }
        total
    }

    // Sessions

    /// Offer the saved session again, replacing the current tabs if
    /// `confirm` accepts it. Returns whether a session was applied.
    pub fn restore_session_prompt<F>(&mut self, confirm: F) -> Result<bool>
    where
        F: FnOnce(&SessionSnapshot) -> bool,
    {
        self.ensure_ready()?;

        let Some(snapshot) = self.sessions.restore() else {
            return Ok(false);
        };
        if !confirm(&snapshot) {
            return Ok(false);
        }

        self.coordinator.release_all();
        self.registry.drain();
        self.timer.pause();

        self.apply_snapshot(&snapshot);
        if self.registry.is_empty() {
            self.registry.create(None);
            self.coordinator.sync_address_bar(&self.registry);
        }

        self.persist();
        Ok(true)
    }

    pub fn saved_session(&self) -> Option<SessionSnapshot> {
        self.sessions.restore()
    }

    pub fn clear_saved_session(&mut self) -> Result<bool> {
        Ok(self.sessions.clear()?)
    }

    // Events

    /// Apply every queued surface event and timer tick, in order. Persists
    /// once afterwards if anything in the session changed. Returns the
    /// number of items processed.
    pub fn process_events(&mut self) -> Result<usize> {
        self.ensure_ready()?;

        let mut changed = false;
        let mut processed = 0;

        for message in self.coordinator.drain_events() {
            processed += 1;
            changed |= self
                .coordinator
                .reconcile(&mut self.registry, message)
                .affects_session();
        }

        for tick in self.timer.drain_ticks() {
            processed += 1;
            if self.timer.tick(tick) == TimerOutcome::Completed {
                self.policy.set_study_mode(false);
                let total = self.record_study_session();
                self.notices.push(ShellNotice::StudySessionCompleted { total });
                changed = true;
            }
        }

        if changed {
            self.persist();
        }
        Ok(processed)
    }

    pub fn take_notices(&mut self) -> Vec<ShellNotice> {
        std::mem::take(&mut self.notices)
    }

    // Teardown

    /// Final persist (mirror included), then stop the timer and destroy
    /// every surface. The remaining timer seconds are kept in the saved
    /// session.
    pub fn shutdown(&mut self) {
        if self.state != ShellState::Ready {
            return;
        }

        self.persist();
        self.timer.pause();
        let released = self.coordinator.release_all();

        tracing::info!(released, "Shell shut down");
    }

    // Read access

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn presentation(&self) -> Presentation {
        match self.registry.active_id() {
            Some(id) if self.coordinator.has_surface(id) => Presentation::Surface(id),
            _ => Presentation::StartPage,
        }
    }

    pub fn address_bar(&self) -> &str {
        self.coordinator.address_bar().text()
    }

    pub fn tabs(&self) -> &[Tab] {
        self.registry.tabs()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.registry.get(id)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.registry.active()
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn timer(&self) -> &StudyTimer {
        &self.timer
    }

    pub fn search_provider(&self) -> &SearchProvider {
        self.coordinator.resolver().search_provider()
    }

    pub fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.coordinator.history().recent(limit)?)
    }

    pub fn search_history(&self, query: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self.coordinator.history().search(query, limit)?)
    }

    pub fn clear_history(&self) -> Result<()> {
        Ok(self.coordinator.history().clear_all()?)
    }

    pub fn downloads(&self) -> Result<Vec<DownloadRecord>> {
        Ok(self.coordinator.downloads().list()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyx_navigation::testing::FakeSurfaces;
    use nyx_navigation::SurfaceEvent;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config() -> Config {
        Config::new(PathBuf::from("/unused"))
    }

    fn shell_on(db: &Database) -> (LifecycleManager, FakeSurfaces) {
        let surfaces = FakeSurfaces::new();
        surfaces.set_auto_commit(true);
        let shell =
            LifecycleManager::with_database(db.clone(), &config(), Box::new(surfaces.factory()))
                .unwrap();
        (shell, surfaces)
    }

    fn ready_shell() -> (LifecycleManager, FakeSurfaces, Database) {
        let db = Database::open_in_memory().unwrap();
        let (mut shell, surfaces) = shell_on(&db);
        shell.initialize(|_| true).unwrap();
        (shell, surfaces, db)
    }

    #[test]
    fn test_commands_require_initialization() {
        let db = Database::open_in_memory().unwrap();
        let (mut shell, _) = shell_on(&db);

        assert_eq!(shell.state(), ShellState::Uninitialized);
        assert!(matches!(shell.create_tab(None), Err(CoreError::NotInitialized)));
        assert!(matches!(
            shell.navigate(TabId::new(1), "a.com"),
            Err(CoreError::NotInitialized)
        ));
        assert!(matches!(shell.process_events(), Err(CoreError::NotInitialized)));
    }

    #[test]
    fn test_fresh_start_opens_default_tab() {
        let (shell, _, _) = ready_shell();

        assert_eq!(shell.state(), ShellState::Ready);
        assert_eq!(shell.tabs().len(), 1);
        let tab = shell.active_tab().unwrap();
        assert!(tab.is_blank());
        assert_eq!(tab.title, "New Tab");
        assert_eq!(shell.presentation(), Presentation::StartPage);
        assert_eq!(shell.address_bar(), "");
        assert!(shell.saved_session().is_some());
    }

    #[test]
    fn test_closing_last_tab_creates_replacement() {
        let (mut shell, _, _) = ready_shell();
        let a = shell.active_tab().unwrap().id;
        let b = shell.create_tab(None).unwrap();

        shell.switch_tab(a).unwrap();
        assert!(shell.close_tab(a).unwrap());
        assert_eq!(shell.active_tab().unwrap().id, b);

        assert!(shell.close_tab(b).unwrap());
        assert_eq!(shell.tabs().len(), 1);
        let fresh = shell.active_tab().unwrap();
        assert_eq!(fresh.id, TabId::new(3));
        assert!(fresh.is_blank());

        assert!(!shell.close_tab(b).unwrap());
    }

    #[test]
    fn test_navigation_round_trip_through_events() {
        let (mut shell, surfaces, _) = ready_shell();
        let id = shell.active_tab().unwrap().id;

        let url = shell.navigate(id, "wikipedia.org").unwrap();
        assert_eq!(url, "https://wikipedia.org");
        assert_eq!(shell.presentation(), Presentation::Surface(id));

        // load-start, navigated, load-stop
        assert_eq!(shell.process_events().unwrap(), 3);
        let tab = shell.tab(id).unwrap();
        assert!(!tab.is_loading);
        assert_eq!(shell.address_bar(), "https://wikipedia.org");

        surfaces.emit(id, SurfaceEvent::NavigatedInPage { url: "https://wikipedia.org#History".into() });
        shell.process_events().unwrap();

        let history = shell.recent_history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            shell.saved_session().unwrap().tabs[0].url,
            "https://wikipedia.org#History"
        );
    }

    #[test]
    fn test_create_tab_with_url_loads_it() {
        let (mut shell, surfaces, _) = ready_shell();

        let id = shell.create_tab(Some("rust-lang.org")).unwrap();
        assert_eq!(shell.tab(id).unwrap().url, "https://rust-lang.org");
        assert_eq!(surfaces.navigations(id), vec!["https://rust-lang.org".to_string()]);
    }

    #[test]
    fn test_surface_failure_is_reported() {
        let (mut shell, surfaces, _) = ready_shell();
        let id = shell.active_tab().unwrap().id;
        surfaces.fail_next_create("out of memory");

        let err = shell.navigate(id, "https://a.com").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Navigation(NavigationError::SurfaceCreationFailed { .. })
        ));
        assert!(shell.tab(id).unwrap().is_blank());
        assert_eq!(shell.presentation(), Presentation::StartPage);
        assert_eq!(
            shell.take_notices(),
            vec![ShellNotice::SurfaceFailed {
                tab_id: id,
                reason: "out of memory".into()
            }]
        );
        assert!(shell.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_study_mode_blocks_outside_whitelist() {
        let (mut shell, _, _) = ready_shell();
        let id = shell.active_tab().unwrap().id;

        assert_eq!(shell.save_whitelist(["  khanacademy.org ", "", "x.edu"]).unwrap(), 2);
        assert!(shell.start_study_timer().unwrap());
        assert!(!shell.start_study_timer().unwrap());
        assert!(shell.policy().study_mode_active());

        let err = shell.navigate(id, "games.example").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Navigation(NavigationError::BlockedByPolicy { .. })
        ));
        assert!(shell.tab(id).unwrap().is_blank());
        assert_eq!(
            shell.take_notices(),
            vec![ShellNotice::NavigationBlocked {
                tab_id: id,
                url: "https://games.example".into()
            }]
        );

        shell.navigate(id, "x.edu/lecture").unwrap();

        // pausing keeps study mode armed
        assert!(shell.pause_study_timer().unwrap());
        assert!(shell.policy().study_mode_active());

        shell.stop_study_timer().unwrap();
        assert!(!shell.policy().study_mode_active());
        shell.navigate(id, "games.example").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_study_session_completion() {
        let (mut shell, _, _) = ready_shell();
        assert!(shell.set_study_minutes(1).unwrap());
        shell.start_study_timer().unwrap();
        assert!(!shell.set_study_minutes(5).unwrap());

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        shell.process_events().unwrap();
        assert_eq!(shell.timer().remaining_secs(), 30);
        assert!(shell.take_notices().is_empty());

        tokio::time::sleep(Duration::from_secs(31)).await;
        shell.process_events().unwrap();

        assert_eq!(
            shell.take_notices(),
            vec![ShellNotice::StudySessionCompleted { total: 1 }]
        );
        assert!(!shell.policy().study_mode_active());
        assert!(!shell.timer().is_running());
        assert_eq!(shell.timer().remaining_secs(), 60);
        assert_eq!(shell.study_sessions_completed(), 1);
    }

    #[test]
    fn test_restore_accepted_on_startup() {
        let db = Database::open_in_memory().unwrap();
        {
            let (mut first, _) = shell_on(&db);
            first.initialize(|_| true).unwrap();
            let a = first.active_tab().unwrap().id;
            first.navigate(a, "https://a.com").unwrap();
            let b = first.create_tab(Some("https://b.com")).unwrap();
            first.create_tab(None).unwrap();
            first.switch_tab(b).unwrap();
            first.shutdown();
        }

        let (mut second, surfaces) = shell_on(&db);
        let mut offered = 0;
        second
            .initialize(|snapshot| {
                offered = snapshot.tab_count();
                true
            })
            .unwrap();

        assert_eq!(offered, 3);
        let urls: Vec<&str> = second.tabs().iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "about:blank"]);
        assert_eq!(second.active_tab().unwrap().id, TabId::new(2));
        assert_eq!(second.address_bar(), "https://b.com");
        assert_eq!(surfaces.created(), vec![TabId::new(1), TabId::new(2)]);
        assert_eq!(
            second.take_notices(),
            vec![ShellNotice::SessionRestored { tabs: 3 }]
        );

        let next = second.create_tab(None).unwrap();
        assert_eq!(next, TabId::new(4));
    }

    #[test]
    fn test_restore_declined_starts_fresh() {
        let db = Database::open_in_memory().unwrap();
        {
            let (mut first, _) = shell_on(&db);
            first.initialize(|_| true).unwrap();
            first.create_tab(Some("https://a.com")).unwrap();
            first.shutdown();
        }

        let (mut second, surfaces) = shell_on(&db);
        second.initialize(|_| false).unwrap();

        assert_eq!(second.tabs().len(), 1);
        assert!(second.active_tab().unwrap().is_blank());
        assert!(surfaces.created().is_empty());
        assert!(second.take_notices().is_empty());
    }

    #[test]
    fn test_restored_study_mode_stays_paused() {
        let db = Database::open_in_memory().unwrap();
        SessionStore::new(db.clone())
            .write(
                &serde_json::from_str::<SessionSnapshot>(
                    r#"{"tabs": [{"id": "tab-1", "title": "Notes", "url": "https://x.edu", "active": true}],
                        "activeTabId": "tab-1", "studyModeActive": true, "timerSeconds": 600}"#,
                )
                .unwrap(),
            )
            .unwrap();

        let (mut shell, _) = shell_on(&db);
        shell.initialize(|_| true).unwrap();

        assert!(shell.policy().study_mode_active());
        assert!(!shell.timer().is_running());
        assert_eq!(shell.timer().remaining_secs(), 600);
    }

    #[test]
    fn test_restore_prompt_replaces_tabs() {
        let (mut shell, surfaces, _) = ready_shell();
        let first = shell.active_tab().unwrap().id;
        shell.navigate(first, "https://a.com").unwrap();
        let second = shell.create_tab(Some("https://b.com")).unwrap();

        assert!(!shell.restore_session_prompt(|_| false).unwrap());
        assert_eq!(surfaces.created(), vec![first, second]);

        assert!(shell.restore_session_prompt(|s| s.tab_count() == 2).unwrap());
        assert_eq!(shell.tabs().len(), 2);
        assert_eq!(shell.active_tab().unwrap().id, second);
        // old surfaces were destroyed and rebuilt from the saved urls
        assert_eq!(surfaces.created(), vec![first, second, first, second]);

        assert!(shell.clear_saved_session().unwrap());
        assert!(!shell.restore_session_prompt(|_| true).unwrap());
    }

    #[test]
    fn test_restore_prompt_drops_events_from_old_surfaces() {
        let (mut shell, surfaces, _) = ready_shell();
        let id = shell.active_tab().unwrap().id;
        shell.navigate(id, "https://a.com").unwrap();
        surfaces.emit(id, SurfaceEvent::Navigated { url: "https://stale.example".into() });

        assert!(shell.restore_session_prompt(|_| true).unwrap());
        assert!(surfaces.emit(id, SurfaceEvent::TitleChanged { title: Some("A".into()) }));
        shell.process_events().unwrap();

        let tab = shell.tab(id).unwrap();
        assert_eq!(tab.url, "https://a.com");
        assert_eq!(tab.title, "A");
        assert_eq!(shell.address_bar(), "https://a.com");
        let history = shell.recent_history(10).unwrap();
        assert!(!history.is_empty());
        assert!(history.iter().all(|e| e.url == "https://a.com"));
    }

    #[test]
    fn test_close_all_tabs_keeps_counting() {
        let (mut shell, surfaces, _) = ready_shell();
        let a = shell.active_tab().unwrap().id;
        shell.navigate(a, "https://a.com").unwrap();
        shell.create_tab(None).unwrap();

        let fresh = shell.close_all_tabs().unwrap();
        assert_eq!(fresh, TabId::new(3));
        assert_eq!(shell.tabs().len(), 1);
        assert!(surfaces.is_closed(a));
        assert_eq!(shell.presentation(), Presentation::StartPage);
    }

    #[test]
    fn test_preferences_survive_restart() {
        let db = Database::open_in_memory().unwrap();
        {
            let (mut first, _) = shell_on(&db);
            first.initialize(|_| false).unwrap();
            first.save_whitelist(["x.edu", "wikipedia.org"]).unwrap();
            first.set_search_engine("google").unwrap();
            assert!(first.set_search_engine("altavista").is_err());
        }

        let (mut second, _) = shell_on(&db);
        second.initialize(|_| false).unwrap();
        assert_eq!(second.policy().whitelist(), ["x.edu", "wikipedia.org"]);
        assert_eq!(second.search_provider(), &SearchProvider::Google);

        let id = second.active_tab().unwrap().id;
        let url = second.navigate(id, "borrow checker").unwrap();
        assert_eq!(url, "https://www.google.com/search?q=borrow%20checker");
    }

    #[test]
    fn test_reorder_and_history_commands() {
        let (mut shell, surfaces, _) = ready_shell();
        let a = shell.active_tab().unwrap().id;
        let b = shell.create_tab(None).unwrap();
        let c = shell.create_tab(None).unwrap();

        assert!(shell.reorder_tab(c, a).unwrap());
        let order: Vec<TabId> = shell.tabs().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![c, a, b]);
        assert!(!shell.reorder_tab(c, TabId::new(99)).unwrap());

        assert!(!shell.go_back(c).unwrap());
        shell.navigate(c, "https://a.com").unwrap();
        surfaces.set_history_capability(c, true, false);
        assert!(shell.go_back(c).unwrap());
        assert!(!shell.go_forward(c).unwrap());
        assert!(shell.reload(c).unwrap());

        surfaces.emit(c, SurfaceEvent::DownloadStarted);
        shell.process_events().unwrap();
        assert_eq!(shell.downloads().unwrap().len(), 1);
        assert_eq!(shell.search_history("a.com", 5).unwrap().len(), 1);
        shell.clear_history().unwrap();
        assert!(shell.recent_history(5).unwrap().is_empty());
    }

    #[test]
    fn test_persistence_failure_is_swallowed() {
        let (mut shell, _, db) = ready_shell();
        db.with_connection(|conn| {
            conn.execute("DROP TABLE settings", [])?;
            Ok(())
        })
        .unwrap();

        let id = shell.create_tab(None).unwrap();
        assert!(shell.switch_tab(id).unwrap());
        shell.shutdown();
        assert!(shell.saved_session().is_none());
    }

    #[test]
    fn test_study_minutes_change_is_persisted() {
        let (mut shell, _, _) = ready_shell();
        assert!(shell.set_study_minutes(10).unwrap());
        assert_eq!(shell.saved_session().unwrap().timer_seconds, 600);

        assert!(!shell.set_study_minutes(0).unwrap());
        assert_eq!(shell.saved_session().unwrap().timer_seconds, 600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_persists_through_mirror() {
        let db = Database::open_in_memory().unwrap();
        let mut config = config();
        config.session_mirror_url = Some("http://127.0.0.1:9/session.json".into());
        let surfaces = FakeSurfaces::new();
        let mut shell =
            LifecycleManager::with_database(db, &config, Box::new(surfaces.factory())).unwrap();
        shell.initialize(|_| true).unwrap();

        shell.start_study_timer().unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        shell.process_events().unwrap();
        let remaining = shell.timer().remaining_secs();
        assert!(remaining < config.study_minutes * 60);
        // ticks alone do not write the session
        assert_eq!(shell.saved_session().unwrap().timer_seconds, config.study_minutes * 60);

        shell.shutdown();
        let saved = shell.saved_session().unwrap();
        assert_eq!(saved.timer_seconds, remaining);
        assert!(saved.study_mode_active);
    }
}
