//! Navigation coordinator
//!
//! Turns navigation intents into surface calls and folds the surfaces'
//! asynchronous events back into tab state. The coordinator never owns the
//! registry or the policy; the shell lends them per call.
//!
//! Surface bindings are create-once: a tab gets its surface lazily on the
//! first real navigation and keeps it until the tab is closed.

use std::collections::HashMap;

use nyx_policy::AccessPolicy;
use nyx_tabs::{TabId, TabRegistry, BLANK_URL};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::downloads::DownloadLog;
use crate::error::NavigationError;
use crate::history::HistoryManager;
use crate::input::InputResolver;
use crate::surface::{PageSurface, SurfaceEvent, SurfaceEventSink, SurfaceFactory, SurfaceMessage};
use crate::Result;

/// Address bar text mirrored from the active tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBar {
    text: String,
}

impl AddressBar {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

/// What a reconciled event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Event for a tab that no longer exists, or carried nothing usable
    Ignored,
    /// Tab fields changed
    TabUpdated,
    /// Tab url changed and a history entry was appended
    HistoryRecorded,
    DownloadRecorded,
}

impl Reconciled {
    /// Whether the change affects the persisted session.
    pub fn affects_session(&self) -> bool {
        matches!(self, Reconciled::TabUpdated | Reconciled::HistoryRecorded)
    }
}

pub struct NavigationCoordinator {
    resolver: InputResolver,
    factory: Box<dyn SurfaceFactory>,
    /// Back-reference map; closing a tab must call `release`
    surfaces: HashMap<TabId, Box<dyn PageSurface>>,
    /// Binding generation of each live surface; events carry the one they
    /// were emitted under
    bindings: HashMap<TabId, u64>,
    next_binding: u64,
    events_tx: UnboundedSender<SurfaceMessage>,
    events_rx: UnboundedReceiver<SurfaceMessage>,
    history: HistoryManager,
    downloads: DownloadLog,
    address_bar: AddressBar,
}

impl NavigationCoordinator {
    pub fn new(
        factory: Box<dyn SurfaceFactory>,
        resolver: InputResolver,
        history: HistoryManager,
        downloads: DownloadLog,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            resolver,
            factory,
            surfaces: HashMap::new(),
            bindings: HashMap::new(),
            next_binding: 1,
            events_tx,
            events_rx,
            history,
            downloads,
            address_bar: AddressBar::default(),
        }
    }

    /// Resolve `raw_input`, check it against `policy` and start loading it
    /// in `tab_id`. Returns the normalized url.
    ///
    /// A blocked url leaves every piece of state untouched. If the tab has
    /// no surface yet and one cannot be created, the tab url is rolled back.
    pub fn navigate(
        &mut self,
        registry: &mut TabRegistry,
        policy: &AccessPolicy,
        tab_id: TabId,
        raw_input: &str,
    ) -> Result<String> {
        let url = self
            .resolver
            .resolve(raw_input)
            .ok_or(NavigationError::EmptyInput)?
            .into_url();

        if !policy.is_navigation_allowed(&url) {
            tracing::info!(tab_id = %tab_id, url = %url, "Navigation blocked by study mode");
            return Err(NavigationError::BlockedByPolicy { url });
        }

        self.load(registry, tab_id, url)
    }

    /// Re-issue a stored url without resolution or policy checks.
    ///
    /// Used when restoring a session: the url was already normalized when it
    /// was first visited.
    pub fn renavigate(&mut self, registry: &mut TabRegistry, tab_id: TabId, url: &str) -> Result<String> {
        self.load(registry, tab_id, url.to_string())
    }

    fn load(&mut self, registry: &mut TabRegistry, tab_id: TabId, url: String) -> Result<String> {
        let is_active = registry.is_active(tab_id);
        let tab = registry
            .get_mut(tab_id)
            .ok_or(NavigationError::TabNotFound(tab_id))?;

        let previous_url = std::mem::replace(&mut tab.url, url.clone());

        if !self.surfaces.contains_key(&tab_id) {
            let binding = self.next_binding;
            self.next_binding += 1;
            let sink = SurfaceEventSink::new(tab_id, binding, self.events_tx.clone());
            match self.factory.create(tab_id, sink) {
                Ok(surface) => {
                    tracing::debug!(tab_id = %tab_id, binding, "Bound page surface");
                    self.surfaces.insert(tab_id, surface);
                    self.bindings.insert(tab_id, binding);
                }
                Err(e) => {
                    tab.url = previous_url;
                    tracing::warn!(tab_id = %tab_id, error = %e, "Surface creation failed");
                    return Err(NavigationError::SurfaceCreationFailed {
                        tab_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if is_active {
            self.address_bar.set(url.clone());
        }

        if let Some(surface) = self.surfaces.get_mut(&tab_id) {
            surface.navigate(&url);
        }

        tracing::info!(tab_id = %tab_id, url = %url, "Navigation issued");
        Ok(url)
    }

    pub fn go_back(&mut self, tab_id: TabId) -> bool {
        match self.surfaces.get_mut(&tab_id) {
            Some(surface) if surface.can_go_back() => {
                surface.back();
                true
            }
            _ => false,
        }
    }

    pub fn go_forward(&mut self, tab_id: TabId) -> bool {
        match self.surfaces.get_mut(&tab_id) {
            Some(surface) if surface.can_go_forward() => {
                surface.forward();
                true
            }
            _ => false,
        }
    }

    pub fn reload(&mut self, tab_id: TabId) -> bool {
        match self.surfaces.get_mut(&tab_id) {
            Some(surface) => {
                surface.reload();
                true
            }
            None => false,
        }
    }

    /// Destroy the surface bound to `tab_id`, if any.
    pub fn release(&mut self, tab_id: TabId) -> bool {
        self.bindings.remove(&tab_id);
        match self.surfaces.remove(&tab_id) {
            Some(mut surface) => {
                surface.close();
                tracing::debug!(tab_id = %tab_id, "Destroyed page surface");
                true
            }
            None => false,
        }
    }

    pub fn release_all(&mut self) -> usize {
        let ids: Vec<TabId> = self.surfaces.keys().copied().collect();
        ids.into_iter().filter(|id| self.release(*id)).count()
    }

    pub fn has_surface(&self, tab_id: TabId) -> bool {
        self.surfaces.contains_key(&tab_id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Take every queued surface event, preserving emission order.
    pub fn drain_events(&mut self) -> Vec<SurfaceMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.events_rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Fold one surface event into tab state.
    pub fn reconcile(&mut self, registry: &mut TabRegistry, message: SurfaceMessage) -> Reconciled {
        let SurfaceMessage {
            tab_id,
            binding,
            event,
        } = message;
        let kind = event.kind();

        if self.bindings.get(&tab_id) != Some(&binding) {
            tracing::debug!(tab_id = %tab_id, binding, event = kind, "Dropping event from released surface");
            return Reconciled::Ignored;
        }
        let is_active = registry.is_active(tab_id);

        let Some(tab) = registry.get_mut(tab_id) else {
            tracing::debug!(tab_id = %tab_id, event = kind, "Dropping event for closed tab");
            return Reconciled::Ignored;
        };

        match event {
            SurfaceEvent::LoadStart => {
                tab.is_loading = true;
                Reconciled::TabUpdated
            }
            SurfaceEvent::LoadStop => {
                tab.is_loading = false;
                if let Some(surface) = self.surfaces.get(&tab_id) {
                    tab.can_go_back = surface.can_go_back();
                    tab.can_go_forward = surface.can_go_forward();
                }
                Reconciled::TabUpdated
            }
            SurfaceEvent::TitleChanged { title } => {
                tab.set_title(title.as_deref());
                Reconciled::TabUpdated
            }
            SurfaceEvent::Navigated { url } => {
                if url.is_empty() {
                    return Reconciled::Ignored;
                }
                tab.url = url.clone();
                if is_active {
                    self.address_bar.set(url.clone());
                }
                if url == BLANK_URL {
                    return Reconciled::TabUpdated;
                }
                if let Err(e) = self.history.record_visit(&url, &tab.title) {
                    tracing::warn!(tab_id = %tab_id, error = %e, "Failed to record history");
                    return Reconciled::TabUpdated;
                }
                Reconciled::HistoryRecorded
            }
            SurfaceEvent::NavigatedInPage { url } => {
                if url.is_empty() {
                    return Reconciled::Ignored;
                }
                tab.url = url.clone();
                if is_active {
                    self.address_bar.set(url);
                }
                Reconciled::TabUpdated
            }
            SurfaceEvent::DownloadStarted => match self.downloads.record_started() {
                Ok(_) => Reconciled::DownloadRecorded,
                Err(e) => {
                    tracing::warn!(tab_id = %tab_id, error = %e, "Failed to record download");
                    Reconciled::Ignored
                }
            },
        }
    }

    /// Point the address bar at the active tab, or clear it.
    pub fn sync_address_bar(&mut self, registry: &TabRegistry) {
        match registry.active() {
            Some(tab) => self.address_bar.set(tab.address_text()),
            None => self.address_bar.clear(),
        }
    }

    pub fn address_bar(&self) -> &AddressBar {
        &self.address_bar
    }

    pub fn resolver(&self) -> &InputResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut InputResolver {
        &mut self.resolver
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn downloads(&self) -> &DownloadLog {
        &self.downloads
    }
}
