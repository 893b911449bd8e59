//! In-memory page surfaces for tests.
//!
//! [`FakeSurfaces`] is a shared handle: hand [`FakeSurfaces::factory`] to a
//! coordinator, keep the handle, then script events and inspect calls.

use std::collections::HashMap;
use std::sync::Arc;

use nyx_tabs::TabId;
use parking_lot::Mutex;

use crate::surface::{PageSurface, SurfaceError, SurfaceEvent, SurfaceEventSink, SurfaceFactory};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceCalls {
    pub back: usize,
    pub forward: usize,
    pub reload: usize,
}

#[derive(Default)]
struct FakeTab {
    sink: Option<SurfaceEventSink>,
    navigations: Vec<String>,
    calls: SurfaceCalls,
    can_go_back: bool,
    can_go_forward: bool,
    closed: bool,
}

#[derive(Default)]
struct FakeState {
    created: Vec<TabId>,
    tabs: HashMap<TabId, FakeTab>,
    fail_next: Option<String>,
    auto_commit: bool,
}

#[derive(Clone, Default)]
pub struct FakeSurfaces {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> FakeSurfaceFactory {
        FakeSurfaceFactory {
            state: Arc::clone(&self.state),
        }
    }

    /// Make every `navigate` immediately emit `LoadStart`, `Navigated` and
    /// `LoadStop`, like a renderer that loads instantly.
    pub fn set_auto_commit(&self, enabled: bool) {
        self.state.lock().auto_commit = enabled;
    }

    pub fn fail_next_create(&self, reason: &str) {
        self.state.lock().fail_next = Some(reason.to_string());
    }

    pub fn set_history_capability(&self, tab_id: TabId, back: bool, forward: bool) {
        let mut state = self.state.lock();
        let tab = state.tabs.entry(tab_id).or_default();
        tab.can_go_back = back;
        tab.can_go_forward = forward;
    }

    /// Push an event through the tab's sink. False if no surface exists.
    pub fn emit(&self, tab_id: TabId, event: SurfaceEvent) -> bool {
        let sink = self
            .state
            .lock()
            .tabs
            .get(&tab_id)
            .and_then(|t| t.sink.clone());

        match sink {
            Some(sink) => sink.emit(event),
            None => false,
        }
    }

    pub fn created(&self) -> Vec<TabId> {
        self.state.lock().created.clone()
    }

    pub fn navigations(&self, tab_id: TabId) -> Vec<String> {
        self.state
            .lock()
            .tabs
            .get(&tab_id)
            .map(|t| t.navigations.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self, tab_id: TabId) -> SurfaceCalls {
        self.state
            .lock()
            .tabs
            .get(&tab_id)
            .map(|t| t.calls)
            .unwrap_or_default()
    }

    pub fn is_closed(&self, tab_id: TabId) -> bool {
        self.state
            .lock()
            .tabs
            .get(&tab_id)
            .map(|t| t.closed)
            .unwrap_or(false)
    }
}

pub struct FakeSurfaceFactory {
    state: Arc<Mutex<FakeState>>,
}

impl SurfaceFactory for FakeSurfaceFactory {
    fn create(
        &mut self,
        tab_id: TabId,
        events: SurfaceEventSink,
    ) -> Result<Box<dyn PageSurface>, SurfaceError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_next.take() {
            return Err(SurfaceError::new(reason));
        }

        state.created.push(tab_id);
        let tab = state.tabs.entry(tab_id).or_default();
        tab.sink = Some(events);
        tab.closed = false;

        Ok(Box::new(FakeSurface {
            tab_id,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSurface {
    tab_id: TabId,
    state: Arc<Mutex<FakeState>>,
}

impl FakeSurface {
    fn with_tab<T>(&self, f: impl FnOnce(&mut FakeTab) -> T) -> T {
        let mut state = self.state.lock();
        f(state.tabs.entry(self.tab_id).or_default())
    }
}

impl PageSurface for FakeSurface {
    fn navigate(&mut self, url: &str) {
        let (sink, auto_commit) = {
            let mut state = self.state.lock();
            let auto_commit = state.auto_commit;
            let tab = state.tabs.entry(self.tab_id).or_default();
            tab.navigations.push(url.to_string());
            (tab.sink.clone(), auto_commit)
        };

        if let (Some(sink), true) = (sink, auto_commit) {
            sink.emit(SurfaceEvent::LoadStart);
            sink.emit(SurfaceEvent::Navigated {
                url: url.to_string(),
            });
            sink.emit(SurfaceEvent::LoadStop);
        }
    }

    fn back(&mut self) {
        self.with_tab(|t| t.calls.back += 1);
    }

    fn forward(&mut self) {
        self.with_tab(|t| t.calls.forward += 1);
    }

    fn reload(&mut self) {
        self.with_tab(|t| t.calls.reload += 1);
    }

    fn can_go_back(&self) -> bool {
        self.with_tab(|t| t.can_go_back)
    }

    fn can_go_forward(&self) -> bool {
        self.with_tab(|t| t.can_go_forward)
    }

    fn close(&mut self) {
        self.with_tab(|t| {
            t.closed = true;
            t.sink = None;
        });
    }
}
