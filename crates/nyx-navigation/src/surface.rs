//! Page surface contract
//!
//! A surface is the renderer that performs real page loads for one tab. The
//! shell only drives it through navigation primitives and learns about
//! progress from the events it pushes into its [`SurfaceEventSink`].

use nyx_tabs::TabId;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Lifecycle events emitted by a surface, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    LoadStart,
    LoadStop,
    TitleChanged { title: Option<String> },
    /// Top-level navigation committed
    Navigated { url: String },
    /// Same-document navigation (anchor or history API)
    NavigatedInPage { url: String },
    DownloadStarted,
}

impl SurfaceEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceEvent::LoadStart => "load-start",
            SurfaceEvent::LoadStop => "load-stop",
            SurfaceEvent::TitleChanged { .. } => "title-changed",
            SurfaceEvent::Navigated { .. } => "navigated",
            SurfaceEvent::NavigatedInPage { .. } => "navigated-in-page",
            SurfaceEvent::DownloadStarted => "download-started",
        }
    }
}

/// A surface event tagged with the tab and the binding it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMessage {
    pub tab_id: TabId,
    /// Identifies one surface binding; events from a released binding are
    /// dropped even if the tab id is bound again later
    pub binding: u64,
    pub event: SurfaceEvent,
}

/// Handed to a surface at creation; every event it emits is queued for the
/// shell thread under the owning tab's id.
#[derive(Debug, Clone)]
pub struct SurfaceEventSink {
    tab_id: TabId,
    binding: u64,
    tx: UnboundedSender<SurfaceMessage>,
}

impl SurfaceEventSink {
    pub(crate) fn new(tab_id: TabId, binding: u64, tx: UnboundedSender<SurfaceMessage>) -> Self {
        Self { tab_id, binding, tx }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Queue an event. Returns false once the shell has gone away.
    pub fn emit(&self, event: SurfaceEvent) -> bool {
        self.tx
            .send(SurfaceMessage {
                tab_id: self.tab_id,
                binding: self.binding,
                event,
            })
            .is_ok()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SurfaceError(pub String);

impl SurfaceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Navigation primitives of one rendering surface.
///
/// `navigate`, `back`, `forward` and `reload` are fire-and-forget; their
/// outcome arrives later as [`SurfaceEvent`]s.
pub trait PageSurface {
    fn navigate(&mut self, url: &str);
    fn back(&mut self);
    fn forward(&mut self);
    fn reload(&mut self);
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;

    /// Tear down renderer resources. Called once, right before the surface
    /// is dropped because its tab closed.
    fn close(&mut self) {}
}

/// Creates surfaces on demand, at most once per tab.
pub trait SurfaceFactory {
    fn create(
        &mut self,
        tab_id: TabId,
        events: SurfaceEventSink,
    ) -> Result<Box<dyn PageSurface>, SurfaceError>;
}
