use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use webpilot_core_types::{TabId, TabInfo};

use crate::error::{SessionError, SessionErrorKind};

/// Minimal debugging capability surface the session manager wires against.
/// The concrete wire client (CDP over a websocket, an extension API, ...) is
/// an external collaborator implementing this trait.
#[async_trait]
pub trait DebuggerBridge: Send + Sync {
    /// Resolve the tab currently focused in the browser.
    async fn active_tab(&self) -> Result<TabInfo, SessionError>;

    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, SessionError>;

    /// Attach a debugging session to `tab` at the given protocol version.
    /// Browsers allow a single client per tab; a second attach fails with
    /// `AlreadyAttached`.
    async fn attach(&self, tab: TabId, protocol_version: &str) -> Result<(), SessionError>;

    async fn detach(&self, tab: TabId) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
struct StubState {
    tabs: Vec<TabInfo>,
    active: Option<TabId>,
    attached: HashSet<TabId>,
    attach_calls: usize,
    detach_calls: usize,
}

/// In-memory bridge for tests and the CLI dry-run. Tracks attachment per tab
/// and enforces the one-client-per-tab rule so the manager's recovery path
/// can be exercised without a browser.
#[derive(Debug, Default)]
pub struct StubBridge {
    state: Mutex<StubState>,
}

impl StubBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tab; the first registered tab becomes the active one.
    pub fn with_tab(self, tab: TabInfo) -> Self {
        {
            let mut state = self.state.lock();
            if state.active.is_none() {
                state.active = Some(tab.id);
            }
            state.tabs.push(tab);
        }
        self
    }

    pub fn set_active(&self, tab: TabId) {
        self.state.lock().active = Some(tab);
    }

    pub fn set_url(&self, tab: TabId, url: impl Into<String>) {
        let mut state = self.state.lock();
        if let Some(info) = state.tabs.iter_mut().find(|info| info.id == tab) {
            info.url = url.into();
        }
    }

    /// Simulate a session left behind by a crashed prior controller.
    pub fn mark_attached(&self, tab: TabId) {
        self.state.lock().attached.insert(tab);
    }

    pub fn is_attached(&self, tab: TabId) -> bool {
        self.state.lock().attached.contains(&tab)
    }

    pub fn attach_calls(&self) -> usize {
        self.state.lock().attach_calls
    }

    pub fn detach_calls(&self) -> usize {
        self.state.lock().detach_calls
    }
}

#[async_trait]
impl DebuggerBridge for StubBridge {
    async fn active_tab(&self) -> Result<TabInfo, SessionError> {
        let state = self.state.lock();
        let active = state
            .active
            .ok_or_else(|| SessionError::new(SessionErrorKind::NoActiveTab))?;
        state
            .tabs
            .iter()
            .find(|info| info.id == active)
            .cloned()
            .ok_or_else(|| SessionError::new(SessionErrorKind::NoActiveTab))
    }

    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, SessionError> {
        self.state
            .lock()
            .tabs
            .iter()
            .find(|info| info.id == tab)
            .cloned()
            .ok_or_else(|| {
                SessionError::new(SessionErrorKind::UnknownTab)
                    .with_hint(format!("tab {tab} not registered"))
            })
    }

    async fn attach(&self, tab: TabId, _protocol_version: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.attach_calls += 1;
        if !state.tabs.iter().any(|info| info.id == tab) {
            return Err(SessionError::new(SessionErrorKind::UnknownTab)
                .with_hint(format!("tab {tab} not registered")));
        }
        if !state.attached.insert(tab) {
            return Err(SessionError::new(SessionErrorKind::AlreadyAttached)
                .with_hint(format!("tab {tab}")));
        }
        Ok(())
    }

    async fn detach(&self, tab: TabId) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.detach_calls += 1;
        if !state.attached.remove(&tab) {
            return Err(SessionError::new(SessionErrorKind::NotAttached)
                .with_hint(format!("tab {tab}")));
        }
        Ok(())
    }
}
