use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use webpilot_core_types::{TabId, TabInfo};

use crate::bridge::DebuggerBridge;
use crate::error::SessionError;
use crate::DebuggerConfig;

/// Owns at most one debugging session at a time. Attachment is idempotent in
/// the face of stale sessions: an `AlreadyAttached` failure is recovered by
/// detaching the leftover client and retrying exactly once.
pub struct SessionManager {
    bridge: Arc<dyn DebuggerBridge>,
    config: DebuggerConfig,
    current: Mutex<Option<TabId>>,
}

impl SessionManager {
    pub fn new(bridge: Arc<dyn DebuggerBridge>, config: DebuggerConfig) -> Self {
        Self {
            bridge,
            config,
            current: Mutex::new(None),
        }
    }

    pub fn current_tab(&self) -> Option<TabId> {
        *self.current.lock()
    }

    pub fn is_attached(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Query the browser for the currently focused tab.
    pub async fn active_tab_info(&self) -> Result<TabInfo, SessionError> {
        self.bridge.active_tab().await
    }

    /// Attach to `tab`, or to the active tab when none is given. On success
    /// the attached tab becomes the tracked current tab.
    pub async fn attach(&self, tab: Option<TabId>) -> Result<TabId, SessionError> {
        let tab = match tab {
            Some(tab) => tab,
            None => self.bridge.active_tab().await?.id,
        };

        match self.bridge.attach(tab, &self.config.protocol_version).await {
            Ok(()) => {}
            Err(err) if err.is_already_attached() => {
                // A prior controller (or a crashed run) left its session on
                // the target; clear it and claim the tab ourselves.
                debug!(target: "debugger", tab = tab.0, "stale session on target; detaching and retrying");
                self.bridge.detach(tab).await?;
                self.bridge.attach(tab, &self.config.protocol_version).await?;
            }
            Err(err) => return Err(err),
        }

        *self.current.lock() = Some(tab);
        info!(
            target: "debugger",
            tab = tab.0,
            version = %self.config.protocol_version,
            "debugger attached"
        );
        Ok(tab)
    }

    /// Detach the current session; no-op when nothing is attached.
    pub async fn detach(&self) -> Result<(), SessionError> {
        let tab = self.current_tab();
        let Some(tab) = tab else {
            return Ok(());
        };
        self.bridge.detach(tab).await?;
        *self.current.lock() = None;
        info!(target: "debugger", tab = tab.0, "debugger detached");
        Ok(())
    }
}
