//! Remote debugging session management.
//!
//! Browsers allow a single debugging client per tab, so attachment is an
//! exclusive resource. The [`SessionManager`] tracks the one attached tab,
//! recovers defensively from sessions left behind by a crashed prior run,
//! and releases the session when a run ends. The wire protocol itself lives
//! behind the [`bridge::DebuggerBridge`] trait.

use serde::{Deserialize, Serialize};

pub mod bridge;
pub mod error;
pub mod manager;

pub use bridge::{DebuggerBridge, StubBridge};
pub use error::{SessionError, SessionErrorKind};
pub use manager::SessionManager;

pub const DEFAULT_PROTOCOL_VERSION: &str = "1.3";

/// Tuning for the debugging session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// DevTools protocol version requested at attach time.
    pub protocol_version: String,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        }
    }
}
