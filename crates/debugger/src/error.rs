use std::fmt;

use thiserror::Error;

use webpilot_core_types::PilotError;

/// High-level failure categories surfaced by the debugging bridge.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SessionErrorKind {
    #[error("another debugger is already attached")]
    AlreadyAttached,
    #[error("no active tab")]
    NoActiveTab,
    #[error("no debugger attached")]
    NotAttached,
    #[error("unknown tab")]
    UnknownTab,
    #[error("debugger protocol failure")]
    Protocol,
    #[error("debugger i/o failure")]
    Io,
}

/// Error with optional context passed back to the session manager.
#[derive(Clone, Debug)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub hint: Option<String>,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_already_attached(&self) -> bool {
        self.kind == SessionErrorKind::AlreadyAttached
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for PilotError {
    fn from(err: SessionError) -> Self {
        match err.kind {
            SessionErrorKind::NoActiveTab => PilotError::NoActiveTab,
            _ => PilotError::Session(err.to_string()),
        }
    }
}
