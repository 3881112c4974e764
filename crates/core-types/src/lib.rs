use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the webpilot task core crates.
#[derive(Debug, Error, Clone)]
pub enum PilotError {
    #[error("no active tab available")]
    NoActiveTab,
    #[error("page state unavailable")]
    PageUnavailable,
    #[error("debugger session error: {0}")]
    Session(String),
    #[error("planner error: {0}")]
    Planner(String),
    #[error("action execution failed: {0}")]
    Execution(String),
    #[error("{0}")]
    Internal(String),
}

impl PilotError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

/// Identifier of a browser tab as assigned by the browser itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a tab as reported by the debugging bridge.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
}

impl TabInfo {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }

    /// Privileged browser pages (chrome://, chrome-extension://, ...) expose
    /// no scriptable DOM; the loop must not try to read them.
    pub fn is_privileged(&self) -> bool {
        self.url.starts_with("chrome")
    }
}

/// Correlation id for one task run, stamped into tracing events.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of the task singleton.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Idle,
    Running,
    Success,
    Error,
    Interrupted,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Interrupted)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Interrupted => "interrupted",
        };
        write!(f, "{label}")
    }
}

/// Fine-grained progress phase published while a step is in flight. Observers
/// render it; the loop never reads it back.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepPhase {
    Idle,
    AttachingDebugger,
    PullingDom,
    GeneratingAction,
    PerformingAction,
    Waiting,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::AttachingDebugger => "attaching-debugger",
            Self::PullingDom => "pulling-dom",
            Self::GeneratingAction => "generating-action",
            Self::PerformingAction => "performing-action",
            Self::Waiting => "waiting",
        };
        write!(f, "{label}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// One decision parsed from a planner response. Terminal operations end the
/// task; everything else is performed against the attached tab.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Click { element_id: String },
    #[serde(rename_all = "camelCase")]
    SetValue { element_id: String, value: String },
    Navigate { url: String },
    Scroll { value: ScrollDirection },
    Wait,
    Finish,
    Fail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Operation {
    /// `finish` and `fail` end the loop without an execution step.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish | Self::Fail { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::SetValue { .. } => "setValue",
            Self::Navigate { .. } => "navigate",
            Self::Scroll { .. } => "scroll",
            Self::Wait => "wait",
            Self::Finish => "finish",
            Self::Fail { .. } => "fail",
        }
    }
}

/// A planner decision: free-form reasoning plus an optional operation. A
/// response that parsed to a thought alone carries no operation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub thought: String,
    #[serde(default)]
    pub operation: Option<Operation>,
}

impl Action {
    pub fn new(thought: impl Into<String>, operation: Option<Operation>) -> Self {
        Self {
            thought: thought.into(),
            operation,
        }
    }
}

/// Token accounting reported by the planner backend, when available.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Immutable record of one completed step.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskHistoryEntry {
    pub prompt: String,
    pub raw_response: String,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}
