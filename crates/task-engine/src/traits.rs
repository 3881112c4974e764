use std::sync::Arc;

use async_trait::async_trait;

use webpilot_core_types::{Action, Operation, PilotError, TabId, TaskHistoryEntry, TokenUsage};

/// Callback invoked with a human-readable message on recoverable top-level
/// failures, mirroring the status transition to `Error`.
pub type ErrorHook = Arc<dyn Fn(String) + Send + Sync>;

/// One planner decision, appended verbatim to the ledger.
#[derive(Clone, Debug)]
pub struct PlannedStep {
    pub prompt: String,
    pub raw_response: String,
    pub action: Action,
    pub usage: Option<TokenUsage>,
}

impl From<PlannedStep> for TaskHistoryEntry {
    fn from(step: PlannedStep) -> Self {
        Self {
            prompt: step.prompt,
            raw_response: step.raw_response,
            action: step.action,
            usage: step.usage,
        }
    }
}

/// Everything the planner needs to propose the next action.
pub struct PlannerRequest<'a> {
    pub instructions: &'a str,
    pub prior_actions: &'a [Action],
    pub page_html: &'a str,
    /// Internal retry budget; exhaustion surfaces as `Ok(None)`, not an error.
    pub retry_budget: u32,
    pub on_error: Option<&'a ErrorHook>,
}

/// Reads the live page through the attached session.
#[async_trait]
pub trait PageReader: Send + Sync {
    /// Suspend until the page's render signal settles.
    async fn wait_until_rendered(&self, tab: TabId) -> Result<(), PilotError>;

    /// Simplified DOM of the page, or `Ok(None)` when no usable page state
    /// could be extracted, which is fatal for the current run.
    async fn simplified_dom(&self, tab: TabId) -> Result<Option<String>, PilotError>;
}

/// Proposes the next action given instructions, history and page state.
#[async_trait]
pub trait Planner: Send + Sync {
    /// `Ok(None)` means "no decision, stop" (including retry exhaustion).
    async fn next_action(
        &self,
        request: PlannerRequest<'_>,
    ) -> Result<Option<PlannedStep>, PilotError>;

    /// Privileged/internal pages expose no DOM; ask for a navigation action
    /// from the instructions alone.
    async fn navigate_only(&self, instructions: &str)
        -> Result<Option<PlannedStep>, PilotError>;
}

/// Performs one side-effecting operation against the attached tab.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(&self, tab: TabId, operation: &Operation) -> Result<(), PilotError>;
}

/// Brackets a run: conflicting browser extensions are disabled before the
/// loop starts and restored unconditionally when the run ends.
#[async_trait]
pub trait ExtensionGate: Send + Sync {
    async fn disable_conflicting(&self) -> Result<(), PilotError>;
    async fn restore(&self) -> Result<(), PilotError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPlanner;

#[async_trait]
impl Planner for NoopPlanner {
    async fn next_action(
        &self,
        _request: PlannerRequest<'_>,
    ) -> Result<Option<PlannedStep>, PilotError> {
        Ok(None)
    }

    async fn navigate_only(
        &self,
        _instructions: &str,
    ) -> Result<Option<PlannedStep>, PilotError> {
        Ok(None)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopExecutor;

#[async_trait]
impl OperationExecutor for NoopExecutor {
    async fn execute(&self, _tab: TabId, _operation: &Operation) -> Result<(), PilotError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopExtensionGate;

#[async_trait]
impl ExtensionGate for NoopExtensionGate {
    async fn disable_conflicting(&self) -> Result<(), PilotError> {
        Ok(())
    }

    async fn restore(&self) -> Result<(), PilotError> {
        Ok(())
    }
}
