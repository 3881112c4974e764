//! Dry-run collaborators for exercising the task loop without a browser or a
//! model behind it. The planner replays a scripted decision list and the
//! executor only logs what it would have done; paired with the in-memory
//! debugger bridge these drive the full engine end to end.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use webpilot_core_types::{Action, Operation, PilotError, TabId};
use webpilot_task_engine::{PageReader, PlannedStep, Planner, PlannerRequest};

/// Serves pre-authored actions in order; an exhausted script reads as "no
/// decision", which stops the loop cleanly.
pub struct ScriptedPlanner {
    actions: Mutex<VecDeque<Action>>,
}

impl ScriptedPlanner {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions: Mutex::new(actions.into()),
        }
    }

    fn planned(&self, prompt: String) -> Result<Option<PlannedStep>, PilotError> {
        let Some(action) = self.actions.lock().pop_front() else {
            return Ok(None);
        };
        let raw_response = serde_json::to_string(&action)
            .map_err(|err| PilotError::internal(err.to_string()))?;
        Ok(Some(PlannedStep {
            prompt,
            raw_response,
            action,
            usage: None,
        }))
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn next_action(
        &self,
        request: PlannerRequest<'_>,
    ) -> Result<Option<PlannedStep>, PilotError> {
        self.planned(format!(
            "task: {} | prior steps: {}",
            request.instructions,
            request.prior_actions.len()
        ))
    }

    async fn navigate_only(
        &self,
        instructions: &str,
    ) -> Result<Option<PlannedStep>, PilotError> {
        self.planned(format!("navigate for task: {instructions}"))
    }
}

/// Page reader backed by a fixed HTML fixture.
pub struct FixturePageReader {
    html: String,
}

impl FixturePageReader {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

#[async_trait]
impl PageReader for FixturePageReader {
    async fn wait_until_rendered(&self, _tab: TabId) -> Result<(), PilotError> {
        Ok(())
    }

    async fn simplified_dom(&self, _tab: TabId) -> Result<Option<String>, PilotError> {
        Ok(Some(self.html.clone()))
    }
}

/// Logs each operation instead of touching a browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingExecutor;

#[async_trait]
impl webpilot_task_engine::OperationExecutor for LoggingExecutor {
    async fn execute(&self, tab: TabId, operation: &Operation) -> Result<(), PilotError> {
        info!(
            target: "harness",
            tab = tab.0,
            operation = operation.kind(),
            "dry-run execute"
        );
        Ok(())
    }
}
