use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use webpilot_core_types::{
    Action, PilotError, RunId, StepPhase, TabId, TaskHistoryEntry, TaskStatus,
};
use webpilot_debugger::{SessionError, SessionErrorKind, SessionManager};
use webpilot_event_bus::TaskEvent;

use crate::config::EngineConfig;
use crate::context::TaskContext;
use crate::traits::{
    ErrorHook, ExtensionGate, OperationExecutor, PageReader, PlannedStep, Planner, PlannerRequest,
};

/// The task orchestrator: owns the run lifecycle, drives the
/// read-plan-record-execute loop against the attached tab, and finalizes
/// status on every exit path.
pub struct TaskEngine {
    context: Arc<TaskContext>,
    session: Arc<SessionManager>,
    reader: Arc<dyn PageReader>,
    planner: Arc<dyn Planner>,
    executor: Arc<dyn OperationExecutor>,
    extensions: Arc<dyn ExtensionGate>,
    config: EngineConfig,
}

impl TaskEngine {
    pub fn new(
        session: Arc<SessionManager>,
        reader: Arc<dyn PageReader>,
        planner: Arc<dyn Planner>,
        executor: Arc<dyn OperationExecutor>,
        extensions: Arc<dyn ExtensionGate>,
        config: EngineConfig,
    ) -> Self {
        let context = Arc::new(TaskContext::new(config.bus_capacity));
        Self {
            context,
            session,
            reader,
            planner,
            executor,
            extensions,
            config,
        }
    }

    pub fn context(&self) -> Arc<TaskContext> {
        Arc::clone(&self.context)
    }

    pub fn status(&self) -> TaskStatus {
        self.context.status()
    }

    pub fn tab(&self) -> Option<TabId> {
        self.context.tab()
    }

    pub fn history(&self) -> Vec<TaskHistoryEntry> {
        self.context.history()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.context.subscribe()
    }

    /// Request cooperative cancellation; the loop exits at its next
    /// checkpoint without a further execute.
    pub fn interrupt(&self) {
        info!(target: "task-engine", "interrupt requested");
        self.context.interrupt();
    }

    /// Attach the debugging session outside a run, to the given tab or the
    /// active one.
    pub async fn attach_debugger(&self, tab: Option<TabId>) -> Result<TabId, PilotError> {
        let tab = self.session.attach(tab).await?;
        self.context.set_tab(Some(tab));
        Ok(tab)
    }

    pub async fn detach_debugger(&self) -> Result<(), PilotError> {
        self.session.detach().await?;
        self.context.set_tab(None);
        Ok(())
    }

    /// Execute a single already-parsed action against the attached tab.
    /// Terminal operations and operation-less actions are a no-op.
    pub async fn perform_action(&self, action: &Action) -> Result<(), PilotError> {
        let Some(operation) = &action.operation else {
            return Ok(());
        };
        if operation.is_terminal() {
            return Ok(());
        }
        let tab = self
            .session
            .current_tab()
            .ok_or_else(|| PilotError::from(SessionError::new(SessionErrorKind::NotAttached)))?;
        self.executor.execute(tab, operation).await
    }

    /// Run one task to completion. No-op while another run is live or when
    /// `instructions` is empty. On return the status is terminal, the session
    /// is detached and the extension gate restored, on every path.
    pub async fn run_task(&self, instructions: &str, on_error: Option<ErrorHook>) {
        if instructions.trim().is_empty() {
            debug!(target: "task-engine", "empty instructions; nothing to run");
            return;
        }
        if !self.context.begin_run() {
            debug!(target: "task-engine", "a task is already running; start request ignored");
            return;
        }

        let run = RunId::new();
        info!(target: "task-engine", run = %run, instructions, "task started");

        let outcome = self.drive(run, instructions, on_error.as_ref()).await;

        // Unconditional cleanup: no exit path may leak the debugging session
        // or leave extensions disabled.
        if let Err(err) = self.session.detach().await {
            warn!(target: "task-engine", run = %run, error = %err, "detach after run failed");
        }
        self.context.set_tab(None);
        if let Err(err) = self.extensions.restore().await {
            warn!(target: "task-engine", run = %run, error = %err, "extension restore failed");
        }

        match outcome {
            Ok(()) => {
                if self.context.is_running() {
                    self.context.set_status(TaskStatus::Success);
                }
                info!(
                    target: "task-engine",
                    run = %run,
                    status = %self.context.status(),
                    steps = self.context.history_len(),
                    "task finished"
                );
            }
            Err(err) => {
                error!(target: "task-engine", run = %run, error = %err, "task failed");
                if let Some(hook) = on_error.as_ref() {
                    hook(err.to_string());
                }
                self.context.set_status(TaskStatus::Error);
            }
        }
        self.context.set_phase(StepPhase::Idle);
    }

    async fn drive(
        &self,
        run: RunId,
        instructions: &str,
        on_error: Option<&ErrorHook>,
    ) -> Result<(), PilotError> {
        self.context.set_phase(StepPhase::AttachingDebugger);
        self.extensions.disable_conflicting().await?;

        if self.session.current_tab().is_none() {
            let tab = self.session.attach(None).await?;
            self.context.set_tab(Some(tab));
        } else {
            self.context.set_tab(self.session.current_tab());
        }

        loop {
            // Checkpoint: give up immediately once the run is no longer live.
            if !self.context.is_running() {
                break;
            }

            let prior_actions = self.context.prior_actions();
            let tab = self.session.active_tab_info().await?;
            if tab.url.is_empty() {
                return Err(PilotError::NoActiveTab);
            }

            let planned = if tab.is_privileged() {
                // No scriptable DOM here; ask for a navigation decision from
                // the instructions alone.
                debug!(target: "task-engine", run = %run, url = %tab.url, "privileged page; requesting navigation action");
                self.context.set_phase(StepPhase::GeneratingAction);
                self.planner.navigate_only(instructions).await?
            } else {
                self.context.set_phase(StepPhase::Waiting);
                self.reader.wait_until_rendered(tab.id).await?;

                self.context.set_phase(StepPhase::PullingDom);
                let Some(page_html) = self.reader.simplified_dom(tab.id).await? else {
                    return Err(PilotError::PageUnavailable);
                };

                if !self.context.is_running() {
                    break;
                }

                self.context.set_phase(StepPhase::GeneratingAction);
                self.planner
                    .next_action(PlannerRequest {
                        instructions,
                        prior_actions: &prior_actions,
                        page_html: &page_html,
                        retry_budget: self.config.planner_retries,
                        on_error,
                    })
                    .await?
            };

            // No decision is a clean stop, not an error.
            let Some(step) = planned else {
                debug!(target: "task-engine", run = %run, "planner returned no decision; stopping");
                break;
            };

            let step_no = self.record_step(&step);
            info!(
                target: "task-engine",
                run = %run,
                step = step_no,
                operation = step.action.operation.as_ref().map(|op| op.kind()).unwrap_or("none"),
                "step recorded"
            );

            // Checkpoint between record and execute: an interrupt that landed
            // during planning keeps the entry but skips its execution.
            if !self.context.is_running() {
                break;
            }

            match &step.action.operation {
                Some(operation) if operation.is_terminal() => {
                    info!(target: "task-engine", run = %run, operation = operation.kind(), "terminal operation; loop ends");
                    break;
                }
                Some(operation) => {
                    self.context.set_phase(StepPhase::PerformingAction);
                    self.executor.execute(tab.id, operation).await?;
                }
                None => {
                    // A thought without an operation stops a privileged-page
                    // iteration; on an ordinary page the loop just moves on.
                    if tab.is_privileged() {
                        break;
                    }
                }
            }

            if step_no >= self.config.max_steps {
                warn!(
                    target: "task-engine",
                    run = %run,
                    steps = step_no,
                    "step limit reached; breaking the loop"
                );
                break;
            }
        }

        Ok(())
    }

    fn record_step(&self, step: &PlannedStep) -> usize {
        self.context.push_history(step.clone().into())
    }
}
