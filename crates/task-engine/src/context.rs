use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use webpilot_core_types::{Action, StepPhase, TabId, TaskHistoryEntry, TaskStatus};
use webpilot_event_bus::{TaskChange, TaskEvent, TaskPublisher};

#[derive(Debug)]
struct TaskState {
    status: TaskStatus,
    tab: Option<TabId>,
    history: crate::ledger::Ledger,
    phase: StepPhase,
}

/// Explicit, engine-owned task state. Constructed once, reset in place at the
/// start of every run, and mutated exclusively through the transition methods
/// below. Each transition performs its read-modify-write under a single lock
/// acquisition and then publishes the observed change on the bus.
pub struct TaskContext {
    state: RwLock<TaskState>,
    publisher: TaskPublisher,
}

impl TaskContext {
    pub fn new(bus_capacity: usize) -> Self {
        Self {
            state: RwLock::new(TaskState {
                status: TaskStatus::Idle,
                tab: None,
                history: crate::ledger::Ledger::new(),
                phase: StepPhase::Idle,
            }),
            publisher: TaskPublisher::new(bus_capacity),
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.state.read().status
    }

    pub fn tab(&self) -> Option<TabId> {
        self.state.read().tab
    }

    pub fn phase(&self) -> StepPhase {
        self.state.read().phase
    }

    pub fn history(&self) -> Vec<TaskHistoryEntry> {
        self.state.read().history.snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.state.read().history.len()
    }

    pub fn prior_actions(&self) -> Vec<Action> {
        self.state.read().history.prior_actions()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.publisher.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.status() == TaskStatus::Running
    }

    /// Request cooperative cancellation. Non-blocking: the loop observes the
    /// flipped status at its next checkpoint; an in-flight external call is
    /// never preempted.
    pub fn interrupt(&self) {
        self.set_status(TaskStatus::Interrupted);
    }

    /// Claim the run slot: clears history and moves to `Running` in one
    /// transition. Returns false (and changes nothing) when a run is already
    /// live.
    pub(crate) fn begin_run(&self) -> bool {
        {
            let mut state = self.state.write();
            if state.status == TaskStatus::Running {
                return false;
            }
            state.history.clear();
            state.status = TaskStatus::Running;
        }
        self.publisher.publish(TaskChange::HistoryCleared);
        self.publisher.publish(TaskChange::Status(TaskStatus::Running));
        true
    }

    pub(crate) fn set_status(&self, status: TaskStatus) {
        {
            let mut state = self.state.write();
            if state.status == status {
                return;
            }
            debug!(target: "task-engine", from = %state.status, to = %status, "status transition");
            state.status = status;
        }
        self.publisher.publish(TaskChange::Status(status));
    }

    pub(crate) fn set_tab(&self, tab: Option<TabId>) {
        {
            let mut state = self.state.write();
            if state.tab == tab {
                return;
            }
            state.tab = tab;
        }
        self.publisher.publish(TaskChange::Tab(tab));
    }

    pub(crate) fn set_phase(&self, phase: StepPhase) {
        {
            let mut state = self.state.write();
            if state.phase == phase {
                return;
            }
            state.phase = phase;
        }
        self.publisher.publish(TaskChange::Phase(phase));
    }

    /// Append one completed step and return the new history length.
    pub(crate) fn push_history(&self, entry: TaskHistoryEntry) -> usize {
        let len = {
            let mut state = self.state.write();
            state.history.append(entry);
            state.history.len()
        };
        self.publisher.publish(TaskChange::HistoryAppended { len });
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpilot_core_types::Operation;

    fn entry() -> TaskHistoryEntry {
        TaskHistoryEntry {
            prompt: "p".into(),
            raw_response: "r".into(),
            action: Action::new("t", Some(Operation::Wait)),
            usage: None,
        }
    }

    #[test]
    fn begin_run_clears_history_and_claims_the_slot() {
        let ctx = TaskContext::new(8);
        assert!(ctx.begin_run());
        ctx.push_history(entry());

        // second claim while running is rejected and leaves state untouched
        assert!(!ctx.begin_run());
        assert_eq!(ctx.history_len(), 1);
        assert_eq!(ctx.status(), TaskStatus::Running);

        ctx.set_status(TaskStatus::Success);
        assert!(ctx.begin_run());
        assert_eq!(ctx.history_len(), 0);
    }

    #[test]
    fn transitions_publish_in_order() {
        let ctx = TaskContext::new(16);
        let mut rx = ctx.subscribe();

        ctx.begin_run();
        ctx.set_tab(Some(TabId(3)));
        ctx.push_history(entry());
        ctx.interrupt();

        let changes: Vec<TaskChange> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| event.change)
            .collect();
        assert_eq!(
            changes,
            vec![
                TaskChange::HistoryCleared,
                TaskChange::Status(TaskStatus::Running),
                TaskChange::Tab(Some(TabId(3))),
                TaskChange::HistoryAppended { len: 1 },
                TaskChange::Status(TaskStatus::Interrupted),
            ]
        );
    }

    #[test]
    fn redundant_transitions_are_not_republished() {
        let ctx = TaskContext::new(8);
        let mut rx = ctx.subscribe();

        ctx.set_tab(None);
        ctx.set_phase(StepPhase::Idle);
        assert!(rx.try_recv().is_err());
    }
}
