use webpilot_core_types::{Action, TaskHistoryEntry};

/// Append-only log of completed steps. Entries are insertion-ordered and
/// never reordered or mutated in place; readers get owned snapshots, so a
/// later append cannot retroactively change a previously returned view.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: Vec<TaskHistoryEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TaskHistoryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<TaskHistoryEntry> {
        self.entries.clone()
    }

    /// Ordered actions for planner context.
    pub fn prior_actions(&self) -> Vec<Action> {
        self.entries.iter().map(|entry| entry.action.clone()).collect()
    }

    /// Reset for a new run; callable only from the run-start transition.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
