//! Broadcast channel carrying task state changes to any number of observers.
//!
//! The task loop publishes into a `TaskPublisher` and never knows how many
//! subscribers exist; delivery is best-effort at broadcast-channel
//! granularity, in emission order.

use std::time::SystemTime;

use tokio::sync::{broadcast, mpsc};
use tracing::trace;

use webpilot_core_types::{StepPhase, TabId, TaskStatus};

/// What changed on the task state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TaskChange {
    Status(TaskStatus),
    Tab(Option<TabId>),
    HistoryCleared,
    HistoryAppended { len: usize },
    Phase(StepPhase),
}

/// One state-change notification.
#[derive(Clone, Debug)]
pub struct TaskEvent {
    pub change: TaskChange,
    pub recorded_at: SystemTime,
}

/// Publish side of the task state channel.
pub struct TaskPublisher {
    sender: broadcast::Sender<TaskEvent>,
}

impl TaskPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Best-effort publish; having no subscribers is not an error.
    pub fn publish(&self, change: TaskChange) {
        let event = TaskEvent {
            change,
            recorded_at: SystemTime::now(),
        };
        if self.sender.send(event).is_err() {
            trace!(target: "event-bus", "task event dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Materialise an mpsc receiver from a subscription so callers can await
/// events without handling broadcast semantics directly. Lagged events are
/// skipped rather than terminating the stream.
pub fn into_stream(publisher: &TaskPublisher, capacity: usize) -> mpsc::Receiver<TaskEvent> {
    let mut rx = publisher.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(target: "event-bus", skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_changes_in_emission_order() {
        let publisher = TaskPublisher::new(8);
        let mut first = publisher.subscribe();
        let mut second = publisher.subscribe();

        publisher.publish(TaskChange::Status(TaskStatus::Running));
        publisher.publish(TaskChange::HistoryAppended { len: 1 });
        publisher.publish(TaskChange::Status(TaskStatus::Success));

        for rx in [&mut first, &mut second] {
            assert_eq!(
                rx.recv().await.unwrap().change,
                TaskChange::Status(TaskStatus::Running)
            );
            assert_eq!(
                rx.recv().await.unwrap().change,
                TaskChange::HistoryAppended { len: 1 }
            );
            assert_eq!(
                rx.recv().await.unwrap().change,
                TaskChange::Status(TaskStatus::Success)
            );
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let publisher = TaskPublisher::new(4);
        publisher.publish(TaskChange::Tab(Some(TabId(7))));
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn into_stream_forwards_events() {
        let publisher = TaskPublisher::new(8);
        let mut stream = into_stream(&publisher, 8);

        publisher.publish(TaskChange::Phase(StepPhase::PullingDom));
        let event = stream.recv().await.unwrap();
        assert_eq!(event.change, TaskChange::Phase(StepPhase::PullingDom));
    }
}
