//! Driving ports (Inbound API)

use async_trait::async_trait;
use shared_types::{Certificate, SignatureEvent, TaskIndex, TaskParams};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::domain::AggregationError;

/// The aggregation engine contract consumed by the coordinator.
///
/// Exactly three operations: register a task, feed it signature events, and
/// wait for its single outcome.
#[async_trait]
pub trait AggregationEngine: Send + Sync {
    /// Register a task and resolve its operator set.
    ///
    /// Fails with `TaskAlreadyInitialized` while a task with the same index
    /// is active; the active task is not affected.
    async fn initialize_task(&self, params: TaskParams) -> Result<(), AggregationError>;

    /// Verify one signature event and add it to its task.
    async fn process_signature(&self, event: SignatureEvent) -> Result<(), AggregationError>;

    /// Take the task's completion signal. Can be taken once per task.
    ///
    /// Dropping the signal before it resolves abandons the task.
    fn completion_signal(&self, task_index: TaskIndex) -> Result<CompletionSignal, AggregationError>;
}

/// Resolves exactly once with the task's certificate or failure.
#[derive(Debug)]
pub struct CompletionSignal {
    task_index: TaskIndex,
    rx: oneshot::Receiver<Result<Certificate, AggregationError>>,
}

impl CompletionSignal {
    pub(crate) fn new(
        task_index: TaskIndex,
        rx: oneshot::Receiver<Result<Certificate, AggregationError>>,
    ) -> Self {
        Self { task_index, rx }
    }

    /// Task this signal belongs to.
    pub fn task_index(&self) -> TaskIndex {
        self.task_index
    }
}

impl Future for CompletionSignal {
    type Output = Result<Certificate, AggregationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let task_index = self.task_index;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Engine dropped the task without reporting
            Poll::Ready(Err(_)) => Poll::Ready(Err(AggregationError::TaskAbandoned(task_index))),
            Poll::Pending => Poll::Pending,
        }
    }
}
