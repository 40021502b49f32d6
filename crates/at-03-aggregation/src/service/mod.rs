//! BLS Aggregation Service
//!
//! Implements [`AggregationEngine`] with one tokio actor per active task.
//! The actor owns the task's [`TaskAggregation`] and serializes every
//! signature submission, so verification and stake accounting never race.
//!
//! ```text
//! process_signature ──Submission──→ [task actor] ──verdict──→ caller
//!                                        │
//!                       threshold ─→ window ─→ certificate ─→ CompletionSignal
//!                       expiry ────────────→ TaskExpired ───↗
//! ```
//!
//! Tasks are removed from the table when they finish, expire or are
//! abandoned, so an index can be reused afterwards.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Certificate, SignatureEvent, TaskIndex, TaskParams};
use std::collections::HashMap;
use std::future::pending;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::domain::{AggregationError, Progress, TaskAggregation};
use crate::ports::{AggregationEngine, CompletionSignal, OperatorRegistry};


type Outcome = Result<Certificate, AggregationError>;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Pending submissions buffered per task before senders wait.
    pub submission_buffer: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            submission_buffer: 256,
        }
    }
}

struct Submission {
    event: SignatureEvent,
    reply: oneshot::Sender<Result<(), AggregationError>>,
}

struct TaskEntry {
    generation: u64,
    submissions: mpsc::Sender<Submission>,
    completion: Option<oneshot::Receiver<Outcome>>,
}

type TaskTable = Arc<Mutex<HashMap<TaskIndex, TaskEntry>>>;

fn remove_task(tasks: &TaskTable, task_index: TaskIndex, generation: u64) {
    let mut tasks = tasks.lock();
    if tasks.get(&task_index).map(|entry| entry.generation) == Some(generation) {
        tasks.remove(&task_index);
    }
}

/// Releases a reserved task index unless the task actor took ownership.
struct Reservation<'a> {
    tasks: &'a TaskTable,
    task_index: TaskIndex,
    generation: u64,
    armed: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            remove_task(self.tasks, self.task_index, self.generation);
        }
    }
}

/// Aggregation engine verifying BLS signatures against a registry snapshot.
pub struct BlsAggregationService<R: OperatorRegistry + ?Sized> {
    registry: Arc<R>,
    tasks: TaskTable,
    next_generation: AtomicU64,
    config: AggregationConfig,
}

impl<R: OperatorRegistry + ?Sized + 'static> BlsAggregationService<R> {
    /// Create a new engine over `registry`
    pub fn new(registry: Arc<R>) -> Self {
        Self::with_config(registry, AggregationConfig::default())
    }

    /// Create with explicit configuration
    pub fn with_config(registry: Arc<R>, config: AggregationConfig) -> Self {
        Self {
            registry,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            config,
        }
    }

    /// Whether a task with this index is currently active.
    pub fn is_active(&self, task_index: TaskIndex) -> bool {
        self.tasks.lock().contains_key(&task_index)
    }

    /// Number of active tasks.
    pub fn active_tasks(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[async_trait]
impl<R: OperatorRegistry + ?Sized + 'static> AggregationEngine for BlsAggregationService<R> {
    async fn initialize_task(&self, params: TaskParams) -> Result<(), AggregationError> {
        params.validate()?;
        let task_index = params.task_index;

        let (submissions_tx, submissions_rx) = mpsc::channel(self.config.submission_buffer.max(1));
        let (completion_tx, completion_rx) = oneshot::channel();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut tasks = self.tasks.lock();
            if tasks.contains_key(&task_index) {
                return Err(AggregationError::TaskAlreadyInitialized(task_index));
            }
            tasks.insert(
                task_index,
                TaskEntry {
                    generation,
                    submissions: submissions_tx,
                    completion: Some(completion_rx),
                },
            );
        }
        let mut reservation = Reservation {
            tasks: &self.tasks,
            task_index,
            generation,
            armed: true,
        };

        let operators = self
            .registry
            .get_operators_at_block(&params.quorum_nums(), params.created_at_block)
            .await?;

        info!(
            task_index,
            block = params.created_at_block,
            operators = operators.len(),
            expiry_ms = params.expiry.as_millis() as u64,
            "Task initialized"
        );

        let aggregation = TaskAggregation::new(params, operators);
        tokio::spawn(run_task(
            aggregation,
            submissions_rx,
            completion_tx,
            Arc::clone(&self.tasks),
            generation,
        ));
        reservation.armed = false;
        Ok(())
    }

    async fn process_signature(&self, event: SignatureEvent) -> Result<(), AggregationError> {
        let task_index = event.task_index;
        let submissions = self
            .tasks
            .lock()
            .get(&task_index)
            .map(|entry| entry.submissions.clone())
            .ok_or(AggregationError::TaskNotFound(task_index))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        submissions
            .send(Submission {
                event,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AggregationError::TaskNotFound(task_index))?;

        // Actor may finish before answering
        reply_rx
            .await
            .map_err(|_| AggregationError::TaskNotFound(task_index))?
    }

    fn completion_signal(&self, task_index: TaskIndex) -> Result<CompletionSignal, AggregationError> {
        let mut tasks = self.tasks.lock();
        let entry = tasks
            .get_mut(&task_index)
            .ok_or(AggregationError::TaskNotFound(task_index))?;
        let rx = entry
            .completion
            .take()
            .ok_or(AggregationError::CompletionAlreadyTaken(task_index))?;
        Ok(CompletionSignal::new(task_index, rx))
    }
}

fn deadline_after(duration: Duration) -> Option<Instant> {
    Instant::now().checked_add(duration)
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending::<()>().await,
    }
}

async fn run_task(
    mut aggregation: TaskAggregation,
    mut submissions: mpsc::Receiver<Submission>,
    mut completion: oneshot::Sender<Outcome>,
    tasks: TaskTable,
    generation: u64,
) {
    let task_index = aggregation.params().task_index;
    // `None` when the duration runs past what `Instant` can represent
    let expiry_at = deadline_after(aggregation.params().expiry);
    let window = aggregation.params().aggregation_window;
    let mut window_at: Option<Instant> = None;

    let outcome = loop {
        let window_elapsed = sleep_until_opt(window_at);
        let expired = sleep_until_opt(expiry_at);

        tokio::select! {
            biased;

            _ = completion.closed() => {
                debug!(task_index, "Completion signal dropped, abandoning task");
                break None;
            }
            _ = window_elapsed => {
                break Some(aggregation.build_certificate());
            }
            _ = expired => {
                break Some(match aggregation.winner() {
                    Some(_) => aggregation.build_certificate(),
                    None => Err(AggregationError::TaskExpired(task_index)),
                });
            }
            submission = submissions.recv() => {
                let Some(Submission { event, reply }) = submission else {
                    break None;
                };
                let operator_id = event.operator_id;
                let verdict = aggregation.process(event);
                match &verdict {
                    Ok(Progress::ThresholdReached(digest)) => {
                        window_at = match (deadline_after(window), expiry_at) {
                            (Some(w), Some(e)) => Some(w.min(e)),
                            (w, e) => w.or(e),
                        };
                        info!(
                            task_index,
                            %digest,
                            window_ms = window.as_millis() as u64,
                            "Threshold reached, aggregation window armed"
                        );
                    }
                    Ok(Progress::CompetingDigest(digest)) => {
                        warn!(
                            task_index,
                            %digest,
                            winner = ?aggregation.winner(),
                            "Second response digest reached threshold; quorum weights overlap, keeping the first"
                        );
                    }
                    Ok(Progress::Collecting) => {
                        debug!(task_index, %operator_id, "Signature accepted");
                    }
                    Err(e) => {
                        debug!(task_index, %operator_id, error = %e, "Signature rejected");
                    }
                }
                let _ = reply.send(verdict.map(|_| ()));
            }
        }
    };

    remove_task(&tasks, task_index, generation);

    if let Some(outcome) = outcome {
        match &outcome {
            Ok(certificate) => info!(
                task_index,
                signers = certificate.signers.len(),
                non_signers = certificate.non_signers.len(),
                "Certificate aggregated"
            ),
            Err(e) => warn!(task_index, error = %e, "Task failed"),
        }
        let _ = completion.send(outcome);
    }
}
