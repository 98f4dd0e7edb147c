use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::domain::{CommandId, CommandKind};
use crate::error::{CodecError, CommandError, ExecuteError, StoreError, WorkerError};
use crate::store::CommandStore;
use crate::typed::{CommandContext, PayloadCodec, Registry};

/// What one worker iteration did.
#[derive(Debug)]
pub enum Step {
    /// Handler succeeded; follow-ups were inserted and the row completed.
    /// `complete_error` carries a non-fatal complete failure, if any.
    Executed {
        id: CommandId,
        kind: CommandKind,
        follow_ups: Vec<CommandId>,
        complete_error: Option<StoreError>,
    },

    /// Handler failed; the row stays Pending.
    Failed {
        id: CommandId,
        kind: CommandKind,
        error: CommandError,
    },

    /// Payload could not be decoded or no handler knows its kind; the row
    /// stays Pending for inspection.
    Undecodable { id: CommandId, error: CodecError },

    /// Nothing Pending past the cursor.
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub executed: usize,
    pub failed: usize,
    pub undecodable: usize,
    pub enqueued: usize,
    pub complete_errors: usize,

    /// Rows fetched during this run that were left Pending.
    pub left_pending: Vec<CommandId>,
}

impl WorkerReport {
    fn record(&mut self, step: &Step) {
        match step {
            Step::Executed {
                follow_ups,
                complete_error,
                ..
            } => {
                self.executed += 1;
                self.enqueued += follow_ups.len();
                if complete_error.is_some() {
                    self.complete_errors += 1;
                }
            }
            Step::Failed { id, .. } => {
                self.failed += 1;
                self.left_pending.push(*id);
            }
            Step::Undecodable { id, .. } => {
                self.undecodable += 1;
                self.left_pending.push(*id);
            }
            Step::Done => {}
        }
    }
}

/// Single consumer: fetch → execute → insert follow-ups → complete.
///
/// The worker keeps a cursor at the last fetched id, so a row that failed or
/// could not be decoded is attempted at most once per worker. Follow-ups get
/// ids above the cursor and are always reached.
pub struct Worker {
    store: Arc<dyn CommandStore>,
    registry: Arc<Registry>,
    codec: PayloadCodec,
    cursor: CommandId,
}

impl Worker {
    pub fn new(store: Arc<dyn CommandStore>, registry: Arc<Registry>) -> Self {
        Self {
            store,
            registry,
            codec: PayloadCodec::new(),
            cursor: CommandId::UNSET,
        }
    }

    pub fn store(&self) -> &Arc<dyn CommandStore> {
        &self.store
    }

    /// Run one iteration.
    ///
    /// Only storage failures are returned as `Err`; everything about the
    /// command itself is reported through [`Step`].
    pub async fn step(&mut self) -> Result<Step, WorkerError> {
        let Some(row) = self.store.fetch_pending_after(self.cursor).await? else {
            return Ok(Step::Done);
        };
        self.cursor = row.id;
        let id = row.id;

        let envelope = match self.codec.decode(&row.payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(command_id = %id, %error, "undecodable command left pending");
                return Ok(Step::Undecodable { id, error });
            }
        };

        let kind = envelope.kind().clone();
        let ctx = CommandContext::new(id, kind.clone());
        debug!(command_id = %id, %kind, "executing command");

        // Store の lock はここでは持っていない（handler 実行中も insert 可能）
        let outcome = match self.registry.dispatch(&ctx, envelope).await {
            Ok(outcome) => outcome,
            Err(ExecuteError::Decode(error)) => {
                warn!(command_id = %id, %kind, %error, "undecodable command left pending");
                return Ok(Step::Undecodable { id, error });
            }
            Err(ExecuteError::Work(error)) => {
                warn!(command_id = %id, %kind, %error, "command failed, left pending");
                return Ok(Step::Failed { id, kind, error });
            }
        };

        // Encode everything first so a bad follow-up inserts nothing.
        let mut encoded = Vec::with_capacity(outcome.follow_ups().len());
        for follow_up in outcome.follow_ups() {
            match self.codec.encode(follow_up) {
                Ok(payload) => encoded.push(payload),
                Err(error) => {
                    warn!(command_id = %id, %kind, %error, "follow-up could not be encoded");
                    return Ok(Step::Failed {
                        id,
                        kind,
                        error: error.into(),
                    });
                }
            }
        }

        // follow-ups and the completion land together or not at all
        let (follow_ups, complete_error) =
            match self.store.complete_with_follow_ups(id, encoded).await {
                Ok(follow_ups) => (follow_ups, None),
                Err(error) if !error.is_fatal() => {
                    warn!(command_id = %id, %kind, %error, "complete reported an error, continuing");
                    (Vec::new(), Some(error))
                }
                Err(error) => return Err(error.into()),
            };

        info!(
            command_id = %id,
            %kind,
            follow_ups = follow_ups.len(),
            "command complete"
        );
        Ok(Step::Executed {
            id,
            kind,
            follow_ups,
            complete_error,
        })
    }

    /// Drain until nothing is Pending past the cursor.
    ///
    /// Terminates only if the commands stop producing follow-ups.
    pub async fn run_until_idle(&mut self) -> Result<WorkerReport, WorkerError> {
        let mut report = WorkerReport::default();
        loop {
            let step = self.step().await?;
            if matches!(step, Step::Done) {
                break;
            }
            report.record(&step);
        }
        info!(
            executed = report.executed,
            failed = report.failed,
            undecodable = report.undecodable,
            enqueued = report.enqueued,
            "queue drained"
        );
        Ok(report)
    }

    /// Run on a background task, polling every `poll_interval` when idle.
    pub fn spawn(self, config: WorkerConfig) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run_until_shutdown(config, shutdown_rx));
        WorkerHandle {
            shutdown_tx,
            join: Some(join),
        }
    }

    async fn run_until_shutdown(
        mut self,
        config: WorkerConfig,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<WorkerReport, WorkerError> {
        let mut report = WorkerReport::default();
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let step = match self.step().await {
                Ok(step) => step,
                Err(err) => {
                    error!(
                        error = %err,
                        executed = report.executed,
                        "worker stopped on storage failure"
                    );
                    return Err(err);
                }
            };
            if !matches!(step, Step::Done) {
                report.record(&step);
                continue;
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // sender dropped: nobody can stop us any more, so stop now
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(config.poll_interval()) => {}
            }
        }
        debug!(executed = report.executed, "worker stopped");
        Ok(report)
    }
}

/// Handle to a spawned worker.
/// - `request_shutdown()` stops it between iterations
/// - `finished()` resolves when the worker exits on its own (storage failure)
/// - in-flight execution is never cancelled
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: Option<JoinHandle<Result<WorkerReport, WorkerError>>>,
}

impl WorkerHandle {
    pub fn request_shutdown(&self) {
        // ignore send error: the worker may already have exited
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the worker task to exit without asking it to.
    ///
    /// Cancel-safe, so it can sit in a `select!` next to a signal listener.
    /// Once it has returned the result, later calls report `Aborted`.
    pub async fn finished(&mut self) -> Result<WorkerReport, WorkerError> {
        let Some(join) = self.join.as_mut() else {
            return Err(WorkerError::Aborted("worker already joined".into()));
        };
        let result = join.await;
        self.join = None;
        result.map_err(|e| WorkerError::Aborted(e.to_string()))?
    }

    pub async fn shutdown_and_join(mut self) -> Result<WorkerReport, WorkerError> {
        self.request_shutdown();
        self.finished().await
    }
}
