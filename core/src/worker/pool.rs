//! Bounded pool of `gcdsim-worker` subprocesses
//!
//! Tasks are queued FIFO and picked up by at most `max_workers` worker slots.
//! Each slot owns one long-lived process, spawned on first use and respawned
//! after it was killed or died.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gcdsim_types::StatSheet;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::ipc::{JobStatus, JobType, PermutationResult, WorkerRequest, WorkerResponse};
use crate::catalog::SimConfig;

/// Environment variable the worker reads its log file path from.
pub const LOG_PATH_ENV: &str = "GCDSIM_LOG_PATH";

/// Transport-level failures; each one rejects only its own task
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker {path}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("worker I/O failed")]
    Io(#[from] std::io::Error),

    #[error("protocol violation: {reason}")]
    Protocol { reason: String },

    #[error("worker exited during job {job_id}")]
    WorkerExited { job_id: u64 },

    #[error("job {job_id} was cancelled")]
    Cancelled { job_id: u64 },

    #[error("job {job_id} failed: {message}")]
    Job { job_id: u64, message: String },

    #[error("worker pool is shut down")]
    PoolClosed,
}

impl WorkerError {
    /// Whether the worker process can no longer be trusted for the next task.
    fn poisons_worker(&self) -> bool {
        !matches!(self, WorkerError::Job { .. } | WorkerError::PoolClosed)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_exe: PathBuf,
    pub max_workers: usize,
    /// Forwarded to workers as `GCDSIM_LOG_PATH`
    pub log_path: Option<PathBuf>,
}

impl WorkerPoolConfig {
    pub fn new(worker_exe: impl Into<PathBuf>, max_workers: usize) -> Self {
        Self {
            worker_exe: worker_exe.into(),
            max_workers: max_workers.max(1),
            log_path: None,
        }
    }
}

type TaskResult = Result<Value, WorkerError>;

struct Task {
    request: WorkerRequest,
    progress: mpsc::UnboundedSender<Value>,
    reply: oneshot::Sender<TaskResult>,
    cancel: watch::Receiver<bool>,
}

/// Caller side of a submitted task.
pub struct TaskHandle {
    job_id: u64,
    progress: mpsc::UnboundedReceiver<Value>,
    result: oneshot::Receiver<TaskResult>,
    cancel: watch::Sender<bool>,
}

impl TaskHandle {
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// Drop the task if it is still queued, or kill its worker if it runs.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Next progress payload; `None` once the task has finished.
    pub async fn next_progress(&mut self) -> Option<Value> {
        self.progress.recv().await
    }

    pub async fn wait(self) -> TaskResult {
        self.result.await.unwrap_or(Err(WorkerError::PoolClosed))
    }
}

pub struct WorkerPool {
    queue: mpsc::UnboundedSender<Task>,
    slots: Vec<JoinHandle<()>>,
    next_job_id: AtomicU64,
}

impl WorkerPool {
    /// Start the worker slots. Must be called within a tokio runtime.
    pub fn new(config: WorkerPoolConfig) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let config = Arc::new(config);

        let slots = (0..config.max_workers.max(1))
            .map(|slot| tokio::spawn(run_slot(slot, Arc::clone(&rx), Arc::clone(&config))))
            .collect();

        Self {
            queue,
            slots,
            next_job_id: AtomicU64::new(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.slots.len()
    }

    /// Queue a job. Results arrive through the returned handle.
    pub fn submit(&self, job_type: JobType, config: SimConfig, payload: Value) -> TaskHandle {
        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let (progress_tx, progress) = mpsc::unbounded_channel();
        let (reply, result) = oneshot::channel();
        let (cancel, cancel_rx) = watch::channel(false);

        let task = Task {
            request: WorkerRequest {
                job_id,
                job_type,
                config,
                payload,
            },
            progress: progress_tx,
            reply,
            cancel: cancel_rx,
        };
        if let Err(mpsc::error::SendError(task)) = self.queue.send(task) {
            let _ = task.reply.send(Err(WorkerError::PoolClosed));
        }

        TaskHandle {
            job_id,
            progress,
            result,
            cancel,
        }
    }

    /// Evaluate `permutations` in chunks of `chunk_size`, one task per chunk.
    ///
    /// Results come back in submission order with indices into `permutations`.
    pub async fn evaluate(
        &self,
        config: &SimConfig,
        permutations: &[StatSheet],
        chunk_size: usize,
    ) -> Result<Vec<PermutationResult>, WorkerError> {
        let chunk_size = chunk_size.max(1);
        let handles: Vec<(usize, TaskHandle)> = permutations
            .chunks(chunk_size)
            .enumerate()
            .map(|(i, chunk)| {
                let payload = serde_json::json!({ "permutations": chunk });
                (i * chunk_size, self.submit(JobType::Evaluate, config.clone(), payload))
            })
            .collect();

        tracing::info!(
            permutations = permutations.len(),
            tasks = handles.len(),
            workers = self.max_workers(),
            "Submitted evaluation batch"
        );

        let mut results = Vec::with_capacity(permutations.len());
        let mut failure = None;
        for (offset, handle) in handles {
            if failure.is_some() {
                handle.cancel();
                continue;
            }
            match handle.wait().await {
                Ok(payload) => {
                    let chunk: Vec<PermutationResult> =
                        serde_json::from_value(payload).map_err(|e| WorkerError::Protocol {
                            reason: format!("bad evaluate payload: {e}"),
                        })?;
                    results.extend(chunk.into_iter().map(|mut r| {
                        r.index += offset;
                        r
                    }));
                }
                Err(e) => failure = Some(e),
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }

    /// Stop accepting tasks and wait for the slots to drain the queue.
    pub async fn shutdown(self) {
        drop(self.queue);
        for slot in self.slots {
            let _ = slot.await;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker slots
// ─────────────────────────────────────────────────────────────────────────────

struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl WorkerProcess {
    fn spawn(config: &WorkerPoolConfig) -> Result<Self, WorkerError> {
        let spawn_error = |source| WorkerError::Spawn {
            path: config.worker_exe.clone(),
            source,
        };

        let mut command = Command::new(&config.worker_exe);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(path) = &config.log_path {
            command.env(LOG_PATH_ENV, path);
        }

        let mut child = command.spawn().map_err(spawn_error)?;
        let missing = || spawn_error(std::io::Error::other("worker stdio not captured"));
        let stdin = child.stdin.take().ok_or_else(missing)?;
        let stdout = child.stdout.take().ok_or_else(missing)?;

        tracing::debug!(pid = ?child.id(), exe = %config.worker_exe.display(), "Spawned worker");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    async fn send(&mut self, request: &WorkerRequest) -> Result<(), WorkerError> {
        let mut line = serde_json::to_vec(request).map_err(|e| WorkerError::Protocol {
            reason: format!("failed to encode request: {e}"),
        })?;
        line.push(b'\n');
        self.stdin.write_all(&line).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_response(&mut self, job_id: u64) -> Result<WorkerResponse, WorkerError> {
        let Some(line) = self.stdout.next_line().await? else {
            return Err(WorkerError::WorkerExited { job_id });
        };
        serde_json::from_str(&line).map_err(|e| WorkerError::Protocol {
            reason: format!("unparseable response: {e}"),
        })
    }

    async fn kill(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(error = %e, "Failed to kill worker");
        }
    }

    async fn close(self) {
        let Self { mut child, stdin, .. } = self;
        drop(stdin);
        if let Err(e) = child.wait().await {
            tracing::warn!(error = %e, "Failed to wait for worker");
        }
    }
}

/// Resolves once the task is cancelled or its handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

async fn run_task(process: &mut WorkerProcess, task: &mut Task) -> TaskResult {
    let job_id = task.request.job_id;
    process.send(&task.request).await?;

    loop {
        let response = tokio::select! {
            response = process.next_response(job_id) => response?,
            _ = cancelled(&mut task.cancel) => return Err(WorkerError::Cancelled { job_id }),
        };

        if response.job_id != job_id {
            return Err(WorkerError::Protocol {
                reason: format!("expected job {job_id}, got {}", response.job_id),
            });
        }

        match response.status {
            JobStatus::Progress => {
                let _ = task.progress.send(response.payload);
            }
            JobStatus::Done => return Ok(response.payload),
            JobStatus::Error => {
                return Err(WorkerError::Job {
                    job_id,
                    message: response.error_message().unwrap_or("unknown error").to_string(),
                });
            }
        }
    }
}

async fn run_slot(
    slot: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Task>>>,
    config: Arc<WorkerPoolConfig>,
) {
    let mut process: Option<WorkerProcess> = None;

    loop {
        let next = queue.lock().await.recv().await;
        let Some(mut task) = next else { break };
        let job_id = task.request.job_id;

        if *task.cancel.borrow() || task.reply.is_closed() {
            tracing::debug!(slot, job_id, "Dropped cancelled task");
            let _ = task.reply.send(Err(WorkerError::Cancelled { job_id }));
            continue;
        }

        if process.is_none() {
            match WorkerProcess::spawn(&config) {
                Ok(worker) => process = Some(worker),
                Err(e) => {
                    tracing::error!(slot, job_id, error = %e, "Failed to spawn worker");
                    let _ = task.reply.send(Err(e));
                    continue;
                }
            }
        }
        let Some(worker) = process.as_mut() else {
            continue;
        };

        let result = run_task(worker, &mut task).await;
        if let Err(e) = &result {
            tracing::error!(slot, job_id, error = %e, "Task failed");
            if e.poisons_worker()
                && let Some(worker) = process.take()
            {
                worker.kill().await;
            }
        }
        let _ = task.reply.send(result);
    }

    if let Some(worker) = process {
        worker.close().await;
    }
    tracing::debug!(slot, "Worker slot stopped");
}
