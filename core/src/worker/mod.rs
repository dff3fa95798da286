//! Worker-process batch layer
//!
//! - **ipc**: request/response envelopes (JSON lines)
//! - **jobs**: job execution inside `gcdsim-worker`
//! - **pool**: tokio pool that distributes jobs to worker subprocesses

mod ipc;
mod jobs;
mod pool;

pub use ipc::{
    EvaluatePayload, JobStatus, JobType, MALFORMED_JOB_ID, PermutationResult, ProgressPayload,
    WorkerRequest, WorkerResponse,
};
pub use jobs::{JobError, execute_job};
pub use pool::{LOG_PATH_ENV, TaskHandle, WorkerError, WorkerPool, WorkerPoolConfig};
