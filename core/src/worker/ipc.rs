//! Wire types shared by the worker pool and the `gcdsim-worker` binary.
//!
//! Both directions are newline-delimited JSON: one `WorkerRequest` per line on
//! the worker's stdin, one `WorkerResponse` per line on its stdout. Every job
//! ends with exactly one `done` or `error` response; `progress` responses may
//! precede it.

use gcdsim_types::StatSheet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::SimConfig;
use crate::rotation::RotationResult;

/// Job id used for responses to lines that could not be parsed.
pub const MALFORMED_JOB_ID: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Evaluate every rotation for each stat permutation
    Evaluate,
    /// Liveness check, answered immediately
    Ping,
}

/// Request envelope sent to a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub job_id: u64,
    pub job_type: JobType,
    #[serde(default)]
    pub config: SimConfig,
    #[serde(default)]
    pub payload: Value,
}

impl WorkerRequest {
    pub fn ping(job_id: u64) -> Self {
        Self {
            job_id,
            job_type: JobType::Ping,
            config: SimConfig::default(),
            payload: Value::Null,
        }
    }

    pub fn evaluate(job_id: u64, config: SimConfig, permutations: Vec<StatSheet>) -> Self {
        Self {
            job_id,
            job_type: JobType::Evaluate,
            config,
            payload: serde_json::json!({ "permutations": permutations }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Done,
    Progress,
    Error,
}

/// Response envelope written by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub job_id: u64,
    pub status: JobStatus,
    #[serde(default)]
    pub payload: Value,
}

impl WorkerResponse {
    pub fn done(job_id: u64, payload: Value) -> Self {
        Self {
            job_id,
            status: JobStatus::Done,
            payload,
        }
    }

    pub fn progress(job_id: u64, completed: usize, total: usize) -> Self {
        Self {
            job_id,
            status: JobStatus::Progress,
            payload: serde_json::json!(ProgressPayload { completed, total }),
        }
    }

    pub fn error(job_id: u64, message: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Error,
            payload: serde_json::json!({ "message": message.into() }),
        }
    }

    /// `done` and `error` end a job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, JobStatus::Progress)
    }

    /// Message carried by an `error` response.
    pub fn error_message(&self) -> Option<&str> {
        match self.status {
            JobStatus::Error => self.payload.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Payload of an `evaluate` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatePayload {
    pub permutations: Vec<StatSheet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub completed: usize,
    pub total: usize,
}

/// Evaluation of one stat permutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationResult {
    /// Position in the submitted permutation list
    pub index: usize,
    pub stats: StatSheet,
    pub results: Vec<RotationResult>,
    /// Highest-DPS successful rotation, absent when all failed
    pub best: Option<RotationResult>,
    pub cache_hit: bool,
    pub error: Option<String>,
}

impl PermutationResult {
    pub fn best_dps(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |r| r.dps)
    }
}
