//! Job execution inside a worker process

use std::sync::Arc;

use thiserror::Error;

use super::ipc::{
    EvaluatePayload, JobType, PermutationResult, WorkerRequest, WorkerResponse,
};
use crate::catalog::{Catalog, ConfigError};
use crate::error::error_chain;
use crate::formulas::{PotencyDamage, StandardTiming};

/// Failures that end a job with an `error` response
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid config")]
    Config(#[from] ConfigError),

    #[error("invalid payload")]
    Payload(#[from] serde_json::Error),
}

/// Run `request` to completion, passing every response to `emit`.
///
/// `emit` receives zero or more progress responses followed by exactly one
/// terminal response.
pub fn execute_job(request: &WorkerRequest, mut emit: impl FnMut(WorkerResponse)) {
    let job_id = request.job_id;
    let terminal = match request.job_type {
        JobType::Ping => WorkerResponse::done(job_id, serde_json::json!("pong")),
        JobType::Evaluate => match evaluate(request, &mut emit) {
            Ok(results) => match serde_json::to_value(results) {
                Ok(payload) => WorkerResponse::done(job_id, payload),
                Err(e) => WorkerResponse::error(job_id, format!("failed to encode results: {e}")),
            },
            Err(e) => {
                let message = error_chain(&e);
                tracing::warn!(job_id, error = %message, "Job failed");
                WorkerResponse::error(job_id, message)
            }
        },
    };
    emit(terminal);
}

fn evaluate(
    request: &WorkerRequest,
    emit: &mut impl FnMut(WorkerResponse),
) -> Result<Vec<PermutationResult>, JobError> {
    let payload: EvaluatePayload = serde_json::from_value(request.payload.clone())?;
    let catalog = Catalog::compile(&request.config)?;

    let timing = Arc::new(StandardTiming::for_level(catalog.stats.level));
    let mut runner = catalog.runner(timing, Arc::new(PotencyDamage::default()));

    let total = payload.permutations.len();
    let mut results = Vec::with_capacity(total);

    for (index, stats) in payload.permutations.into_iter().enumerate() {
        let result = match runner.evaluate(&stats) {
            Ok(outcome) => PermutationResult {
                index,
                best: Some(outcome.best().clone()),
                cache_hit: outcome.cache_hit,
                results: outcome.results,
                stats,
                error: None,
            },
            Err(e) => PermutationResult {
                index,
                stats,
                results: Vec::new(),
                best: None,
                cache_hit: false,
                error: Some(error_chain(&e)),
            },
        };
        results.push(result);
        emit(WorkerResponse::progress(request.job_id, index + 1, total));
    }

    tracing::info!(
        job_id = request.job_id,
        permutations = total,
        simulations = runner.simulations(),
        "Evaluated permutations"
    );
    Ok(results)
}
