//! gcdsim-worker - Subprocess that evaluates simulation jobs.
//!
//! Spawned by the worker pool. Reads one `WorkerRequest` per line on stdin and
//! writes `WorkerResponse` lines to stdout until stdin closes. Logs go to
//! `GCDSIM_LOG_PATH` when set, otherwise stderr; stdout carries protocol
//! output only.

use std::io::{self, BufRead, Write};

use gcdsim_core::worker::{
    LOG_PATH_ENV, MALFORMED_JOB_ID, WorkerRequest, WorkerResponse, execute_job,
};
use tracing_subscriber::filter::EnvFilter;

/// Initialize logging, appending to GCDSIM_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var(LOG_PATH_ENV)
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn write_response(out: &mut impl Write, response: &WorkerResponse) -> io::Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    out.write_all(b"\n")?;
    out.flush()
}

fn main() -> Result<(), String> {
    init_logging();
    tracing::info!(pid = std::process::id(), "Worker started");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut jobs = 0usize;

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| format!("failed to read request: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let request: WorkerRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed request");
                let response = WorkerResponse::error(MALFORMED_JOB_ID, format!("malformed request: {e}"));
                write_response(&mut out, &response).map_err(|e| e.to_string())?;
                continue;
            }
        };

        tracing::debug!(job_id = request.job_id, job_type = ?request.job_type, "Received job");
        let mut write_error = None;
        execute_job(&request, |response| {
            if write_error.is_none()
                && let Err(e) = write_response(&mut out, &response)
            {
                write_error = Some(e);
            }
        });
        if let Some(e) = write_error {
            return Err(format!("failed to write response: {e}"));
        }
        jobs += 1;
    }

    tracing::info!(jobs, "Worker stopped");
    Ok(())
}
