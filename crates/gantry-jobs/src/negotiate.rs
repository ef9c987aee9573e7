//! Job-id negotiation against existing jobs on the remote service.

use crate::running::RunningJob;
use gantry_client::JobAdapter;
use gantry_types::{GantryError, JobStatus, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds a usable job id, probing `base`, `base-1`, `base-2`, ... in order.
///
/// The first unused suffix is returned. An existing candidate short-circuits
/// the probe when it can be reused instead of re-run: any non-terminal job,
/// or a succeeded one when `return_success` is set.
///
/// With `override_existing`, existing candidates are never reused: a
/// non-terminal candidate is killed and probing continues, so the returned id
/// is always free. The two flags contradict each other and cannot be
/// combined.
///
/// # Errors
///
/// Returns [`GantryError::Configuration`] when both flags are set, before any
/// remote call; otherwise propagates status and kill failures.
pub async fn generate_job_id(
    adapter: &JobAdapter,
    base: &str,
    return_success: bool,
    override_existing: bool,
) -> Result<String> {
    if return_success && override_existing {
        return Err(GantryError::Configuration(
            "return_success and override_existing are mutually exclusive".to_string(),
        ));
    }

    let mut suffix = 0u32;
    loop {
        let candidate = if suffix == 0 {
            base.to_string()
        } else {
            format!("{base}-{suffix}")
        };

        match adapter.get_status(&candidate, None).await {
            Err(err) if err.is_not_found() => {
                info!(job_id = %candidate, "job id is unused");
                return Ok(candidate);
            }
            Err(err) => return Err(err),
            Ok(status) => {
                debug!(job_id = %candidate, status = %status, "candidate id is taken");
                if override_existing {
                    if !status.is_done() {
                        info!(job_id = %candidate, "killing existing job before re-run");
                        adapter.kill_job(&candidate).await?;
                    }
                } else if (return_success && status == JobStatus::Succeeded) || !status.is_done() {
                    return Ok(candidate);
                }
            }
        }
        suffix += 1;
    }
}

/// Attaches a handle to an already-submitted job.
///
/// The returned handle is seeded with the job's current status; nothing is
/// submitted.
///
/// # Errors
///
/// Returns [`GantryError::NotFound`] when no such job exists.
pub async fn reattach_job(adapter: Arc<JobAdapter>, job_id: &str) -> Result<RunningJob> {
    let status = adapter.get_status(job_id, None).await?;
    info!(job_id, status = %status, "reattached to existing job");
    Ok(RunningJob::with_status(adapter, job_id, status))
}
