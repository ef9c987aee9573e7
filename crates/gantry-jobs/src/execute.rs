//! End-to-end submission flow.

use crate::negotiate::{generate_job_id, reattach_job};
use crate::running::RunningJob;
use gantry_client::JobAdapter;
use gantry_types::{JobSpec, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Knobs for [`execute`].
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Negotiate a usable id against existing runs (reattach or pick the
    /// next free suffix) instead of submitting directly under the spec's id.
    pub retry: bool,
    /// With `retry`: run the job even when a succeeded run with this id
    /// already exists.
    pub force: bool,
    /// Kill any non-terminal job found under a candidate id and submit under
    /// a fresh one. Requires `force`.
    pub override_existing: bool,
    /// Submission attempts; defaults to the adapter's configured value.
    pub attempts: Option<u32>,
    /// Submission backoff; defaults to the adapter's configured value.
    pub backoff: Option<Duration>,
}

/// Runs a job spec to a live handle.
///
/// By default the spec is submitted directly under its assigned id, with no
/// id negotiation; a collision with an existing job surfaces as a conflict.
///
/// With `retry` (or `override_existing`), a usable id is negotiated from the
/// spec's first: an existing reusable job under a candidate id is reattached
/// instead of re-run, and otherwise the job is submitted under the first
/// free suffix. Without `force`, a previous succeeded run counts as
/// reusable.
///
/// # Errors
///
/// Returns [`gantry_types::GantryError::Conflict`] when the submission id is
/// already taken, [`gantry_types::GantryError::Configuration`] for
/// contradictory options, or any negotiation/submission failure.
pub async fn execute(
    adapter: Arc<JobAdapter>,
    spec: &JobSpec,
    options: &ExecuteOptions,
) -> Result<RunningJob> {
    if options.retry || options.override_existing {
        let job_id = generate_job_id(
            &adapter,
            &spec.id,
            !options.force,
            options.override_existing,
        )
        .await?;

        return match reattach_job(adapter.clone(), &job_id).await {
            Ok(job) => Ok(job),
            Err(err) if err.is_not_found() => submit(adapter, spec, options, job_id).await,
            Err(err) => Err(err),
        };
    }

    submit(adapter, spec, options, spec.id.clone()).await
}

async fn submit(
    adapter: Arc<JobAdapter>,
    spec: &JobSpec,
    options: &ExecuteOptions,
    job_id: String,
) -> Result<RunningJob> {
    let mut spec = spec.clone();
    spec.id.clone_from(&job_id);

    let attempts = options.attempts.unwrap_or(adapter.config().attempts);
    let backoff = options.backoff.unwrap_or(adapter.config().backoff);
    adapter.submit_job_with(&spec, attempts, backoff).await?;

    info!(job_id, "job submitted");
    Ok(RunningJob::new(adapter, job_id))
}
