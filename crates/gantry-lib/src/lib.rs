//! Resilient client for a remote batch-job HTTP service.
//!
//! This is a facade crate that re-exports functionality from the gantry
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use gantry_lib::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = Arc::new(JobAdapter::new(ClientConfig::new(
//!         "http://gantry.example.com:8080",
//!     ))?);
//!
//!     let spec = JobSpec::new("nightly-report", "nightly report", "etl");
//!     let mut job = execute(adapter, &spec, &ExecuteOptions::default()).await?;
//!
//!     job.watch_stderr(std::time::Duration::from_secs(3), &mut std::io::stderr())
//!         .await?;
//!     println!("{} finished: {}", job.job_id(), job.status().await?);
//!
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gantry-rs/gantry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use gantry_types::*;

// Re-export the call layer and job adapter
#[cfg(feature = "client")]
pub use gantry_client::{
    Auth, ClientConfig, HttpRequest, HttpResponse, JobAdapter, RestClient, RetryPolicy, Transport,
};

// Re-export the job lifecycle
#[cfg(feature = "jobs")]
pub use gantry_jobs::{ExecuteOptions, RunningJob, execute, generate_job_id, reattach_job};

/// Prelude module for convenient imports.
///
/// ```
/// use gantry_lib::prelude::*;
/// ```
pub mod prelude {
    pub use gantry_types::{GantryError, JobSpec, JobStatus, Result, Section, TransportError};

    #[cfg(feature = "client")]
    pub use gantry_client::{Auth, ClientConfig, JobAdapter, RetryPolicy};

    #[cfg(feature = "jobs")]
    pub use gantry_jobs::{ExecuteOptions, RunningJob, execute, generate_job_id, reattach_job};
}
