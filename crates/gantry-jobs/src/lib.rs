//! Running-job handle, job-id negotiation, and execution driver.
//!
//! This crate sits on top of [`gantry_client`] and provides the client-side
//! job lifecycle:
//!
//! - [`RunningJob`] - a live remote job: cached info sections, incremental
//!   log tailing, status observation
//! - [`generate_job_id`] / [`reattach_job`] - suffix-probing id negotiation
//! - [`execute`] - the end-to-end submit-or-reattach flow

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod execute;
mod negotiate;
mod running;

pub use execute::{ExecuteOptions, execute};
pub use negotiate::{generate_job_id, reattach_job};
pub use running::RunningJob;
