//! Core types for the gantry batch-job client.
//!
//! This crate holds the shared vocabulary used across the gantry workspace:
//!
//! - [`JobStatus`] - server-reported job states
//! - [`Section`] - named subsets of a job's remote metadata
//! - [`JobSpec`] - an immutable-once-submitted description of work
//! - [`GantryError`] / [`TransportError`] - the error taxonomy

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod section;
mod spec;
mod status;

pub use error::{GantryError, Result, TransportError};
pub use section::Section;
pub use spec::JobSpec;
pub use status::JobStatus;
