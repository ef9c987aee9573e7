//! HTTP call layer and remote job adapter for the gantry batch-job client.
//!
//! This crate provides the protocol plumbing between a client process and the
//! remote job service:
//!
//! - [`Transport`] - the seam between logical requests and the wire
//! - [`RestClient`] - a single logical call with retry/backoff driven by
//!   response status codes and transport failures
//! - [`JobAdapter`] - logical job operations (submit, status, info sections,
//!   log retrieval, kill) mapped onto HTTP verbs and paths

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod auth;
mod call;
mod config;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use adapter::JobAdapter;
pub use auth::Auth;
pub use call::{RestClient, RetryPolicy};
pub use config::ClientConfig;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
