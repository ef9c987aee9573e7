//! Client configuration.

use crate::auth::Auth;
use std::time::Duration;

/// Configuration for the job client.
///
/// Built in memory by the caller; loading and merging configuration files is
/// left to the embedding application.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the job service, e.g. `http://gantry.example.com:8080`.
    pub base_url: String,
    /// Default per-request timeout applied by the adapter.
    pub timeout: Duration,
    /// When set, no timeout is attached to any outgoing request, regardless
    /// of caller arguments.
    pub disable_timeout: bool,
    /// Default retry attempts per logical call.
    pub attempts: u32,
    /// Default delay between retry attempts.
    pub backoff: Duration,
    /// Credentials attached to every outgoing call.
    pub auth: Auth,
    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given service URL with defaults for
    /// everything else.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            disable_timeout: false,
            attempts: 4,
            backoff: Duration::from_secs(5),
            auth: Auth::None,
            user_agent: format!("gantry/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
