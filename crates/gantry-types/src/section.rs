//! Named subsets of a job's remote metadata.

use serde_json::{Value, json};

/// A named subset of a job's remote metadata, fetched and cached
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The job record itself (status, command args, grouping, metadata).
    Job,
    /// The original submission request (resource asks, tags, dependencies).
    Request,
    /// Applications resolved for the job.
    Applications,
    /// The cluster the job was scheduled on.
    Cluster,
    /// The command the job resolved to.
    Command,
    /// Execution details (host, process, exit code).
    Execution,
    /// Output manifest (file names and sizes).
    Output,
}

impl Section {
    /// All sections in the fixed aggregate-fetch order.
    pub const ALL: [Self; 7] = [
        Self::Job,
        Self::Request,
        Self::Applications,
        Self::Cluster,
        Self::Command,
        Self::Execution,
        Self::Output,
    ];

    /// The URL path segment under the job resource, or `None` for the job
    /// record itself.
    #[must_use]
    pub const fn path(&self) -> Option<&'static str> {
        match self {
            Self::Job => None,
            Self::Request => Some("request"),
            Self::Applications => Some("applications"),
            Self::Cluster => Some("cluster"),
            Self::Command => Some("command"),
            Self::Execution => Some("execution"),
            Self::Output => Some("output"),
        }
    }

    /// Default value substituted when the section is missing on the server.
    ///
    /// `None` means a missing section is an error for this section: the job
    /// record and the original request must exist for any job the client can
    /// observe.
    #[must_use]
    pub fn if_not_found(&self) -> Option<Value> {
        match self {
            Self::Job | Self::Request => None,
            Self::Applications => Some(json!([])),
            Self::Cluster | Self::Command | Self::Execution | Self::Output => Some(json!({})),
        }
    }

    /// Section name used in logs and cache keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Request => "request",
            Self::Applications => "applications",
            Self::Cluster => "cluster",
            Self::Command => "command",
            Self::Execution => "execution",
            Self::Output => "output",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
