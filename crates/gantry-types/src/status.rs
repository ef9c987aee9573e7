//! Server-reported job status.

use serde::{Deserialize, Serialize};

/// Status of a remote job as reported by the server.
///
/// The client never transitions a job itself; it only observes server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Job has been accepted but not yet started.
    #[default]
    Init,
    /// Job was accepted by the server and is queued.
    Accepted,
    /// Job was claimed by an agent but has not started running.
    Claimed,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Succeeded,
    /// Job failed.
    Failed,
    /// Job was killed.
    Killed,
}

impl JobStatus {
    /// Returns true if the status is terminal.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Killed)
    }

    /// Returns the status as the server's string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Accepted => "ACCEPTED",
            Self::Claimed => "CLAIMED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        }
    }

    /// Parses a status string as reported by the server (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "INIT" => Some(Self::Init),
            "ACCEPTED" => Some(Self::Accepted),
            "CLAIMED" => Some(Self::Claimed),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "KILLED" => Some(Self::Killed),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
