//! Job specification consumed at submission time.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A description of work to run on the remote service.
///
/// A spec is built up by the caller, submitted once, and discarded after
/// submission or reattachment produces a running-job handle. The execution
/// driver only mutates the [`id`](Self::id) slot, when id negotiation assigns
/// a suffix-qualified id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Desired job id. Uniqueness is enforced by the server, not locally.
    pub id: String,
    /// Human-readable job name.
    pub name: String,
    /// User submitting the job.
    pub user: String,
    /// Job version label.
    pub version: String,
    /// Command-line arguments for the job.
    pub command_args: Vec<String>,
    /// Tags attached to the job record.
    pub tags: Vec<String>,
    /// File dependencies staged into the job working directory.
    pub dependencies: Vec<String>,
    /// Tags used to select a cluster.
    pub cluster_tags: Vec<String>,
    /// Tags used to select a command.
    pub command_tags: Vec<String>,
    /// Requested CPU count.
    pub cpu: Option<u32>,
    /// Requested memory in MB.
    pub memory: Option<u32>,
    /// Grouping this job belongs to (e.g. a workflow name).
    pub grouping: Option<String>,
    /// Instance of the grouping (e.g. a workflow run).
    pub grouping_instance: Option<String>,
    /// Free-form metadata stored with the job.
    pub metadata: Option<Value>,
    /// Job description.
    pub description: Option<String>,
}

impl JobSpec {
    /// Creates a spec with the given id, name, and user; everything else
    /// starts empty.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            user: user.into(),
            version: "0.0".to_string(),
            command_args: Vec::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            cluster_tags: Vec::new(),
            command_tags: Vec::new(),
            cpu: None,
            memory: None,
            grouping: None,
            grouping_instance: None,
            metadata: None,
            description: None,
        }
    }

    /// Shapes the spec into the submission payload expected by the server.
    ///
    /// This is the read-only snapshot the adapter POSTs; the spec itself is
    /// never sent verbatim.
    #[must_use]
    pub fn payload(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("name".to_string(), json!(self.name));
        map.insert("user".to_string(), json!(self.user));
        map.insert("version".to_string(), json!(self.version));
        map.insert("commandArgs".to_string(), json!(self.command_args));
        map.insert("tags".to_string(), json!(self.tags));
        map.insert("dependencies".to_string(), json!(self.dependencies));
        map.insert(
            "clusterCriterias".to_string(),
            json!([{"tags": self.cluster_tags}]),
        );
        map.insert("commandCriteria".to_string(), json!(self.command_tags));
        if let Some(cpu) = self.cpu {
            map.insert("cpu".to_string(), json!(cpu));
        }
        if let Some(memory) = self.memory {
            map.insert("memory".to_string(), json!(memory));
        }
        if let Some(grouping) = &self.grouping {
            map.insert("grouping".to_string(), json!(grouping));
        }
        if let Some(instance) = &self.grouping_instance {
            map.insert("groupingInstance".to_string(), json!(instance));
        }
        if let Some(metadata) = &self.metadata {
            map.insert("metadata".to_string(), metadata.clone());
        }
        if let Some(description) = &self.description {
            map.insert("description".to_string(), json!(description));
        }
        Value::Object(map)
    }
}
