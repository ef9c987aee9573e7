//! Protocol mapping from logical job operations to HTTP verbs and paths.

use crate::call::{RestClient, RetryPolicy};
use crate::config::ClientConfig;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use gantry_types::{GantryError, JobSpec, JobStatus, Result, Section};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Adapter for the remote job service's REST API.
///
/// Thin mapping from logical operations (submit, status, info sections, log
/// retrieval, kill) to authenticated HTTP calls through [`RestClient`].
#[derive(Debug, Clone)]
pub struct JobAdapter {
    rest: RestClient,
    config: ClientConfig,
}

impl JobAdapter {
    /// Creates an adapter with a production HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> std::result::Result<Self, reqwest::Error> {
        let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Creates an adapter over an explicit transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let rest = RestClient::new(transport, config.auth.clone());
        Self { rest, config }
    }

    /// The adapter's configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn jobs_url(&self) -> String {
        format!("{}/api/v1/jobs", self.config.base_url.trim_end_matches('/'))
    }

    fn job_url(&self, job_id: &str) -> String {
        format!("{}/{}", self.jobs_url(), job_id)
    }

    /// The timeout actually attached to a request: the caller's value, the
    /// configured default, or nothing at all in disabled-timeout mode.
    fn effective_timeout(&self, requested: Option<Duration>) -> Option<Duration> {
        if self.config.disable_timeout {
            None
        } else {
            Some(requested.unwrap_or(self.config.timeout))
        }
    }

    fn default_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.attempts, self.config.backoff)
    }

    /// Submits a job spec with the configured attempts and backoff.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::Conflict`] on an id collision (HTTP 409, never
    /// retried); other terminal failures propagate from the call layer.
    pub async fn submit_job(&self, spec: &JobSpec) -> Result<()> {
        self.submit_job_with(spec, self.config.attempts, self.config.backoff)
            .await
    }

    /// Submits a job spec with explicit attempts and backoff.
    ///
    /// # Errors
    ///
    /// Same as [`submit_job`](Self::submit_job).
    pub async fn submit_job_with(
        &self,
        spec: &JobSpec,
        attempts: u32,
        backoff: Duration,
    ) -> Result<()> {
        // Id collisions are the execution driver's responsibility; retrying
        // them here would mask the collision.
        let policy = RetryPolicy::new(attempts, backoff).failure_codes(&[409]);
        let request = HttpRequest::post(self.jobs_url(), spec.payload())
            .timeout(self.effective_timeout(None));

        info!(job_id = %spec.id, "submitting job");
        match self.rest.call(request, &policy).await {
            Ok(_) => Ok(()),
            Err(GantryError::Http { status: 409, .. }) => {
                Err(GantryError::Conflict(spec.id.clone()))
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches the job resource or one of its sub-paths as JSON.
    ///
    /// When `if_not_found` is supplied it is returned in place of a terminal
    /// not-found or HTTP failure, so an aggregate fetch can tolerate missing
    /// sections.
    ///
    /// # Errors
    ///
    /// Without a default: [`GantryError::NotFound`] for a missing job, or the
    /// terminal call-layer error.
    pub async fn get(
        &self,
        job_id: &str,
        path: Option<&str>,
        if_not_found: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let url = match path {
            Some(path) => format!("{}/{}", self.job_url(job_id), path),
            None => self.job_url(job_id),
        };
        let mut request = HttpRequest::get(url).timeout(self.effective_timeout(timeout));
        if path == Some("output") {
            request = request.header("Accept", "application/json");
        }

        match self.rest.call(request, &self.default_policy()).await {
            Ok(Some(response)) => Ok(response.json()?),
            Ok(None) => Err(GantryError::NotFound(format!("job {job_id} not found"))),
            Err(err @ (GantryError::NotFound(_) | GantryError::Http { .. })) => {
                if let Some(default) = if_not_found {
                    warn!(job_id, path, error = %err, "substituting default for failed fetch");
                    Ok(default)
                } else if err.is_not_found() {
                    Err(GantryError::NotFound(format!("job {job_id} not found")))
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches job information for the running-job handle.
    ///
    /// With a section, only that section is fetched and normalized. Without
    /// one, all sections are fetched sequentially in the fixed order job ->
    /// request -> applications -> cluster -> command -> execution -> output,
    /// every sub-call sharing the one `timeout`, and the normalized fragments
    /// merged.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NotFound`] if the job or request section is
    /// missing; other sections fall back to their empty defaults.
    pub async fn job_info(
        &self,
        job_id: &str,
        section: Option<Section>,
        timeout: Option<Duration>,
    ) -> Result<Map<String, Value>> {
        match section {
            Some(section) => self.section_info(job_id, section, timeout).await,
            None => {
                let mut merged = Map::new();
                for section in Section::ALL {
                    let fragment = self.section_info(job_id, section, timeout).await?;
                    merged.extend(fragment);
                }
                Ok(merged)
            }
        }
    }

    async fn section_info(
        &self,
        job_id: &str,
        section: Section,
        timeout: Option<Duration>,
    ) -> Result<Map<String, Value>> {
        debug!(job_id, section = %section, "fetching info section");
        let data = self
            .get(job_id, section.path(), section.if_not_found(), timeout)
            .await?;
        Ok(normalize(section, data))
    }

    /// Fetches only the job's status field.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NotFound`] if the job does not exist, or
    /// [`GantryError::Protocol`] if the status field is missing or unknown.
    pub async fn get_status(&self, job_id: &str, timeout: Option<Duration>) -> Result<JobStatus> {
        let value = self.get(job_id, Some("status"), None, timeout).await?;
        let raw = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| GantryError::Protocol(format!("no status field for job {job_id}")))?;
        JobStatus::parse(raw)
            .ok_or_else(|| GantryError::Protocol(format!("unknown job status '{raw}'")))
    }

    /// Fetches the job's stderr log, optionally a byte range of it.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::LogNotFound`] when the log does not exist.
    pub async fn get_stderr(
        &self,
        job_id: &str,
        range: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.get_log(job_id, "stderr", range, timeout).await
    }

    /// Fetches the job's stdout log, optionally a byte range of it.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::LogNotFound`] when the log does not exist.
    pub async fn get_stdout(
        &self,
        job_id: &str,
        range: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.get_log(job_id, "stdout", range, timeout).await
    }

    /// Fetches the job runner's own log, optionally a byte range of it.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::LogNotFound`] when the log does not exist.
    pub async fn get_run_log(
        &self,
        job_id: &str,
        range: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.get_log(job_id, "run.log", range, timeout).await
    }

    /// Fetches a named file from the job's output directory.
    ///
    /// A `range` of the form `bytes=<start>-[<end>]` is forwarded as an HTTP
    /// `Range` header for byte-accurate incremental retrieval.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::LogNotFound`] when the file does not exist,
    /// distinct from a generic HTTP error.
    pub async fn get_log(
        &self,
        job_id: &str,
        filename: &str,
        range: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let url = format!("{}/output/{}", self.job_url(job_id), filename);
        let mut request = HttpRequest::get(url).timeout(self.effective_timeout(timeout));
        if let Some(range) = range {
            request = request.header("Range", range);
        }

        match self.rest.call(request, &self.default_policy()).await {
            Ok(Some(response)) => Ok(response.text()),
            Ok(None) | Err(GantryError::NotFound(_)) => Err(GantryError::LogNotFound(format!(
                "{filename} for job {job_id}"
            ))),
            Err(err) => Err(err),
        }
    }

    /// Terminates a running job.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NotFound`] if the job does not exist.
    pub async fn kill_job(&self, job_id: &str) -> Result<()> {
        let request =
            HttpRequest::delete(self.job_url(job_id)).timeout(self.effective_timeout(None));

        warn!(job_id, "killing job");
        match self.rest.call(request, &self.default_policy()).await {
            Ok(_) => Ok(()),
            Err(GantryError::NotFound(_)) => {
                Err(GantryError::NotFound(format!("job {job_id} not found")))
            }
            Err(err) => Err(err),
        }
    }
}

/// Flattens a section response into the handle's field vocabulary.
fn normalize(section: Section, data: Value) -> Map<String, Value> {
    let mut out = Map::new();
    match section {
        Section::Job => {
            copy(&data, &mut out, "id", "id");
            copy(&data, &mut out, "name", "name");
            copy(&data, &mut out, "user", "user");
            copy(&data, &mut out, "status", "status");
            copy(&data, &mut out, "statusMsg", "status_msg");
            copy(&data, &mut out, "commandArgs", "command_args");
            copy(&data, &mut out, "description", "description");
            copy(&data, &mut out, "grouping", "grouping");
            copy(&data, &mut out, "groupingInstance", "grouping_instance");
            copy(&data, &mut out, "metadata", "metadata");
            copy(&data, &mut out, "started", "started");
            copy(&data, &mut out, "finished", "finished");
        }
        Section::Request => {
            out.insert("request_data".to_string(), data);
        }
        Section::Applications => {
            out.insert("applications".to_string(), data);
        }
        Section::Cluster => {
            copy(&data, &mut out, "name", "cluster_name");
            out.insert("cluster_data".to_string(), data);
        }
        Section::Command => {
            copy(&data, &mut out, "name", "command_name");
            out.insert("command_data".to_string(), data);
        }
        Section::Execution => {
            out.insert("execution_data".to_string(), data);
        }
        Section::Output => {
            for (file, key) in [
                ("stdout", "stdout_size"),
                ("stderr", "stderr_size"),
                ("run.log", "run_log_size"),
            ] {
                if let Some(size) = file_size(&data, file) {
                    out.insert(key.to_string(), Value::from(size));
                }
            }
            if let Some(files) = data.get("files") {
                out.insert("output_files".to_string(), files.clone());
            }
        }
    }
    out
}

/// Copies `from` out of `data` under the key `to`, skipping absent fields.
fn copy(data: &Value, out: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = data.get(from) {
        if !value.is_null() {
            out.insert(to.to_string(), value.clone());
        }
    }
}

/// Size of a named file in the output manifest.
fn file_size(data: &Value, name: &str) -> Option<u64> {
    data.get("files")?
        .as_array()?
        .iter()
        .find(|file| file.get("name").and_then(Value::as_str) == Some(name))?
        .get("size")?
        .as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Auth;
    use crate::testing::FakeTransport;
    use reqwest::Method;
    use serde_json::json;

    fn fast_config() -> ClientConfig {
        ClientConfig {
            backoff: Duration::ZERO,
            ..ClientConfig::new("http://gantry.test:8080")
        }
    }

    fn adapter(transport: &Arc<FakeTransport>) -> JobAdapter {
        JobAdapter::with_transport(fast_config(), transport.clone() as Arc<dyn Transport>)
    }

    fn spec() -> JobSpec {
        JobSpec::new("job-1", "test job", "tester")
    }

    #[tokio::test]
    async fn test_submit_job() {
        let transport = FakeTransport::with_statuses(&[202]);
        adapter(&transport).submit_job(&spec()).await.unwrap();

        let request = transport.request(0);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "http://gantry.test:8080/api/v1/jobs");
        assert_eq!(request.body.unwrap()["id"], "job-1");
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_submit_job_conflict_not_retried() {
        let transport = FakeTransport::with_statuses(&[409, 202, 503]);
        let err = adapter(&transport).submit_job(&spec()).await.unwrap_err();

        assert!(matches!(err, GantryError::Conflict(id) if id == "job-1"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_job_retries_transient_codes() {
        let transport = FakeTransport::with_statuses(&[403, 412, 503, 504, 202]);
        adapter(&transport)
            .submit_job_with(&spec(), 15, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test]
    async fn test_get_returns_default_on_404() {
        let transport = FakeTransport::with_statuses(&[404]);
        let value = adapter(&transport)
            .get("job-dne", Some("output"), Some(json!("DEFAULT")), None)
            .await
            .unwrap();

        assert_eq!(value, json!("DEFAULT"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_get_returns_default_after_5xx_exhaustion() {
        let transport = FakeTransport::with_statuses(&[500, 500, 500]);
        let config = ClientConfig {
            attempts: 3,
            ..fast_config()
        };
        let adapter = JobAdapter::with_transport(config, transport.clone() as Arc<dyn Transport>);
        let value = adapter
            .get("job-500", Some("output"), Some(json!({})), None)
            .await
            .unwrap();

        assert_eq!(value, json!({}));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_get_without_default_maps_to_job_not_found() {
        let transport = FakeTransport::with_statuses(&[404]);
        let err = adapter(&transport)
            .get("job-dne", None, None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::NotFound(msg) if msg.contains("job-dne")));
    }

    #[tokio::test]
    async fn test_job_info_all_sections_fixed_order() {
        let transport = FakeTransport::new();
        transport.push_json(json!({"id": "111-all", "status": "RUNNING"}));
        transport.push_json(json!({"cpu": 2}));
        transport.push_json(json!([]));
        transport.push_json(json!({"name": "prod-cluster"}));
        transport.push_json(json!({"name": "sparksubmit"}));
        transport.push_json(json!({"hostName": "a1.example"}));
        transport.push_json(json!({"files": [{"name": "stderr", "size": 12}]}));

        let info = adapter(&transport)
            .job_info("111-all", None, Some(Duration::from_secs(1)))
            .await
            .unwrap();

        let base = "http://gantry.test:8080/api/v1/jobs/111-all";
        let urls: Vec<String> = transport.requests().iter().map(|r| r.url.clone()).collect();
        assert_eq!(
            urls,
            [
                base.to_string(),
                format!("{base}/request"),
                format!("{base}/applications"),
                format!("{base}/cluster"),
                format!("{base}/command"),
                format!("{base}/execution"),
                format!("{base}/output"),
            ]
        );

        // One shared timeout across every sub-call.
        for request in transport.requests() {
            assert_eq!(request.timeout, Some(Duration::from_secs(1)));
        }

        // Only the output fetch asks for the JSON manifest.
        assert_eq!(
            transport.request(6).header_value("accept"),
            Some("application/json")
        );
        assert_eq!(transport.request(0).header_value("accept"), None);

        assert_eq!(info["status"], "RUNNING");
        assert_eq!(info["cluster_name"], "prod-cluster");
        assert_eq!(info["command_name"], "sparksubmit");
        assert_eq!(info["request_data"]["cpu"], 2);
        assert_eq!(info["execution_data"]["hostName"], "a1.example");
        assert_eq!(info["stderr_size"], 12);
    }

    #[tokio::test]
    async fn test_job_info_missing_sections_use_defaults() {
        let transport = FakeTransport::new();
        transport.push_json(json!({"id": "111-sparse", "status": "INIT"}));
        transport.push_json(json!({}));
        transport.push_status(404); // applications
        transport.push_status(404); // cluster
        transport.push_status(404); // command
        transport.push_status(404); // execution
        transport.push_status(404); // output

        let info = adapter(&transport)
            .job_info("111-sparse", None, None)
            .await
            .unwrap();

        assert_eq!(info["applications"], json!([]));
        assert_eq!(info["cluster_data"], json!({}));
        assert!(!info.contains_key("cluster_name"));
        assert!(!info.contains_key("stderr_size"));
    }

    #[tokio::test]
    async fn test_job_info_single_section() {
        let transport = FakeTransport::new();
        transport.push_json(json!({"name": "prod-cluster", "version": "1.0"}));

        let info = adapter(&transport)
            .job_info("111-cluster", Some(Section::Cluster), None)
            .await
            .unwrap();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(
            transport.request(0).url,
            "http://gantry.test:8080/api/v1/jobs/111-cluster/cluster"
        );
        assert_eq!(info["cluster_name"], "prod-cluster");
    }

    #[tokio::test]
    async fn test_disabled_timeout_suppresses_timeout_everywhere() {
        let transport = FakeTransport::new();
        let config = ClientConfig {
            disable_timeout: true,
            ..fast_config()
        };
        let adapter = JobAdapter::with_transport(config, transport.clone() as Arc<dyn Transport>);

        transport.push_json(json!({"hostName": "a1"}));
        adapter
            .job_info("job-1", Some(Section::Execution), Some(Duration::from_secs(333)))
            .await
            .unwrap();

        transport.push_json(json!({"status": "RUNNING"}));
        adapter
            .get_status("job-1", Some(Duration::from_secs(1)))
            .await
            .unwrap();

        transport.push_text("log line\n");
        adapter
            .get_log("job-1", "some.log", None, Some(Duration::from_secs(111)))
            .await
            .unwrap();

        transport.push_status(202);
        adapter.submit_job(&spec()).await.unwrap();

        for request in transport.requests() {
            assert_eq!(request.timeout, None);
        }
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test]
    async fn test_get_status() {
        let transport = FakeTransport::new();
        transport.push_json(json!({"status": "SUCCEEDED"}));

        let status = adapter(&transport).get_status("job-1", None).await.unwrap();

        assert_eq!(status, JobStatus::Succeeded);
        assert_eq!(
            transport.request(0).url,
            "http://gantry.test:8080/api/v1/jobs/job-1/status"
        );
    }

    #[tokio::test]
    async fn test_get_status_unknown_value() {
        let transport = FakeTransport::new();
        transport.push_json(json!({"status": "WEDGED"}));

        let err = adapter(&transport)
            .get_status("job-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GantryError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_get_stderr_range_header() {
        let transport = FakeTransport::new();
        transport.push_text("line3\nline4\n");

        let text = adapter(&transport)
            .get_stderr("job-1", Some("bytes=12-"), None)
            .await
            .unwrap();

        assert_eq!(text, "line3\nline4\n");
        let request = transport.request(0);
        assert_eq!(
            request.url,
            "http://gantry.test:8080/api/v1/jobs/job-1/output/stderr"
        );
        assert_eq!(request.header_value("range"), Some("bytes=12-"));
    }

    #[tokio::test]
    async fn test_get_stderr_log_not_found() {
        let transport = FakeTransport::with_statuses(&[404]);
        let err = adapter(&transport)
            .get_stderr("job-dne", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::LogNotFound(_)));
    }

    #[tokio::test]
    async fn test_kill_job() {
        let transport = FakeTransport::with_statuses(&[202]);
        adapter(&transport).kill_job("job-1").await.unwrap();

        let request = transport.request(0);
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.url, "http://gantry.test:8080/api/v1/jobs/job-1");
    }

    #[tokio::test]
    async fn test_auth_from_config_reaches_transport() {
        let transport = FakeTransport::new();
        transport.push_json(json!({"status": "RUNNING"}));
        let config = ClientConfig {
            auth: Auth::basic("auth_user", "1234!!!"),
            ..fast_config()
        };
        let adapter = JobAdapter::with_transport(config, transport.clone() as Arc<dyn Transport>);
        adapter.get_status("job-1", None).await.unwrap();

        assert_eq!(
            transport.request(0).auth,
            Auth::basic("auth_user", "1234!!!")
        );
    }
}
