//! Handle over a single live remote job.

use chrono::{DateTime, Utc};
use gantry_client::JobAdapter;
use gantry_types::{GantryError, JobStatus, Result, Section};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Incremental-tail state for one remote log file.
///
/// The cursor (cumulative cached length) only advances; it is reset only by a
/// fresh handle.
#[derive(Debug, Default)]
struct LogTail {
    cached: Option<String>,
    complete: bool,
}

impl LogTail {
    /// Range header for the next fetch: nothing while the cumulative cache is
    /// empty, `bytes=<len>-` afterwards.
    fn range(&self) -> Option<String> {
        match self.cached.as_deref() {
            Some(cached) if !cached.is_empty() => Some(format!("bytes={}-", cached.len())),
            _ => None,
        }
    }

    /// Appends a newly fetched increment. After the first fetch the cache is
    /// an empty string, never unset, so a zero-byte fetch cannot produce a
    /// bogus range later.
    fn absorb(&mut self, chunk: &str, job_done: bool) {
        self.cached.get_or_insert_with(String::new).push_str(chunk);
        if job_done {
            self.complete = true;
        }
    }
}

/// Which remote log file a chunk request targets.
#[derive(Debug, Clone, Copy)]
enum LogFile {
    Stdout,
    Stderr,
    RunLog,
}

impl LogFile {
    const fn size_key(self) -> &'static str {
        match self {
            Self::Stdout => "stdout_size",
            Self::Stderr => "stderr_size",
            Self::RunLog => "run_log_size",
        }
    }
}

/// A single remote job's live state.
///
/// Lazily fetches and caches structured info sections, and exposes
/// incremental stderr/stdout retrieval with byte-accurate range requests.
/// The handle only observes server-reported state; it never transitions the
/// job itself.
///
/// Not thread-safe: all methods take `&mut self` and callers must serialize
/// access to one handle.
#[derive(Debug)]
pub struct RunningJob {
    adapter: Arc<JobAdapter>,
    job_id: String,
    status: Option<JobStatus>,
    status_msg: Option<String>,
    sections: HashMap<Section, Map<String, Value>>,
    stderr_tail: LogTail,
    stdout_tail: LogTail,
}

impl RunningJob {
    /// Creates a handle for the given job id with an empty cache.
    #[must_use]
    pub fn new(adapter: Arc<JobAdapter>, job_id: impl Into<String>) -> Self {
        Self {
            adapter,
            job_id: job_id.into(),
            status: None,
            status_msg: None,
            sections: HashMap::new(),
            stderr_tail: LogTail::default(),
            stdout_tail: LogTail::default(),
        }
    }

    /// Creates a handle seeded with an already-known status, e.g. from
    /// reattachment.
    #[must_use]
    pub fn with_status(adapter: Arc<JobAdapter>, job_id: impl Into<String>, status: JobStatus) -> Self {
        let mut job = Self::new(adapter, job_id);
        job.status = Some(status);
        job
    }

    /// The job's id on the remote service.
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// The job's current status.
    ///
    /// Status is volatile: while the job is non-terminal every access
    /// re-queries the server. Once a terminal status has been observed it is
    /// cached for the lifetime of the handle.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NotFound`] if the job no longer exists.
    pub async fn status(&mut self) -> Result<JobStatus> {
        if let Some(status) = self.status {
            if status.is_done() {
                return Ok(status);
            }
        }
        let status = self.adapter.get_status(&self.job_id, None).await?;
        self.status = Some(status);
        Ok(status)
    }

    /// True iff the job status is terminal (succeeded, failed, or killed).
    ///
    /// # Errors
    ///
    /// Propagates the status fetch.
    pub async fn is_done(&mut self) -> Result<bool> {
        Ok(self.status().await?.is_done())
    }

    /// Re-fetches cached job information.
    ///
    /// With a section, only that section is replaced. Without one, the whole
    /// cache is invalidated and every section is re-fetched in the fixed
    /// order, each sub-call sharing `timeout`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetches.
    pub async fn update(
        &mut self,
        section: Option<Section>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        match section {
            Some(section) => {
                let fragment = self
                    .adapter
                    .job_info(&self.job_id, Some(section), timeout)
                    .await?;
                self.sections.insert(section, fragment);
            }
            None => {
                self.sections.clear();
                self.status_msg = None;
                for section in Section::ALL {
                    let fragment = self
                        .adapter
                        .job_info(&self.job_id, Some(section), timeout)
                        .await?;
                    self.sections.insert(section, fragment);
                }
            }
        }
        Ok(())
    }

    /// Returns the cached section, fetching it on first access.
    ///
    /// Repeat reads of the same section never re-fetch; `update` is the only
    /// invalidation.
    async fn section(&mut self, section: Section) -> Result<&Map<String, Value>> {
        if !self.sections.contains_key(&section) {
            debug!(job_id = %self.job_id, section = %section, "populating section cache");
            let fragment = self.adapter.job_info(&self.job_id, Some(section), None).await?;
            self.sections.insert(section, fragment);
        }
        Ok(&self.sections[&section])
    }

    async fn section_value(&mut self, section: Section, key: &str) -> Result<Option<Value>> {
        Ok(self.section(section).await?.get(key).cloned())
    }

    async fn section_str(&mut self, section: Section, key: &str) -> Result<Option<String>> {
        Ok(self
            .section_value(section, key)
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Name of the cluster the job was scheduled on.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn cluster_name(&mut self) -> Result<Option<String>> {
        self.section_str(Section::Cluster, "cluster_name").await
    }

    /// Command-line arguments the job was submitted with.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn command_args(&mut self) -> Result<Vec<String>> {
        let args = self.section_value(Section::Job, "command_args").await?;
        Ok(args
            .as_ref()
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Requested CPU count, from the original submission request.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn cpu(&mut self) -> Result<Option<u64>> {
        Ok(self
            .section_value(Section::Request, "request_data")
            .await?
            .as_ref()
            .and_then(|data| data.get("cpu"))
            .and_then(Value::as_u64))
    }

    /// Requested memory in MB, from the original submission request.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn memory(&mut self) -> Result<Option<u64>> {
        Ok(self
            .section_value(Section::Request, "request_data")
            .await?
            .as_ref()
            .and_then(|data| data.get("memory"))
            .and_then(Value::as_u64))
    }

    /// Job description.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn description(&mut self) -> Result<Option<String>> {
        self.section_str(Section::Job, "description").await
    }

    /// The original submission request, echoed by the server.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn request_data(&mut self) -> Result<Value> {
        Ok(self
            .section_value(Section::Request, "request_data")
            .await?
            .unwrap_or(Value::Null))
    }

    /// The command the job resolved to.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn command_data(&mut self) -> Result<Value> {
        Ok(self
            .section_value(Section::Command, "command_data")
            .await?
            .unwrap_or(Value::Null))
    }

    /// Execution details (host, process, exit code).
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn execution_data(&mut self) -> Result<Value> {
        Ok(self
            .section_value(Section::Execution, "execution_data")
            .await?
            .unwrap_or(Value::Null))
    }

    /// Applications resolved for the job.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn applications(&mut self) -> Result<Value> {
        Ok(self
            .section_value(Section::Applications, "applications")
            .await?
            .unwrap_or(Value::Null))
    }

    /// Grouping the job belongs to.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn grouping(&mut self) -> Result<Option<String>> {
        self.section_str(Section::Job, "grouping").await
    }

    /// Instance of the grouping the job belongs to.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn grouping_instance(&mut self) -> Result<Option<String>> {
        self.section_str(Section::Job, "grouping_instance").await
    }

    /// Free-form metadata stored with the job.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch.
    pub async fn metadata(&mut self) -> Result<Option<Value>> {
        self.section_value(Section::Job, "metadata").await
    }

    /// When the job started, if it has.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch; [`GantryError::Protocol`] for an
    /// unparseable timestamp.
    pub async fn started(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp("started").await
    }

    /// When the job finished, if it has.
    ///
    /// # Errors
    ///
    /// Propagates the section fetch; [`GantryError::Protocol`] for an
    /// unparseable timestamp.
    pub async fn finished(&mut self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp("finished").await
    }

    async fn timestamp(&mut self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match self.section_str(Section::Job, key).await? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|err| {
                    GantryError::Protocol(format!("bad {key} timestamp '{raw}': {err}"))
                }),
            None => Ok(None),
        }
    }

    /// The job's status message.
    ///
    /// Refetched on every access while the job is running; once the job is
    /// done the message is fetched one final time and cached.
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetches.
    pub async fn status_msg(&mut self) -> Result<Option<String>> {
        if self.is_done().await? {
            if let Some(msg) = &self.status_msg {
                return Ok(Some(msg.clone()));
            }
            let msg = self.fetch_status_msg().await?;
            self.status_msg.clone_from(&msg);
            return Ok(msg);
        }
        self.fetch_status_msg().await
    }

    async fn fetch_status_msg(&mut self) -> Result<Option<String>> {
        let info = self
            .adapter
            .job_info(&self.job_id, Some(Section::Job), None)
            .await?;
        Ok(info
            .get("status_msg")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Cumulative stderr retrieved so far; `None` before the first fetch.
    #[must_use]
    pub fn cached_stderr(&self) -> Option<&str> {
        self.stderr_tail.cached.as_deref()
    }

    /// Cumulative stdout retrieved so far; `None` before the first fetch.
    #[must_use]
    pub fn cached_stdout(&self) -> Option<&str> {
        self.stdout_tail.cached.as_deref()
    }

    /// Fetches the stderr bytes written since the previous call.
    ///
    /// The first call fetches from the start; later calls send
    /// `Range: bytes=<cursor>-`. Only the new increment is returned; the
    /// cumulative text accrues in [`cached_stderr`](Self::cached_stderr).
    /// Once the job is done one final fetch is performed, after which calls
    /// return an empty string without remote I/O.
    ///
    /// # Errors
    ///
    /// Propagates the status and log fetches.
    pub async fn stderr(&mut self, timeout: Option<Duration>) -> Result<String> {
        if self.stderr_tail.complete {
            return Ok(String::new());
        }
        let done = self.is_done().await?;
        let range = self.stderr_tail.range();
        let chunk = self
            .adapter
            .get_stderr(&self.job_id, range.as_deref(), timeout)
            .await?;
        self.stderr_tail.absorb(&chunk, done);
        Ok(chunk)
    }

    /// Fetches the stdout bytes written since the previous call.
    ///
    /// Same cursor semantics as [`stderr`](Self::stderr), with an
    /// independent cursor.
    ///
    /// # Errors
    ///
    /// Propagates the status and log fetches.
    pub async fn stdout(&mut self, timeout: Option<Duration>) -> Result<String> {
        if self.stdout_tail.complete {
            return Ok(String::new());
        }
        let done = self.is_done().await?;
        let range = self.stdout_tail.range();
        let chunk = self
            .adapter
            .get_stdout(&self.job_id, range.as_deref(), timeout)
            .await?;
        self.stdout_tail.absorb(&chunk, done);
        Ok(chunk)
    }

    /// Polls stderr until the job reaches a terminal state, writing each
    /// non-empty increment to `out`, then flushes any trailing output with
    /// one final fetch.
    ///
    /// Sleeps `interval` between iterations; a zero interval polls without
    /// sleeping. There is no built-in cancellation beyond the job finishing.
    ///
    /// # Errors
    ///
    /// Propagates fetch and write failures.
    pub async fn watch_stderr<W: Write>(&mut self, interval: Duration, out: &mut W) -> Result<()> {
        while !self.is_done().await? {
            let chunk = self.stderr(None).await?;
            if !chunk.is_empty() {
                out.write_all(chunk.as_bytes())?;
                out.flush()?;
            }
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }
        let chunk = self.stderr(None).await?;
        out.write_all(chunk.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Fetches a chunk of stderr by byte range.
    ///
    /// Without an offset the last `size` bytes are fetched; with one, bytes
    /// `offset..offset + size`. Returns `None` without fetching the log when
    /// the server reports the log as empty.
    ///
    /// # Errors
    ///
    /// Propagates the size and log fetches.
    pub async fn stderr_chunk(&mut self, size: u64, offset: Option<u64>) -> Result<Option<String>> {
        self.log_chunk(LogFile::Stderr, size, offset).await
    }

    /// Fetches a chunk of stdout by byte range; see
    /// [`stderr_chunk`](Self::stderr_chunk).
    ///
    /// # Errors
    ///
    /// Propagates the size and log fetches.
    pub async fn stdout_chunk(&mut self, size: u64, offset: Option<u64>) -> Result<Option<String>> {
        self.log_chunk(LogFile::Stdout, size, offset).await
    }

    /// Fetches a chunk of the runner log by byte range; see
    /// [`stderr_chunk`](Self::stderr_chunk).
    ///
    /// # Errors
    ///
    /// Propagates the size and log fetches.
    pub async fn run_log_chunk(
        &mut self,
        size: u64,
        offset: Option<u64>,
    ) -> Result<Option<String>> {
        self.log_chunk(LogFile::RunLog, size, offset).await
    }

    async fn log_chunk(
        &mut self,
        file: LogFile,
        size: u64,
        offset: Option<u64>,
    ) -> Result<Option<String>> {
        // Sizes move while the job runs, so the output manifest is fetched
        // fresh rather than through the section cache.
        let info = self
            .adapter
            .job_info(&self.job_id, Some(Section::Output), None)
            .await?;
        let total = info.get(file.size_key()).and_then(Value::as_u64).unwrap_or(0);
        if total == 0 {
            return Ok(None);
        }

        let range = match offset {
            None => format!("bytes=-{size}"),
            Some(offset) => format!("bytes={offset}-{}", offset.saturating_add(size)),
        };
        let text = match file {
            LogFile::Stderr => {
                self.adapter
                    .get_stderr(&self.job_id, Some(&range), None)
                    .await?
            }
            LogFile::Stdout => {
                self.adapter
                    .get_stdout(&self.job_id, Some(&range), None)
                    .await?
            }
            LogFile::RunLog => {
                self.adapter
                    .get_run_log(&self.job_id, Some(&range), None)
                    .await?
            }
        };
        Ok(Some(text))
    }

    /// Terminates the job on the remote service.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NotFound`] if the job no longer exists.
    pub async fn kill(&mut self) -> Result<()> {
        self.adapter.kill_job(&self.job_id).await
    }
}
