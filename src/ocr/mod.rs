//! Asynchronous OCR jobs.
//!
//! A document goes through three phases here:
//!
//! 1. [`OcrService::submit`] starts a text detection job and hands back a
//!    [`JobHandle`].
//! 2. [`poller::JobPoller`] waits until the job reaches a terminal
//!    [`JobStatus`].
//! 3. [`aggregate::fetch_all_pages`] follows the continuation token chain, and
//!    [`aggregate::flatten_lines`] turns the pages into plain text.
//!
//! The service itself sits behind a trait so that the batch logic can be
//! tested without AWS.

use std::fmt;

use crate::{errors::DocumentError, prelude::*, storage::DocumentRef};

pub mod aggregate;
pub mod poller;
pub mod textract;

/// Opaque identifier for one OCR job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wrap a job ID returned by the service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw job ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a job is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Will this status ever change again?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// The granularity of a detected item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetectionKind {
    /// A full line of text. The only kind we keep.
    Line,
    /// A single word. Words repeat the text of their line.
    Word,
    /// Pages, cells, and anything else the service reports.
    Other,
}

/// One detected item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    pub kind: DetectionKind,
    pub text: Option<String>,
}

#[cfg(test)]
impl Detection {
    /// A line detection with text.
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            kind: DetectionKind::Line,
            text: Some(text.into()),
        }
    }

    /// A word detection with text.
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            kind: DetectionKind::Word,
            text: Some(text.into()),
        }
    }
}

/// One page of job results, as returned by a single fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub detections: Vec<Detection>,

    /// Token for fetching the next page. `None` on the last page.
    pub next_token: Option<String>,
}

/// Interface to an asynchronous OCR service.
#[async_trait]
pub trait OcrService: Send + Sync + 'static {
    /// Start a text detection job for `document`.
    async fn submit(&self, document: &DocumentRef) -> Result<JobHandle, DocumentError>;

    /// Ask for the current status of a job.
    async fn job_status(&self, job: &JobHandle) -> Result<JobStatus, DocumentError>;

    /// Fetch one page of results. `token` is `None` for the first page.
    ///
    /// Errors should use [`DocumentError::Aggregation`]; the page index is
    /// filled in by the caller.
    async fn fetch_page(
        &self,
        job: &JobHandle,
        token: Option<&str>,
    ) -> Result<ResultPage, DocumentError>;
}

#[cfg(test)]
pub mod fake {
    //! A scripted [`OcrService`] for tests.

    use std::{
        collections::{HashMap, VecDeque},
        sync::Mutex,
    };

    use super::*;

    /// What the fake should do for one document.
    #[derive(Clone, Debug)]
    pub struct Script {
        /// Reject the submission with this message.
        pub reject: Option<String>,
        /// Statuses returned by successive polls. The last one repeats.
        pub statuses: Vec<JobStatus>,
        /// Pages, chained together with tokens `"t1"`, `"t2"`, ...
        pub pages: Vec<Vec<Detection>>,
        /// Fail when fetching the page at this index.
        pub fail_page: Option<usize>,
        /// Fail every status query with this message.
        pub status_error: Option<String>,
        /// End the token chain with `Some("")` instead of `None`.
        pub empty_final_token: bool,
    }

    impl Script {
        /// A job that succeeds after one poll, with the given pages.
        pub fn succeeds_with(pages: Vec<Vec<Detection>>) -> Self {
            Self {
                reject: None,
                statuses: vec![JobStatus::Succeeded],
                pages,
                fail_page: None,
                status_error: None,
                empty_final_token: false,
            }
        }
    }

    /// Every call the fake has received, in order.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        Submit(String),
        Status(String),
        Fetch(String, Option<String>),
    }

    /// Scripted OCR service keyed by object key. Job IDs are `job-<key>`.
    #[derive(Default)]
    pub struct FakeOcr {
        scripts: HashMap<String, Script>,
        pending_statuses: Mutex<HashMap<String, VecDeque<JobStatus>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeOcr {
        /// Script the behavior for one object key.
        pub fn with_script(mut self, key: &str, script: Script) -> Self {
            self.pending_statuses
                .get_mut()
                .expect("lock poisoned")
                .insert(job_id_for(key), script.statuses.iter().copied().collect());
            self.scripts.insert(job_id_for(key), script);
            self
        }

        /// All calls so far.
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("lock poisoned").clone()
        }

        /// How many status queries have we answered?
        pub fn status_call_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Status(_)))
                .count()
        }

        /// How many page fetches have we answered?
        pub fn fetch_call_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Fetch(..)))
                .count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().expect("lock poisoned").push(call);
        }

        fn script(&self, job: &JobHandle) -> &Script {
            self.scripts
                .get(job.as_str())
                .unwrap_or_else(|| panic!("no script for {job}"))
        }
    }

    fn job_id_for(key: &str) -> String {
        format!("job-{key}")
    }

    fn token_for(index: usize) -> String {
        format!("t{index}")
    }

    #[async_trait]
    impl OcrService for FakeOcr {
        async fn submit(&self, document: &DocumentRef) -> Result<JobHandle, DocumentError> {
            self.record(Call::Submit(document.key.clone()));
            let job = JobHandle::new(job_id_for(&document.key));
            match &self.script(&job).reject {
                Some(message) => Err(DocumentError::Submission {
                    key: document.key.clone(),
                    message: message.clone(),
                }),
                None => Ok(job),
            }
        }

        async fn job_status(&self, job: &JobHandle) -> Result<JobStatus, DocumentError> {
            self.record(Call::Status(job.to_string()));
            if let Some(message) = &self.script(job).status_error {
                return Err(DocumentError::Status {
                    job_id: job.to_string(),
                    message: message.clone(),
                });
            }
            let mut pending = self.pending_statuses.lock().expect("lock poisoned");
            let queue = pending
                .get_mut(job.as_str())
                .unwrap_or_else(|| panic!("no script for {job}"));
            let status = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().copied()
            };
            Ok(status.unwrap_or(JobStatus::Running))
        }

        async fn fetch_page(
            &self,
            job: &JobHandle,
            token: Option<&str>,
        ) -> Result<ResultPage, DocumentError> {
            self.record(Call::Fetch(job.to_string(), token.map(str::to_owned)));
            let script = self.script(job);
            let index = match token {
                None => 0,
                Some(token) => token[1..].parse::<usize>().expect("bad fake token"),
            };
            if script.fail_page == Some(index) {
                return Err(DocumentError::Aggregation {
                    job_id: job.to_string(),
                    page_index: index,
                    message: "simulated fetch failure".to_owned(),
                });
            }
            let detections = script.pages.get(index).cloned().unwrap_or_default();
            let next_token = if index + 1 < script.pages.len() {
                Some(token_for(index + 1))
            } else if script.empty_final_token {
                Some(String::new())
            } else {
                None
            };
            Ok(ResultPage {
                detections,
                next_token,
            })
        }
    }
}
