//! The job pipeline: one logical operation against a Google service.
//!
//! A [`Job`] owns a FIFO queue of requests and dispatches them one at a time
//! through a [`Transport`]. What to send and how to read the replies is
//! decided by a [`JobHandler`]:
//!
//! - [`Fetch`] lists a collection page by page, or fetches one object.
//! - [`Create`] and [`Modify`] send one request per input object, in order.
//! - [`Delete`] deletes a list of ids, in order.
//!
//! A job runs `Idle -> Running -> Finished` and produces a single
//! [`JobOutcome`]. Executing consumes the job, so it cannot be reused.

mod batch;
mod delete;
mod fetch;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::error::{ErrorCode, GapiError, Result};
use crate::transport::{ContentType, Reply, Request, Transport};

pub use batch::{Create, CreateJob, Modify, ModifyJob};
pub use delete::{Delete, DeleteJob};
pub use fetch::{Fetch, FetchJob};

/// Lifecycle of a job. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Finished,
}

/// Progress callback, called with `(processed, total)`.
pub type ProgressFn = Box<dyn FnMut(u64, u64) + Send>;

/// Mutable job state handed to a [`JobHandler`].
pub struct JobContext {
    state: JobState,
    queue: VecDeque<Request>,
    error: ErrorCode,
    error_string: String,
    progress: Option<ProgressFn>,
}

impl JobContext {
    fn new() -> Self {
        Self {
            state: JobState::Idle,
            queue: VecDeque::new(),
            error: ErrorCode::NoError,
            error_string: String::new(),
            progress: None,
        }
    }

    /// Append a request to the queue. It is sent once every request enqueued
    /// before it has been answered.
    pub fn enqueue_request(&mut self, request: Request) {
        if self.state == JobState::Finished {
            warn!(url = %request.url, "request enqueued on a finished job, dropping it");
            return;
        }
        self.queue.push_back(request);
    }

    /// Record the terminal error code. Does not stop the job by itself.
    pub fn set_error(&mut self, code: ErrorCode) {
        self.error = code;
    }

    pub fn set_error_string(&mut self, text: impl Into<String>) {
        self.error_string = text.into();
    }

    /// Record an error and finish the job, dropping pending requests.
    pub fn fail(&mut self, code: ErrorCode, text: impl Into<String>) {
        self.set_error(code);
        self.set_error_string(text);
        self.emit_finished();
    }

    /// Finish the job. Requests still queued are never sent.
    ///
    /// Must be called exactly once per job.
    pub fn emit_finished(&mut self) {
        debug_assert!(
            self.state != JobState::Finished,
            "emit_finished called twice on the same job"
        );
        if self.state == JobState::Finished {
            warn!("emit_finished called twice on the same job, ignoring");
            return;
        }

        self.state = JobState::Finished;
        if !self.queue.is_empty() {
            debug!(dropped = self.queue.len(), "discarding pending requests");
            self.queue.clear();
        }
    }

    pub fn emit_progress(&mut self, processed: u64, total: u64) {
        if let Some(progress) = self.progress.as_mut() {
            progress(processed, total);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == JobState::Finished
    }

    pub fn error(&self) -> ErrorCode {
        self.error
    }

    /// Number of requests waiting to be sent.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Fail with `InvalidResponse` unless the reply declares JSON.
    pub fn ensure_json(&mut self, reply: &Reply) -> bool {
        if reply.content_type() == ContentType::Json {
            return true;
        }
        self.fail(ErrorCode::InvalidResponse, "Invalid response content type");
        false
    }
}

/// Processing policy of a job.
pub trait JobHandler: Send {
    type Item: Send;

    /// Operation name for logs, e.g. `"fetch"`.
    const OPERATION: &'static str;

    /// Name of the service the job talks to.
    fn service_name(&self) -> &'static str;

    /// Enqueue the first request(s). Called once when the job is executed.
    fn start(&mut self, ctx: &mut JobContext);

    /// Decode one successful reply.
    ///
    /// May enqueue follow-up requests. Must call
    /// [`JobContext::emit_finished`] (directly or through
    /// [`JobContext::fail`]) once nothing more needs to be sent.
    fn handle_reply(&mut self, ctx: &mut JobContext, reply: &Reply) -> Vec<Self::Item>;
}

/// Result of a finished job.
#[derive(Debug, Clone)]
pub struct JobOutcome<T> {
    items: Vec<T>,
    error: ErrorCode,
    error_string: String,
    requests_sent: usize,
}

impl<T> JobOutcome<T> {
    /// Items decoded before the job finished, in request order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn error(&self) -> ErrorCode {
        self.error
    }

    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    pub fn is_success(&self) -> bool {
        !self.error.is_error()
    }

    pub fn requests_sent(&self) -> usize {
        self.requests_sent
    }

    /// Items on success, the recorded error otherwise.
    pub fn into_result(self) -> Result<Vec<T>> {
        if self.is_success() {
            Ok(self.items)
        } else {
            Err(GapiError::JobFailed {
                code: self.error,
                message: self.error_string,
            })
        }
    }
}

/// One logical operation against a Google service.
pub struct Job<H: JobHandler> {
    account: Arc<Account>,
    transport: Arc<dyn Transport>,
    handler: H,
    ctx: JobContext,
}

impl<H: JobHandler> Job<H> {
    /// Create an idle job. Nothing is sent until [`Job::exec`].
    pub fn new(account: Arc<Account>, transport: Arc<dyn Transport>, handler: H) -> Self {
        Self {
            account,
            transport,
            handler,
            ctx: JobContext::new(),
        }
    }

    pub fn state(&self) -> JobState {
        self.ctx.state
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Observe progress while the job runs.
    pub fn on_progress(mut self, progress: impl FnMut(u64, u64) + Send + 'static) -> Self {
        self.ctx.progress = Some(Box::new(progress));
        self
    }

    /// Run the job to completion.
    ///
    /// Requests are sent strictly one after another. A transport failure, an
    /// error status or a handler failure finishes the job immediately.
    pub async fn exec(mut self) -> JobOutcome<H::Item> {
        let service = self.handler.service_name();
        let mut items = Vec::new();
        let mut requests_sent = 0;

        self.ctx.state = JobState::Running;
        debug!(operation = H::OPERATION, service, "job started");
        self.handler.start(&mut self.ctx);

        while !self.ctx.is_finished() {
            let Some(request) = self.ctx.queue.pop_front() else {
                warn!(
                    operation = H::OPERATION,
                    service, "request queue drained before the job finished"
                );
                self.ctx.emit_finished();
                break;
            };

            let request = match self.authorize(request) {
                Ok(request) => request,
                Err(err) => {
                    self.ctx.fail(err.code(), err.to_string());
                    break;
                }
            };

            requests_sent += 1;
            let reply = match self.transport.send(request).await {
                Ok(reply) => reply,
                Err(err) => {
                    warn!(operation = H::OPERATION, service, error = %err, "transport failure");
                    self.ctx.fail(ErrorCode::NetworkError, err.to_string());
                    break;
                }
            };

            if let Some(code) = ErrorCode::from_status(reply.status) {
                let message = reply.error_message();
                warn!(
                    operation = H::OPERATION,
                    service,
                    status = %reply.status,
                    %message,
                    "request failed"
                );
                self.ctx.fail(code, message);
                break;
            }

            items.extend(self.handler.handle_reply(&mut self.ctx, &reply));
        }

        info!(
            operation = H::OPERATION,
            service,
            items = items.len(),
            requests = requests_sent,
            error = %self.ctx.error,
            "job finished"
        );

        JobOutcome {
            items,
            error: self.ctx.error,
            error_string: self.ctx.error_string,
            requests_sent,
        }
    }

    fn authorize(&self, mut request: Request) -> Result<Request> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {}", self.account.access_token()))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(request)
    }
}

impl<H: JobHandler> fmt::Debug for Job<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("operation", &H::OPERATION)
            .field("service", &self.handler.service_name())
            .field("state", &self.ctx.state)
            .field("pending", &self.ctx.queue.len())
            .finish()
    }
}
