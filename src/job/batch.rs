//! Request-per-item batches: create and modify.
//!
//! Inputs are sent one at a time in caller order. The request for item
//! `i + 1` is built only after the reply for item `i` has been decoded, and
//! the first failure finishes the job without touching the remaining items.

use std::collections::VecDeque;
use std::sync::Arc;

use reqwest::header::{HeaderValue, IF_MATCH};
use reqwest::Method;
use tracing::debug;

use super::{Job, JobContext, JobHandler};
use crate::account::Account;
use crate::error::{ErrorCode, GapiError, Result};
use crate::service::{Resource, Service, UrlKind};
use crate::transport::{Reply, Request, Transport, JSON_CONTENT_TYPE};

/// Ordered input queue shared by the batch policies.
pub(super) struct Batch<T> {
    pending: VecDeque<T>,
    total: usize,
    done: usize,
}

impl<T> Batch<T> {
    pub(super) fn new(inputs: impl IntoIterator<Item = T>) -> Self {
        let pending: VecDeque<T> = inputs.into_iter().collect();
        Self {
            total: pending.len(),
            pending,
            done: 0,
        }
    }

    /// Enqueue the request for the next input, or finish when none is left.
    pub(super) fn process_next(
        &mut self,
        ctx: &mut JobContext,
        build: impl FnOnce(&T) -> Result<Request>,
    ) {
        if ctx.is_finished() {
            return;
        }

        let Some(input) = self.pending.pop_front() else {
            ctx.emit_finished();
            return;
        };

        match build(&input) {
            Ok(request) => ctx.enqueue_request(request),
            Err(err) => ctx.fail(err.code(), err.to_string()),
        }
    }

    /// Count one input as done and report progress.
    pub(super) fn record(&mut self, ctx: &mut JobContext) {
        self.done += 1;
        ctx.emit_progress(self.done as u64, self.total as u64);
    }

    pub(super) fn remaining(&self) -> usize {
        self.pending.len()
    }
}

/// Decode the object the server echoed back for one write.
fn decode_echo<S: Service>(
    service: &S,
    ctx: &mut JobContext,
    reply: &Reply,
) -> Option<S::Object> {
    if !ctx.ensure_json(reply) {
        return None;
    }

    match service.decode(&reply.body) {
        Ok(object) => Some(object),
        Err(err) => {
            ctx.fail(ErrorCode::InvalidResponse, err.to_string());
            None
        }
    }
}

fn object_id<O: Resource>(object: &O) -> Result<&str> {
    object
        .id()
        .filter(|id| !id.is_empty())
        .ok_or(GapiError::MissingId { kind: O::KIND })
}

/// Create policy: one `POST` per input object.
pub struct Create<S: Service> {
    service: S,
    batch: Batch<S::Object>,
}

impl<S: Service> Create<S> {
    pub fn new(service: S, objects: impl IntoIterator<Item = S::Object>) -> Self {
        Self {
            service,
            batch: Batch::new(objects),
        }
    }

    fn process_next(&mut self, ctx: &mut JobContext) {
        let service = &self.service;
        self.batch.process_next(ctx, |object| {
            let url = service.build_url(UrlKind::Create)?;
            let body = service.encode(object)?;
            Ok(Request::new(Method::POST, url).with_body(body, JSON_CONTENT_TYPE))
        });
    }
}

impl<S: Service> JobHandler for Create<S> {
    type Item = S::Object;

    const OPERATION: &'static str = "create";

    fn service_name(&self) -> &'static str {
        S::NAME
    }

    fn start(&mut self, ctx: &mut JobContext) {
        self.process_next(ctx);
    }

    fn handle_reply(&mut self, ctx: &mut JobContext, reply: &Reply) -> Vec<S::Object> {
        let Some(created) = decode_echo(&self.service, ctx, reply) else {
            return Vec::new();
        };

        debug!(service = S::NAME, id = ?created.id(), remaining = self.batch.remaining(), "created");
        self.batch.record(ctx);
        self.process_next(ctx);
        vec![created]
    }
}

/// Modify policy: one update request per input object.
pub struct Modify<S: Service> {
    service: S,
    batch: Batch<S::Object>,
    check_etag: bool,
}

impl<S: Service> Modify<S> {
    pub fn new(service: S, objects: impl IntoIterator<Item = S::Object>) -> Self {
        Self {
            service,
            batch: Batch::new(objects),
            check_etag: false,
        }
    }

    fn process_next(&mut self, ctx: &mut JobContext) {
        let service = &self.service;
        let check_etag = self.check_etag;
        self.batch.process_next(ctx, |object| {
            let url = service.build_url(UrlKind::Update(object_id(object)?))?;
            let body = service.encode(object)?;
            let mut request =
                Request::new(service.update_method(), url).with_body(body, JSON_CONTENT_TYPE);
            if let (true, Some(etag)) = (check_etag, object.etag()) {
                request = request.with_header(IF_MATCH, HeaderValue::from_str(etag)?);
            }
            Ok(request)
        });
    }
}

impl<S: Service> JobHandler for Modify<S> {
    type Item = S::Object;

    const OPERATION: &'static str = "modify";

    fn service_name(&self) -> &'static str {
        S::NAME
    }

    fn start(&mut self, ctx: &mut JobContext) {
        self.process_next(ctx);
    }

    fn handle_reply(&mut self, ctx: &mut JobContext, reply: &Reply) -> Vec<S::Object> {
        let Some(modified) = decode_echo(&self.service, ctx, reply) else {
            return Vec::new();
        };

        debug!(service = S::NAME, id = ?modified.id(), remaining = self.batch.remaining(), "modified");
        self.batch.record(ctx);
        self.process_next(ctx);
        vec![modified]
    }
}

/// Job creating objects, one request per object.
pub type CreateJob<S> = Job<Create<S>>;

impl<S: Service> Job<Create<S>> {
    pub fn create(
        account: Arc<Account>,
        transport: Arc<dyn Transport>,
        service: S,
        objects: impl IntoIterator<Item = S::Object>,
    ) -> Self {
        Job::new(account, transport, Create::new(service, objects))
    }
}

/// Job updating objects, one request per object.
pub type ModifyJob<S> = Job<Modify<S>>;

impl<S: Service> Job<Modify<S>> {
    pub fn modify(
        account: Arc<Account>,
        transport: Arc<dyn Transport>,
        service: S,
        objects: impl IntoIterator<Item = S::Object>,
    ) -> Self {
        Job::new(account, transport, Modify::new(service, objects))
    }

    /// Send each object's etag as `If-Match`, so a concurrent change on the
    /// server fails the job with `Conflict` instead of being overwritten.
    pub fn with_etag_check(mut self, check: bool) -> Self {
        self.handler.check_etag = check;
        self
    }
}
