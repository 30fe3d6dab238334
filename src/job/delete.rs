//! Deleting objects by id, one request per id.

use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use super::batch::Batch;
use super::{Job, JobContext, JobHandler};
use crate::account::Account;
use crate::error::{GapiError, Result};
use crate::service::{Resource, Service, UrlKind};
use crate::transport::{Reply, Request, Transport};

/// Delete policy. Yields the id of every object deleted before the job
/// finished, so a failed job tells which deletions went through.
pub struct Delete<S: Service> {
    service: S,
    batch: Batch<String>,
    current: Option<String>,
}

impl<S: Service> Delete<S> {
    pub fn new(service: S, ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            service,
            batch: Batch::new(ids),
            current: None,
        }
    }

    /// Delete the given objects. Fails if any of them has no id yet.
    pub fn for_objects<'a>(
        service: S,
        objects: impl IntoIterator<Item = &'a S::Object>,
    ) -> Result<Self> {
        let ids = objects
            .into_iter()
            .map(|object| {
                object
                    .id()
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .ok_or(GapiError::MissingId {
                        kind: <S::Object as Resource>::KIND,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(service, ids))
    }

    fn process_next(&mut self, ctx: &mut JobContext) {
        let service = &self.service;
        let current = &mut self.current;
        self.batch.process_next(ctx, |id| {
            let url = service.build_url(UrlKind::Delete(id))?;
            *current = Some(id.clone());
            Ok(Request::new(Method::DELETE, url))
        });
    }
}

impl<S: Service> JobHandler for Delete<S> {
    type Item = String;

    const OPERATION: &'static str = "delete";

    fn service_name(&self) -> &'static str {
        S::NAME
    }

    fn start(&mut self, ctx: &mut JobContext) {
        self.process_next(ctx);
    }

    // Deletions answer with an empty body, so only the status is checked.
    fn handle_reply(&mut self, ctx: &mut JobContext, _reply: &Reply) -> Vec<String> {
        let deleted = self.current.take();
        debug!(service = S::NAME, id = ?deleted, remaining = self.batch.remaining(), "deleted");
        self.batch.record(ctx);
        self.process_next(ctx);
        deleted.into_iter().collect()
    }
}

/// Job deleting objects by id.
pub type DeleteJob<S> = Job<Delete<S>>;

impl<S: Service> Job<Delete<S>> {
    pub fn delete(
        account: Arc<Account>,
        transport: Arc<dyn Transport>,
        service: S,
        ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Job::new(account, transport, Delete::new(service, ids))
    }
}
