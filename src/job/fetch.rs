//! Fetching a collection page by page, or a single object.

use std::sync::Arc;

use reqwest::Url;
use tracing::debug;

use super::{Job, JobContext, JobHandler};
use crate::account::Account;
use crate::error::ErrorCode;
use crate::service::{Service, UrlKind};
use crate::transport::{Reply, Request, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    All,
    One(String),
}

/// Fetch policy.
///
/// List fetches follow the feed's next-page locator until a page comes back
/// without one. Pages are requested strictly in sequence, so items come out
/// in server order.
pub struct Fetch<S: Service> {
    service: S,
    target: Target,
    query: Vec<(String, String)>,
    page_size: Option<u32>,
    max_results: Option<usize>,
    request_url: Option<Url>,
    fetched: usize,
}

impl<S: Service> Fetch<S> {
    pub fn all(service: S) -> Self {
        Self::with_target(service, Target::All)
    }

    pub fn one(service: S, id: impl Into<String>) -> Self {
        Self::with_target(service, Target::One(id.into()))
    }

    fn with_target(service: S, target: Target) -> Self {
        Self {
            service,
            target,
            query: Vec::new(),
            page_size: None,
            max_results: None,
            request_url: None,
            fetched: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn first_url(&self) -> crate::error::Result<Url> {
        let kind = match &self.target {
            Target::All => UrlKind::FetchAll,
            Target::One(id) => UrlKind::FetchOne(id),
        };
        let mut url = self.service.build_url(kind)?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
            if let (Target::All, Some(size)) = (&self.target, self.page_size) {
                pairs.append_pair(self.service.page_size_param(), &size.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn handle_page(&mut self, ctx: &mut JobContext, reply: &Reply) -> Vec<S::Object> {
        let (mut items, feed) = match self.service.decode_feed(&reply.body) {
            Ok(page) => page,
            Err(err) => {
                ctx.fail(ErrorCode::InvalidResponse, err.to_string());
                return Vec::new();
            }
        };

        self.fetched += items.len();
        debug!(
            service = S::NAME,
            page_items = items.len(),
            fetched = self.fetched,
            total = ?feed.total_results,
            "page decoded"
        );

        if let Some(max) = self.max_results {
            if self.fetched >= max {
                let excess = self.fetched - max;
                items.truncate(items.len() - excess);
                self.fetched = max;
                ctx.emit_finished();
                return items;
            }
        }

        let next = self
            .request_url
            .as_ref()
            .and_then(|url| feed.next_page_request(url));
        match next {
            Some(url) => {
                ctx.emit_progress(self.fetched as u64, feed.total_results.unwrap_or(0));
                ctx.enqueue_request(Request::get(url));
            }
            None => ctx.emit_finished(),
        }
        items
    }
}

impl<S: Service> JobHandler for Fetch<S> {
    type Item = S::Object;

    const OPERATION: &'static str = "fetch";

    fn service_name(&self) -> &'static str {
        S::NAME
    }

    fn start(&mut self, ctx: &mut JobContext) {
        if self.target == Target::All && self.max_results == Some(0) {
            ctx.emit_finished();
            return;
        }

        match self.first_url() {
            Ok(url) => {
                self.request_url = Some(url.clone());
                ctx.enqueue_request(Request::get(url));
            }
            Err(err) => ctx.fail(err.code(), err.to_string()),
        }
    }

    fn handle_reply(&mut self, ctx: &mut JobContext, reply: &Reply) -> Vec<S::Object> {
        if !ctx.ensure_json(reply) {
            return Vec::new();
        }

        if self.target == Target::All {
            return self.handle_page(ctx, reply);
        }

        match self.service.decode(&reply.body) {
            Ok(object) => {
                ctx.emit_finished();
                vec![object]
            }
            Err(err) => {
                ctx.fail(ErrorCode::InvalidResponse, err.to_string());
                Vec::new()
            }
        }
    }
}

/// Job fetching a collection or a single object.
pub type FetchJob<S> = Job<Fetch<S>>;

impl<S: Service> Job<Fetch<S>> {
    /// Fetch every object of the collection, following pagination.
    pub fn fetch_all(account: Arc<Account>, transport: Arc<dyn Transport>, service: S) -> Self {
        Job::new(account, transport, Fetch::all(service))
    }

    /// Fetch one object by id.
    pub fn fetch_one(
        account: Arc<Account>,
        transport: Arc<dyn Transport>,
        service: S,
        id: impl Into<String>,
    ) -> Self {
        Job::new(account, transport, Fetch::one(service, id))
    }

    /// Add a query parameter to the first request. Continuations keep it.
    pub fn with_query_item(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.handler.query.push((key.into(), value.into()));
        self
    }

    /// Ask the server for pages of at most `size` items.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.handler.page_size = Some(size);
        self
    }

    /// Stop once `max` items have been fetched.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.handler.max_results = Some(max);
        self
    }
}
