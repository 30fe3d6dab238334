//! In-memory transport replaying canned replies in order.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gapi::transport::{Reply, Request, Transport};
use gapi::{Account, GapiError, Result};

/// Transport answering each request with the next scripted reply and
/// recording every request it was given.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Reply>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script a transport failure after the replies queued so far.
    pub fn then_fail(self: Arc<Self>, reason: &str) -> Arc<Self> {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(GapiError::InvalidResponse(reason.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Reply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GapiError::InvalidResponse("no scripted reply left".to_string())))
    }
}

pub fn account() -> Arc<Account> {
    Arc::new(Account::new("ada@example.com", "test-token"))
}
