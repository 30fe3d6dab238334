//! gapi - asynchronous jobs against Google REST services.
//!
//! Every operation (list, fetch one, create, modify, delete) runs as a
//! [`Job`](job::Job): a queue of HTTP requests sent one after another on
//! behalf of an [`Account`], whose replies are decoded into typed objects by
//! a per-resource [`Service`](service::Service).
//!
//! Supported services:
//! - Calendar: calendars and events
//! - Tasks: task lists and tasks
//! - People: contacts and contact groups
//! - Drive: files, shared drives, permissions and changes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gapi::calendar::EventService;
//! use gapi::job::FetchJob;
//! use gapi::{Account, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let account = Arc::new(Account::new("ada@example.com", "ya29.token"));
//!     let transport = Arc::new(HttpTransport::new()?);
//!
//!     let outcome = FetchJob::fetch_all(account, transport, EventService::new("primary"))
//!         .with_page_size(50)
//!         .exec()
//!         .await;
//!
//!     for event in outcome.into_result()? {
//!         println!("{:?}", event.summary);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod auth;
pub mod calendar;
pub mod client;
pub mod drive;
pub mod error;
pub mod feed;
pub mod job;
pub mod models;
pub mod people;
pub mod service;
pub mod tasks;
pub mod transport;
pub mod url_parser;

pub use account::Account;
pub use auth::Authenticator;
pub use client::GoogleClient;
pub use error::{ErrorCode, GapiError, Result};
pub use job::{Job, JobOutcome, JobState};
pub use transport::{HttpTransport, Reply, Request, Transport};
pub use url_parser::extract_id;
