//! Convenience façade bundling an account and a transport.

use std::sync::Arc;

use crate::account::Account;
use crate::calendar::{Calendar, CalendarService, Event, EventService};
use crate::drive::{
    About, AboutService, Change, ChangeService, File, FileService, Permission, PermissionService,
    StartPageTokenService, Teamdrive, TeamdriveService,
};
use crate::error::{GapiError, Result};
use crate::job::{CreateJob, DeleteJob, FetchJob, ModifyJob};
use crate::people::{ContactGroup, ContactGroupService, Person, PersonService};
use crate::service::{Resource, Service};
use crate::tasks::{Task, TaskList, TaskListService, TaskService};
use crate::transport::{HttpTransport, Transport};

/// Client for Google services on behalf of one account.
///
/// Builds jobs that share the client's account and transport. The job
/// constructors return idle jobs for callers that want to tune them; the
/// `list_*` helpers run a fetch straight to completion.
#[derive(Clone)]
pub struct GoogleClient {
    account: Arc<Account>,
    transport: Arc<dyn Transport>,
}

impl GoogleClient {
    /// Create a client talking HTTP through `reqwest`.
    pub fn new(account: Account) -> Result<Self> {
        Ok(Self::with_transport(account, Arc::new(HttpTransport::new()?)))
    }

    pub fn with_transport(account: Account, transport: Arc<dyn Transport>) -> Self {
        Self {
            account: Arc::new(account),
            transport,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn fetch_all<S: Service>(&self, service: S) -> FetchJob<S> {
        FetchJob::fetch_all(self.account.clone(), self.transport.clone(), service)
    }

    pub fn fetch_one<S: Service>(&self, service: S, id: impl Into<String>) -> FetchJob<S> {
        FetchJob::fetch_one(self.account.clone(), self.transport.clone(), service, id)
    }

    pub fn create<S: Service>(
        &self,
        service: S,
        objects: impl IntoIterator<Item = S::Object>,
    ) -> CreateJob<S> {
        CreateJob::create(self.account.clone(), self.transport.clone(), service, objects)
    }

    pub fn modify<S: Service>(
        &self,
        service: S,
        objects: impl IntoIterator<Item = S::Object>,
    ) -> ModifyJob<S> {
        ModifyJob::modify(self.account.clone(), self.transport.clone(), service, objects)
    }

    pub fn delete<S: Service>(
        &self,
        service: S,
        ids: impl IntoIterator<Item = String>,
    ) -> DeleteJob<S> {
        DeleteJob::delete(self.account.clone(), self.transport.clone(), service, ids)
    }

    /// Fetch every object of `service`, failing if the job fails.
    pub async fn list<S: Service>(&self, service: S) -> Result<Vec<S::Object>> {
        self.fetch_all(service).exec().await.into_result()
    }

    pub async fn list_calendars(&self) -> Result<Vec<Calendar>> {
        self.list(CalendarService::new()).await
    }

    pub async fn list_events(&self, calendar_id: &str) -> Result<Vec<Event>> {
        self.list(EventService::new(calendar_id)).await
    }

    pub async fn list_tasklists(&self) -> Result<Vec<TaskList>> {
        self.list(TaskListService::new()).await
    }

    pub async fn list_tasks(&self, tasklist_id: &str) -> Result<Vec<Task>> {
        self.list(TaskService::new(tasklist_id)).await
    }

    pub async fn list_contacts(&self) -> Result<Vec<Person>> {
        self.list(PersonService::new()).await
    }

    /// Contacts matching `query` by name, email or phone number.
    pub async fn search_contacts(&self, query: &str) -> Result<Vec<Person>> {
        self.list(PersonService::search(query)).await
    }

    pub async fn list_contact_groups(&self) -> Result<Vec<ContactGroup>> {
        self.list(ContactGroupService::new()).await
    }

    /// Files matching a Drive query such as `'<folder>' in parents`.
    pub async fn query_files(&self, query: &str) -> Result<Vec<File>> {
        self.fetch_all(FileService::new())
            .with_query_item("q", query)
            .exec()
            .await
            .into_result()
    }

    /// Files directly inside a folder, trashed ones excluded.
    pub async fn list_files(&self, parent_id: &str) -> Result<Vec<File>> {
        let query = format!("'{}' in parents and trashed = false", parent_id);
        self.query_files(&query).await
    }

    pub async fn list_drives(&self) -> Result<Vec<Teamdrive>> {
        self.list(TeamdriveService::new()).await
    }

    pub async fn list_permissions(&self, file_id: &str) -> Result<Vec<Permission>> {
        self.list(PermissionService::new(file_id)).await
    }

    /// Quota and identity of the authenticated Drive user.
    pub async fn about(&self) -> Result<About> {
        self.get(AboutService::new(), AboutService::ID).await
    }

    /// Token marking the current end of the Drive change log.
    pub async fn start_page_token(&self) -> Result<String> {
        let token = self
            .get(StartPageTokenService::new(), StartPageTokenService::ID)
            .await?;
        Ok(token.start_page_token)
    }

    /// Changes recorded since `start_page_token`.
    pub async fn list_changes(&self, start_page_token: &str) -> Result<Vec<Change>> {
        self.list(ChangeService::new(start_page_token)).await
    }

    /// Fetch one object of `service`, failing if the job fails.
    pub async fn get<S: Service>(&self, service: S, id: &str) -> Result<S::Object> {
        self.fetch_one(service, id)
            .exec()
            .await
            .into_result()?
            .pop()
            .ok_or_else(|| {
                GapiError::InvalidResponse(format!("no {} in reply", <S::Object as Resource>::KIND))
            })
    }
}
