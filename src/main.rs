//! gapi CLI - Query Google Calendar, Tasks, Contacts and Drive.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gapi::calendar::{CalendarService, EventService};
use gapi::drive::{
    AboutService, ChangeService, FileService, PermissionService, StartPageTokenService,
    TeamdriveService,
};
use gapi::service::Resource;
use gapi::job::{DeleteJob, Fetch, FetchJob, Job};
use gapi::people::{ContactGroupService, PersonService};
use gapi::service::Service;
use gapi::tasks::{TaskListService, TaskService};
use gapi::models::format_size;
use gapi::{extract_id, Account, Authenticator, HttpTransport, Transport};

/// Command line client for Google REST services.
#[derive(Parser)]
#[command(name = "gapi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OAuth2 access token to use as is. Takes precedence over credentials.
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// User to impersonate with the service account.
    #[arg(long, env = "GOOGLE_IMPERSONATE_SUBJECT")]
    subject: Option<String>,

    /// Items requested per page.
    #[arg(long)]
    page_size: Option<u32>,

    /// Stop after this many items.
    #[arg(long)]
    max_results: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List calendars.
    Calendars,

    /// List events of a calendar.
    Events {
        /// Calendar ID, e.g. `primary`.
        calendar: String,
    },

    /// List task lists.
    Tasklists,

    /// List tasks of a task list.
    Tasks {
        tasklist: String,

        /// Hide completed tasks.
        #[arg(long)]
        pending: bool,
    },

    /// List contacts.
    Contacts {
        /// Search by name, email or phone number instead of listing all.
        #[arg(long, short = 'q')]
        query: Option<String>,
    },

    /// List contact groups.
    Groups,

    /// List Drive files.
    Files {
        /// Drive query, e.g. `name contains 'report'`.
        #[arg(long, short = 'q')]
        query: Option<String>,

        /// Folder URL or ID to list.
        #[arg(long)]
        folder: Option<String>,

        /// Restrict to one shared drive (URL or ID).
        #[arg(long)]
        drive: Option<String>,
    },

    /// List shared drives.
    Drives,

    /// List permissions of a file.
    Permissions {
        /// File URL or ID.
        file: String,
    },

    /// Show the Drive user, storage quota and upload limit.
    About,

    /// List Drive changes since a page token.
    Changes {
        /// Token saved from an earlier run.
        #[arg(required_unless_present = "from_now")]
        start_page_token: Option<String>,

        /// Print the current token to start from instead of listing.
        #[arg(long, conflicts_with = "start_page_token")]
        from_now: bool,
    },

    /// Delete events from a calendar.
    DeleteEvent {
        calendar: String,

        #[arg(required = true)]
        events: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let account = Arc::new(load_account(&cli).await?);
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new().context("Failed to create HTTP client")?);

    let opts = ListOptions {
        page_size: cli.page_size,
        max_results: cli.max_results,
    };

    match cli.command {
        Commands::Calendars => {
            let calendars = list(&opts, account, transport, CalendarService::new()).await?;
            for calendar in calendars {
                println!(
                    "{:<50} {:<8} {}",
                    calendar.id.unwrap_or_default(),
                    calendar.access_role.unwrap_or_default(),
                    calendar.title
                );
            }
        }

        Commands::Events { calendar } => {
            let events = list(&opts, account, transport, EventService::new(&calendar)).await?;
            for event in events {
                let start = event
                    .start
                    .and_then(|s| s.date_time.or(s.date))
                    .unwrap_or_default();
                println!(
                    "{:<30} {:<26} {}",
                    event.id.unwrap_or_default(),
                    start,
                    event.summary.unwrap_or_default()
                );
            }
        }

        Commands::Tasklists => {
            let lists = list(&opts, account, transport, TaskListService::new()).await?;
            for tasklist in lists {
                println!("{:<44} {}", tasklist.id.unwrap_or_default(), tasklist.title);
            }
        }

        Commands::Tasks { tasklist, pending } => {
            let service = TaskService::new(&tasklist).with_show_completed(!pending);
            let tasks = list(&opts, account, transport, service).await?;
            for task in tasks {
                let mark = if task.is_completed() { "x" } else { " " };
                println!("[{}] {:<30} {}", mark, task.id.unwrap_or_default(), task.title);
            }
        }

        Commands::Contacts { query } => {
            let service = match query {
                Some(query) => PersonService::search(query),
                None => PersonService::new(),
            };
            let people = list(&opts, account, transport, service).await?;
            for person in people {
                println!(
                    "{:<40} {:<30} {}",
                    person.resource_name.as_deref().unwrap_or_default(),
                    person.display_name().unwrap_or_default(),
                    person.primary_email().unwrap_or_default()
                );
            }
        }

        Commands::Groups => {
            let groups = list(&opts, account, transport, ContactGroupService::new()).await?;
            for group in groups {
                println!(
                    "{:<40} {:>6} {}",
                    group.resource_name.unwrap_or_default(),
                    group.member_count.unwrap_or(0),
                    group.name
                );
            }
        }

        Commands::Files {
            query,
            folder,
            drive,
        } => {
            let service = match drive {
                Some(drive) => FileService::in_drive(
                    extract_id(&drive)
                        .with_context(|| format!("Invalid shared drive URL or ID: {}", drive))?,
                ),
                None => FileService::new(),
            };

            let mut terms = Vec::new();
            if let Some(folder) = folder {
                let folder_id = extract_id(&folder)
                    .with_context(|| format!("Invalid folder URL or ID: {}", folder))?;
                terms.push(format!("'{}' in parents and trashed = false", folder_id));
            }
            terms.extend(query);

            let mut job = opts.apply(FetchJob::fetch_all(account, transport, service));
            if !terms.is_empty() {
                job = job.with_query_item("q", terms.join(" and "));
            }
            let files = job.exec().await.into_result().context("Failed to list files")?;

            if files.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44}\t{:>10}\t{:<30}\t{}", "ID", "SIZE", "TYPE", "NAME");
                for file in files {
                    println!("{}", file);
                }
            }
        }

        Commands::Drives => {
            let drives = list(&opts, account, transport, TeamdriveService::new()).await?;
            for drive in drives {
                println!("{:<24} {}", drive.id.unwrap_or_default(), drive.name);
            }
        }

        Commands::Permissions { file } => {
            let file_id =
                extract_id(&file).with_context(|| format!("Invalid file URL or ID: {}", file))?;
            let permissions =
                list(&opts, account, transport, PermissionService::new(file_id)).await?;
            for permission in permissions {
                println!(
                    "{:<24} {:<8} {:<14} {}",
                    permission.id.unwrap_or_default(),
                    permission.kind.unwrap_or_default(),
                    permission.role.unwrap_or_default(),
                    permission
                        .email_address
                        .or(permission.domain)
                        .unwrap_or_default()
                );
            }
        }

        Commands::About => {
            let about = fetch_one(account, transport, AboutService::new(), AboutService::ID).await?;
            if let Some(user) = &about.user {
                println!(
                    "User:        {} <{}>",
                    user.display_name.as_deref().unwrap_or_default(),
                    user.email_address.as_deref().unwrap_or_default()
                );
            }
            if let Some(quota) = &about.storage_quota {
                let limit = quota
                    .limit
                    .map(format_size)
                    .unwrap_or_else(|| "unlimited".to_string());
                println!(
                    "Storage:     {} of {}",
                    format_size(quota.usage.unwrap_or(0)),
                    limit
                );
            }
            if let Some(max) = about.max_upload_size {
                println!("Max upload:  {}", format_size(max));
            }
        }

        Commands::Changes {
            start_page_token,
            from_now,
        } => {
            let start_page_token = match start_page_token {
                Some(token) if !from_now => token,
                _ => {
                    let token = fetch_one(
                        account,
                        transport,
                        StartPageTokenService::new(),
                        StartPageTokenService::ID,
                    )
                    .await?;
                    println!("{}", token.start_page_token);
                    return Ok(());
                }
            };

            let changes =
                list(&opts, account, transport, ChangeService::new(start_page_token)).await?;
            for change in changes {
                let action = if change.removed { "removed" } else { "changed" };
                let name = change
                    .file
                    .map(|f| f.name)
                    .or(change.drive.map(|d| d.name))
                    .unwrap_or_default();
                println!(
                    "{:<26} {:<8} {:<44} {}",
                    change.time.unwrap_or_default(),
                    action,
                    change.file_id.or(change.drive_id).unwrap_or_default(),
                    name
                );
            }
        }

        Commands::DeleteEvent { calendar, events } => {
            let total = events.len();
            let service = EventService::new(&calendar);
            let outcome = DeleteJob::delete(account, transport, service, events)
                .on_progress(|done, total| eprintln!("[{}/{}] deleted", done, total))
                .exec()
                .await;

            let deleted = outcome.items().len();
            outcome
                .into_result()
                .with_context(|| format!("Deleted {} of {} event(s)", deleted, total))?;
            println!("Deleted {} event(s).", deleted);
        }
    }

    Ok(())
}

/// Paging flags shared by every list command.
struct ListOptions {
    page_size: Option<u32>,
    max_results: Option<usize>,
}

impl ListOptions {
    fn apply<S: Service>(&self, mut job: Job<Fetch<S>>) -> Job<Fetch<S>> {
        if let Some(size) = self.page_size {
            job = job.with_page_size(size);
        }
        if let Some(max) = self.max_results {
            job = job.with_max_results(max);
        }
        job
    }
}

async fn list<S: Service>(
    opts: &ListOptions,
    account: Arc<Account>,
    transport: Arc<dyn Transport>,
    service: S,
) -> Result<Vec<S::Object>> {
    let job = opts.apply(FetchJob::fetch_all(account, transport, service));
    job.exec()
        .await
        .into_result()
        .with_context(|| format!("Failed to list {}s", S::NAME))
}

async fn fetch_one<S: Service>(
    account: Arc<Account>,
    transport: Arc<dyn Transport>,
    service: S,
    id: &str,
) -> Result<S::Object> {
    FetchJob::fetch_one(account, transport, service, id)
        .exec()
        .await
        .into_result()
        .with_context(|| format!("Failed to fetch {}", S::NAME))?
        .pop()
        .with_context(|| format!("No {} in reply", <S::Object as Resource>::KIND))
}

/// Build the account from an explicit token or service account credentials.
async fn load_account(cli: &Cli) -> Result<Account> {
    if let Some(token) = &cli.access_token {
        return Ok(Account::new(cli.subject.clone().unwrap_or_default(), token));
    }

    let path = cli.credentials.as_ref().context(
        "No credentials: set GOOGLE_ACCESS_TOKEN or GOOGLE_APPLICATION_CREDENTIALS",
    )?;
    let mut auth = Authenticator::from_file(path)
        .with_context(|| format!("Failed to load credentials from {:?}", path))?;
    if let Some(subject) = &cli.subject {
        auth = auth.with_subject(subject);
    }
    auth.account().await.context("Failed to obtain an access token")
}

fn init_tracing() {
    // RUST_LOG takes precedence over the default
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gapi=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
