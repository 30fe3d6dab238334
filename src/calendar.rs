//! Google Calendar API v3: calendars and events.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::service::{endpoint, Resource, Service, UrlKind};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// A calendar as listed in the user's calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "summary", default)]
    pub title: String,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

impl Calendar {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Whether the user may change events in this calendar.
    pub fn is_editable(&self) -> bool {
        matches!(self.access_role.as_deref(), Some("owner") | Some("writer"))
    }
}

impl Resource for Calendar {
    const KIND: &'static str = "calendar";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

/// Start or end of an event: either a whole day or a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl Resource for Event {
    const KIND: &'static str = "event";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

/// Calendars of the authenticated user.
///
/// Listing and fetching go through the calendar list, writes through the
/// calendars collection.
#[derive(Debug, Clone)]
pub struct CalendarService {
    base_url: String,
}

impl CalendarService {
    pub fn new() -> Self {
        Self {
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for CalendarService {
    type Object = Calendar;

    const NAME: &'static str = "calendar";

    // Calendar list properties the calendars collection does not accept.
    const READ_ONLY_FIELDS: &'static [&'static str] = &[
        "accessRole",
        "backgroundColor",
        "foregroundColor",
        "primary",
    ];

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        match kind {
            UrlKind::FetchAll => endpoint(&self.base_url, &["users", "me", "calendarList"]),
            UrlKind::FetchOne(id) => {
                endpoint(&self.base_url, &["users", "me", "calendarList", id])
            }
            UrlKind::Create => endpoint(&self.base_url, &["calendars"]),
            UrlKind::Update(id) | UrlKind::Delete(id) => {
                endpoint(&self.base_url, &["calendars", id])
            }
        }
    }
}

/// Events of one calendar.
#[derive(Debug, Clone)]
pub struct EventService {
    base_url: String,
    calendar_id: String,
    send_updates: Option<String>,
}

impl EventService {
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            base_url: CALENDAR_API_BASE.to_string(),
            calendar_id: calendar_id.into(),
            send_updates: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Who gets notified about writes: `all`, `externalOnly` or `none`.
    pub fn with_send_updates(mut self, send_updates: impl Into<String>) -> Self {
        self.send_updates = Some(send_updates.into());
        self
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }
}

impl Service for EventService {
    type Object = Event;

    const NAME: &'static str = "event";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        let events = ["calendars", self.calendar_id.as_str(), "events"];
        let mut url = match kind {
            UrlKind::FetchAll | UrlKind::Create => endpoint(&self.base_url, &events)?,
            UrlKind::FetchOne(id) | UrlKind::Update(id) | UrlKind::Delete(id) => {
                let mut segments = events.to_vec();
                segments.push(id);
                endpoint(&self.base_url, &segments)?
            }
        };

        let is_write = !matches!(kind, UrlKind::FetchAll | UrlKind::FetchOne(_));
        if let Some(send_updates) = self.send_updates.as_deref().filter(|_| is_write) {
            url.query_pairs_mut().append_pair("sendUpdates", send_updates);
        }
        Ok(url)
    }
}
