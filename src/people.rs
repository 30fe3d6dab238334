//! Google People API v1: contacts and contact groups.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{GapiError, Result};
use crate::feed::FeedData;
use crate::service::{
    decode_object, endpoint, resource_segments, write_value, Resource, Service, UrlKind,
};

/// Base URL for Google People API v1.
pub const PEOPLE_API_BASE: &str = "https://people.googleapis.com/v1";

/// Person fields requested and written when none are configured.
pub const DEFAULT_PERSON_FIELDS: &str = "names,emailAddresses,phoneNumbers,organizations,urls";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honorific_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honorific_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unstructured_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_form: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUrl {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// `people/<id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<Name>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<Organization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<PersonUrl>,
}

impl Person {
    /// Display name of the primary name entry, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.names.first().and_then(|n| n.display_name.as_deref())
    }

    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.first().map(|e| e.value.as_str())
    }
}

impl Resource for Person {
    const KIND: &'static str = "person";

    fn id(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactGroup {
    /// `contactGroups/<id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_name: Option<String>,
    /// `USER_CONTACT_GROUP` or `SYSTEM_CONTACT_GROUP`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
}

impl ContactGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Resource for ContactGroup {
    const KIND: &'static str = "contact group";

    fn id(&self) -> Option<&str> {
        self.resource_name.as_deref()
    }

    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Listing {
    Connections,
    Search(String),
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    person: Person,
}

/// Contacts of the authenticated user.
///
/// Lists either all connections (paginated) or the matches of a contact
/// search.
#[derive(Debug, Clone)]
pub struct PersonService {
    base_url: String,
    listing: Listing,
    person_fields: String,
}

impl PersonService {
    /// Service listing all connections.
    pub fn new() -> Self {
        Self {
            base_url: PEOPLE_API_BASE.to_string(),
            listing: Listing::Connections,
            person_fields: DEFAULT_PERSON_FIELDS.to_string(),
        }
    }

    /// Service listing the contacts matching `query`.
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            listing: Listing::Search(query.into()),
            ..Self::new()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fields read on fetch and written on update (comma separated).
    pub fn with_person_fields(mut self, fields: impl Into<String>) -> Self {
        self.person_fields = fields.into();
        self
    }

    fn person_url(&self, resource_name: &str, method: Option<&str>) -> Result<Url> {
        let mut segments = resource_segments(resource_name)?;
        if let (Some(method), Some(last)) = (method, segments.last_mut()) {
            last.push(':');
            last.push_str(method);
        }
        endpoint(&self.base_url, &segments)
    }
}

impl Default for PersonService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for PersonService {
    type Object = Person;

    const NAME: &'static str = "people";

    const FEED_KEY: &'static str = "connections";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        let fields = self.person_fields.as_str();
        let url = match kind {
            UrlKind::FetchAll => match &self.listing {
                Listing::Connections => {
                    let mut url = endpoint(&self.base_url, &["people", "me", "connections"])?;
                    url.query_pairs_mut().append_pair("personFields", fields);
                    url
                }
                Listing::Search(query) => {
                    let mut url = endpoint(&self.base_url, &["people:searchContacts"])?;
                    url.query_pairs_mut()
                        .append_pair("query", query)
                        .append_pair("readMask", fields);
                    url
                }
            },
            UrlKind::FetchOne(name) => {
                let mut url = self.person_url(name, None)?;
                url.query_pairs_mut().append_pair("personFields", fields);
                url
            }
            UrlKind::Create => {
                let mut url = endpoint(&self.base_url, &["people:createContact"])?;
                url.query_pairs_mut().append_pair("personFields", fields);
                url
            }
            UrlKind::Update(name) => {
                let mut url = self.person_url(name, Some("updateContact"))?;
                url.query_pairs_mut()
                    .append_pair("updatePersonFields", fields);
                url
            }
            UrlKind::Delete(name) => self.person_url(name, Some("deleteContact"))?,
        };
        Ok(url)
    }

    fn update_method(&self) -> Method {
        Method::PATCH
    }

    fn page_size_param(&self) -> &'static str {
        "pageSize"
    }

    fn decode(&self, raw: &[u8]) -> Result<Person> {
        let person: Person = decode_object(raw)?;
        match person.resource_name.as_deref() {
            Some(name) if name.starts_with("people/") => Ok(person),
            _ => Err(GapiError::InvalidResponse(
                "reply is not a person resource".to_string(),
            )),
        }
    }

    fn decode_feed(&self, raw: &[u8]) -> Result<(Vec<Person>, FeedData)> {
        match self.listing {
            Listing::Connections => crate::service::decode_feed(raw, Self::FEED_KEY),
            // Search results come in one page.
            Listing::Search(_) => {
                let response: SearchResponse = decode_object(raw)?;
                let people = response.results.into_iter().map(|r| r.person).collect();
                Ok((people, FeedData::default()))
            }
        }
    }
}

/// Contact groups of the authenticated user.
#[derive(Debug, Clone)]
pub struct ContactGroupService {
    base_url: String,
}

impl ContactGroupService {
    pub fn new() -> Self {
        Self {
            base_url: PEOPLE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ContactGroupService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for ContactGroupService {
    type Object = ContactGroup;

    const NAME: &'static str = "contactgroup";

    const FEED_KEY: &'static str = "contactGroups";

    const READ_ONLY_FIELDS: &'static [&'static str] =
        &["formattedName", "groupType", "memberCount"];

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        match kind {
            UrlKind::FetchAll | UrlKind::Create => endpoint(&self.base_url, &["contactGroups"]),
            UrlKind::FetchOne(name) | UrlKind::Update(name) | UrlKind::Delete(name) => {
                endpoint(&self.base_url, &resource_segments(name)?)
            }
        }
    }

    fn page_size_param(&self) -> &'static str {
        "pageSize"
    }

    // Writes take the group wrapped in a `contactGroup` envelope.
    fn encode(&self, object: &ContactGroup) -> Result<Vec<u8>> {
        let group = write_value(object, Self::READ_ONLY_FIELDS)?;
        Ok(serde_json::to_vec(&json!({ "contactGroup": group }))?)
    }
}
