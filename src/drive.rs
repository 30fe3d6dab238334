//! Google Drive API v3: files, shared drives, permissions and changes.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{format_size, string_u64};
use crate::service::{encode_object, endpoint, unsupported, Resource, Service, UrlKind};

/// Base URL for Google Drive API v3.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const FILE_FIELDS: &str =
    "id, name, size, mimeType, webViewLink, parents, trashed, driveId, modifiedTime, md5Checksum";

const ABOUT_FIELDS: &str = "user, storageQuota, maxUploadSize, appInstalled, canCreateDrives, \
    folderColorPalette, importFormats, exportFormats";

const PERMISSION_FIELDS: &str =
    "id, type, role, emailAddress, domain, displayName, allowFileDiscovery, expirationTime, deleted";

/// Metadata for a file or folder in Google Drive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, with = "string_u64", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trashed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_checksum: Option<String>,
}

impl File {
    /// A new file or folder placed in `parent`.
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: vec![parent.into()],
            ..Self::default()
        }
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size_str = self
            .size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        let id = self.id.as_deref().unwrap_or("-");
        let mime = self.mime_type.as_deref().unwrap_or("-");
        write!(f, "{}\t{}\t{}\t{}", id, size_str, mime, self.name)
    }
}

impl Resource for File {
    const KIND: &'static str = "file";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// A shared drive (formerly Team Drive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teamdrive {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl Teamdrive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Resource for Teamdrive {
    const KIND: &'static str = "shared drive";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Access grant on a file or shared drive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `user`, `group`, `domain` or `anyone`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `owner`, `organizer`, `fileOrganizer`, `writer`, `commenter` or `reader`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_file_discovery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl Permission {
    /// Grant `role` to the user with `email_address`.
    pub fn user(email_address: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            kind: Some("user".to_string()),
            role: Some(role.into()),
            email_address: Some(email_address.into()),
            ..Self::default()
        }
    }
}

impl Resource for Permission {
    const KIND: &'static str = "permission";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// One entry of the Drive change log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// `file` or `drive`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub removed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<File>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<Teamdrive>,
}

impl Resource for Change {
    const KIND: &'static str = "change";

    fn id(&self) -> Option<&str> {
        self.file_id.as_deref().or(self.drive_id.as_deref())
    }
}

/// A Drive user as reported on files, permissions and `about`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_link: Option<String>,
    /// Whether this is the authenticated user.
    #[serde(default)]
    pub me: bool,
}

/// Storage limits of the account, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuota {
    /// Absent when storage is unlimited.
    #[serde(default, with = "string_u64", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, with = "string_u64", skip_serializing_if = "Option::is_none")]
    pub usage: Option<u64>,
    #[serde(default, with = "string_u64", skip_serializing_if = "Option::is_none")]
    pub usage_in_drive: Option<u64>,
    #[serde(default, with = "string_u64", skip_serializing_if = "Option::is_none")]
    pub usage_in_drive_trash: Option<u64>,
}

impl StorageQuota {
    /// Bytes left, or `None` when unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.limit
            .map(|limit| limit.saturating_sub(self.usage.unwrap_or(0)))
    }
}

/// The authenticated user, their quota and Drive capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_quota: Option<StorageQuota>,
    #[serde(default, with = "string_u64", skip_serializing_if = "Option::is_none")]
    pub max_upload_size: Option<u64>,
    #[serde(default)]
    pub app_installed: bool,
    #[serde(default)]
    pub can_create_drives: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub folder_color_palette: Vec<String>,
    /// Source MIME type to the Google formats it can be imported as.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub import_formats: BTreeMap<String, Vec<String>>,
    /// Google format to the MIME types it can be exported as.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub export_formats: BTreeMap<String, Vec<String>>,
}

impl Resource for About {
    const KIND: &'static str = "about";

    fn id(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.permission_id.as_deref())
    }
}

/// Position in the change log from which later changes are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPageToken {
    pub start_page_token: String,
}

impl Resource for StartPageToken {
    const KIND: &'static str = "start page token";

    fn id(&self) -> Option<&str> {
        Some(&self.start_page_token)
    }
}

/// Files visible to the account, optionally restricted to one shared drive.
#[derive(Debug, Clone)]
pub struct FileService {
    base_url: String,
    drive_id: Option<String>,
}

impl FileService {
    pub fn new() -> Self {
        Self {
            base_url: DRIVE_API_BASE.to_string(),
            drive_id: None,
        }
    }

    /// List files of one shared drive only.
    pub fn in_drive(drive_id: impl Into<String>) -> Self {
        Self {
            drive_id: Some(drive_id.into()),
            ..Self::new()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for FileService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for FileService {
    type Object = File;

    const NAME: &'static str = "drive file";

    const FEED_KEY: &'static str = "files";

    const READ_ONLY_FIELDS: &'static [&'static str] =
        &["id", "size", "webViewLink", "driveId", "md5Checksum"];

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        let mut url = match kind {
            UrlKind::FetchAll | UrlKind::Create => endpoint(&self.base_url, &["files"])?,
            UrlKind::FetchOne(id) | UrlKind::Update(id) | UrlKind::Delete(id) => {
                endpoint(&self.base_url, &["files", id])?
            }
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("supportsAllDrives", "true");
            match kind {
                UrlKind::FetchAll => {
                    query
                        .append_pair("includeItemsFromAllDrives", "true")
                        .append_pair("fields", &format!("nextPageToken, files({})", FILE_FIELDS));
                    if let Some(drive_id) = &self.drive_id {
                        query
                            .append_pair("corpora", "drive")
                            .append_pair("driveId", drive_id);
                    }
                }
                UrlKind::Delete(_) => {}
                _ => {
                    query.append_pair("fields", FILE_FIELDS);
                }
            }
        }
        Ok(url)
    }

    fn update_method(&self) -> Method {
        Method::PATCH
    }

    fn page_size_param(&self) -> &'static str {
        "pageSize"
    }

    // Parents can only be set on creation; moving takes addParents/removeParents.
    fn encode(&self, object: &File) -> Result<Vec<u8>> {
        if object.id.is_none() {
            return encode_object(object, Self::READ_ONLY_FIELDS);
        }
        let mut read_only = Self::READ_ONLY_FIELDS.to_vec();
        read_only.push("parents");
        encode_object(object, &read_only)
    }
}

/// Shared drives of the account.
#[derive(Debug, Clone)]
pub struct TeamdriveService {
    base_url: String,
    use_domain_admin_access: bool,
}

impl TeamdriveService {
    pub fn new() -> Self {
        Self {
            base_url: DRIVE_API_BASE.to_string(),
            use_domain_admin_access: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Act as a domain administrator on drives of the domain.
    pub fn with_domain_admin_access(mut self, enabled: bool) -> Self {
        self.use_domain_admin_access = enabled;
        self
    }
}

impl Default for TeamdriveService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for TeamdriveService {
    type Object = Teamdrive;

    const NAME: &'static str = "shared drive";

    const FEED_KEY: &'static str = "drives";

    const READ_ONLY_FIELDS: &'static [&'static str] = &["id", "createdTime"];

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        let mut url = match kind {
            UrlKind::FetchAll | UrlKind::Create => endpoint(&self.base_url, &["drives"])?,
            UrlKind::FetchOne(id) | UrlKind::Update(id) | UrlKind::Delete(id) => {
                endpoint(&self.base_url, &["drives", id])?
            }
        };

        if kind == UrlKind::Create {
            // Drive deduplicates creations by request id.
            url.query_pairs_mut()
                .append_pair("requestId", &uuid::Uuid::new_v4().to_string());
        } else if self.use_domain_admin_access {
            url.query_pairs_mut()
                .append_pair("useDomainAdminAccess", "true");
        }
        Ok(url)
    }

    fn update_method(&self) -> Method {
        Method::PATCH
    }

    fn page_size_param(&self) -> &'static str {
        "pageSize"
    }
}

/// Permissions of one file or shared drive.
#[derive(Debug, Clone)]
pub struct PermissionService {
    base_url: String,
    file_id: String,
    transfer_ownership: bool,
    use_domain_admin_access: bool,
    send_notification_email: Option<bool>,
    email_message: Option<String>,
}

impl PermissionService {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            base_url: DRIVE_API_BASE.to_string(),
            file_id: file_id.into(),
            transfer_ownership: false,
            use_domain_admin_access: false,
            send_notification_email: None,
            email_message: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Required when granting the `owner` role; the current owner is
    /// downgraded to writer.
    pub fn with_transfer_ownership(mut self, transfer: bool) -> Self {
        self.transfer_ownership = transfer;
        self
    }

    pub fn with_domain_admin_access(mut self, enabled: bool) -> Self {
        self.use_domain_admin_access = enabled;
        self
    }

    /// Notification sent to new grantees on creation.
    pub fn with_notification(mut self, send: bool, message: Option<String>) -> Self {
        self.send_notification_email = Some(send);
        self.email_message = message;
        self
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }
}

impl Service for PermissionService {
    type Object = Permission;

    const NAME: &'static str = "permission";

    const FEED_KEY: &'static str = "permissions";

    const READ_ONLY_FIELDS: &'static [&'static str] = &["id", "displayName", "deleted"];

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        let permissions = ["files", self.file_id.as_str(), "permissions"];
        let mut url = match kind {
            UrlKind::FetchAll | UrlKind::Create => endpoint(&self.base_url, &permissions)?,
            UrlKind::FetchOne(id) | UrlKind::Update(id) | UrlKind::Delete(id) => {
                let mut segments = permissions.to_vec();
                segments.push(id);
                endpoint(&self.base_url, &segments)?
            }
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("supportsAllDrives", "true");
            if self.use_domain_admin_access {
                query.append_pair("useDomainAdminAccess", "true");
            }
            match kind {
                UrlKind::FetchAll => {
                    query.append_pair(
                        "fields",
                        &format!("nextPageToken, permissions({})", PERMISSION_FIELDS),
                    );
                }
                UrlKind::Create => {
                    query.append_pair("fields", PERMISSION_FIELDS);
                    if self.transfer_ownership {
                        query.append_pair("transferOwnership", "true");
                    }
                    if let Some(send) = self.send_notification_email {
                        query.append_pair("sendNotificationEmail", if send { "true" } else { "false" });
                    }
                    if let Some(message) = &self.email_message {
                        query.append_pair("emailMessage", message);
                    }
                }
                UrlKind::Update(_) => {
                    query.append_pair("fields", PERMISSION_FIELDS);
                    if self.transfer_ownership {
                        query.append_pair("transferOwnership", "true");
                    }
                }
                UrlKind::FetchOne(_) => {
                    query.append_pair("fields", PERMISSION_FIELDS);
                }
                UrlKind::Delete(_) => {}
            }
        }
        Ok(url)
    }

    fn update_method(&self) -> Method {
        Method::PATCH
    }

    fn page_size_param(&self) -> &'static str {
        "pageSize"
    }

    // Only the role and the expiration of an existing grant can change.
    fn encode(&self, object: &Permission) -> Result<Vec<u8>> {
        if object.id.is_none() {
            return encode_object(object, Self::READ_ONLY_FIELDS);
        }

        let mut body = Map::new();
        if let Some(role) = &object.role {
            body.insert("role".to_string(), Value::String(role.clone()));
        }
        if let Some(expiration) = &object.expiration_time {
            body.insert("expirationTime".to_string(), Value::String(expiration.clone()));
        }
        Ok(serde_json::to_vec(&Value::Object(body))?)
    }
}

/// Change log of the account, starting at a saved page token.
#[derive(Debug, Clone)]
pub struct ChangeService {
    base_url: String,
    start_page_token: String,
    drive_id: Option<String>,
    include_removed: bool,
}

impl ChangeService {
    pub fn new(start_page_token: impl Into<String>) -> Self {
        Self {
            base_url: DRIVE_API_BASE.to_string(),
            start_page_token: start_page_token.into(),
            drive_id: None,
            include_removed: true,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Only report changes of one shared drive.
    pub fn with_drive(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }

    /// Whether removals are reported (default: yes).
    pub fn with_include_removed(mut self, include_removed: bool) -> Self {
        self.include_removed = include_removed;
        self
    }
}

impl Service for ChangeService {
    type Object = Change;

    const NAME: &'static str = "drive change";

    const FEED_KEY: &'static str = "changes";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        if kind != UrlKind::FetchAll {
            return unsupported(Self::NAME, kind);
        }

        let mut url = endpoint(&self.base_url, &["changes"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("pageToken", &self.start_page_token)
                .append_pair("supportsAllDrives", "true")
                .append_pair("includeItemsFromAllDrives", "true");
            if !self.include_removed {
                query.append_pair("includeRemoved", "false");
            }
            if let Some(drive_id) = &self.drive_id {
                query.append_pair("driveId", drive_id);
            }
        }
        Ok(url)
    }

    fn page_size_param(&self) -> &'static str {
        "pageSize"
    }
}

/// The `about` record of the authenticated user.
///
/// It has no id of its own: fetch it with [`AboutService::ID`].
#[derive(Debug, Clone)]
pub struct AboutService {
    base_url: String,
}

impl AboutService {
    /// Id passed to a single fetch; any value addresses the same record.
    pub const ID: &'static str = "me";

    pub fn new() -> Self {
        Self {
            base_url: DRIVE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for AboutService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for AboutService {
    type Object = About;

    const NAME: &'static str = "drive about";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        if !matches!(kind, UrlKind::FetchOne(_)) {
            return unsupported(Self::NAME, kind);
        }

        let mut url = endpoint(&self.base_url, &["about"])?;
        url.query_pairs_mut().append_pair("fields", ABOUT_FIELDS);
        Ok(url)
    }
}

/// Current head of the change log, to start a [`ChangeService`] from.
#[derive(Debug, Clone)]
pub struct StartPageTokenService {
    base_url: String,
    drive_id: Option<String>,
}

impl StartPageTokenService {
    /// Id passed to a single fetch; the token has no id of its own.
    pub const ID: &'static str = "current";

    pub fn new() -> Self {
        Self {
            base_url: DRIVE_API_BASE.to_string(),
            drive_id: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Token for the change log of one shared drive.
    pub fn with_drive(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }
}

impl Default for StartPageTokenService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for StartPageTokenService {
    type Object = StartPageToken;

    const NAME: &'static str = "drive start page token";

    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url> {
        if !matches!(kind, UrlKind::FetchOne(_)) {
            return unsupported(Self::NAME, kind);
        }

        let mut url = endpoint(&self.base_url, &["changes", "startPageToken"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("supportsAllDrives", "true");
            if let Some(drive_id) = &self.drive_id {
                query.append_pair("driveId", drive_id);
            }
        }
        Ok(url)
    }
}
