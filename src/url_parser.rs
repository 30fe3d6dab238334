//! Extracting Google Drive ids from the URLs users copy out of a browser.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{GapiError, Result};

static FOLDER_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)")
        .expect("Invalid folder URL regex")
});

static SHARED_DRIVE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/drive/(?:u/\d+/)?(?:shared-drives|team-drives)/([a-zA-Z0-9_-]+)")
        .expect("Invalid shared drive URL regex")
});

static FILE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/(?:u/\d+/)?file/d/([a-zA-Z0-9_-]+)")
        .expect("Invalid file URL regex")
});

static DOCS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://docs\.google\.com/(?:document|spreadsheets|presentation|forms)/(?:u/\d+/)?d/([a-zA-Z0-9_-]+)",
    )
    .expect("Invalid docs URL regex")
});

static OPEN_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/(?:open|uc)\?(?:.*&)?id=([a-zA-Z0-9_-]+)")
        .expect("Invalid open URL regex")
});

static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Extract a Google Drive id from a URL or validate a raw id.
///
/// Supports the following forms:
/// - `https://drive.google.com/drive/folders/<ID>` (also under `u/<n>/`)
/// - `https://drive.google.com/drive/shared-drives/<ID>`
/// - `https://drive.google.com/file/d/<ID>/view`
/// - `https://docs.google.com/document/d/<ID>/edit` and the other editors
/// - `https://drive.google.com/open?id=<ID>`
/// - a raw id
///
/// # Examples
///
/// ```
/// use gapi::url_parser::extract_id;
///
/// let id = extract_id("https://drive.google.com/drive/folders/1abc123").unwrap();
/// assert_eq!(id, "1abc123");
///
/// let id = extract_id("1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// ```
pub fn extract_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();

    let patterns = [
        &FOLDER_URL_REGEX,
        &SHARED_DRIVE_URL_REGEX,
        &FILE_URL_REGEX,
        &DOCS_URL_REGEX,
        &OPEN_URL_REGEX,
    ];
    for pattern in patterns {
        if let Some(id) = pattern.captures(trimmed).and_then(|c| c.get(1)) {
            return Ok(id.as_str().to_string());
        }
    }

    if ID_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(GapiError::InvalidUrlOrId(url_or_id.to_string()))
}
