//! Per-resource service strategies: URL building and JSON encode/decode.
//!
//! Every resource type has one [`Service`] implementation. Jobs only talk to
//! this trait, so they never need to know which concrete resource they move.

use std::fmt;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{GapiError, Result};
use crate::feed::FeedData;

/// A typed value representing one server-side entity.
pub trait Resource:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Short name used in logs and errors, e.g. `"calendar"`.
    const KIND: &'static str;

    /// Server-assigned identifier, absent on objects not created yet.
    fn id(&self) -> Option<&str>;

    fn etag(&self) -> Option<&str> {
        None
    }
}

/// Which request a URL is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind<'a> {
    FetchAll,
    FetchOne(&'a str),
    Create,
    Update(&'a str),
    Delete(&'a str),
}

impl UrlKind<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            UrlKind::FetchAll => "fetch all",
            UrlKind::FetchOne(_) => "fetch one",
            UrlKind::Create => "create",
            UrlKind::Update(_) => "update",
            UrlKind::Delete(_) => "delete",
        }
    }
}

/// URL and codec strategy for one resource type.
pub trait Service: Send + Sync + 'static {
    type Object: Resource;

    /// Name used in logs and errors, e.g. `"calendar"`.
    const NAME: &'static str;

    /// Key of the item array in list responses.
    const FEED_KEY: &'static str = "items";

    /// Top-level fields the API refuses in write bodies.
    const READ_ONLY_FIELDS: &'static [&'static str] = &[];

    /// Build the URL for a request. Has no side effects.
    fn build_url(&self, kind: UrlKind<'_>) -> Result<Url>;

    /// HTTP method used for updates.
    fn update_method(&self) -> Method {
        Method::PUT
    }

    /// Query parameter carrying the page size on list requests.
    fn page_size_param(&self) -> &'static str {
        "maxResults"
    }

    fn decode(&self, raw: &[u8]) -> Result<Self::Object> {
        decode_object(raw)
    }

    fn decode_feed(&self, raw: &[u8]) -> Result<(Vec<Self::Object>, FeedData)> {
        decode_feed(raw, Self::FEED_KEY)
    }

    fn encode(&self, object: &Self::Object) -> Result<Vec<u8>> {
        encode_object(object, Self::READ_ONLY_FIELDS)
    }
}

/// Error for a request kind a service does not offer.
pub fn unsupported<T>(service: &'static str, kind: UrlKind<'_>) -> Result<T> {
    Err(GapiError::Unsupported {
        service,
        operation: kind.name(),
    })
}

/// Append path segments to a base URL. Each segment is percent-encoded, so
/// ids containing `#` or `/` stay a single segment.
pub fn endpoint<S: AsRef<str>>(base: &str, segments: &[S]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| GapiError::InvalidUrlOrId(format!("{}: {}", base, e)))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| GapiError::InvalidUrlOrId(base.to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment.as_ref());
        }
    }
    Ok(url)
}

/// Split a resource name such as `people/c123` into path segments.
pub fn resource_segments(resource_name: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = resource_name.split('/').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty() || s == "." || s == "..") {
        return Err(GapiError::InvalidUrlOrId(resource_name.to_string()));
    }
    Ok(segments)
}

/// Decode a single JSON object.
pub fn decode_object<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(raw)?)
}

/// Decode a list response: the array under `key` plus pagination metadata.
///
/// A missing or `null` array is an empty page, not an error.
pub fn decode_feed<T: DeserializeOwned>(raw: &[u8], key: &str) -> Result<(Vec<T>, FeedData)> {
    let mut root = match serde_json::from_slice::<Value>(raw)? {
        Value::Object(map) => map,
        _ => {
            return Err(GapiError::InvalidResponse(
                "feed is not a JSON object".to_string(),
            ))
        }
    };

    let items = match root.remove(key) {
        Some(Value::Array(values)) => values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            return Err(GapiError::InvalidResponse(format!(
                "`{}` is not an array",
                key
            )))
        }
    };

    Ok((items, feed_data(&root)))
}

/// Extract pagination metadata from the top level of a list response.
pub fn feed_data(root: &Map<String, Value>) -> FeedData {
    let number = |keys: &[&str]| {
        keys.iter().find_map(|k| match root.get(*k) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        })
    };

    FeedData {
        items_per_page: number(&["itemsPerPage"]),
        start_index: number(&["startIndex"]),
        total_results: number(&["totalItems", "totalResults", "totalSize", "totalPeople"]),
        next_page_url: root
            .get("nextLink")
            .and_then(Value::as_str)
            .and_then(|s| Url::parse(s).ok()),
        next_page_token: root
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Serialize an object for a write request, dropping `read_only` fields.
pub fn encode_object<T: Serialize>(object: &T, read_only: &[&str]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&write_value(object, read_only)?)?)
}

/// The JSON value of a write body, before any envelope is added.
pub fn write_value<T: Serialize>(object: &T, read_only: &[&str]) -> Result<Value> {
    let mut value = serde_json::to_value(object)?;
    if let Value::Object(map) = &mut value {
        for field in read_only {
            map.remove(*field);
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        #[serde(default)]
        kind: Option<String>,
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint(
            "https://www.googleapis.com/calendar/v3/",
            &["calendars", "en.usa#holiday@group.v.calendar.google.com"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com"
        );
    }

    #[test]
    fn test_resource_segments() {
        assert_eq!(
            resource_segments("people/c42").unwrap(),
            vec!["people".to_string(), "c42".to_string()]
        );
        assert!(resource_segments("people//c42").is_err());
        assert!(resource_segments("../etc").is_err());
    }

    #[test]
    fn test_decode_feed() {
        let raw = br#"{
            "kind": "list",
            "items": [{"id": "a"}, {"id": "b", "kind": "x"}],
            "nextPageToken": "tok2",
            "totalItems": "7"
        }"#;
        let (items, feed): (Vec<Item>, _) = decode_feed(raw, "items").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind.as_deref(), Some("x"));
        assert_eq!(feed.next_page_token.as_deref(), Some("tok2"));
        assert_eq!(feed.total_results, Some(7));
    }

    #[test]
    fn test_decode_feed_empty_page() {
        let (items, feed): (Vec<Item>, _) = decode_feed(br#"{"kind": "list"}"#, "items").unwrap();
        assert!(items.is_empty());
        assert!(!feed.has_next_page());
    }

    #[test]
    fn test_decode_feed_rejects_malformed() {
        assert!(decode_feed::<Item>(b"[1, 2]", "items").is_err());
        assert!(decode_feed::<Item>(br#"{"items": {"id": "a"}}"#, "items").is_err());
        assert!(decode_feed::<Item>(b"<feed/>", "items").is_err());
    }

    #[test]
    fn test_encode_drops_read_only_fields() {
        let item = Item {
            id: "a".to_string(),
            kind: Some("x".to_string()),
        };
        let raw = encode_object(&item, &["id"]).unwrap();
        let value: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "x"}));
    }
}
