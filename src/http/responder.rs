// src/http/responder.rs

//! Conditional-GET answers for a bundle.

use std::sync::Arc;

use crate::build::Bundle;

pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_MODIFIED: u16 = 304;

/// Every bundle response may be stored but must be revalidated.
pub const CACHE_CONTROL: &str = "no-cache";

/// Framework-neutral description of the response to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Arc<[u8]>,
    /// `None` on 304.
    pub content_type: Option<String>,
}

impl ResponseDescriptor {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn etag(&self) -> Option<&str> {
        self.header("ETag")
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == STATUS_NOT_MODIFIED
    }
}

/// First entity tag of an `If-None-Match` value.
///
/// Clients normally send back the single tag they were given; for a list
/// only the first entry is considered.
pub fn first_entity_tag(if_none_match: &str) -> Option<&str> {
    if_none_match
        .split(',')
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Answer a request for `bundle`.
///
/// 304 with no body when `if_none_match` is exactly the bundle's ETag,
/// otherwise 200 with the bytes, the ETag and `content_type`.
pub fn respond(bundle: &Bundle, if_none_match: Option<&str>, content_type: &str) -> ResponseDescriptor {
    let etag = bundle.etag();
    let matched = if_none_match
        .and_then(first_entity_tag)
        .is_some_and(|tag| tag == etag);

    if matched {
        return ResponseDescriptor {
            status: STATUS_NOT_MODIFIED,
            headers: vec![("Cache-Control".to_string(), CACHE_CONTROL.to_string())],
            body: Arc::from(Vec::<u8>::new()),
            content_type: None,
        };
    }

    ResponseDescriptor {
        status: STATUS_OK,
        headers: vec![
            ("ETag".to_string(), etag),
            ("Cache-Control".to_string(), CACHE_CONTROL.to_string()),
        ],
        body: bundle.shared_bytes(),
        content_type: Some(content_type.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entity_tag_trims_lists() {
        assert_eq!(first_entity_tag(" \"a\" , \"b\""), Some("\"a\""));
        assert_eq!(first_entity_tag(""), None);
    }
}
