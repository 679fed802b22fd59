//! Target resolution from the captured proxy route.
//!
//! # Encoding
//! ```text
//! /proxy/https/example.org/foo?q=1
//!        └──────┬────────────┘ └┬┘
//!         captured route      inbound query
//!
//! → https://example.org/foo?q=1
//! ```
//!
//! The schema segment is optional and defaults to `http`. The query string is
//! always taken from the inbound request, never from the captured segment.

use std::fmt;

/// Schema used when the captured route does not name one.
pub const DEFAULT_SCHEMA: Schema = Schema::Http;

/// Shortest URI worth dispatching: `http://` plus one character.
pub const MIN_TARGET_URI_LEN: usize = "http://".len() + 1;

/// Transport schema of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Http,
    Https,
}

impl Schema {
    /// Parse a schema segment, ignoring ASCII case.
    pub fn parse(segment: &str) -> Option<Self> {
        if segment.eq_ignore_ascii_case("http") {
            Some(Schema::Http)
        } else if segment.eq_ignore_ascii_case("https") {
            Some(Schema::Https)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Http => "http",
            Schema::Https => "https",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema and host+path pair decoded from a captured route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub schema: Option<Schema>,
    pub path: String,
}

impl ResolvedTarget {
    /// Split a captured route into an optional schema and the remaining path.
    ///
    /// Never fails: an empty captured route yields an empty path, which the
    /// caller must reject.
    pub fn decompose(captured: &str) -> Self {
        if let Some((head, rest)) = captured.split_once('/') {
            if let Some(schema) = Schema::parse(head) {
                return Self {
                    schema: Some(schema),
                    path: rest.to_string(),
                };
            }
        }

        Self {
            schema: None,
            path: captured.to_string(),
        }
    }

    /// Assemble the target URI using the inbound raw query string.
    pub fn target_uri(&self, raw_query: Option<&str>) -> Option<String> {
        build_target_uri(self.schema, &self.path, raw_query)
    }
}

/// Build `<schema>://<path>[?<query>]`.
///
/// Returns `None` when the assembled URI is shorter than
/// [`MIN_TARGET_URI_LEN`].
pub fn build_target_uri(schema: Option<Schema>, path: &str, raw_query: Option<&str>) -> Option<String> {
    let schema = schema.unwrap_or(DEFAULT_SCHEMA).as_str();
    let query = raw_query.filter(|q| !q.is_empty());

    let mut uri = String::with_capacity(
        schema.len() + 3 + path.len() + query.map_or(0, |q| q.len() + 1),
    );
    uri.push_str(schema);
    uri.push_str("://");
    uri.push_str(path);

    if let Some(query) = query {
        uri.push('?');
        uri.push_str(query);
    }

    if uri.len() < MIN_TARGET_URI_LEN {
        return None;
    }

    Some(uri)
}
