//! Request construction
//!
//! Maps a logical DbFlare operation plus route/query parameters and an
//! optional JSON body onto a concrete, dispatchable HTTP request
//! descriptor. Verb selection honors the per-client overrides for backends
//! that cannot accept PUT/DELETE (e.g. behind a firewall).

use crate::error::{Error, Result};
use crate::types::{MultiValueMap, StringMap, ValueMap};
use reqwest::Method;
use serde_json::Value;
use url::Url;


/// The `accept` header sent on every request
pub const ACCEPT_JSON: &str = "application/json;charset=UTF-8";

// ============================================================================
// Logical operations and verb overrides
// ============================================================================

/// Logical DbFlare operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `zget` retrieval
    Get,
    /// `zinsert`
    Insert,
    /// `zupdate`
    Update,
    /// `zdelete`
    Delete,
}

/// HTTP verb mapping for mutating operations.
///
/// Reads are always GET and inserts always POST. Updates default to PUT but
/// may be remapped to POST; deletes default to DELETE but may be remapped to
/// GET. Anything else is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbOverrides {
    update: Method,
    delete: Method,
}

impl Default for VerbOverrides {
    fn default() -> Self {
        Self {
            update: Method::PUT,
            delete: Method::DELETE,
        }
    }
}

impl VerbOverrides {
    /// Remap the update verb
    #[must_use]
    pub fn update(mut self, verb: Method) -> Self {
        self.update = verb;
        self
    }

    /// Remap the delete verb
    #[must_use]
    pub fn delete(mut self, verb: Method) -> Self {
        self.delete = verb;
        self
    }

    /// Validate the mapping against the allowed verb sets
    pub fn validate(&self) -> Result<()> {
        if self.update != Method::PUT && self.update != Method::POST {
            return Err(Error::config(format!(
                "invalid update verb override '{}', allowed: PUT, POST",
                self.update
            )));
        }
        if self.delete != Method::DELETE && self.delete != Method::GET {
            return Err(Error::config(format!(
                "invalid delete verb override '{}', allowed: DELETE, GET",
                self.delete
            )));
        }
        Ok(())
    }

    /// The concrete verb for a logical operation
    pub fn verb_for(&self, operation: Operation) -> Method {
        match operation {
            Operation::Get => Method::GET,
            Operation::Insert => Method::POST,
            Operation::Update => self.update.clone(),
            Operation::Delete => self.delete.clone(),
        }
    }
}

// ============================================================================
// Request descriptor
// ============================================================================

/// A fully-described HTTP request, built per call and handed to the
/// transport. `url` may contain `{name}` route templates which
/// [`RequestSpec::resolve_url`] substitutes from `route_params`.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, possibly with `{name}` route templates
    pub url: String,
    /// Route template substitutions
    pub route_params: StringMap,
    /// Single-value query parameters (JSON scalars; nulls are skipped)
    pub query: ValueMap,
    /// Repeated query parameters for IN-style filters
    pub query_multi: MultiValueMap,
    /// Request headers
    pub headers: StringMap,
    /// Pre-serialized JSON body
    pub body: Option<String>,
}

impl RequestSpec {
    /// Create a request descriptor
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            route_params: StringMap::new(),
            query: ValueMap::new(),
            query_multi: MultiValueMap::new(),
            headers: StringMap::new(),
            body: None,
        }
    }

    /// Add a route template substitution
    #[must_use]
    pub fn route(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_params.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Merge a map of query parameters
    #[must_use]
    pub fn query_map(mut self, params: &ValueMap) -> Self {
        self.query
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add a repeated query parameter
    #[must_use]
    pub fn query_values(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.query_multi.insert(key.into(), values);
        self
    }

    /// Merge a map of repeated query parameters
    #[must_use]
    pub fn query_multi_map(mut self, params: &MultiValueMap) -> Self {
        self.query_multi
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Merge a map of headers
    #[must_use]
    pub fn headers(mut self, headers: StringMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach a JSON body, serializing the payload
    pub fn json_body<T: serde::Serialize>(mut self, payload: &T) -> Result<Self> {
        self.body = Some(serde_json::to_string(payload)?);
        Ok(self)
    }

    /// Substitute route templates and attach query parameters, producing
    /// the final URL
    pub fn resolve_url(&self) -> Result<Url> {
        let mut path = self.url.clone();
        for (key, value) in &self.route_params {
            path = path.replace(&format!("{{{key}}}"), value);
        }

        let mut url = Url::parse(&path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                if let Some(rendered) = render_query_value(value) {
                    pairs.append_pair(key, &rendered);
                }
            }
            for (key, values) in &self.query_multi {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }
        // An empty query would otherwise leave a dangling '?'
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }
}

/// Render a JSON scalar as a query-string value. Nulls are skipped,
/// composite values fall back to their compact JSON text.
fn render_query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        composite => Some(composite.to_string()),
    }
}

/// Join a base URL and an endpoint path without doubling slashes
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
