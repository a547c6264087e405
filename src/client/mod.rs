//! The DbFlare client
//!
//! One configured [`DbFlareClient`] per backend. Every operation issues
//! exactly one HTTP request, awaits its response, decodes the envelope and
//! projects it into the requested shape. The configuration is immutable
//! after construction and the client is safe to share across tasks.

use crate::coerce::{Coercer, ObjectAssembler};
use crate::envelope;
use crate::error::{Error, Result};
use crate::paging::Paging;
use crate::request::{join_url, Operation, RequestSpec, VerbOverrides, ACCEPT_JSON};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{JsonObject, MultiValueMap, PayloadKey, StringMap, ValueMap};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

#[cfg(test)]
mod tests;

// ============================================================================
// Configuration
// ============================================================================

/// Client configuration, immutable after construction
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the DbFlare backend
    pub base_url: String,
    /// Whether requests must carry an API key
    pub api_key_required: bool,
    /// The API key sent in the `Authorization` header
    pub api_key: Option<String>,
    /// Verb remapping for update/delete
    pub verb_overrides: VerbOverrides,
    /// Which envelope generation the backend speaks
    pub payload_key: PayloadKey,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key_required: false,
            api_key: None,
            verb_overrides: VerbOverrides::default(),
            payload_key: PayloadKey::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate the configuration (base URL and verb overrides)
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url is required"));
        }
        Url::parse(&self.base_url)?;
        self.verb_overrides.validate()
    }
}

/// Builder for the client configuration
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Require an API key on every request
    pub fn api_key_required(mut self, required: bool) -> Self {
        self.config.api_key_required = required;
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Remap mutating verbs
    pub fn verb_overrides(mut self, overrides: VerbOverrides) -> Self {
        self.config.verb_overrides = overrides;
        self
    }

    /// Select the envelope generation
    pub fn payload_key(mut self, key: PayloadKey) -> Self {
        self.config.payload_key = key;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// ============================================================================
// Client
// ============================================================================

/// Async client for the DbFlare remote data-access service
pub struct DbFlareClient {
    config: ClientConfig,
    coercer: Coercer,
    transport: Arc<dyn Transport>,
}

impl DbFlareClient {
    /// Create a client over the default reqwest transport.
    ///
    /// Fails with `Error::Config` when the base URL is missing/invalid or a
    /// verb override is outside its allowed set.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let coercer = Coercer::new(config.payload_key);
        Ok(Self {
            config,
            coercer,
            transport,
        })
    }

    /// The client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shape coercer matching this client's envelope generation
    pub fn coercer(&self) -> &Coercer {
        &self.coercer
    }

    // ============================================================================
    // Retrieval
    // ============================================================================

    /// Fetch a single typed entity
    pub async fn zget_one<T: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
    ) -> Result<Option<T>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_object(root.as_ref())
    }

    /// Fetch a single entity as a generic map
    pub async fn zget_one_map(&self, eid: &str, query: &ValueMap) -> Result<Option<JsonObject>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_map(root.as_ref())
    }

    /// Fetch a single entity through a caller-supplied assembler
    pub async fn zget_one_with<A: ObjectAssembler>(
        &self,
        eid: &str,
        query: &ValueMap,
        assembler: &A,
    ) -> Result<Option<A::Output>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_object_with(root.as_ref(), assembler)
    }

    /// Fetch a typed list
    pub async fn zget_list<T: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
    ) -> Result<Vec<T>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_list(root.as_ref())
    }

    /// Fetch a typed list, writing the server-reported total into `paging`
    pub async fn zget_list_paged<T: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
        paging: &mut Paging,
    ) -> Result<Vec<T>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_list_paged(root.as_ref(), paging)
    }

    /// Fetch a typed list with repeated query keys (IN-style filters)
    pub async fn zget_list_filtered<T: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
        filters: &MultiValueMap,
    ) -> Result<Vec<T>> {
        let root = self.dispatch_get(eid, query, Some(filters)).await?;
        self.coercer.to_list(root.as_ref())
    }

    /// Filtered list variant with paging write-back
    pub async fn zget_list_filtered_paged<T: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
        filters: &MultiValueMap,
        paging: &mut Paging,
    ) -> Result<Vec<T>> {
        let root = self.dispatch_get(eid, query, Some(filters)).await?;
        self.coercer.to_list_paged(root.as_ref(), paging)
    }

    /// Fetch a list of generic maps
    pub async fn zget_list_map(&self, eid: &str, query: &ValueMap) -> Result<Vec<JsonObject>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_list_map(root.as_ref())
    }

    /// List-of-maps variant with paging write-back
    pub async fn zget_list_map_paged(
        &self,
        eid: &str,
        query: &ValueMap,
        paging: &mut Paging,
    ) -> Result<Vec<JsonObject>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_list_map_paged(root.as_ref(), paging)
    }

    /// Fetch a list through a caller-supplied assembler
    pub async fn zget_list_with<A: ObjectAssembler>(
        &self,
        eid: &str,
        query: &ValueMap,
        assembler: &A,
    ) -> Result<Vec<A::Output>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_list_with(root.as_ref(), assembler)
    }

    /// Assembler list variant with paging write-back
    pub async fn zget_list_paged_with<A: ObjectAssembler>(
        &self,
        eid: &str,
        query: &ValueMap,
        paging: &mut Paging,
        assembler: &A,
    ) -> Result<Vec<A::Output>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_list_paged_with(root.as_ref(), paging, assembler)
    }

    /// Fetch the raw JSON text of whatever the endpoint returns
    pub async fn zget_json(&self, eid: &str, query: &ValueMap) -> Result<Option<String>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_json_string(root.as_ref())
    }

    /// Fetch a scalar string result
    pub async fn zget_string(&self, eid: &str, query: &ValueMap) -> Result<Option<String>> {
        let primitive = self.zget_primitive(eid, query).await?;
        Ok(primitive.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    /// Fetch a scalar integer result
    pub async fn zget_i64(&self, eid: &str, query: &ValueMap) -> Result<Option<i64>> {
        match self.zget_primitive(eid, query).await? {
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| Error::decode(format!("'{v}' is not an integer"))),
            None => Ok(None),
        }
    }

    /// Fetch a scalar floating-point result
    pub async fn zget_f64(&self, eid: &str, query: &ValueMap) -> Result<Option<f64>> {
        match self.zget_primitive(eid, query).await? {
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| Error::decode(format!("'{v}' is not a number"))),
            None => Ok(None),
        }
    }

    async fn zget_primitive(&self, eid: &str, query: &ValueMap) -> Result<Option<Value>> {
        let root = self.dispatch_get(eid, query, None).await?;
        self.coercer.to_primitive(root.as_ref())
    }

    // ============================================================================
    // Insert
    // ============================================================================

    /// Insert a batch of items, returning the stored rows
    pub async fn zinsert<T: Serialize, R: DeserializeOwned>(
        &self,
        eid: &str,
        items: &[T],
    ) -> Result<Vec<R>> {
        let spec = self
            .prepare(Operation::Insert, "/zinsert")?
            .query("eid", eid)
            .json_body(&items)?;
        let root = self.dispatch(spec).await?;
        self.coercer.to_list(root.as_ref())
    }

    /// Insert one item. Inserts always travel as a batch; this wraps the
    /// item in a one-element batch and returns the first stored row.
    pub async fn zinsert_one<T: Serialize, R: DeserializeOwned>(
        &self,
        eid: &str,
        item: &T,
    ) -> Result<Option<R>> {
        let rows = self.zinsert(eid, std::slice::from_ref(item)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a batch, returning the stored rows as generic maps
    pub async fn zinsert_map<T: Serialize>(
        &self,
        eid: &str,
        items: &[T],
    ) -> Result<Vec<JsonObject>> {
        self.zinsert(eid, items).await
    }

    /// Insert one item, returning the stored row as a generic map
    pub async fn zinsert_one_map<T: Serialize>(
        &self,
        eid: &str,
        item: &T,
    ) -> Result<Option<JsonObject>> {
        self.zinsert_one(eid, item).await
    }

    // ============================================================================
    // Update
    // ============================================================================

    /// Update a batch of items, returning the stored rows
    pub async fn zupdate<T: Serialize, R: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
        items: &[T],
    ) -> Result<Vec<R>> {
        let spec = self
            .prepare(Operation::Update, "/zupdate")?
            .query("eid", eid)
            .query_map(query)
            .json_body(&items)?;
        let root = self.dispatch(spec).await?;
        self.coercer.to_list(root.as_ref())
    }

    /// Update a single item, returning the stored row
    pub async fn zupdate_one<T: Serialize, R: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
        item: &T,
    ) -> Result<Option<R>> {
        let spec = self
            .prepare(Operation::Update, "/zupdate")?
            .query("eid", eid)
            .query_map(query)
            .json_body(item)?;
        let root = self.dispatch(spec).await?;
        self.coercer.to_object(root.as_ref())
    }

    /// Update a batch, returning the stored rows as generic maps
    pub async fn zupdate_map<T: Serialize>(
        &self,
        eid: &str,
        query: &ValueMap,
        items: &[T],
    ) -> Result<Vec<JsonObject>> {
        self.zupdate(eid, query, items).await
    }

    /// Update one item, returning the stored row as a generic map
    pub async fn zupdate_one_map<T: Serialize>(
        &self,
        eid: &str,
        query: &ValueMap,
        item: &T,
    ) -> Result<Option<JsonObject>> {
        self.zupdate_one(eid, query, item).await
    }

    // ============================================================================
    // Delete
    // ============================================================================

    /// Delete rows selected by the query parameters
    pub async fn zdelete(&self, eid: &str, query: &ValueMap) -> Result<()> {
        let root = self.dispatch_delete(eid, query).await?;
        if let Some(root) = root {
            envelope::bubble_errors(&root)?;
        }
        Ok(())
    }

    /// Delete and return the removed row, typed
    pub async fn zdelete_as<R: DeserializeOwned>(
        &self,
        eid: &str,
        query: &ValueMap,
    ) -> Result<Option<R>> {
        let root = self.dispatch_delete(eid, query).await?;
        self.coercer.to_object(root.as_ref())
    }

    /// Delete and return the removed row as a generic map
    pub async fn zdelete_map(&self, eid: &str, query: &ValueMap) -> Result<Option<JsonObject>> {
        self.zdelete_as(eid, query).await
    }

    async fn dispatch_delete(&self, eid: &str, query: &ValueMap) -> Result<Option<Value>> {
        let spec = self
            .prepare(Operation::Delete, "/zdelete")?
            .query("eid", eid)
            .query_map(query);
        self.dispatch(spec).await
    }

    // ============================================================================
    // Raw escape hatches
    // ============================================================================

    /// GET an arbitrary path (with `{name}` route templates) and return the
    /// decoded root element for custom processing
    pub async fn get_raw(
        &self,
        path: &str,
        route: &StringMap,
        query: &ValueMap,
        filters: Option<&MultiValueMap>,
    ) -> Result<Option<Value>> {
        let mut spec = self
            .prepare(Operation::Get, path)?
            .query_map(query);
        for (key, value) in route {
            spec = spec.route(key.clone(), value.clone());
        }
        if let Some(filters) = filters {
            spec = spec.query_multi_map(filters);
        }
        self.dispatch(spec).await
    }

    /// POST a payload to an arbitrary path and return the decoded root
    pub async fn post_raw<T: Serialize>(
        &self,
        path: &str,
        route: &StringMap,
        query: &ValueMap,
        payload: &T,
    ) -> Result<Option<Value>> {
        self.send_raw(reqwest::Method::POST, path, route, query, payload)
            .await
    }

    /// PUT a payload to an arbitrary path and return the decoded root
    pub async fn put_raw<T: Serialize>(
        &self,
        path: &str,
        route: &StringMap,
        query: &ValueMap,
        payload: &T,
    ) -> Result<Option<Value>> {
        self.send_raw(reqwest::Method::PUT, path, route, query, payload)
            .await
    }

    /// DELETE an arbitrary path and return the decoded root
    pub async fn delete_raw(
        &self,
        path: &str,
        route: &StringMap,
        query: &ValueMap,
    ) -> Result<Option<Value>> {
        let mut spec = RequestSpec::new(
            reqwest::Method::DELETE,
            join_url(&self.config.base_url, path),
        )
        .headers(self.base_headers()?)
        .query_map(query);
        for (key, value) in route {
            spec = spec.route(key.clone(), value.clone());
        }
        self.dispatch(spec).await
    }

    async fn send_raw<T: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        route: &StringMap,
        query: &ValueMap,
        payload: &T,
    ) -> Result<Option<Value>> {
        let mut spec = RequestSpec::new(method, join_url(&self.config.base_url, path))
            .headers(self.base_headers()?)
            .query_map(query)
            .json_body(payload)?;
        for (key, value) in route {
            spec = spec.route(key.clone(), value.clone());
        }
        self.dispatch(spec).await
    }

    // ============================================================================
    // Plumbing
    // ============================================================================

    async fn dispatch_get(
        &self,
        eid: &str,
        query: &ValueMap,
        filters: Option<&MultiValueMap>,
    ) -> Result<Option<Value>> {
        let mut spec = self
            .prepare(Operation::Get, "/zget")?
            .query("eid", eid)
            .query_map(query);
        if let Some(filters) = filters {
            spec = spec.query_multi_map(filters);
        }
        self.dispatch(spec).await
    }

    /// Build the request skeleton for a logical operation. The API-key
    /// checkpoint runs here, before anything touches the network.
    fn prepare(&self, operation: Operation, path: &str) -> Result<RequestSpec> {
        let headers = self.base_headers()?;
        let method = self.config.verb_overrides.verb_for(operation);
        Ok(RequestSpec::new(method, join_url(&self.config.base_url, path)).headers(headers))
    }

    fn base_headers(&self) -> Result<StringMap> {
        let mut headers = StringMap::new();
        if self.config.api_key_required {
            let key = self.config.api_key.as_deref().unwrap_or("");
            if key.trim().is_empty() {
                return Err(Error::config("API key is required but missing or blank"));
            }
            headers.insert("Authorization".to_string(), key.to_string());
        }
        headers.insert("accept".to_string(), ACCEPT_JSON.to_string());
        Ok(headers)
    }

    async fn dispatch(&self, spec: RequestSpec) -> Result<Option<Value>> {
        debug!(method = %spec.method, url = %spec.url, "dispatching");
        let response = self.transport.send(&spec).await?;
        envelope::decode(response.status, &response.body)
    }
}

impl std::fmt::Debug for DbFlareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbFlareClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
