//! Shape coercion of decoded envelopes
//!
//! Given a root element from [`crate::envelope::decode`], the [`Coercer`]
//! projects it into the caller's requested shape: typed object, generic map,
//! list, JSON primitive, or raw JSON text. One unwrap algorithm serves both
//! envelope generations; the payload key (`data` vs `result`) is the only
//! knob.
//!
//! List targets are deliberately lenient: a missing or non-array payload key
//! means "no rows" and yields an empty list, never an error.

mod assembler;

pub use assembler::ObjectAssembler;

use crate::envelope::{bubble_errors, json_kind};
use crate::error::{Error, Result};
use crate::paging::Paging;
use crate::types::{JsonObject, PayloadKey};
use serde::de::DeserializeOwned;
use serde_json::Value;


/// Projects decoded root elements into caller-requested shapes
#[derive(Debug, Clone, Copy, Default)]
pub struct Coercer {
    payload_key: PayloadKey,
}

impl Coercer {
    /// Create a coercer for the given envelope generation
    pub fn new(payload_key: PayloadKey) -> Self {
        Self { payload_key }
    }

    /// The configured payload key
    pub fn payload_key(&self) -> PayloadKey {
        self.payload_key
    }

    // ============================================================================
    // Object targets
    // ============================================================================

    /// Coerce the root into a single typed object.
    ///
    /// A null/absent root or a null payload yields `None`.
    pub fn to_object<T: DeserializeOwned>(&self, root: Option<&Value>) -> Result<Option<T>> {
        match self.unwrap_object(root)? {
            Some(element) => Ok(Some(serde_json::from_value(element.clone())?)),
            None => Ok(None),
        }
    }

    /// Coerce the root into a generic JSON object map
    pub fn to_map(&self, root: Option<&Value>) -> Result<Option<JsonObject>> {
        self.to_object(root)
    }

    /// Coerce the root into a single object via a caller-supplied assembler
    pub fn to_object_with<A: ObjectAssembler>(
        &self,
        root: Option<&Value>,
        assembler: &A,
    ) -> Result<Option<A::Output>> {
        match self.unwrap_object(root)? {
            Some(element) => Ok(Some(assembler.assemble(element)?)),
            None => Ok(None),
        }
    }

    /// Shared unwrap for object/map targets: reject scalars and arrays,
    /// bubble service errors, then peel the payload key if present.
    fn unwrap_object<'a>(&self, root: Option<&'a Value>) -> Result<Option<&'a Value>> {
        let Some(root) = root else {
            return Ok(None);
        };
        match root {
            Value::Null => Ok(None),
            Value::Object(map) => {
                bubble_errors(root)?;
                match map.get(self.payload_key.as_str()) {
                    Some(Value::Null) => Ok(None),
                    Some(payload) => Ok(Some(payload)),
                    None => Ok(Some(root)),
                }
            }
            Value::Array(_) => Err(Error::type_mismatch("object", "array")),
            other => Err(Error::type_mismatch("object", json_kind(other))),
        }
    }

    // ============================================================================
    // List targets
    // ============================================================================

    /// Coerce the root into a typed list. "No rows" (missing or non-array
    /// payload) is an empty list.
    pub fn to_list<T: DeserializeOwned>(&self, root: Option<&Value>) -> Result<Vec<T>> {
        match self.unwrap_list(root, None)? {
            Some(elements) => deserialize_elements(elements),
            None => Ok(Vec::new()),
        }
    }

    /// Coerce the root into a typed list, writing the server-reported total
    /// into `paging`
    pub fn to_list_paged<T: DeserializeOwned>(
        &self,
        root: Option<&Value>,
        paging: &mut Paging,
    ) -> Result<Vec<T>> {
        match self.unwrap_list(root, Some(paging))? {
            Some(elements) => deserialize_elements(elements),
            None => Ok(Vec::new()),
        }
    }

    /// Coerce the root into a list via a caller-supplied assembler, invoked
    /// once per array element
    pub fn to_list_with<A: ObjectAssembler>(
        &self,
        root: Option<&Value>,
        assembler: &A,
    ) -> Result<Vec<A::Output>> {
        match self.unwrap_list(root, None)? {
            Some(elements) => elements.iter().map(|e| assembler.assemble(e)).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Assembler list variant with paging write-back; the assembler receives
    /// the paging info per element
    pub fn to_list_paged_with<A: ObjectAssembler>(
        &self,
        root: Option<&Value>,
        paging: &mut Paging,
        assembler: &A,
    ) -> Result<Vec<A::Output>> {
        match self.unwrap_list(root, Some(&mut *paging))? {
            Some(elements) => elements
                .iter()
                .map(|e| assembler.assemble_paged(e, paging))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Coerce the root into a list of generic JSON object maps
    pub fn to_list_map(&self, root: Option<&Value>) -> Result<Vec<JsonObject>> {
        self.to_list(root)
    }

    /// List-of-maps variant with paging write-back
    pub fn to_list_map_paged(
        &self,
        root: Option<&Value>,
        paging: &mut Paging,
    ) -> Result<Vec<JsonObject>> {
        self.to_list_paged(root, paging)
    }

    /// Shared unwrap for list targets. Returns the backing array, or `None`
    /// for the lenient empty result. When paging is supplied the total is
    /// written back: array length for bare arrays (no server-reported total
    /// exists), the envelope's `total` field for wrapped arrays.
    fn unwrap_list<'a>(
        &self,
        root: Option<&'a Value>,
        paging: Option<&mut Paging>,
    ) -> Result<Option<&'a Vec<Value>>> {
        let Some(root) = root else {
            if let Some(paging) = paging {
                paging.total = 0;
            }
            return Ok(None);
        };
        match root {
            Value::Null => {
                if let Some(paging) = paging {
                    paging.total = 0;
                }
                Ok(None)
            }
            Value::Array(elements) => {
                if let Some(paging) = paging {
                    paging.total = elements.len() as u64;
                }
                Ok(Some(elements))
            }
            Value::Object(map) => {
                bubble_errors(root)?;
                match map.get(self.payload_key.as_str()) {
                    Some(Value::Array(elements)) => {
                        if let Some(paging) = paging {
                            // Callers requesting pagination rely on the
                            // endpoint returning a total; a wrapped array
                            // without one is a malformed page.
                            let total = map
                                .get("total")
                                .and_then(Value::as_u64)
                                .ok_or_else(|| {
                                    Error::decode("paginated response is missing 'total'")
                                })?;
                            paging.total = total;
                        }
                        Ok(Some(elements))
                    }
                    _ => {
                        if let Some(paging) = paging {
                            paging.total = 0;
                        }
                        Ok(None)
                    }
                }
            }
            other => Err(Error::type_mismatch("list", json_kind(other))),
        }
    }

    // ============================================================================
    // Primitive and raw JSON targets
    // ============================================================================

    /// Coerce the root into a scalar JSON value (string, number, or boolean)
    pub fn to_primitive(&self, root: Option<&Value>) -> Result<Option<Value>> {
        let Some(root) = root else {
            return Ok(None);
        };
        match root {
            Value::Null => Ok(None),
            Value::Array(_) => Err(Error::type_mismatch("primitive", "array")),
            Value::Object(map) => {
                bubble_errors(root)?;
                match map.get(self.payload_key.as_str()) {
                    Some(Value::Null) | None => Ok(None),
                    Some(payload) if is_scalar(payload) => Ok(Some(payload.clone())),
                    Some(payload) => Err(Error::type_mismatch("primitive", json_kind(payload))),
                }
            }
            scalar => Ok(Some(scalar.clone())),
        }
    }

    /// Return the root's literal JSON text, without unwrapping envelopes.
    ///
    /// Service errors still bubble for object roots; arrays and scalars pass
    /// through untouched. This is the debugging/pass-through path.
    pub fn to_json_string(&self, root: Option<&Value>) -> Result<Option<String>> {
        let Some(root) = root else {
            return Ok(None);
        };
        if root.is_null() {
            return Ok(None);
        }
        if root.is_object() {
            bubble_errors(root)?;
        }
        Ok(Some(serde_json::to_string(root)?))
    }
}

fn deserialize_elements<T: DeserializeOwned>(elements: &[Value]) -> Result<Vec<T>> {
    elements
        .iter()
        .map(|e| serde_json::from_value(e.clone()).map_err(Error::from))
        .collect()
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}
