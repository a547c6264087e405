//! Caller-supplied object assembly
//!
//! An assembler is the escape hatch for callers whose types need custom
//! construction logic (id-based pooling, computed fields) instead of plain
//! serde deserialization. The coercer hands it the unwrapped JSON element —
//! once for object targets, once per element for list targets.

use crate::error::Result;
use crate::paging::Paging;
use serde_json::Value;

/// Strategy for converting a JSON element into a typed object
pub trait ObjectAssembler {
    /// The assembled type
    type Output;

    /// Build one value from an unwrapped JSON element
    fn assemble(&self, element: &Value) -> Result<Self::Output>;

    /// Build one value with access to the call's paging information.
    /// Defaults to ignoring the paging info.
    fn assemble_paged(&self, element: &Value, _paging: &mut Paging) -> Result<Self::Output> {
        self.assemble(element)
    }
}

impl<T, F> ObjectAssembler for F
where
    F: Fn(&Value) -> Result<T>,
{
    type Output = T;

    fn assemble(&self, element: &Value) -> Result<T> {
        self(element)
    }
}
