//! Response encoding for the two terminal outcomes of an invocation.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;
use xfn_core::{CompositeResponse, Condition, FunctionError, FunctionMeta, ResourceKey, Result};

use crate::merger::DesiredEntry;

/// Package a successful invocation.
///
/// Prior entries are written back under their original key and value.
/// Synthesized resources are keyed by `"<kind>/<name>"`; a synthesized key
/// that is already taken by an unrelated prior entry is a malformed request.
pub fn encode(
    meta: FunctionMeta,
    desired: IndexMap<ResourceKey, DesiredEntry>,
    pipeline_context: Map<String, Value>,
    conditions: Vec<Condition>,
) -> Result<CompositeResponse> {
    let mut entries = IndexMap::with_capacity(desired.len());
    for (identity, entry) in desired {
        let (key, value) = match entry {
            DesiredEntry::Prior(prior) => (prior.key, prior.value),
            DesiredEntry::Synthesized(resource) => {
                (identity.to_string(), serde_json::to_value(&resource)?)
            }
        };
        if entries.contains_key(&key) {
            return Err(FunctionError::malformed(
                format!("priorDesired[{key:?}]"),
                format!("key is also used for {identity}"),
            ));
        }
        entries.insert(key, value);
    }

    Ok(CompositeResponse {
        meta,
        desired: entries,
        pipeline_context,
        conditions,
    })
}

/// Package a halted invocation: one `Fatal` condition and no desired
/// resources, so the caller cannot proceed with partial results. The
/// incoming context is returned untouched.
pub fn encode_fatal(
    meta: FunctionMeta,
    pipeline_context: Map<String, Value>,
    error: &FunctionError,
) -> CompositeResponse {
    warn!(
        error = %error,
        category = %error.category(),
        "Composition function halted"
    );
    CompositeResponse {
        meta,
        desired: IndexMap::new(),
        pipeline_context,
        conditions: vec![error.to_condition()],
    }
}
