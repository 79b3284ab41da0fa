//! Request decoding.
//!
//! Turns the loosely-typed observed composite of a [`CompositeRequest`] into
//! typed data and validates every prior desired entry. Every shape problem is
//! reported as a [`FunctionError::MalformedRequest`] naming the offending
//! field.
//!
//! Prior entries are only inspected for their `(kind, name)` identity; the
//! entry itself is kept as received so it can be returned unchanged.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;
use xfn_core::{CompositeRequest, FunctionError, ResourceKey, Result};

const OBJECT: &str = "an object";
const STRING: &str = "a string";

/// Metadata of the observed composite resource.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeMetadata {
    pub name: String,
    /// The full metadata object, including `name`.
    pub fields: Map<String, Value>,
}

/// A prior desired entry exactly as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorEntry {
    /// Key the entry was sent under in `priorDesired`.
    pub key: String,
    pub value: Value,
}

/// A validated request, ready for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRequest {
    pub metadata: CompositeMetadata,
    pub spec: Map<String, Value>,
    /// Prior entries in request order, indexed by merge identity.
    pub prior: IndexMap<ResourceKey, PriorEntry>,
}

pub fn decode(request: &CompositeRequest) -> Result<DecodedRequest> {
    let composite = request
        .observed_composite
        .as_object()
        .ok_or_else(|| malformed_shape("observedComposite", OBJECT, &request.observed_composite))?;

    let metadata = decode_metadata(composite)?;
    let spec = required_object(composite, "spec", "observedComposite.spec")?.clone();

    let mut prior = IndexMap::with_capacity(request.prior_desired.len());
    for (entry, value) in &request.prior_desired {
        let key = prior_identity(entry, value)?;
        if prior.contains_key(&key) {
            return Err(FunctionError::malformed(
                format!("priorDesired[{entry:?}]"),
                format!("duplicates identity {key} of an earlier entry"),
            ));
        }
        prior.insert(
            key,
            PriorEntry {
                key: entry.clone(),
                value: value.clone(),
            },
        );
    }

    debug!(
        composite = %metadata.name,
        spec_fields = spec.len(),
        prior = prior.len(),
        "Decoded request"
    );

    Ok(DecodedRequest {
        metadata,
        spec,
        prior,
    })
}

fn decode_metadata(composite: &Map<String, Value>) -> Result<CompositeMetadata> {
    let fields = required_object(composite, "metadata", "observedComposite.metadata")?;
    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        Some(Value::String(_)) => {
            return Err(FunctionError::malformed(
                "observedComposite.metadata.name",
                "must not be empty",
            ));
        }
        Some(other) => {
            return Err(malformed_shape(
                "observedComposite.metadata.name",
                STRING,
                other,
            ));
        }
        None => {
            return Err(FunctionError::malformed(
                "observedComposite.metadata.name",
                "missing",
            ));
        }
    };

    Ok(CompositeMetadata {
        name,
        fields: fields.clone(),
    })
}

/// Merge identity of one prior desired entry. `apiVersion` and `kind` must
/// be present; the name is read from `name`, falling back to
/// `metadata.name` for objects written in Kubernetes form.
fn prior_identity(entry: &str, value: &Value) -> Result<ResourceKey> {
    let field = format!("priorDesired[{entry:?}]");
    let object = value
        .as_object()
        .ok_or_else(|| malformed_shape(&field, OBJECT, value))?;

    required_string(object, "apiVersion", &field)?;
    let kind = required_string(object, "kind", &field)?;
    let name = match object.get("name") {
        Some(_) => required_string(object, "name", &field)?,
        None => object
            .get("metadata")
            .and_then(Value::as_object)
            .map(|metadata| required_string(metadata, "name", &format!("{field}.metadata")))
            .transpose()?
            .ok_or_else(|| FunctionError::malformed(format!("{field}.name"), "missing"))?,
    };

    Ok(ResourceKey::new(kind, name))
}

fn required_object<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<&'a Map<String, Value>> {
    match parent.get(key) {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(malformed_shape(field, OBJECT, other)),
        None => Err(FunctionError::malformed(field, "missing")),
    }
}

fn required_string(parent: &Map<String, Value>, key: &str, field: &str) -> Result<String> {
    let path = format!("{field}.{key}");
    match parent.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(FunctionError::malformed(path, "must not be empty")),
        Some(other) => Err(malformed_shape(&path, STRING, other)),
        None => Err(FunctionError::malformed(path, "missing")),
    }
}

fn malformed_shape(field: &str, expected: &str, value: &Value) -> FunctionError {
    FunctionError::malformed(
        field,
        format!("expected {expected}, found {}", json_type(value)),
    )
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
