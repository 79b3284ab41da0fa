//! Request and response shapes exchanged with the caller of a composition
//! function.
//!
//! Field names follow the camelCase JSON convention used on the wire. The
//! observed composite and desired entries are kept as raw values here;
//! turning them into typed data (and rejecting malformed shapes) is the
//! decoder's job. Desired entries stay raw in responses too, so an entry
//! carried over from a previous step is returned exactly as it arrived.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::Condition;

/// Opaque metadata echoed from request to response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl FunctionMeta {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
    }
}

/// Input for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRequest {
    #[serde(default, skip_serializing_if = "FunctionMeta::is_empty")]
    pub meta: FunctionMeta,
    #[serde(default)]
    pub observed_composite: Value,
    #[serde(default)]
    pub prior_desired: IndexMap<String, Value>,
    #[serde(default)]
    pub pipeline_context: Map<String, Value>,
}

impl CompositeRequest {
    pub fn new(observed_composite: Value) -> Self {
        Self {
            observed_composite,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.meta.tag = Some(tag.into());
        self
    }

    pub fn with_prior(mut self, key: impl Into<String>, resource: Value) -> Self {
        self.prior_desired.insert(key.into(), resource);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.pipeline_context.insert(key.into(), value);
        self
    }

    /// Build the request for the next pipeline step.
    ///
    /// The observed composite and tag stay the same; the desired state and
    /// context accumulated by `response` become the next step's input.
    pub fn advance(&self, response: &CompositeResponse) -> Self {
        Self {
            meta: self.meta.clone(),
            observed_composite: self.observed_composite.clone(),
            prior_desired: response.desired.clone(),
            pipeline_context: response.pipeline_context.clone(),
        }
    }
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Fatal,
}

/// Output of one invocation.
///
/// Synthesized entries in `desired` are keyed by `"<kind>/<name>"`; entries
/// carried over from the request keep their original key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResponse {
    #[serde(default, skip_serializing_if = "FunctionMeta::is_empty")]
    pub meta: FunctionMeta,
    #[serde(default)]
    pub desired: IndexMap<String, Value>,
    #[serde(default)]
    pub pipeline_context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl CompositeResponse {
    pub fn is_fatal(&self) -> bool {
        self.conditions.iter().any(Condition::is_fatal)
    }

    pub fn outcome(&self) -> Outcome {
        if self.is_fatal() {
            Outcome::Fatal
        } else {
            Outcome::Success
        }
    }

    /// First fatal condition, if the invocation halted.
    pub fn fatal_condition(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.is_fatal())
    }
}
