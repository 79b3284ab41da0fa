//! The composition function: decode → synthesize → merge → encode.

use serde_json::Map;
use tracing::{debug, info};
use xfn_core::{CompositeRequest, CompositeResponse, FunctionError, FunctionMeta, Result};

use crate::config::FunctionConfig;
use crate::rules::{RuleInput, RuleSet};
use crate::{decoder, encoder, merger};

/// A stateless composition function built around an immutable rule set.
///
/// Safe to share across threads; every call is an independent transform.
#[derive(Debug, Clone, Default)]
pub struct CompositionFunction {
    name: String,
    rules: RuleSet,
}

impl CompositionFunction {
    pub fn new(name: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn from_config(config: &FunctionConfig) -> Result<Self> {
        Ok(Self::new(
            env!("CARGO_PKG_NAME"),
            RuleSet::from_config(&config.rules)?,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run one invocation. Failures are reported inside the response as a
    /// `Fatal` condition; this never returns an error.
    pub fn run(&self, request: &CompositeRequest) -> CompositeResponse {
        match self.try_run(request) {
            Ok(response) => response,
            Err(err) => encoder::encode_fatal(
                request.meta.clone(),
                request.pipeline_context.clone(),
                &err,
            ),
        }
    }

    /// Run one invocation from raw JSON. Input that does not parse is a
    /// malformed request like any other.
    pub fn run_json(&self, raw: &str) -> CompositeResponse {
        match serde_json::from_str::<CompositeRequest>(raw) {
            Ok(request) => self.run(&request),
            Err(err) => encoder::encode_fatal(
                FunctionMeta::default(),
                Map::new(),
                &FunctionError::from(err),
            ),
        }
    }

    fn try_run(&self, request: &CompositeRequest) -> Result<CompositeResponse> {
        let decoded = decoder::decode(request)?;
        let synthesis = self.rules.synthesize(&RuleInput::from(&decoded))?;

        let mut pipeline_context = request.pipeline_context.clone();
        for (key, value) in synthesis.context {
            debug!(key = %key, "Rule updated pipeline context");
            pipeline_context.insert(key, value);
        }

        let prior = decoded.prior.len();
        let synthesized = synthesis.resources.len();
        let desired = merger::merge(decoded.prior, synthesis.resources.into_values())?;

        info!(
            function = %self.name,
            composite = %decoded.metadata.name,
            prior,
            synthesized,
            desired = desired.len(),
            warnings = synthesis.conditions.len(),
            "Composition function completed"
        );

        encoder::encode(
            request.meta.clone(),
            desired,
            pipeline_context,
            synthesis.conditions,
        )
    }
}
