//! Pipelines of composition steps.
//!
//! A pipeline is a fold over ordered steps: each step receives the request
//! built from the previous step's response, so desired state and context
//! accumulate explicitly rather than through shared state. Warnings raised
//! by any step are carried into the final response. A `Fatal` response stops
//! the fold and is returned as-is.

use std::sync::Arc;

use tracing::{debug, warn};
use xfn_core::{CompositeRequest, CompositeResponse};

use crate::function::CompositionFunction;
use crate::{decoder, encoder};

/// One step of a composition pipeline.
pub trait CompositionStep: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, request: &CompositeRequest) -> CompositeResponse;
}

impl CompositionStep for CompositionFunction {
    fn name(&self) -> &str {
        CompositionFunction::name(self)
    }

    fn run(&self, request: &CompositeRequest) -> CompositeResponse {
        CompositionFunction::run(self, request)
    }
}

#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn CompositionStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: Arc<dyn CompositionStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order. An empty pipeline validates the request and
    /// echoes its prior desired state and context.
    pub fn run(&self, request: &CompositeRequest) -> CompositeResponse {
        let mut current = request.clone();
        let mut response: Option<CompositeResponse> = None;
        let mut conditions = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(previous) = &response {
                current = current.advance(previous);
            }

            debug!(step = %step.name(), index, "Running pipeline step");
            let mut output = step.run(&current);
            if output.is_fatal() {
                warn!(step = %step.name(), index, "Pipeline halted by fatal condition");
                return output;
            }
            conditions.append(&mut output.conditions);
            response = Some(output);
        }

        match response {
            Some(mut response) => {
                response.conditions = conditions;
                response
            }
            None => passthrough(request),
        }
    }
}

fn passthrough(request: &CompositeRequest) -> CompositeResponse {
    if let Err(err) = decoder::decode(request) {
        return encoder::encode_fatal(
            request.meta.clone(),
            request.pipeline_context.clone(),
            &err,
        );
    }

    CompositeResponse {
        meta: request.meta.clone(),
        desired: request.prior_desired.clone(),
        pipeline_context: request.pipeline_context.clone(),
        conditions: Vec::new(),
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipeline").field("steps", &names).finish()
    }
}
