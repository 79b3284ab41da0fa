//! Resource synthesis and desired-state merging for composition function
//! pipelines.
//!
//! One invocation runs strictly in sequence:
//!
//! ```text
//! CompositeRequest
//!       │
//!  ┌────▼────┐   ┌───────────┐   ┌────────┐   ┌─────────┐
//!  │ decoder ├──►│ rule set  ├──►│ merger ├──►│ encoder │──► CompositeResponse
//!  └─────────┘   └───────────┘   └────────┘   └─────────┘
//! ```
//!
//! Any failure along the way (malformed input, conflicting emissions) ends
//! in a response carrying a single `Fatal` condition and no desired
//! resources; the function never fails at the protocol boundary.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use xfn_core::CompositeRequest;
//! use xfn_function::{CompositionFunction, FunctionConfig};
//!
//! let function = CompositionFunction::from_config(&FunctionConfig::default()).unwrap();
//! let request = CompositeRequest::new(json!({
//!     "metadata": {"name": "my-xr"},
//!     "spec": {"cidr": "10.0.0.0/16"}
//! }));
//!
//! let response = function.run(&request);
//! assert!(response.desired.contains_key("VPC/my-xr-vpc"));
//! ```

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod function;
pub mod merger;
pub mod observability;
pub mod pipeline;
pub mod rules;

pub use config::{ConfigError, FunctionConfig, LoggingConfig, RulesConfig, VpcRuleConfig};
pub use decoder::{CompositeMetadata, DecodedRequest, PriorEntry, decode};
pub use function::CompositionFunction;
pub use merger::DesiredEntry;
pub use observability::{apply_logging_level, init_tracing};
pub use pipeline::{CompositionStep, Pipeline};
pub use rules::{FnRule, RuleInput, RuleOutcome, RuleSet, Synthesis, SynthesisRule, VpcFromCidr};
