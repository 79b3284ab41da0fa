//! Synthesis rules and the rule set that runs them.
//!
//! A rule looks at the observed composite's spec and metadata and emits at
//! most one desired resource. Rules never see each other's output, so the
//! set's result is the union of all emissions regardless of the order rules
//! were registered in. Registration order only fixes the order new entries
//! appear in the response.
//!
//! Two rules emitting the same `(kind, name)` with different content is a
//! conflict and fails the invocation; identical emissions collapse into one.
//! The same applies to pipeline-context entries written by rules.

pub mod vpc;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;
use xfn_core::{Condition, DesiredResource, FunctionError, ResourceKey, Result};

use crate::config::RulesConfig;
use crate::decoder::{CompositeMetadata, DecodedRequest};

pub use vpc::VpcFromCidr;

/// Read-only view a rule inspects.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub spec: &'a Map<String, Value>,
    pub metadata: &'a CompositeMetadata,
}

impl<'a> RuleInput<'a> {
    pub fn new(spec: &'a Map<String, Value>, metadata: &'a CompositeMetadata) -> Self {
        Self { spec, metadata }
    }
}

impl<'a> From<&'a DecodedRequest> for RuleInput<'a> {
    fn from(request: &'a DecodedRequest) -> Self {
        Self::new(&request.spec, &request.metadata)
    }
}

/// What a single rule produced for one invocation.
///
/// The default value means "not applicable": nothing emitted, nothing to
/// report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub resource: Option<DesiredResource>,
    /// Pipeline-context entries this rule sets.
    pub context: Map<String, Value>,
    /// Anomalies worth reporting as conditions.
    pub anomalies: Vec<Condition>,
}

impl RuleOutcome {
    pub fn not_applicable() -> Self {
        Self::default()
    }

    pub fn emit(resource: DesiredResource) -> Self {
        Self {
            resource: Some(resource),
            ..Default::default()
        }
    }

    pub fn anomaly(condition: Condition) -> Self {
        Self {
            anomalies: vec![condition],
            ..Default::default()
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn is_not_applicable(&self) -> bool {
        self.resource.is_none() && self.context.is_empty() && self.anomalies.is_empty()
    }
}

impl From<Option<DesiredResource>> for RuleOutcome {
    fn from(resource: Option<DesiredResource>) -> Self {
        Self {
            resource,
            ..Default::default()
        }
    }
}

/// A pure synthesis rule.
///
/// Implementations must not read or write shared mutable state: the same
/// input always yields the same outcome.
pub trait SynthesisRule: Send + Sync {
    /// Unique rule name, used in logs and conflict reports.
    fn name(&self) -> &str;

    fn synthesize(&self, input: &RuleInput<'_>) -> RuleOutcome;
}

/// Adapter registering a plain function or closure as a rule.
pub struct FnRule<F> {
    name: String,
    f: F,
}

impl<F> FnRule<F>
where
    F: Fn(&RuleInput<'_>) -> RuleOutcome + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SynthesisRule for FnRule<F>
where
    F: Fn(&RuleInput<'_>) -> RuleOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn synthesize(&self, input: &RuleInput<'_>) -> RuleOutcome {
        (self.f)(input)
    }
}

/// Combined result of running every rule in a set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Synthesis {
    pub resources: IndexMap<ResourceKey, DesiredResource>,
    pub context: Map<String, Value>,
    pub conditions: Vec<Condition>,
}

/// Ordered collection of registered rules.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn SynthesisRule>>,
}

impl RuleSet {
    /// Create a new empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the rule set described by configuration.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let mut set = Self::new();
        if config.vpc.enabled {
            set.register(Arc::new(VpcFromCidr::new(config.vpc.clone())))?;
        } else {
            debug!(rule = vpc::RULE_NAME, "Rule disabled by configuration");
        }
        Ok(set)
    }

    /// Register a rule. Rule names must be unique within the set.
    pub fn register(&mut self, rule: Arc<dyn SynthesisRule>) -> Result<()> {
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(FunctionError::duplicate_rule(rule.name()));
        }
        debug!(rule = %rule.name(), "Registered synthesis rule");
        self.rules.push(rule);
        Ok(())
    }

    /// Register a plain function as a rule.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(&RuleInput<'_>) -> RuleOutcome + Send + Sync + 'static,
    {
        self.register(Arc::new(FnRule::new(name, f)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule against `input` and union the emissions.
    pub fn synthesize(&self, input: &RuleInput<'_>) -> Result<Synthesis> {
        let mut emitted: IndexMap<ResourceKey, (&str, DesiredResource)> = IndexMap::new();
        let mut context: IndexMap<String, (&str, Value)> = IndexMap::new();
        let mut conditions = Vec::new();

        for rule in &self.rules {
            let rule_name = rule.name();
            let outcome = rule.synthesize(input);
            if outcome.is_not_applicable() {
                debug!(rule = %rule_name, "Rule not applicable");
                continue;
            }

            if let Some(resource) = outcome.resource {
                let key = resource.key();
                match emitted.get(&key) {
                    Some((first, existing)) if *existing != resource => {
                        return Err(FunctionError::conflict(key.kind, key.name, *first, rule_name));
                    }
                    Some((first, _)) => {
                        debug!(
                            rule = %rule_name,
                            first = %first,
                            resource = %key,
                            "Identical emission collapsed"
                        );
                    }
                    None => {
                        debug!(rule = %rule_name, resource = %key, "Rule emitted resource");
                        emitted.insert(key, (rule_name, resource));
                    }
                }
            }

            for (key, value) in outcome.context {
                match context.get(&key) {
                    Some((first, existing)) if *existing != value => {
                        return Err(FunctionError::context_conflict(key, *first, rule_name));
                    }
                    Some(_) => {}
                    None => {
                        context.insert(key, (rule_name, value));
                    }
                }
            }

            conditions.extend(outcome.anomalies);
        }

        Ok(Synthesis {
            resources: emitted
                .into_iter()
                .map(|(key, (_, resource))| (key, resource))
                .collect(),
            context: context
                .into_iter()
                .map(|(key, (_, value))| (key, value))
                .collect(),
            conditions,
        })
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(name: &str) -> CompositeMetadata {
        CompositeMetadata {
            name: name.to_string(),
            fields: json!({"name": name}).as_object().unwrap().clone(),
        }
    }

    fn fixed(
        kind: &'static str,
        name: &'static str,
        spec: Value,
    ) -> impl Fn(&RuleInput<'_>) -> RuleOutcome + Send + Sync + 'static {
        move |_| {
            let resource = DesiredResource::new("example.org/v1", kind, name);
            RuleOutcome::emit(resource.with_spec(spec.clone()))
        }
    }

    fn writes(
        key: &'static str,
        value: &'static str,
    ) -> impl Fn(&RuleInput<'_>) -> RuleOutcome + Send + Sync + 'static {
        move |_| RuleOutcome::not_applicable().with_context(key, json!(value))
    }

    fn not_applicable(_: &RuleInput<'_>) -> RuleOutcome {
        RuleOutcome::not_applicable()
    }

    #[test]
    fn test_empty_rule_set_synthesizes_nothing() {
        let spec = Map::new();
        let meta = metadata("xr");
        let synthesis = RuleSet::new()
            .synthesize(&RuleInput::new(&spec, &meta))
            .unwrap();
        assert_eq!(synthesis, Synthesis::default());
    }

    #[test]
    fn test_duplicate_rule_name_rejected() {
        let mut set = RuleSet::new();
        set.register_fn("a", not_applicable).unwrap();
        let err = set.register_fn("a", not_applicable).unwrap_err();
        assert!(matches!(err, FunctionError::DuplicateRule(name) if name == "a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_union_of_emissions_in_registration_order() {
        let mut set = RuleSet::new();
        set.register_fn("bucket", fixed("Bucket", "b", json!({})))
            .unwrap();
        set.register_fn("none", not_applicable).unwrap();
        set.register_fn("vpc", fixed("VPC", "v", json!({})))
            .unwrap();

        let spec = Map::new();
        let meta = metadata("xr");
        let synthesis = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap();
        let keys: Vec<String> = synthesis
            .resources
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["Bucket/b", "VPC/v"]);
        assert!(synthesis.conditions.is_empty());
    }

    #[test]
    fn test_conflicting_emissions_fail() {
        let mut set = RuleSet::new();
        set.register_fn("first", fixed("VPC", "x-vpc", json!({"a": 1})))
            .unwrap();
        set.register_fn("second", fixed("VPC", "x-vpc", json!({"a": 2})))
            .unwrap();

        let spec = Map::new();
        let meta = metadata("x");
        let err = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap_err();
        match err {
            FunctionError::Conflict {
                kind,
                name,
                first,
                second,
            } => {
                assert_eq!((kind.as_str(), name.as_str()), ("VPC", "x-vpc"));
                assert_eq!((first.as_str(), second.as_str()), ("first", "second"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_emissions_collapse() {
        let mut set = RuleSet::new();
        set.register_fn("first", fixed("VPC", "x-vpc", json!({"a": 1})))
            .unwrap();
        set.register_fn("second", fixed("VPC", "x-vpc", json!({"a": 1})))
            .unwrap();

        let spec = Map::new();
        let meta = metadata("x");
        let synthesis = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap();
        assert_eq!(synthesis.resources.len(), 1);
    }

    #[test]
    fn test_context_updates_and_conflicts() {
        let mut set = RuleSet::new();
        set.register_fn("a", writes("region", "eu-west-1")).unwrap();
        set.register_fn("b", writes("region", "eu-west-1")).unwrap();

        let spec = Map::new();
        let meta = metadata("x");
        let synthesis = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap();
        assert_eq!(synthesis.context["region"], "eu-west-1");

        set.register_fn("c", writes("region", "us-east-1")).unwrap();
        let err = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap_err();
        assert!(matches!(err, FunctionError::ContextConflict { ref key, .. } if key == "region"));
    }

    #[test]
    fn test_rules_see_only_the_input() {
        let mut set = RuleSet::new();
        set.register_fn("echo-name", |input| {
            RuleOutcome::from(Some(DesiredResource::new(
                "example.org/v1",
                "Echo",
                format!("{}-echo", input.metadata.name),
            )))
        })
        .unwrap();

        let spec = Map::new();
        let meta = metadata("xr");
        let synthesis = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap();
        assert!(
            synthesis
                .resources
                .contains_key(&ResourceKey::new("Echo", "xr-echo"))
        );
    }

    #[test]
    fn test_anomalies_become_conditions() {
        let mut set = RuleSet::new();
        set.register_fn("odd", |_| {
            RuleOutcome::anomaly(Condition::warning("odd input"))
        })
        .unwrap();

        let spec = Map::new();
        let meta = metadata("xr");
        let synthesis = set.synthesize(&RuleInput::new(&spec, &meta)).unwrap();
        assert!(synthesis.resources.is_empty());
        assert_eq!(synthesis.conditions, vec![Condition::warning("odd input")]);
    }

    #[test]
    fn test_from_config_registers_vpc_rule() {
        let set = RuleSet::from_config(&RulesConfig::default()).unwrap();
        assert_eq!(set.names(), vec![vpc::RULE_NAME]);

        let mut config = RulesConfig::default();
        config.vpc.enabled = false;
        assert!(RuleSet::from_config(&config).unwrap().is_empty());
    }
}
