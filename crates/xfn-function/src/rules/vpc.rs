use ipnetwork::IpNetwork;
use serde_json::{Value, json};
use tracing::warn;
use xfn_core::{Condition, DesiredResource};

use super::{RuleInput, RuleOutcome, SynthesisRule};
use crate::config::VpcRuleConfig;
use crate::decoder::json_type;

pub const RULE_NAME: &str = "vpc-from-cidr";

/// Emits a VPC named `<composite>-vpc` when the composite's spec carries a
/// `cidr`.
///
/// An absent (or null) `cidr` means the rule does not apply. A `cidr` that
/// is present but not a non-empty string in `address/prefix` form is reported
/// as a warning and nothing is emitted.
#[derive(Debug, Clone)]
pub struct VpcFromCidr {
    config: VpcRuleConfig,
}

impl VpcFromCidr {
    pub fn new(config: VpcRuleConfig) -> Self {
        Self { config }
    }

    fn render(&self, composite: &str, cidr: &str) -> DesiredResource {
        DesiredResource::new(
            self.config.api_version.clone(),
            self.config.kind.clone(),
            format!("{composite}{}", self.config.name_suffix),
        )
        .with_spec(json!({
            "forProvider": {
                "cidrBlock": cidr,
                "enableDnsHostnames": self.config.enable_dns_hostnames,
                "enableDnsSupport": self.config.enable_dns_support
            },
            "providerConfigRef": {
                "name": self.config.provider_config
            }
        }))
    }
}

impl Default for VpcFromCidr {
    fn default() -> Self {
        Self::new(VpcRuleConfig::default())
    }
}

impl SynthesisRule for VpcFromCidr {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn synthesize(&self, input: &RuleInput<'_>) -> RuleOutcome {
        let cidr = match input.spec.get("cidr") {
            None | Some(Value::Null) => return RuleOutcome::not_applicable(),
            Some(Value::String(cidr)) => cidr,
            Some(other) => {
                return invalid_cidr(
                    input,
                    format!("spec.cidr must be a string, found {}", json_type(other)),
                );
            }
        };

        if cidr.trim().is_empty() {
            return invalid_cidr(input, "spec.cidr must not be empty".to_string());
        }
        if !cidr.contains('/') || cidr.parse::<IpNetwork>().is_err() {
            return invalid_cidr(
                input,
                format!("spec.cidr {cidr:?} is not a valid CIDR block"),
            );
        }

        RuleOutcome::emit(self.render(&input.metadata.name, cidr))
    }
}

fn invalid_cidr(input: &RuleInput<'_>, message: String) -> RuleOutcome {
    warn!(
        rule = RULE_NAME,
        composite = %input.metadata.name,
        reason = %message,
        "Skipping VPC synthesis"
    );
    RuleOutcome::anomaly(
        Condition::warning(format!("{RULE_NAME}: {message}")).with_reason("InvalidCidr"),
    )
}
