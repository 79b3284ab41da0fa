use serde::{Deserialize, Serialize};

/// Error types for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(String),

    #[error("config deserialize error: {0}")]
    Deserialize(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FunctionConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Synthesis rule configuration
    #[serde(default)]
    pub rules: RulesConfig,
}

impl FunctionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        // Rule validations only apply to rules that will be registered
        if self.rules.vpc.enabled {
            let vpc = &self.rules.vpc;
            if vpc.kind.trim().is_empty() {
                return Err(ConfigError::validation("rules.vpc.kind must not be empty"));
            }
            if !vpc.api_version.contains('/') {
                return Err(ConfigError::validation(
                    "rules.vpc.api_version must look like <group>/<version>",
                ));
            }
            if vpc.provider_config.trim().is_empty() {
                return Err(ConfigError::validation(
                    "rules.vpc.provider_config must not be empty",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesConfig {
    #[serde(default)]
    pub vpc: VpcRuleConfig,
}

/// Settings for the VPC-from-CIDR rule. Defaults target the AWS network
/// provider and the `default` provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcRuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_vpc_api_version")]
    pub api_version: String,
    #[serde(default = "default_vpc_kind")]
    pub kind: String,
    #[serde(default = "default_vpc_name_suffix")]
    pub name_suffix: String,
    #[serde(default = "default_provider_config")]
    pub provider_config: String,
    #[serde(default = "default_true")]
    pub enable_dns_hostnames: bool,
    #[serde(default = "default_true")]
    pub enable_dns_support: bool,
}

fn default_true() -> bool {
    true
}
fn default_vpc_api_version() -> String {
    "ec2.aws.crossplane.io/v1beta1".into()
}
fn default_vpc_kind() -> String {
    "VPC".into()
}
fn default_vpc_name_suffix() -> String {
    "-vpc".into()
}
fn default_provider_config() -> String {
    "default".into()
}

impl Default for VpcRuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_version: default_vpc_api_version(),
            kind: default_vpc_kind(),
            name_suffix: default_vpc_name_suffix(),
            provider_config: default_provider_config(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
        }
    }
}

pub mod loader {
    use super::{ConfigError, FunctionConfig};
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// Default configuration file looked up in the working directory.
    pub const DEFAULT_CONFIG_FILE: &str = "xfn.toml";

    /// Load configuration from an optional file plus `XFN__*` environment
    /// overrides, e.g. `XFN__RULES__VPC__PROVIDER_CONFIG=aws-prod`.
    ///
    /// An explicitly requested file must exist. Without one, `xfn.toml` is
    /// read when present and defaults apply otherwise.
    pub fn load_config(path: Option<&Path>) -> Result<FunctionConfig, ConfigError> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.is_file() {
                    return Err(ConfigError::Build(format!(
                        "configuration file {} not found",
                        p.display()
                    )));
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("XFN")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Build(e.to_string()))?;
        let merged: FunctionConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }
}
