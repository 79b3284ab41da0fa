use serde::{Deserialize, Serialize};

/// Severity of a diagnostic condition. Ordered so that `Fatal` is the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "Warning"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// A diagnostic record attached to a response.
///
/// Only anomalies become conditions; a rule that simply does not apply
/// produces nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Condition {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            reason: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, message)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Fatal > Severity::Warning);
    }

    #[test]
    fn test_condition_serialization() {
        let condition = Condition::warning("cidr is not a valid network").with_reason("InvalidCidr");
        let json = serde_json::to_value(&condition).unwrap();

        assert_eq!(
            json,
            json!({
                "severity": "Warning",
                "message": "cidr is not a valid network",
                "reason": "InvalidCidr"
            })
        );
    }

    #[test]
    fn test_condition_without_reason_omits_field() {
        let json = serde_json::to_value(Condition::fatal("boom")).unwrap();
        assert!(json.get("reason").is_none());
        assert_eq!(json["severity"], "Fatal");
    }

    #[test]
    fn test_is_fatal() {
        assert!(Condition::fatal("x").is_fatal());
        assert!(!Condition::warning("x").is_fatal());
    }
}
