use thiserror::Error;

use crate::condition::Condition;

/// Core error types for composition function invocations
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Malformed request: {field}: {reason}")]
    MalformedRequest { field: String, reason: String },

    #[error("Conflicting desired resource {kind}/{name}: emitted differently by rules '{first}' and '{second}'")]
    Conflict {
        kind: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("Conflicting pipeline context key '{key}': written differently by rules '{first}' and '{second}'")]
    ContextConflict {
        key: String,
        first: String,
        second: String,
    },

    #[error("Duplicate desired resource name '{name}': used by both {first_kind} and {second_kind}")]
    NameCollision {
        name: String,
        first_kind: String,
        second_kind: String,
    },

    #[error("Synthesis rule already registered: {0}")]
    DuplicateRule(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FunctionError {
    /// Create a new MalformedRequest error
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Conflict error for two rules emitting the same resource identity
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a new ContextConflict error
    pub fn context_conflict(
        key: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::ContextConflict {
            key: key.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a new NameCollision error
    pub fn name_collision(
        name: impl Into<String>,
        first_kind: impl Into<String>,
        second_kind: impl Into<String>,
    ) -> Self {
        Self::NameCollision {
            name: name.into(),
            first_kind: first_kind.into(),
            second_kind: second_kind.into(),
        }
    }

    /// Create a new DuplicateRule error
    pub fn duplicate_rule(rule: impl Into<String>) -> Self {
        Self::DuplicateRule(rule.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedRequest { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } | Self::ContextConflict { .. } | Self::NameCollision { .. } => {
                ErrorCategory::Conflict
            }
            Self::DuplicateRule(_) => ErrorCategory::Configuration,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }

    /// Machine-readable reason attached to the fatal condition
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } | Self::JsonError(_) => "MalformedRequest",
            Self::Conflict { .. } => "ConflictingResources",
            Self::ContextConflict { .. } => "ConflictingContext",
            Self::NameCollision { .. } => "DuplicateResourceName",
            Self::DuplicateRule(_) => "DuplicateRule",
        }
    }

    /// Render this error as the `Fatal` condition carried by a halted response
    pub fn to_condition(&self) -> Condition {
        Condition::fatal(self.to_string()).with_reason(self.reason())
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    Serialization,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for function operations
pub type Result<T> = std::result::Result<T, FunctionError>;
