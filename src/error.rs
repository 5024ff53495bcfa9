use serde::{Deserialize, Serialize};
use std::fmt;

/// Produced by [`config::parse`](crate::config::parse) when a configuration
/// document cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("empty configuration")]
    Empty,
    #[error("invalid YAML: {0}")]
    Syntax(String),
    #[error("configuration root must be a mapping")]
    NotAMapping,
    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// A registered rule whose name no provider knows.
///
/// At run time such a rule simply fails; this is the form reported by
/// [`Validator::unknown_rules`](crate::Validator::unknown_rules).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownRule {
    pub field: String,
    pub rule: String,
}

impl fmt::Display for UnknownRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rule '{}' on field '{}'", self.rule, self.field)
    }
}

impl std::error::Error for UnknownRule {}

/// Error kind for expression failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionErrorKind {
    Compile,
    Execution,
}

/// Produced when a `cel` rule expression cannot be compiled or run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub message: String,
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExpressionError {}
