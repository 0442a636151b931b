//! Fuzzy engine error types.
//!
//! Two families live here. Request errors (`InvalidInput`, `NoTopics`,
//! `DegenerateAggregate`) are surfaced to whoever asked for a score.
//! Everything else describes a broken control system definition and is
//! raised while the system is being built, before any request is served.

use thiserror::Error;

/// Errors produced while building or evaluating a fuzzy control system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FuzzyError {
    /// A crisp input was non-finite or outside the range it is defined on.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A level aggregation was requested over zero topics.
    #[error("no topics to aggregate")]
    NoTopics,

    /// A rule or lookup referenced a variable the system does not define.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// A rule or lookup referenced a label the variable does not define.
    #[error("unknown label '{label}' on variable '{variable}'")]
    UnknownLabel { variable: String, label: String },

    /// An antecedent referenced by the rule base had no crisp input.
    #[error("missing input for antecedent '{0}'")]
    MissingInput(String),

    /// No rule fired for the consequent, so the centroid has no mass.
    #[error("no rule fired for consequent '{0}'")]
    DegenerateAggregate(String),

    /// A universe with a non-positive step or fewer than two points.
    #[error("invalid universe: {0}")]
    InvalidUniverse(String),

    /// Breakpoints out of order or outside the variable's universe.
    #[error("invalid membership function '{label}' on variable '{variable}': {reason}")]
    InvalidMembership {
        variable: String,
        label: String,
        reason: String,
    },

    /// A control system was built without any rules.
    #[error("control system has no rules")]
    EmptyRuleBase,

    /// Any other structural problem with a system definition.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

impl FuzzyError {
    /// Returns `true` if this error was caused by the inputs of a single
    /// request rather than by the system configuration.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            FuzzyError::InvalidInput(_) | FuzzyError::NoTopics | FuzzyError::DegenerateAggregate(_)
        )
    }

    /// Stable snake_case identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FuzzyError::InvalidInput(_) => "invalid_input",
            FuzzyError::NoTopics => "no_topics",
            FuzzyError::UnknownVariable(_) => "unknown_variable",
            FuzzyError::UnknownLabel { .. } => "unknown_label",
            FuzzyError::MissingInput(_) => "missing_input",
            FuzzyError::DegenerateAggregate(_) => "degenerate_aggregate",
            FuzzyError::InvalidUniverse(_) => "invalid_universe",
            FuzzyError::InvalidMembership { .. } => "invalid_membership",
            FuzzyError::EmptyRuleBase => "empty_rule_base",
            FuzzyError::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, FuzzyError>;
