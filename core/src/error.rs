//! Error types for specification building and token parsing.
//!
//! Construction problems ([`SpecError`]) surface while builders are validated
//! or added to a [`CommandSpec`](crate::CommandSpec). Matching problems
//! ([`ParseError`]) abort a single [`Parser::parse`](crate::Parser::parse)
//! call and identify the first violation found.

use thiserror::Error;

use crate::types::ValueType;

/// Errors raised while building or registering argument specs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// Arity or index text does not follow the `N`, `*`, `M..N`, `M..`,
    /// `M..*` grammar, or has `min > max`.
    #[error("invalid range syntax: '{0}'")]
    InvalidRangeSyntax(String),
    /// The split regex does not compile.
    #[error("invalid split regex '{pattern}': {reason}")]
    InvalidSplitRegex { pattern: String, reason: String },
    /// An option was declared without any name.
    #[error("option must declare at least one name")]
    MissingOptionName,
    /// An option name is empty or whitespace-only.
    #[error("option name cannot be empty")]
    EmptyOptionName,
    /// An alias is already registered by another option in the same command.
    #[error("duplicate option name: {0}")]
    DuplicateOptionName(String),
}

/// Errors raised by the parser. Each one aborts the current parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An option-shaped token matched no declared option.
    #[error("unknown option: '{0}'")]
    UnknownOption(String),
    /// A positional token was not claimed by any positional parameter.
    #[error("unmatched positional argument: '{0}'")]
    UnknownPositional(String),
    /// An option or positional received fewer values than its arity minimum,
    /// or a required option never appeared.
    #[error("missing required parameter for {arg}: expected at least {expected} value(s), got {actual}")]
    MissingRequiredParameter {
        arg: String,
        expected: usize,
        actual: usize,
    },
    /// A raw token could not be converted to the declared type.
    #[error("invalid value for {arg}: '{token}' is not a valid {target}")]
    TypeConversionError {
        arg: String,
        token: String,
        target: ValueType,
    },
    /// A clustered short-option token cannot be decomposed unambiguously.
    #[error("ambiguous option cluster: '{0}'")]
    AmbiguousOptionCluster(String),
    /// Split sub-values pushed an option past its arity maximum.
    #[error("too many values for {arg}: at most {max} allowed, got {actual}")]
    ArityExceeded {
        arg: String,
        max: usize,
        actual: usize,
    },
}
