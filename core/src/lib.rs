//! Declarative command-line argument specifications and a token parser.
//!
//! This crate models what a command accepts and matches raw tokens against
//! it:
//!
//! - [`Range`] — inclusive interval used for arity and positional index.
//! - [`OptionSpec`] / [`PositionalParamSpec`] — builders for named options
//!   and positional parameters. `validate()` applies default inference and
//!   returns a resolved [`ArgSpec`].
//! - [`CommandSpec`] — registry of resolved specs with alias lookup.
//! - [`Parser`] — matches a token stream, converts values to their declared
//!   [`ValueType`], and reports unmatched tokens.
//!
//! Construction errors are [`SpecError`]s; parse errors are [`ParseError`]s.
//!
//! # Example
//!
//! ```
//! use argspec_core::*;
//!
//! let mut spec = CommandSpec::new();
//! spec.add(OptionSpec::new(["-h", "--help"]).usage_help(true)).unwrap();
//! spec.add(
//!     OptionSpec::new(["-c", "--count"])
//!         .arity("1")
//!         .value_type(ValueType::Int)
//!         .param_label("COUNT"),
//! )
//! .unwrap();
//! spec.add(PositionalParamSpec::new().arity("*").param_label("FILE")).unwrap();
//!
//! let result = parse(&["-c", "33", "a.txt", "b.txt"], &mut spec, false).unwrap();
//! assert!(result.unmatched_tokens.is_empty());
//! assert_eq!(spec.value_of("--count"), Some(&Value::Int(33)));
//! ```

mod command;
mod error;
mod parser;
mod range;
mod spec;
mod types;

pub use command::{ArgId, CommandSpec, DEFAULT_COMMAND_NAME};
pub use error::{ParseError, SpecError};
pub use parser::{BoundValue, END_OF_OPTIONS, ParseResult, Parser, ParserConfig, parse};
pub use range::Range;
pub use spec::{ArgKind, ArgSpec, DEFAULT_PARAM_LABEL, IntoArgSpec, OptionSpec, PositionalParamSpec};
pub use types::{UnknownValueType, Value, ValueType};
