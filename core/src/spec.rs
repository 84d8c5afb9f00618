//! Argument spec builders and the default-inference algorithm.
//!
//! [`OptionSpec`] and [`PositionalParamSpec`] are mutable builders. Calling
//! `validate()` applies the default rules below and produces a resolved,
//! immutable [`ArgSpec`]; the builder itself is never modified, so repeated
//! calls derive the same result.
//!
//! 1. Unset arity is `0` for options and `1` for positionals.
//! 2. With neither type nor auxiliary types set, the type is derived from the
//!    arity's cardinality: `boolean` / `String` when `arity.max <= 1`, the
//!    array form otherwise.
//! 3. Explicit auxiliary types override rule 2 at every arity: the type
//!    becomes the first auxiliary type.
//! 4. Auxiliary types default to `[type]`.
//! 5. `param_label` defaults to `"PARAM"`, `description` to no lines,
//!    `split_regex` to `""` (no splitting).

use regex::Regex;
use serde::Serialize;

use crate::error::SpecError;
use crate::range::Range;
use crate::types::{Value, ValueType};

/// Label used when none is declared.
pub const DEFAULT_PARAM_LABEL: &str = "PARAM";

/// Arity or index as given to a builder: raw text is parsed on `validate()`.
#[derive(Debug, Clone)]
enum RangeInput {
    Text(String),
    Parsed(Range),
}

impl RangeInput {
    fn resolve(&self) -> Result<Range, SpecError> {
        match self {
            Self::Text(text) => Range::parse(text),
            Self::Parsed(range) => Ok(*range),
        }
    }
}

/// Explicitly set fields shared by options and positionals.
#[derive(Debug, Clone, Default)]
struct Settings {
    arity: Option<RangeInput>,
    value_type: Option<ValueType>,
    auxiliary_types: Option<Vec<ValueType>>,
    param_label: Option<String>,
    description: Option<Vec<String>>,
    split_regex: Option<String>,
}

macro_rules! shared_setters {
    () => {
        /// Sets the arity from range text (`"1"`, `"0..1"`, `"*"`, ...).
        ///
        /// Malformed text is reported by `validate()` as
        /// [`SpecError::InvalidRangeSyntax`].
        pub fn arity(mut self, text: impl Into<String>) -> Self {
            self.settings.arity = Some(RangeInput::Text(text.into()));
            self
        }

        /// Sets the arity from an already parsed [`Range`].
        pub fn arity_range(mut self, range: Range) -> Self {
            self.settings.arity = Some(RangeInput::Parsed(range));
            self
        }

        /// Sets the value type explicitly.
        pub fn value_type(mut self, ty: ValueType) -> Self {
            self.settings.value_type = Some(ty);
            self
        }

        /// Sets the auxiliary (element) types, overriding the arity-derived
        /// default type.
        pub fn auxiliary_types(mut self, types: impl IntoIterator<Item = ValueType>) -> Self {
            self.settings.auxiliary_types = Some(types.into_iter().collect());
            self
        }

        pub fn param_label(mut self, label: impl Into<String>) -> Self {
            self.settings.param_label = Some(label.into());
            self
        }

        /// Sets the description lines.
        pub fn description<S: Into<String>>(mut self, lines: impl IntoIterator<Item = S>) -> Self {
            self.settings.description = Some(lines.into_iter().map(Into::into).collect());
            self
        }

        /// Sets the regex used to split each raw token into several values.
        pub fn split_regex(mut self, pattern: impl Into<String>) -> Self {
            self.settings.split_regex = Some(pattern.into());
            self
        }
    };
}

/// Builder for a named option.
///
/// # Examples
///
/// ```
/// use argspec_core::{OptionSpec, Range, ValueType};
///
/// let verbose = OptionSpec::new(["-v", "--verbose"]).validate().unwrap();
/// assert_eq!(verbose.arity(), Range::exactly(0));
/// assert_eq!(verbose.value_type(), &ValueType::Bool);
///
/// let count = OptionSpec::new(["-c", "--count"])
///     .arity("1")
///     .value_type(ValueType::Int)
///     .param_label("COUNT")
///     .validate()
///     .unwrap();
/// assert_eq!(count.param_label(), "COUNT");
/// assert_eq!(count.auxiliary_types(), &[ValueType::Int]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    names: Vec<String>,
    usage_help: bool,
    version_help: bool,
    required: bool,
    hidden: bool,
    settings: Settings,
}

impl OptionSpec {
    /// Creates an option builder with the given names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::default().names(names)
    }

    /// Replaces the option's names. Display order follows declaration order.
    pub fn names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    shared_setters!();

    /// Marks the option as a usage-help request.
    pub fn usage_help(mut self, usage_help: bool) -> Self {
        self.usage_help = usage_help;
        self
    }

    /// Marks the option as a version-help request.
    pub fn version_help(mut self, version_help: bool) -> Self {
        self.version_help = version_help;
        self
    }

    /// Requires the option to appear in every parse.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Hides the option from usage text. Has no effect on matching.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Applies default inference and returns the resolved spec.
    ///
    /// # Errors
    ///
    /// [`SpecError::MissingOptionName`] / [`SpecError::EmptyOptionName`] for
    /// bad names, [`SpecError::InvalidRangeSyntax`] for bad arity text, and
    /// [`SpecError::InvalidSplitRegex`] when the split regex does not compile.
    pub fn validate(&self) -> Result<ArgSpec, SpecError> {
        if self.names.is_empty() {
            return Err(SpecError::MissingOptionName);
        }
        let mut names: Vec<String> = Vec::with_capacity(self.names.len());
        for name in &self.names {
            if name.trim().is_empty() {
                return Err(SpecError::EmptyOptionName);
            }
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        resolve(
            &self.settings,
            ArgKind::Option {
                names,
                usage_help: self.usage_help,
                version_help: self.version_help,
                required: self.required,
                hidden: self.hidden,
            },
        )
    }
}

/// Builder for a positional parameter.
///
/// # Examples
///
/// ```
/// use argspec_core::{PositionalParamSpec, Range, ValueType};
///
/// let files = PositionalParamSpec::new().validate().unwrap();
/// assert_eq!(files.index(), Some(Range::unbounded(0)));
/// assert_eq!(files.arity(), Range::exactly(1));
/// assert_eq!(files.value_type(), &ValueType::String);
///
/// let rest = PositionalParamSpec::new().index("1..*").arity("*").validate().unwrap();
/// assert_eq!(rest.value_type(), &ValueType::String.array());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PositionalParamSpec {
    index: Option<RangeInput>,
    settings: Settings,
}

impl PositionalParamSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the index range from text. Defaults to `*`.
    pub fn index(mut self, text: impl Into<String>) -> Self {
        self.index = Some(RangeInput::Text(text.into()));
        self
    }

    pub fn index_range(mut self, range: Range) -> Self {
        self.index = Some(RangeInput::Parsed(range));
        self
    }

    shared_setters!();

    /// Applies default inference and returns the resolved spec.
    ///
    /// # Errors
    ///
    /// [`SpecError::InvalidRangeSyntax`] for bad index or arity text, and
    /// [`SpecError::InvalidSplitRegex`] when the split regex does not compile.
    pub fn validate(&self) -> Result<ArgSpec, SpecError> {
        let index = match &self.index {
            Some(input) => input.resolve()?,
            None => Range::unbounded(0),
        };
        resolve(&self.settings, ArgKind::Positional { index })
    }
}

fn resolve(settings: &Settings, kind: ArgKind) -> Result<ArgSpec, SpecError> {
    let arity = match &settings.arity {
        Some(input) => input.resolve()?,
        None if kind.is_option() => Range::exactly(0),
        None => Range::exactly(1),
    };

    let explicit_aux = settings
        .auxiliary_types
        .as_ref()
        .filter(|types| !types.is_empty());

    let (value_type, auxiliary_types) = match (&settings.value_type, explicit_aux) {
        (Some(ty), Some(aux)) => (ty.clone(), aux.clone()),
        (Some(ty), None) => (ty.clone(), vec![ty.clone()]),
        (None, Some(aux)) => (aux[0].clone(), aux.clone()),
        (None, None) => {
            let base = if kind.is_option() {
                ValueType::Bool
            } else {
                ValueType::String
            };
            let ty = if arity.is_multi_valued() {
                base.array()
            } else {
                base
            };
            (ty.clone(), vec![ty])
        }
    };

    let split_regex = settings.split_regex.clone().unwrap_or_default();
    let splitter = if split_regex.is_empty() {
        None
    } else {
        Some(
            Regex::new(&split_regex).map_err(|err| SpecError::InvalidSplitRegex {
                pattern: split_regex.clone(),
                reason: err.to_string(),
            })?,
        )
    };

    Ok(ArgSpec {
        kind,
        value_type,
        auxiliary_types,
        arity,
        param_label: settings
            .param_label
            .clone()
            .unwrap_or_else(|| DEFAULT_PARAM_LABEL.to_string()),
        description: settings.description.clone().unwrap_or_default(),
        split_regex,
        splitter,
        value: None,
    })
}

/// What distinguishes an option from a positional parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgKind {
    Option {
        names: Vec<String>,
        usage_help: bool,
        version_help: bool,
        required: bool,
        hidden: bool,
    },
    Positional {
        index: Range,
    },
}

impl ArgKind {
    pub fn is_option(&self) -> bool {
        matches!(self, Self::Option { .. })
    }
}

/// A resolved argument spec.
///
/// Produced by `validate()` on a builder; every field has its final value, so
/// consumers such as usage formatters read them directly without re-running
/// inference. The only mutable part is the bound [`value`](Self::value),
/// written by a successful parse.
#[derive(Debug, Clone, Serialize)]
pub struct ArgSpec {
    #[serde(flatten)]
    kind: ArgKind,
    #[serde(rename = "type")]
    value_type: ValueType,
    auxiliary_types: Vec<ValueType>,
    arity: Range,
    param_label: String,
    description: Vec<String>,
    split_regex: String,
    #[serde(skip)]
    splitter: Option<Regex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl ArgSpec {
    pub fn kind(&self) -> &ArgKind {
        &self.kind
    }

    pub fn is_option(&self) -> bool {
        self.kind.is_option()
    }

    /// Option names in declaration order; empty for positionals.
    pub fn names(&self) -> &[String] {
        match &self.kind {
            ArgKind::Option { names, .. } => names,
            ArgKind::Positional { .. } => &[],
        }
    }

    /// Index range for positionals; `None` for options.
    pub fn index(&self) -> Option<Range> {
        match &self.kind {
            ArgKind::Positional { index } => Some(*index),
            ArgKind::Option { .. } => None,
        }
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn auxiliary_types(&self) -> &[ValueType] {
        &self.auxiliary_types
    }

    pub fn arity(&self) -> Range {
        self.arity
    }

    pub fn param_label(&self) -> &str {
        &self.param_label
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn split_regex(&self) -> &str {
        &self.split_regex
    }

    pub fn usage_help(&self) -> bool {
        matches!(self.kind, ArgKind::Option { usage_help: true, .. })
    }

    pub fn version_help(&self) -> bool {
        matches!(self.kind, ArgKind::Option { version_help: true, .. })
    }

    pub fn required(&self) -> bool {
        matches!(self.kind, ArgKind::Option { required: true, .. })
    }

    pub fn hidden(&self) -> bool {
        matches!(self.kind, ArgKind::Option { hidden: true, .. })
    }

    /// The value bound by the last successful parse, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: Option<Value>) {
        self.value = value;
    }

    /// Name used in error messages: the longest option name, or the label
    /// and index of a positional.
    pub fn display_name(&self) -> String {
        match &self.kind {
            // `rev` so the first of equally long names wins.
            ArgKind::Option { names, .. } => names
                .iter()
                .rev()
                .max_by_key(|n| n.len())
                .cloned()
                .unwrap_or_default(),
            ArgKind::Positional { index } => format!("{} (index {index})", self.param_label),
        }
    }

    /// Splits a raw token by the split regex; without one the token is a
    /// single value.
    pub fn split<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        match &self.splitter {
            Some(re) => re.split(raw).collect(),
            None => vec![raw],
        }
    }

    /// Type used to convert the `i`-th value of a multi-valued match: the
    /// `i`-th auxiliary type (the last one repeats), without its array layer.
    pub fn element_type(&self, i: usize) -> &ValueType {
        let aux = &self.auxiliary_types;
        aux.get(i)
            .or_else(|| aux.last())
            .unwrap_or(&self.value_type)
            .element()
    }
}

impl PartialEq for ArgSpec {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.value_type == other.value_type
            && self.auxiliary_types == other.auxiliary_types
            && self.arity == other.arity
            && self.param_label == other.param_label
            && self.description == other.description
            && self.split_regex == other.split_regex
            && self.value == other.value
    }
}

/// Anything that can be registered with a [`CommandSpec`](crate::CommandSpec):
/// builders are validated on the way in, resolved specs pass through.
pub trait IntoArgSpec {
    fn into_arg_spec(self) -> Result<ArgSpec, SpecError>;
}

impl IntoArgSpec for ArgSpec {
    fn into_arg_spec(self) -> Result<ArgSpec, SpecError> {
        Ok(self)
    }
}

impl IntoArgSpec for OptionSpec {
    fn into_arg_spec(self) -> Result<ArgSpec, SpecError> {
        self.validate()
    }
}

impl IntoArgSpec for PositionalParamSpec {
    fn into_arg_spec(self) -> Result<ArgSpec, SpecError> {
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_defaults() {
        let spec = OptionSpec::new(["-x"]).validate().unwrap();
        assert_eq!(spec.arity(), Range::exactly(0));
        assert_eq!(spec.value_type(), &ValueType::Bool);
        assert_eq!(spec.auxiliary_types(), &[ValueType::Bool]);
        assert_eq!(spec.param_label(), "PARAM");
        assert!(spec.description().is_empty());
        assert_eq!(spec.split_regex(), "");
        assert!(spec.value().is_none());
    }

    #[test]
    fn test_explicit_type_fills_auxiliary_types() {
        let spec = OptionSpec::new(["-x"])
            .value_type(ValueType::Int)
            .validate()
            .unwrap();
        assert_eq!(spec.auxiliary_types(), &[ValueType::Int]);
    }

    #[test]
    fn test_explicit_type_and_auxiliary_types_are_kept() {
        let spec = OptionSpec::new(["-D"])
            .arity("1..*")
            .value_type(ValueType::String.array())
            .auxiliary_types([ValueType::String, ValueType::Int])
            .validate()
            .unwrap();
        assert_eq!(spec.value_type(), &ValueType::String.array());
        assert_eq!(spec.auxiliary_types(), &[ValueType::String, ValueType::Int]);
        assert_eq!(spec.element_type(0), &ValueType::String);
        assert_eq!(spec.element_type(1), &ValueType::Int);
        assert_eq!(spec.element_type(5), &ValueType::Int);
    }

    #[test]
    fn test_empty_auxiliary_types_count_as_unset() {
        let spec = OptionSpec::new(["-x"])
            .arity("2")
            .auxiliary_types([])
            .validate()
            .unwrap();
        assert_eq!(spec.value_type(), &ValueType::Bool.array());
    }

    #[test]
    fn test_option_names_are_checked_and_deduplicated() {
        assert_eq!(
            OptionSpec::default().validate(),
            Err(SpecError::MissingOptionName)
        );
        assert_eq!(
            OptionSpec::new(["-a", " "]).validate(),
            Err(SpecError::EmptyOptionName)
        );
        let spec = OptionSpec::new(["-a", "--all", "-a"]).validate().unwrap();
        assert_eq!(spec.names(), &["-a".to_string(), "--all".to_string()]);
    }

    #[test]
    fn test_bad_range_text_surfaces_on_validate() {
        let builder = OptionSpec::new(["-x"]).arity("1..0");
        assert_eq!(
            builder.validate(),
            Err(SpecError::InvalidRangeSyntax("1..0".into()))
        );
        let positional = PositionalParamSpec::new().index("x");
        assert_eq!(
            positional.validate(),
            Err(SpecError::InvalidRangeSyntax("x".into()))
        );
    }

    #[test]
    fn test_bad_split_regex_is_rejected() {
        let err = OptionSpec::new(["-x"]).split_regex("(").validate().unwrap_err();
        assert!(matches!(err, SpecError::InvalidSplitRegex { pattern, .. } if pattern == "("));
    }

    #[test]
    fn test_split_uses_regex() {
        let spec = OptionSpec::new(["-x"])
            .arity("1..*")
            .split_regex(",")
            .validate()
            .unwrap();
        assert_eq!(spec.split("a,b,c"), vec!["a", "b", "c"]);

        let plain = OptionSpec::new(["-y"]).arity("1").validate().unwrap();
        assert_eq!(plain.split("a,b"), vec!["a,b"]);
    }

    #[test]
    fn test_display_name() {
        let option = OptionSpec::new(["-c", "--count"]).validate().unwrap();
        assert_eq!(option.display_name(), "--count");

        let positional = PositionalParamSpec::new()
            .param_label("FILE")
            .index("0")
            .validate()
            .unwrap();
        assert_eq!(positional.display_name(), "FILE (index 0)");
    }

    #[test]
    fn test_resolved_spec_serializes_all_fields() {
        let spec = OptionSpec::new(["-c", "--count"])
            .arity("1")
            .value_type(ValueType::Int)
            .param_label("COUNT")
            .validate()
            .unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "option");
        assert_eq!(json["names"], serde_json::json!(["-c", "--count"]));
        assert_eq!(json["type"], "int");
        assert_eq!(json["auxiliary_types"], serde_json::json!(["int"]));
        assert_eq!(json["arity"], "1");
        assert_eq!(json["param_label"], "COUNT");
        assert!(json.get("value").is_none());
    }
}
