//! Serializable command declarations.
//!
//! A declaration describes a command's options and positionals the way a
//! user writes them, leaving every unset field unset so that the core's
//! default inference decides it. Converting a declaration always yields a
//! fresh [`CommandSpec`], so each parse can start from clean values.
//!
//! # Example YAML
//!
//! ```yaml
//! name: greet
//! parser:
//!   unmatched_allowed: false
//! options:
//!   - names: ["-h", "--help"]
//!     usage_help: true
//!     description: show help and exit
//!   - names: ["-c", "--count"]
//!     arity: 1
//!     type: int
//!     param_label: COUNT
//! positionals:
//!   - index: "0..*"
//!     arity: "*"
//!     param_label: NAME
//! ```

use std::fs;
use std::path::Path;

use argspec_core::{CommandSpec, OptionSpec, ParserConfig, PositionalParamSpec, ValueType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoaderError, Result};

/// Range text as written in a declaration: `1` or `"0..*"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeText {
    Number(usize),
    Text(String),
}

impl RangeText {
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Description as written in a declaration: one line or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lines {
    One(String),
    Many(Vec<String>),
}

impl Lines {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(line) => vec![line],
            Self::Many(lines) => lines,
        }
    }
}

/// Fields shared by option and positional declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<RangeText>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_types: Option<Vec<ValueType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Lines>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_regex: Option<String>,
}

/// Applies the set fields of an [`ArgDecl`] through the builder setters that
/// options and positionals share.
macro_rules! apply_common {
    ($builder:expr, $common:expr) => {{
        let common: &ArgDecl = $common;
        let mut builder = $builder;
        if let Some(arity) = &common.arity {
            builder = builder.arity(arity.as_text());
        }
        if let Some(ty) = &common.value_type {
            builder = builder.value_type(ty.clone());
        }
        if let Some(types) = &common.auxiliary_types {
            builder = builder.auxiliary_types(types.iter().cloned());
        }
        if let Some(label) = &common.param_label {
            builder = builder.param_label(label.clone());
        }
        if let Some(lines) = &common.description {
            builder = builder.description(lines.clone().into_vec());
        }
        if let Some(pattern) = &common.split_regex {
            builder = builder.split_regex(pattern.clone());
        }
        builder
    }};
}

/// A named option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDecl {
    pub names: Vec<String>,
    #[serde(flatten)]
    pub common: ArgDecl,
    #[serde(default)]
    pub usage_help: bool,
    #[serde(default)]
    pub version_help: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl OptionDecl {
    /// Builds the unvalidated option builder.
    pub fn to_builder(&self) -> OptionSpec {
        let builder = OptionSpec::new(self.names.iter().cloned())
            .usage_help(self.usage_help)
            .version_help(self.version_help)
            .required(self.required)
            .hidden(self.hidden);
        apply_common!(builder, &self.common)
    }
}

/// A positional parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<RangeText>,
    #[serde(flatten)]
    pub common: ArgDecl,
}

impl PositionalDecl {
    /// Builds the unvalidated positional builder.
    pub fn to_builder(&self) -> PositionalParamSpec {
        let builder = match &self.index {
            Some(index) => PositionalParamSpec::new().index(index.as_text()),
            None => PositionalParamSpec::new(),
        };
        apply_common!(builder, &self.common)
    }
}

/// A whole command: name, parser settings, options, positionals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub options: Vec<OptionDecl>,
    #[serde(default)]
    pub positionals: Vec<PositionalDecl>,
}

impl CommandDecl {
    /// Builds a fresh [`CommandSpec`]: options first, then positionals, each
    /// in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidSpec`] wrapping the first
    /// [`SpecError`](argspec_core::SpecError) raised while validating or
    /// registering a declaration.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_loader::CommandDecl;
    ///
    /// let decl: CommandDecl = serde_json::from_str(
    ///     r#"{"name": "greet", "options": [{"names": ["-v", "--verbose"]}]}"#,
    /// ).unwrap();
    /// let spec = decl.to_command_spec().unwrap();
    /// assert_eq!(spec.name(), "greet");
    /// assert!(spec.find_option("-v").is_some());
    /// ```
    pub fn to_command_spec(&self) -> Result<CommandSpec> {
        let invalid = |source| LoaderError::InvalidSpec {
            command: self.name.clone(),
            source,
        };

        let mut spec = CommandSpec::new().with_name(self.name.clone());
        for option in &self.options {
            spec.add(option.to_builder()).map_err(invalid)?;
        }
        for positional in &self.positionals {
            spec.add(positional.to_builder()).map_err(invalid)?;
        }
        Ok(spec)
    }

    /// Parses a declaration from text in the given format.
    pub fn from_str_with(text: &str, format: Format) -> Result<Self> {
        Ok(match format {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml => serde_yaml::from_str(text)?,
        })
    }

    /// Serializes the declaration in the given format.
    pub fn to_string_with(&self, format: Format) -> Result<String> {
        Ok(match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        })
    }
}

/// Declaration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from a file extension: `.json`, `.yaml` or `.yml`.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Loads one declaration file, choosing the format by extension.
///
/// # Errors
///
/// Returns [`LoaderError::UnsupportedFormat`] for unknown extensions,
/// [`LoaderError::IoError`] if the file cannot be read, or a JSON/YAML error
/// if decoding fails.
pub fn load_command(path: impl AsRef<Path>) -> Result<CommandDecl> {
    let path = path.as_ref();
    let format = Format::from_path(path)
        .ok_or_else(|| LoaderError::UnsupportedFormat(path.display().to_string()))?;
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "Loading command declaration");
    CommandDecl::from_str_with(&text, format)
}

#[cfg(test)]
mod tests {
    use argspec_core::{Range, SpecError, Value};

    use super::*;

    const GREET_YAML: &str = r#"
name: greet
parser:
  unmatched_allowed: true
options:
  - names: ["-h", "--help"]
    usage_help: true
    description: show help and exit
  - names: ["-c", "--count"]
    arity: 1
    type: int
    param_label: COUNT
positionals:
  - index: "0..*"
    arity: "*"
    param_label: NAME
"#;

    #[test]
    fn test_yaml_declaration_builds_spec() {
        let decl = CommandDecl::from_str_with(GREET_YAML, Format::Yaml).unwrap();
        assert!(decl.parser.unmatched_allowed);
        assert!(decl.parser.end_of_options_delimiter);

        let spec = decl.to_command_spec().unwrap();
        let count = spec.find_option("--count").unwrap();
        assert_eq!(count.arity(), Range::exactly(1));
        assert_eq!(count.value_type(), &ValueType::Int);
        assert_eq!(count.param_label(), "COUNT");

        let help = spec.find_option("-h").unwrap();
        assert!(help.usage_help());
        assert_eq!(help.description(), &["show help and exit".to_string()]);

        let names = spec.positionals().next().unwrap();
        assert_eq!(names.value_type(), &ValueType::String.array());
    }

    #[test]
    fn test_unset_fields_use_core_defaults() {
        let decl: CommandDecl =
            serde_json::from_str(r#"{"name": "x", "options": [{"names": ["-q"]}], "positionals": [{}]}"#)
                .unwrap();
        let spec = decl.to_command_spec().unwrap();
        let quiet = spec.find_option("-q").unwrap();
        assert_eq!(quiet.arity(), Range::exactly(0));
        assert_eq!(quiet.value_type(), &ValueType::Bool);

        let positional = spec.positionals().next().unwrap();
        assert_eq!(positional.index(), Some(Range::unbounded(0)));
        assert_eq!(positional.value_type(), &ValueType::String);
    }

    #[test]
    fn test_invalid_declaration_reports_command() {
        let decl: CommandDecl = serde_json::from_str(
            r#"{"name": "bad", "options": [{"names": ["-a"], "arity": "2..1"}]}"#,
        )
        .unwrap();
        let err = decl.to_command_spec().unwrap_err();
        assert!(matches!(
            err,
            LoaderError::InvalidSpec { ref command, source: SpecError::InvalidRangeSyntax(_) }
                if command == "bad"
        ));
    }

    #[test]
    fn test_unknown_type_is_rejected_at_decode() {
        let err = serde_json::from_str::<CommandDecl>(
            r#"{"name": "bad", "options": [{"names": ["-a"], "type": "quaternion"}]}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_each_conversion_yields_fresh_spec() {
        let decl = CommandDecl::from_str_with(GREET_YAML, Format::Yaml).unwrap();
        let mut first = decl.to_command_spec().unwrap();
        argspec_core::parse(&["-c", "2"], &mut first, false).unwrap();
        assert_eq!(first.value_of("-c"), Some(&Value::Int(2)));

        let second = decl.to_command_spec().unwrap();
        assert!(second.value_of("-c").is_none());
    }

    #[test]
    fn test_round_trip_through_json() {
        let decl = CommandDecl::from_str_with(GREET_YAML, Format::Yaml).unwrap();
        let json = decl.to_string_with(Format::Json).unwrap();
        let back = CommandDecl::from_str_with(&json, Format::Json).unwrap();
        assert_eq!(back, decl);
    }

    #[test]
    fn test_shared_fields_reach_both_builders() {
        let common = ArgDecl {
            arity: Some(RangeText::Text("1..3".into())),
            value_type: Some(ValueType::Int.array()),
            auxiliary_types: Some(vec![ValueType::Int]),
            param_label: Some("N".into()),
            description: Some(Lines::Many(vec!["first".into(), "second".into()])),
            split_regex: Some(",".into()),
        };
        let option = OptionDecl {
            names: vec!["-n".into()],
            common: common.clone(),
            ..Default::default()
        }
        .to_builder()
        .validate()
        .unwrap();
        let positional = PositionalDecl {
            index: Some(RangeText::Number(0)),
            common,
        }
        .to_builder()
        .validate()
        .unwrap();

        for arg in [&option, &positional] {
            assert_eq!(arg.arity(), Range::new(1, 3).unwrap());
            assert_eq!(arg.value_type(), &ValueType::Int.array());
            assert_eq!(arg.auxiliary_types(), &[ValueType::Int]);
            assert_eq!(arg.param_label(), "N");
            assert_eq!(arg.description(), &["first".to_string(), "second".to_string()]);
            assert_eq!(arg.split_regex(), ",");
        }
        assert_eq!(positional.index(), Some(Range::exactly(0)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a.yml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.toml")), None);
    }
}
