//! Registry of argument specs for one command.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::SpecError;
use crate::spec::{ArgSpec, IntoArgSpec};
use crate::types::Value;

/// Name used for a command that was never named.
pub const DEFAULT_COMMAND_NAME: &str = "<main class>";

/// Identifies a spec within its [`CommandSpec`]: its position in add order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArgId(usize);

impl ArgId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered registry of options and positional parameters.
///
/// Every alias across all options is unique; adding an option whose alias is
/// already taken is rejected and leaves the registry unchanged. Alias lookup
/// is a hash-map hit.
///
/// A `CommandSpec` stores the values bound by the last successful parse.
/// Reusing one for an unrelated token stream without calling
/// [`reset`](Self::reset) carries those values forward.
///
/// # Examples
///
/// ```
/// use argspec_core::{CommandSpec, OptionSpec, PositionalParamSpec, SpecError};
///
/// let mut spec = CommandSpec::new();
/// spec.add(OptionSpec::new(["-v", "--verbose"])).unwrap()
///     .add(PositionalParamSpec::new().param_label("FILE")).unwrap();
///
/// assert!(spec.find_option("--verbose").is_some());
/// assert_eq!(spec.positionals().count(), 1);
///
/// let err = spec.add(OptionSpec::new(["-v"])).unwrap_err();
/// assert_eq!(err, SpecError::DuplicateOptionName("-v".into()));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    args: Vec<ArgSpec>,
    #[serde(skip)]
    options: Vec<ArgId>,
    #[serde(skip)]
    positionals: Vec<ArgId>,
    #[serde(skip)]
    name_index: HashMap<String, ArgId>,
}

impl CommandSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the command name shown by usage formatters.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The command name, or [`DEFAULT_COMMAND_NAME`].
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_COMMAND_NAME)
    }

    /// Validates (if needed) and registers a spec.
    ///
    /// # Errors
    ///
    /// Returns any [`SpecError`] raised by validation, or
    /// [`SpecError::DuplicateOptionName`] if one of the option's names is
    /// already registered.
    pub fn add(&mut self, spec: impl IntoArgSpec) -> Result<&mut Self, SpecError> {
        let spec = spec.into_arg_spec()?;

        if let Some(taken) = spec
            .names()
            .iter()
            .find(|name| self.name_index.contains_key(name.as_str()))
        {
            return Err(SpecError::DuplicateOptionName(taken.clone()));
        }

        let id = ArgId(self.args.len());
        if spec.is_option() {
            for name in spec.names() {
                self.name_index.insert(name.clone(), id);
            }
            self.options.push(id);
        } else {
            self.positionals.push(id);
        }
        debug!(arg = %spec.display_name(), id = id.0, "Registered arg spec");
        self.args.push(spec);

        Ok(self)
    }

    /// Consuming form of [`add`](Self::add) for builder chains.
    pub fn with_arg(mut self, spec: impl IntoArgSpec) -> Result<Self, SpecError> {
        self.add(spec)?;
        Ok(self)
    }

    /// All specs in the order they were added.
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Specs paired with their ids, in add order.
    pub fn args_with_ids(&self) -> impl Iterator<Item = (ArgId, &ArgSpec)> {
        self.args.iter().enumerate().map(|(i, spec)| (ArgId(i), spec))
    }

    /// Options in add order.
    pub fn options(&self) -> impl Iterator<Item = &ArgSpec> {
        self.options.iter().map(|id| &self.args[id.0])
    }

    /// Positional parameters in add order.
    pub fn positionals(&self) -> impl Iterator<Item = &ArgSpec> {
        self.positionals.iter().map(|id| &self.args[id.0])
    }

    pub(crate) fn positional_ids(&self) -> &[ArgId] {
        &self.positionals
    }

    pub(crate) fn option_ids(&self) -> &[ArgId] {
        &self.options
    }

    pub fn get(&self, id: ArgId) -> Option<&ArgSpec> {
        self.args.get(id.0)
    }

    /// Looks up an option by any of its aliases.
    pub fn find_option(&self, alias: &str) -> Option<&ArgSpec> {
        self.option_id(alias).map(|id| &self.args[id.0])
    }

    /// Id of the option registered under `alias`.
    pub fn option_id(&self, alias: &str) -> Option<ArgId> {
        self.name_index.get(alias).copied()
    }

    /// Every registered alias with its option, in no particular order.
    pub fn options_map(&self) -> impl Iterator<Item = (&str, &ArgSpec)> {
        self.name_index
            .iter()
            .map(|(alias, id)| (alias.as_str(), &self.args[id.0]))
    }

    /// The value currently bound to the option registered under `alias`.
    pub fn value_of(&self, alias: &str) -> Option<&Value> {
        self.find_option(alias).and_then(ArgSpec::value)
    }

    /// Clears every bound value so the spec can parse an independent stream.
    pub fn reset(&mut self) {
        for spec in &mut self.args {
            spec.set_value(None);
        }
    }

    pub(crate) fn set_value(&mut self, id: ArgId, value: Option<Value>) {
        if let Some(spec) = self.args.get_mut(id.0) {
            spec.set_value(value);
        }
    }

    /// Number of registered specs.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{OptionSpec, PositionalParamSpec, Range};

    use super::*;

    #[test]
    fn test_add_indexes_every_alias() {
        let mut spec = CommandSpec::new();
        spec.add(OptionSpec::new(["-h", "--help"]).usage_help(true))
            .unwrap()
            .add(OptionSpec::new(["-c", "--count"]).arity("1"))
            .unwrap();

        assert_eq!(spec.option_id("-h"), spec.option_id("--help"));
        assert_eq!(spec.option_id("-c").map(ArgId::index), Some(1));
        assert!(spec.find_option("--help").unwrap().usage_help());
        assert_eq!(spec.options_map().count(), 4);
        assert!(spec.find_option("-x").is_none());
    }

    #[test]
    fn test_duplicate_alias_leaves_registry_unchanged() {
        let mut spec = CommandSpec::new();
        spec.add(OptionSpec::new(["-c", "--count"])).unwrap();

        let err = spec
            .add(OptionSpec::new(["-n", "--count"]))
            .unwrap_err();
        assert_eq!(err, SpecError::DuplicateOptionName("--count".into()));
        assert_eq!(spec.len(), 1);
        assert!(spec.find_option("-n").is_none());
    }

    #[test]
    fn test_add_validates_builders_lazily() {
        let mut spec = CommandSpec::new();
        let err = spec
            .add(PositionalParamSpec::new().arity("x"))
            .unwrap_err();
        assert_eq!(err, SpecError::InvalidRangeSyntax("x".into()));
        assert!(spec.is_empty());
    }

    #[test]
    fn test_accepts_already_validated_specs() {
        let resolved = PositionalParamSpec::new().index("1").validate().unwrap();
        let spec = CommandSpec::new()
            .with_arg(OptionSpec::new(["-q"]))
            .unwrap()
            .with_arg(resolved)
            .unwrap();

        let kinds: Vec<bool> = spec.args().iter().map(ArgSpec::is_option).collect();
        assert_eq!(kinds, vec![true, false]);
        assert_eq!(
            spec.positionals().next().unwrap().index(),
            Some(Range::exactly(1))
        );
    }

    #[test]
    fn test_default_name() {
        assert_eq!(CommandSpec::new().name(), DEFAULT_COMMAND_NAME);
        assert_eq!(CommandSpec::new().with_name("git").name(), "git");
    }

    #[test]
    fn test_reset_clears_values() {
        let mut spec = CommandSpec::new()
            .with_arg(OptionSpec::new(["-v"]))
            .unwrap();
        let id = spec.option_id("-v").unwrap();
        spec.set_value(id, Some(Value::Bool(true)));
        assert_eq!(spec.value_of("-v"), Some(&Value::Bool(true)));

        spec.reset();
        assert!(spec.value_of("-v").is_none());
    }
}
