//! Token matching and type coercion.
//!
//! A parse is a single left-to-right scan over the tokens followed by one
//! pass that distributes the queued positional tokens:
//!
//! 1. Each token is first tried as an option: an exact alias, an alias with
//!    an attached `=value` / `:value`, or a cluster of short aliases. A
//!    recognized option consumes up to `arity.max` following tokens (at
//!    least `arity.min`), stopping early at the next recognized option.
//! 2. Unrecognized option-shaped tokens are unmatched. Everything else is
//!    queued as a positional candidate.
//! 3. Positional parameters, ordered by where their index range begins,
//!    claim queued tokens up to their arity. Leftovers are unmatched.
//!    Unless [`ParserConfig::unmatched_allowed`] is set, the leftmost
//!    unmatched token is an error.
//!
//! Values are staged while scanning and only written back to the
//! [`CommandSpec`] when the whole parse succeeds.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{ArgId, CommandSpec};
use crate::error::ParseError;
use crate::range::Range;
use crate::spec::ArgSpec;
use crate::types::{Value, ValueType};

/// Token that ends option recognition.
pub const END_OF_OPTIONS: &str = "--";

/// Per-call parser settings.
///
/// # Examples
///
/// ```
/// use argspec_core::ParserConfig;
///
/// let config: ParserConfig = serde_json::from_str(r#"{"unmatched_allowed": true}"#).unwrap();
/// assert!(config.unmatched_allowed);
/// assert!(!config.trace);
/// assert!(config.end_of_options_delimiter);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Collect unmatched tokens instead of failing on the first one.
    pub unmatched_allowed: bool,
    /// Emit a `debug!` event for every matching decision.
    pub trace: bool,
    /// Treat `--` as the end of options.
    pub end_of_options_delimiter: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            unmatched_allowed: false,
            trace: false,
            end_of_options_delimiter: true,
        }
    }
}

/// A value bound during one parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundValue {
    pub arg: ArgId,
    /// [`ArgSpec::display_name`] of the bound spec.
    pub name: String,
    pub value: Value,
}

/// Outcome of a successful parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    /// Values bound by this parse, in add order.
    pub bound_values: Vec<BoundValue>,
    /// Every spec that matched, including options that bound no value.
    pub matched: Vec<ArgId>,
    /// Tokens no spec claimed, in the order they appeared.
    pub unmatched_tokens: Vec<String>,
    /// A usage-help option matched.
    pub usage_help_requested: bool,
    /// A version-help option matched.
    pub version_help_requested: bool,
}

impl ParseResult {
    /// The value bound to `arg` by this parse.
    pub fn value(&self, arg: ArgId) -> Option<&Value> {
        self.bound_values
            .iter()
            .find(|bound| bound.arg == arg)
            .map(|bound| &bound.value)
    }

    pub fn is_matched(&self, arg: ArgId) -> bool {
        self.matched.contains(&arg)
    }

    /// `true` if a usage-help or version-help option matched; callers
    /// usually print the requested text and stop.
    pub fn help_requested(&self) -> bool {
        self.usage_help_requested || self.version_help_requested
    }
}

/// Matches token streams against a [`CommandSpec`].
///
/// # Examples
///
/// ```
/// use argspec_core::{CommandSpec, OptionSpec, Parser, ParserConfig, Value, ValueType};
///
/// let mut spec = CommandSpec::new();
/// spec.add(OptionSpec::new(["-c", "--count"]).arity("1").value_type(ValueType::Int))
///     .unwrap();
///
/// let result = Parser::new(ParserConfig::default())
///     .parse(&mut spec, &["--count=33"])
///     .unwrap();
/// assert!(result.unmatched_tokens.is_empty());
/// assert_eq!(spec.value_of("-c"), Some(&Value::Int(33)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `tokens` against `spec`.
    ///
    /// On success every bound value is also stored on its spec (see
    /// [`ArgSpec::value`]). On error `spec` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] found in scan order.
    pub fn parse<S: AsRef<str>>(
        &self,
        spec: &mut CommandSpec,
        tokens: &[S],
    ) -> Result<ParseResult, ParseError> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        let session = Session::new(self.config, spec, tokens);
        let outcome = session.run()?;

        for (i, value) in outcome.staged.into_iter().enumerate() {
            if outcome.touched[i] {
                spec.set_value(outcome.ids[i], value);
            }
        }
        Ok(outcome.result)
    }
}

/// Parses with default settings, only choosing whether unmatched tokens are
/// collected or rejected.
///
/// # Examples
///
/// ```
/// use argspec_core::{CommandSpec, parse};
///
/// let mut spec = CommandSpec::new();
/// let result = parse(&["-p", "123", "abc"], &mut spec, true).unwrap();
/// assert_eq!(result.unmatched_tokens, vec!["-p", "123", "abc"]);
/// assert!(result.bound_values.is_empty());
/// ```
pub fn parse<S: AsRef<str>>(
    tokens: &[S],
    spec: &mut CommandSpec,
    unmatched_allowed: bool,
) -> Result<ParseResult, ParseError> {
    Parser::new(ParserConfig {
        unmatched_allowed,
        ..ParserConfig::default()
    })
    .parse(spec, tokens)
}

struct Outcome {
    ids: Vec<ArgId>,
    staged: Vec<Option<Value>>,
    touched: Vec<bool>,
    result: ParseResult,
}

/// State of one parse call.
struct Session<'a> {
    config: ParserConfig,
    spec: &'a CommandSpec,
    tokens: Vec<&'a str>,
    pos: usize,
    staged: Vec<Option<Value>>,
    touched: Vec<bool>,
    matched: Vec<bool>,
    positional_queue: Vec<(usize, &'a str)>,
    unmatched: Vec<(usize, &'a str)>,
    unknown_options: Vec<usize>,
    usage_help: bool,
    version_help: bool,
}

impl<'a> Session<'a> {
    fn new(config: ParserConfig, spec: &'a CommandSpec, tokens: Vec<&'a str>) -> Self {
        let len = spec.len();
        Self {
            config,
            spec,
            tokens,
            pos: 0,
            // Staging starts from the current values so that reuse without
            // `reset` carries earlier bindings forward.
            staged: spec.args().iter().map(|arg| arg.value().cloned()).collect(),
            touched: vec![false; len],
            matched: vec![false; len],
            positional_queue: Vec::new(),
            unmatched: Vec::new(),
            unknown_options: Vec::new(),
            usage_help: false,
            version_help: false,
        }
    }

    fn run(mut self) -> Result<Outcome, ParseError> {
        while self.pos < self.tokens.len() {
            let idx = self.pos;
            let token = self.tokens[idx];
            self.pos += 1;

            if self.config.end_of_options_delimiter && token == END_OF_OPTIONS {
                if self.config.trace {
                    debug!(index = idx, "End of options; remaining tokens are positional");
                }
                for (i, rest) in self.tokens.iter().enumerate().skip(self.pos) {
                    self.positional_queue.push((i, rest));
                }
                self.pos = self.tokens.len();
                break;
            }

            self.process(idx, token)?;
        }

        self.distribute_positionals()?;

        if !self.usage_help && !self.version_help {
            self.check_required_options()?;
        }

        Ok(self.finish())
    }

    fn process(&mut self, idx: usize, token: &'a str) -> Result<(), ParseError> {
        let spec = self.spec;

        if let Some(id) = spec.option_id(token) {
            if self.config.trace {
                debug!(index = idx, token, "Matched option");
            }
            return self.apply_option(id, None);
        }

        if let Some((id, value)) = self.split_attached(token) {
            if self.config.trace {
                debug!(index = idx, token, value, "Matched option with attached value");
            }
            return self.apply_option(id, Some(value));
        }

        if let Some(steps) = self.plan_cluster(token)? {
            if self.config.trace {
                debug!(index = idx, token, options = steps.len(), "Matched short option cluster");
            }
            for (id, attached) in steps {
                self.apply_option(id, attached)?;
            }
            return Ok(());
        }

        if looks_like_option(token) {
            if self.config.trace {
                debug!(index = idx, token, "Unknown option; keeping as unmatched");
            }
            self.unmatched.push((idx, token));
            self.unknown_options.push(idx);
            return Ok(());
        }

        if self.config.trace {
            debug!(index = idx, token, "Queued positional candidate");
        }
        self.positional_queue.push((idx, token));
        Ok(())
    }

    /// `name=value` (tried first) or `name:value` where `name` is an alias.
    fn split_attached(&self, token: &'a str) -> Option<(ArgId, &'a str)> {
        ['=', ':'].into_iter().find_map(|sep| {
            let (name, value) = token.split_once(sep)?;
            self.spec.option_id(name).map(|id| (id, value))
        })
    }

    /// Decomposes `-abc` into short options. Returns `Ok(None)` when the
    /// token is not a cluster of registered short aliases.
    fn plan_cluster(
        &self,
        token: &'a str,
    ) -> Result<Option<Vec<(ArgId, Option<&'a str>)>>, ParseError> {
        let Some(body) = token.strip_prefix('-') else {
            return Ok(None);
        };
        if body.starts_with('-') || body.chars().count() < 2 {
            return Ok(None);
        }

        let spec = self.spec;
        let mut steps = Vec::new();
        let mut flags_before = 0usize;
        let mut rest = body;

        while let Some(c) = rest.chars().next() {
            let Some(id) = short_alias(spec, c) else {
                return Ok(None);
            };
            let arity = spec_of(spec, id).arity();
            rest = &rest[c.len_utf8()..];

            if arity.max() == Some(0) {
                steps.push((id, None));
                flags_before += 1;
                continue;
            }

            // A value-taking option ends the cluster.
            if rest.is_empty() {
                steps.push((id, None));
                break;
            }
            let optional_value = arity.min() == 0;
            let next_is_alias = rest
                .chars()
                .next()
                .is_some_and(|n| short_alias(spec, n).is_some());
            if (optional_value && next_is_alias) || (arity.is_multi_valued() && flags_before > 0) {
                return Err(ParseError::AmbiguousOptionCluster(token.to_string()));
            }
            steps.push((id, Some(rest.strip_prefix('=').unwrap_or(rest))));
            break;
        }

        Ok(Some(steps))
    }

    /// `true` if `token` would be matched as an option by [`process`].
    /// An ambiguous cluster counts: `process` would reject it as an option.
    fn recognizes_option(&self, token: &'a str) -> bool {
        self.spec.option_id(token).is_some()
            || self.split_attached(token).is_some()
            || !matches!(self.plan_cluster(token), Ok(None))
    }

    fn apply_option(&mut self, id: ArgId, attached: Option<&'a str>) -> Result<(), ParseError> {
        let spec = self.spec;
        let arg = spec_of(spec, id);
        let arity = arg.arity();

        if arity.max() == Some(0) {
            return match attached {
                // `--flag=false` style: the attached text is the value.
                Some(value) => {
                    let converted = convert(arg, value, arg.value_type())?;
                    self.mark_matched(id, arg);
                    self.store_scalar(id, converted);
                    Ok(())
                }
                None => self.bind(id, &[]),
            };
        }

        let max = arity.max_or_inf();
        let mut raw: Vec<&'a str> = Vec::new();
        if let Some(value) = attached {
            raw.extend(arg.split(value));
        }

        while raw.len() < max && self.pos < self.tokens.len() {
            let next = self.tokens[self.pos];
            let stops = self.recognizes_option(next)
                || (self.config.end_of_options_delimiter && next == END_OF_OPTIONS);
            if stops {
                if raw.len() < arity.min() {
                    return Err(missing(arg, raw.len()));
                }
                break;
            }
            self.pos += 1;
            raw.extend(arg.split(next));
        }

        check_arity(arg, arity, raw.len())?;
        self.bind(id, &raw)
    }

    fn distribute_positionals(&mut self) -> Result<(), ParseError> {
        let spec = self.spec;
        let mut order: Vec<ArgId> = spec.positional_ids().to_vec();
        order.sort_by_key(|id| spec_of(spec, *id).index().map_or(0, |index| index.min()));

        let queue = std::mem::take(&mut self.positional_queue);
        let mut cursor = 0usize;
        let mut claims: Vec<(ArgId, Vec<&'a str>)> = Vec::with_capacity(order.len());

        for id in order {
            let arg = spec_of(spec, id);
            let index = arg.index().unwrap_or(Range::unbounded(0));

            let start = cursor.max(index.min());
            while cursor < start && cursor < queue.len() {
                self.unmatched.push(queue[cursor]);
                cursor += 1;
            }

            let positions = match index.max() {
                Some(last) if last >= start => (last - start).saturating_add(1),
                Some(_) => 0,
                None => usize::MAX,
            };
            let max = arg.arity().max_or_inf();
            let mut raw: Vec<&'a str> = Vec::new();
            let mut claimed = 0usize;
            while cursor < queue.len() && claimed < positions && raw.len() < max {
                raw.extend(arg.split(queue[cursor].1));
                cursor += 1;
                claimed += 1;
            }

            if self.config.trace {
                debug!(arg = %arg.display_name(), claimed, "Distributed positional tokens");
            }
            claims.push((id, raw));
        }

        self.unmatched.extend(queue.into_iter().skip(cursor));

        // Strict mode reports the leftmost token nothing claimed.
        if !self.config.unmatched_allowed {
            if let Some(&(idx, token)) = self.unmatched.iter().min_by_key(|(idx, _)| *idx) {
                return Err(if self.unknown_options.contains(&idx) {
                    ParseError::UnknownOption(token.to_string())
                } else {
                    ParseError::UnknownPositional(token.to_string())
                });
            }
        }

        for (id, raw) in claims {
            let arg = spec_of(spec, id);
            let arity = arg.arity();
            if raw.len() < arity.min() {
                if self.usage_help || self.version_help {
                    continue;
                }
                return Err(missing(arg, raw.len()));
            }
            check_arity(arg, arity, raw.len())?;
            if !raw.is_empty() {
                self.bind(id, &raw)?;
            }
        }
        Ok(())
    }

    fn check_required_options(&self) -> Result<(), ParseError> {
        for &id in self.spec.option_ids() {
            let arg = spec_of(self.spec, id);
            if arg.required() && !self.matched[id.index()] {
                return Err(ParseError::MissingRequiredParameter {
                    arg: arg.display_name(),
                    expected: arg.arity().min().max(1),
                    actual: 0,
                });
            }
        }
        Ok(())
    }

    /// Converts and stages the raw values of one match.
    fn bind(&mut self, id: ArgId, raw: &[&str]) -> Result<(), ParseError> {
        let arg = spec_of(self.spec, id);
        self.mark_matched(id, arg);

        if arg.arity().is_multi_valued() {
            let mut converted = Vec::with_capacity(raw.len().max(1));
            for (i, value) in raw.iter().enumerate() {
                converted.push(convert(arg, value, arg.element_type(i))?);
            }
            if raw.is_empty() && arg.value_type().is_boolean() {
                converted.push(Value::Bool(true));
            }
            self.append(id, converted);
            return Ok(());
        }

        match raw.first() {
            Some(value) => {
                let converted = convert(arg, value, arg.value_type())?;
                self.store_scalar(id, converted);
            }
            None if arg.value_type().is_boolean() => {
                let implicit = if arg.value_type().is_array() {
                    Value::Array(vec![Value::Bool(true)])
                } else {
                    Value::Bool(true)
                };
                self.store_scalar(id, implicit);
            }
            // Matched without a value: recorded in `matched` only.
            None => {}
        }
        Ok(())
    }

    fn mark_matched(&mut self, id: ArgId, arg: &ArgSpec) {
        self.matched[id.index()] = true;
        self.usage_help |= arg.usage_help();
        self.version_help |= arg.version_help();
    }

    fn append(&mut self, id: ArgId, values: Vec<Value>) {
        match &mut self.staged[id.index()] {
            Some(Value::Array(items)) => items.extend(values),
            slot => *slot = Some(Value::Array(values)),
        }
        self.touched[id.index()] = true;
    }

    /// Array-typed scalars accumulate; anything else is overwritten.
    fn store_scalar(&mut self, id: ArgId, value: Value) {
        let i = id.index();
        match (&mut self.staged[i], value) {
            (Some(Value::Array(items)), Value::Array(more)) => items.extend(more),
            (slot, value) => {
                if self.touched[i] {
                    warn!(
                        arg = %spec_of(self.spec, id).display_name(),
                        "Option specified more than once; keeping the last value"
                    );
                }
                *slot = Some(value);
            }
        }
        self.touched[i] = true;
    }

    fn finish(mut self) -> Outcome {
        self.unmatched.sort_by_key(|(idx, _)| *idx);

        let spec = self.spec;
        let ids: Vec<ArgId> = spec.args_with_ids().map(|(id, _)| id).collect();
        let mut result = ParseResult {
            unmatched_tokens: self
                .unmatched
                .iter()
                .map(|(_, token)| token.to_string())
                .collect(),
            usage_help_requested: self.usage_help,
            version_help_requested: self.version_help,
            ..ParseResult::default()
        };

        for (id, arg) in spec.args_with_ids() {
            let i = id.index();
            if self.matched[i] {
                result.matched.push(id);
            }
            if let (true, Some(value)) = (self.touched[i], &self.staged[i]) {
                result.bound_values.push(BoundValue {
                    arg: id,
                    name: arg.display_name(),
                    value: value.clone(),
                });
            }
        }

        Outcome {
            ids,
            staged: self.staged,
            touched: self.touched,
            result,
        }
    }
}

fn spec_of(spec: &CommandSpec, id: ArgId) -> &ArgSpec {
    &spec.args()[id.index()]
}

fn short_alias(spec: &CommandSpec, c: char) -> Option<ArgId> {
    let mut alias = String::with_capacity(1 + c.len_utf8());
    alias.push('-');
    alias.push(c);
    spec.option_id(&alias)
}

/// Option-shaped: a leading `-`, more than one character, not a negative
/// number. A lone `-` is positional.
fn looks_like_option(token: &str) -> bool {
    match token.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => !is_unsigned_number(rest),
        _ => false,
    }
}

fn is_unsigned_number(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit()) && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

fn convert(arg: &ArgSpec, raw: &str, target: &ValueType) -> Result<Value, ParseError> {
    target
        .convert(raw)
        .ok_or_else(|| ParseError::TypeConversionError {
            arg: arg.display_name(),
            token: raw.to_string(),
            target: target.clone(),
        })
}

fn missing(arg: &ArgSpec, actual: usize) -> ParseError {
    ParseError::MissingRequiredParameter {
        arg: arg.display_name(),
        expected: arg.arity().min(),
        actual,
    }
}

fn check_arity(arg: &ArgSpec, arity: Range, actual: usize) -> Result<(), ParseError> {
    if actual < arity.min() {
        return Err(missing(arg, actual));
    }
    match arity.max() {
        Some(max) if actual > max => Err(ParseError::ArityExceeded {
            arg: arg.display_name(),
            max,
            actual,
        }),
        _ => Ok(()),
    }
}
