//! Value types and bound values.
//!
//! [`ValueType`] describes what a declared option or positional converts its
//! raw tokens into, and [`Value`] is the converted result stored on the spec
//! after a successful parse.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target type for converting raw tokens.
///
/// The textual form (used by [`Display`](fmt::Display), [`FromStr`] and
/// serde) is `boolean`, `int`, `long`, `double`, `char`, `String`, `Path`,
/// `one-of(a|b|c)`, with a `[]` suffix for arrays.
///
/// # Examples
///
/// ```
/// use argspec_core::ValueType;
///
/// let ty: ValueType = "int[]".parse().unwrap();
/// assert_eq!(ty, ValueType::Int.array());
/// assert_eq!(ty.element(), &ValueType::Int);
/// assert_eq!(ty.to_string(), "int[]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    /// `true` / `false`, matched case-insensitively.
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 64-bit float.
    Double,
    /// Exactly one character.
    Char,
    /// Any string, taken verbatim.
    String,
    /// Filesystem path, taken verbatim.
    Path,
    /// One of a fixed set of strings (e.g., `--format json|yaml`).
    Choice(Vec<String>),
    /// Sequence of the inner type.
    Array(Box<ValueType>),
}

impl ValueType {
    /// Wraps this type in an array.
    pub fn array(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// Returns `true` for array types.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Strips one array layer; non-array types are returned unchanged.
    pub fn element(&self) -> &ValueType {
        match self {
            Self::Array(inner) => inner,
            other => other,
        }
    }

    /// Returns `true` when the element type is [`ValueType::Bool`].
    pub fn is_boolean(&self) -> bool {
        matches!(self.element(), Self::Bool)
    }

    /// Converts a raw token to this type. Returns `None` when the token is
    /// not a valid representation.
    ///
    /// Converting to an array type produces a one-element array.
    ///
    /// # Examples
    ///
    /// ```
    /// use argspec_core::{Value, ValueType};
    ///
    /// assert_eq!(ValueType::Int.convert("33"), Some(Value::Int(33)));
    /// assert_eq!(ValueType::Bool.convert("TRUE"), Some(Value::Bool(true)));
    /// assert_eq!(ValueType::Int.convert("abc"), None);
    /// ```
    pub fn convert(&self, raw: &str) -> Option<Value> {
        match self {
            Self::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            Self::Int => raw.parse().ok().map(Value::Int),
            Self::Long => raw.parse().ok().map(Value::Long),
            Self::Double => raw.parse().ok().map(Value::Double),
            Self::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            Self::String => Some(Value::Str(raw.to_string())),
            Self::Path => Some(Value::Path(PathBuf::from(raw))),
            Self::Choice(choices) => choices
                .iter()
                .any(|c| c == raw)
                .then(|| Value::Str(raw.to_string())),
            Self::Array(inner) => inner.convert(raw).map(|v| Value::Array(vec![v])),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("boolean"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Double => f.write_str("double"),
            Self::Char => f.write_str("char"),
            Self::String => f.write_str("String"),
            Self::Path => f.write_str("Path"),
            Self::Choice(choices) => write!(f, "one-of({})", choices.join("|")),
            Self::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// Error for unrecognized type names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value type: '{0}'")]
pub struct UnknownValueType(pub String);

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return inner.parse::<ValueType>().map(ValueType::array);
        }
        if let Some(list) = s
            .strip_prefix("one-of(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let choices: Vec<String> = list
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            if choices.is_empty() {
                return Err(UnknownValueType(s.to_string()));
            }
            return Ok(Self::Choice(choices));
        }
        match s {
            "boolean" | "bool" => Ok(Self::Bool),
            "int" | "i32" | "integer" => Ok(Self::Int),
            "long" | "i64" => Ok(Self::Long),
            "double" | "float" | "f64" => Ok(Self::Double),
            "char" => Ok(Self::Char),
            "String" | "string" | "str" => Ok(Self::String),
            "Path" | "path" | "file" => Ok(Self::Path),
            _ => Err(UnknownValueType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = UnknownValueType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(ty: ValueType) -> Self {
        ty.to_string()
    }
}

/// A converted value bound to an option or positional parameter.
///
/// Serializes untagged, so `Value::Int(33)` prints as `33` and arrays as JSON
/// arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Char(char),
    Str(String),
    Path(PathBuf),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            Self::Int(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrows string and choice values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Str(s) => f.write_str(s),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
