//! Inclusive numeric intervals used for arity and positional index.
//!
//! The textual grammar is the only wire format owned by this crate:
//!
//! | text | min | max |
//! |---|---|---|
//! | `N` | N | N |
//! | `*` | 0 | unbounded |
//! | `M..N` | M | N |
//! | `M..` / `M..*` | M | unbounded |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// An inclusive interval `min..=max`, where `max` may be unbounded.
///
/// # Examples
///
/// ```
/// use argspec_core::Range;
///
/// let arity = Range::parse("1..*").unwrap();
/// assert_eq!(arity.min(), 1);
/// assert_eq!(arity.max(), None);
/// assert_eq!(arity.to_string(), "1..*");
///
/// assert_eq!(Range::parse("*").unwrap(), Range::unbounded(0));
/// assert!(Range::parse("3..1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Range {
    min: usize,
    max: Option<usize>,
}

impl Range {
    /// Creates `min..=max`. Returns `None` when `min > max`.
    pub fn new(min: usize, max: usize) -> Option<Self> {
        (min <= max).then_some(Self {
            min,
            max: Some(max),
        })
    }

    /// Creates the single-value range `n..=n`.
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Creates `min..` with no upper bound.
    pub const fn unbounded(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Parses the textual range grammar.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidRangeSyntax`] on malformed text or when the
    /// lower bound exceeds the upper bound.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let invalid = || SpecError::InvalidRangeSyntax(text.to_string());
        let trimmed = text.trim();

        if trimmed == "*" {
            return Ok(Self::unbounded(0));
        }

        match trimmed.split_once("..") {
            None => parse_bound(trimmed).map(Self::exactly).ok_or_else(invalid),
            Some((lo, hi)) => {
                let min = parse_bound(lo).ok_or_else(invalid)?;
                if hi.is_empty() || hi == "*" {
                    return Ok(Self::unbounded(min));
                }
                let max = parse_bound(hi).ok_or_else(invalid)?;
                Self::new(min, max).ok_or_else(invalid)
            }
        }
    }

    /// Lower bound.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Upper bound, `None` when unbounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Returns `true` when there is no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    /// Returns `true` if `n` lies within the interval.
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }

    /// Returns `true` when the upper bound is 2 or more (or unbounded).
    ///
    /// This is the cardinality test used by default type inference.
    pub fn is_multi_valued(&self) -> bool {
        self.max.is_none_or(|max| max > 1)
    }

    /// Upper bound with unbounded mapped to `usize::MAX`, convenient for
    /// capping loops.
    pub fn max_or_inf(&self) -> usize {
        self.max.unwrap_or(usize::MAX)
    }
}

fn parse_bound(s: &str) -> Option<usize> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.min),
            None if self.min == 0 => f.write_str("*"),
            None => write!(f, "{}..*", self.min),
        }
    }
}

impl FromStr for Range {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Range {
    type Error = SpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Range> for String {
    fn from(range: Range) -> Self {
        range.to_string()
    }
}
