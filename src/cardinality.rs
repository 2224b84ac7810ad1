use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel upper bound for `n` / `*`.
pub const MANY: u64 = u64::MAX;

/// Occurrence range of an attribute or relation end, e.g. `0..1` or `1..*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    pub lower: u64,
    pub upper: u64,
}

impl Cardinality {
    pub fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }

    /// Parse an optional bound pair. Absent input means "optional, single-valued".
    pub fn parse(value: Option<&str>) -> Result<Self, CardinalityError> {
        match value {
            None => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }

    /// Like [`Cardinality::parse`] but keeps absence visible to the caller.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, CardinalityError> {
        value.map(|s| s.parse::<Self>()).transpose()
    }

    /// Literal reference behavior: only a lower bound above one counts as required.
    pub fn is_required(&self) -> bool {
        self.lower > 1
    }

    pub fn is_multivalued(&self) -> bool {
        self.upper > 1
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper == MANY
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "{}..*", self.lower)
        } else {
            write!(f, "{}..{}", self.lower, self.upper)
        }
    }
}

impl FromStr for Cardinality {
    type Err = CardinalityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lower, upper) = match s.split_once("..") {
            Some((lower, upper)) if upper.trim().is_empty() => (lower, lower),
            Some((lower, upper)) => (lower, upper),
            None => (s, s),
        };

        let lower = parse_bound(lower, s)?;
        let upper = parse_bound(upper, s)?;

        Ok(Cardinality::new(lower, upper))
    }
}

fn parse_bound(bound: &str, whole: &str) -> Result<u64, CardinalityError> {
    match bound.trim() {
        "n" | "*" => Ok(MANY),
        token => token.parse().map_err(|_| CardinalityError::InvalidBound {
            bound: token.to_string(),
            value: whole.to_string(),
        }),
    }
}

#[derive(Debug, Error)]
pub enum CardinalityError {
    #[error("Invalid cardinality bound `{bound}` in `{value}`")]
    InvalidBound { bound: String, value: String },
}
