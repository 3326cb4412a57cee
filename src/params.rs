use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coercion;
use crate::error::SqlHandleError;
use crate::types::Value;

/// Longest rendering of a single parameter value in error messages.
const MAX_RENDERED_CHARS: usize = 100;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("static regex");
}

/// Type tag of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// `i`: 64-bit integer
    Int,
    /// `s`: string
    Str,
    /// `d`: double
    Double,
    /// `b`: binary blob
    Blob,
}

impl ParamType {
    /// The single-character tag used in bind type strings.
    #[must_use]
    pub fn tag(self) -> char {
        match self {
            ParamType::Int => 'i',
            ParamType::Str => 's',
            ParamType::Double => 'd',
            ParamType::Blob => 'b',
        }
    }
}

impl TryFrom<char> for ParamType {
    type Error = SqlHandleError;

    fn try_from(tag: char) -> Result<Self, Self::Error> {
        match tag {
            'i' => Ok(ParamType::Int),
            's' => Ok(ParamType::Str),
            'd' => Ok(ParamType::Double),
            'b' => Ok(ParamType::Blob),
            other => Err(SqlHandleError::InvalidParameterType(other.to_string())),
        }
    }
}

impl FromStr for ParamType {
    type Err = SqlHandleError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut chars = tag.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ParamType::try_from(c),
            _ => Err(SqlHandleError::InvalidParameterType(tag.to_string())),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A typed value for one `?` placeholder. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    param_type: ParamType,
    value: Value,
}

impl Parameter {
    /// Build a parameter from a textual type tag (`i`, `s`, `d` or `b`).
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::InvalidParameterType` for any other tag.
    pub fn new(tag: &str, value: impl Into<Value>) -> Result<Self, SqlHandleError> {
        Ok(Self::typed(tag.parse()?, value))
    }

    #[must_use]
    pub fn typed(param_type: ParamType, value: impl Into<Value>) -> Self {
        Self {
            param_type,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::typed(ParamType::Int, value)
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(ParamType::Str, Value::Text(value.into()))
    }

    #[must_use]
    pub fn double(value: f64) -> Self {
        Self::typed(ParamType::Double, value)
    }

    #[must_use]
    pub fn blob(value: impl Into<Vec<u8>>) -> Self {
        Self::typed(ParamType::Blob, Value::Blob(value.into()))
    }

    #[must_use]
    pub fn null(param_type: ParamType) -> Self {
        Self::typed(param_type, Value::Null)
    }

    #[must_use]
    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Positional bind data: one type tag per parameter plus the parallel values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    types: String,
    values: Vec<Value>,
}

impl BoundParams {
    /// Pack `params` in order. An empty slice yields an empty binding.
    #[must_use]
    pub fn bind(params: &[Parameter]) -> Self {
        let mut types = String::with_capacity(params.len());
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            types.push(param.param_type.tag());
            values.push(param.value.clone());
        }
        Self { types, values }
    }

    #[must_use]
    pub fn types(&self) -> &str {
        &self.types
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Render `params` for an error message, one `- <tag>: '<value>'` line each.
#[must_use]
pub fn format_parameters(params: &[Parameter]) -> String {
    let lines: Vec<String> = params
        .iter()
        .map(|p| format!(" - {}: '{}'", p.param_type, shorten(&coercion::to_text(&p.value))))
        .collect();
    format!("\n\tparameters given:\n\t{}\n\t", lines.join("\n\t"))
}

/// Collapse whitespace runs (newlines included) and cut to the display limit.
fn shorten(value: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(value, " ");
    let cut: String = collapsed.chars().take(MAX_RENDERED_CHARS).collect();
    cut.trim().to_string()
}
