//! Boolean filter compilation
//!
//! Renders a [`FilterExpression`] tree into the structured-query syntax used
//! by the `fq` search parameter. Rendering is a pure function of the tree:
//! children and array values keep their caller-supplied order and nothing is
//! deduplicated.
//!
//! ```
//! use stratus::filter::FilterExpression;
//!
//! let expr = FilterExpression::and([
//!     FilterExpression::eq("foo", "bar"),
//!     FilterExpression::eq("baz", "bug"),
//! ]);
//! assert_eq!(expr.compile(), "(and%20foo:'bar'baz:'bug')");
//! ```

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::escape::form_escape;

/// Maximum nesting accepted by [`parse_filter`]
pub const MAX_FILTER_DEPTH: usize = 32;

/// Logical operator of a filter group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }

    /// Map a reserved key of the JSON filter form to its operator
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            _ => None,
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric value used for range bounds and facet options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
        }
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Numeric {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for Numeric {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

/// Value compared against a field
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    /// Absent value; never rendered in an equality term
    Null,
}

impl Scalar {
    /// Whether an equality term on this value renders to nothing
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => format!("{:?}", n),
            Self::Text(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Null => String::new(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Structured filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Group {
        op: BoolOp,
        children: Vec<FilterExpression>,
    },
    Equality {
        field: String,
        value: Scalar,
    },
    Range {
        field: String,
        min: Numeric,
        max: Numeric,
    },
    AnyOf {
        field: String,
        values: Vec<Scalar>,
    },
}

impl FilterExpression {
    pub fn group(op: BoolOp, children: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::Group {
            op,
            children: children.into_iter().collect(),
        }
    }

    pub fn and(children: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::group(BoolOp::And, children)
    }

    pub fn or(children: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::group(BoolOp::Or, children)
    }

    pub fn not(children: impl IntoIterator<Item = FilterExpression>) -> Self {
        Self::group(BoolOp::Not, children)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Equality {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(
        field: impl Into<String>,
        min: impl Into<Numeric>,
        max: impl Into<Numeric>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn any_of<V: Into<Scalar>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::AnyOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Render into structured-query syntax.
    ///
    /// Returns an empty string when nothing in the tree is renderable; a
    /// parent group drops such children instead of emitting `(and )`.
    pub fn compile(&self) -> String {
        match self {
            Self::Group { op, children } => {
                let rendered: Vec<String> = children
                    .iter()
                    .map(Self::compile)
                    .filter(|s| !s.is_empty())
                    .collect();
                if rendered.is_empty() {
                    return String::new();
                }
                format!("({}%20{})", op, rendered.concat())
            }
            Self::Equality { field, value } => match value {
                Scalar::Integer(n) => format!("{}:{}", field, form_escape(&n.to_string())),
                v if v.is_absent() => String::new(),
                v => format!("{}:'{}'", field, form_escape(&v.render())),
            },
            Self::Range { field, min, max } => {
                form_escape(&format!("(range field={} [{}, {}])", field, min, max))
            }
            Self::AnyOf { field, values } => {
                if values.is_empty() {
                    return String::new();
                }
                let terms: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        Scalar::Text(s) => format!("{}:'{}'", field, form_escape(s)),
                        other => format!("{}:{}", field, form_escape(&other.render())),
                    })
                    .collect();
                format!("(or%20{})", terms.join("%20"))
            }
        }
    }
}

/// Render several top-level expressions back to back
pub fn compile_all(exprs: &[FilterExpression]) -> String {
    exprs.iter().map(FilterExpression::compile).collect()
}

/// Parse the JSON map form of a filter.
///
/// Keys `and`, `or` and `not` with an object value open a group. Any other
/// key names a field: scalars become equality terms, arrays become
/// [`FilterExpression::AnyOf`] and `{"min": .., "max": ..}` becomes a range.
pub fn parse_filter(value: &Value) -> Result<Vec<FilterExpression>> {
    match value {
        Value::Object(map) => parse_entries(map, 1),
        other => Err(Error::unsupported("filter", json_kind(other))),
    }
}

fn parse_entries(map: &Map<String, Value>, depth: usize) -> Result<Vec<FilterExpression>> {
    if depth > MAX_FILTER_DEPTH {
        return Err(Error::FilterTooDeep {
            max: MAX_FILTER_DEPTH,
        });
    }
    map.iter()
        .map(|(key, value)| parse_entry(key, value, depth))
        .collect()
}

fn parse_entry(key: &str, value: &Value, depth: usize) -> Result<FilterExpression> {
    if let (Some(op), Value::Object(children)) = (BoolOp::from_key(key), value) {
        return Ok(FilterExpression::Group {
            op,
            children: parse_entries(children, depth + 1)?,
        });
    }

    match value {
        Value::Array(items) => {
            let values = items
                .iter()
                .map(|item| scalar_from_json(key, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(FilterExpression::AnyOf {
                field: key.to_string(),
                values,
            })
        }
        Value::Object(bounds) => range_from_json(key, bounds),
        other => Ok(FilterExpression::Equality {
            field: key.to_string(),
            value: scalar_from_json(key, other)?,
        }),
    }
}

fn scalar_from_json(field: &str, value: &Value) -> Result<Scalar> {
    match value {
        Value::Null => Ok(Scalar::Null),
        Value::Bool(b) => Ok(Scalar::Boolean(*b)),
        Value::String(s) => Ok(Scalar::Text(s.clone())),
        Value::Number(_) => match numeric_from_json(value) {
            Some(Numeric::Integer(n)) => Ok(Scalar::Integer(n)),
            Some(Numeric::Float(n)) => Ok(Scalar::Float(n)),
            None => Err(Error::unsupported(field, "number out of range")),
        },
        Value::Array(_) => Err(Error::unsupported(field, "nested array")),
        Value::Object(_) => Err(Error::unsupported(field, "object")),
    }
}

fn range_from_json(field: &str, bounds: &Map<String, Value>) -> Result<FilterExpression> {
    let min = bounds.get("min").and_then(numeric_from_json);
    let max = bounds.get("max").and_then(numeric_from_json);
    match (min, max) {
        (Some(min), Some(max)) if bounds.len() == 2 => Ok(FilterExpression::Range {
            field: field.to_string(),
            min,
            max,
        }),
        _ => Err(Error::unsupported(field, "object")),
    }
}

pub(crate) fn numeric_from_json(value: &Value) -> Option<Numeric> {
    let n = value.as_number()?;
    if let Some(i) = n.as_i64() {
        Some(Numeric::Integer(i))
    } else {
        n.as_f64().map(Numeric::Float)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
