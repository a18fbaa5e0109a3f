//! Facet parameter compilation
//!
//! Each facet becomes an `&facet.<field>=<options>` fragment where the
//! options are a small object literal, percent-encoded as a whole.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::escape::form_escape;
use crate::filter::{Numeric, json_kind, numeric_from_json};

/// Option value inside a facet object literal
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    /// Rendered single-quoted
    Text(String),
    /// Rendered bare
    Number(Numeric),
}

impl From<&str> for FacetValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Numeric> for FacetValue {
    fn from(n: Numeric) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FacetValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for FacetValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for FacetValue {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for FacetValue {
    fn from(n: f64) -> Self {
        Self::Number(n.into())
    }
}

/// Ordered option map for one facet (e.g. `sort`, `size`, `buckets`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetOptions {
    entries: Vec<(String, FacetValue)>,
}

impl FacetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FacetValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object literal form, e.g. `{sort:'count',size:5}`
    pub fn to_literal(&self) -> String {
        let body = self
            .entries
            .iter()
            .map(|(key, value)| match value {
                FacetValue::Text(s) => format!("{}:'{}'", key, s),
                FacetValue::Number(n) => format!("{}:{}", key, n),
            })
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{}}}", body)
    }
}

/// Facets requested for a search
#[derive(Debug, Clone, PartialEq)]
pub enum FacetSpec {
    /// Bare field names, each with default options
    Fields(Vec<String>),
    /// Field name to options, in caller order
    Options(Vec<(String, FacetOptions)>),
}

impl FacetSpec {
    pub fn fields<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }

    pub fn options<S: Into<String>>(facets: impl IntoIterator<Item = (S, FacetOptions)>) -> Self {
        Self::Options(
            facets
                .into_iter()
                .map(|(field, options)| (field.into(), options))
                .collect(),
        )
    }

    /// Render the `&facet.<field>=...` fragments
    pub fn compile(&self) -> String {
        match self {
            Self::Fields(fields) => fields
                .iter()
                .map(|field| format!("&facet.{}={}", field, form_escape("{}")))
                .collect(),
            Self::Options(facets) => facets
                .iter()
                .map(|(field, options)| {
                    format!("&facet.{}={}", field, form_escape(&options.to_literal()))
                })
                .collect(),
        }
    }
}

/// Parse facets from JSON: an array of field names or an object of
/// field name to option object.
///
/// Array entries that are not strings are skipped, as are option values that
/// are neither strings nor numbers.
pub fn parse_facets(value: &Value) -> Result<FacetSpec> {
    match value {
        Value::Array(items) => Ok(FacetSpec::Fields(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        )),
        Value::Object(map) => {
            let mut facets = Vec::with_capacity(map.len());
            for (field, options) in map {
                let Value::Object(options) = options else {
                    return Err(Error::unsupported(field.as_str(), json_kind(options)));
                };
                let mut parsed = FacetOptions::new();
                for (key, option) in options {
                    if let Some(s) = option.as_str() {
                        parsed = parsed.with(key.as_str(), s);
                    } else if let Some(n) = numeric_from_json(option) {
                        parsed = parsed.with(key.as_str(), n);
                    }
                }
                facets.push((field.clone(), parsed));
            }
            Ok(FacetSpec::Options(facets))
        }
        other => Err(Error::unsupported("facet", json_kind(other))),
    }
}
