//! Document batch bodies for the document endpoint

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filter::json_kind;

/// A single document field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Sent as an explicit empty string
    Null,
    /// Sent as epoch seconds
    DateTime(DateTime<Utc>),
    /// Sent as epoch seconds of midnight UTC
    Date(NaiveDate),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Convert a JSON value; objects are rejected
    pub fn from_json(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Integer(i)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| Error::unsupported(field, "number")),
            },
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| Self::from_json(field, item))
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Value::Object(_) => Err(Error::unsupported(field, json_kind(value))),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Null => serializer.serialize_str(""),
            Self::DateTime(dt) => serializer.serialize_i64(dt.timestamp()),
            Self::Date(d) => {
                serializer.serialize_i64(d.and_time(NaiveTime::MIN).and_utc().timestamp())
            }
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Field name to value, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, FieldValue)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing an earlier value with the same name in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from a JSON object
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::unsupported("fields", json_kind(value)));
        };
        let mut fields = Self::new();
        for (name, v) in map {
            fields.insert(name.as_str(), FieldValue::from_json(name, v)?);
        }
        Ok(fields)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One entry of a document batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentOperation {
    Add { id: String, fields: Fields },
    Delete { id: String },
}

impl DocumentOperation {
    pub fn add(id: impl ToString, fields: Fields) -> Self {
        Self::Add {
            id: id.to_string(),
            fields,
        }
    }

    pub fn delete(id: impl ToString) -> Self {
        Self::Delete { id: id.to_string() }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Add { id, .. } | Self::Delete { id } => id,
        }
    }
}

/// Ordered operations sent as one JSON array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBatch {
    operations: Vec<DocumentOperation>,
}

impl DocumentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(operation: DocumentOperation) -> Self {
        Self {
            operations: vec![operation],
        }
    }

    pub fn push(&mut self, operation: DocumentOperation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[DocumentOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.operations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_add_body() {
        let batch = DocumentBatch::single(DocumentOperation::add(
            1,
            Fields::new().with("name", "fritters"),
        ));
        assert_eq!(
            batch.to_json().unwrap(),
            r#"[{"type":"add","id":"1","fields":{"name":"fritters"}}]"#
        );
    }

    #[test]
    fn test_delete_body() {
        let batch = DocumentBatch::single(DocumentOperation::delete("1"));
        assert_eq!(batch.to_json().unwrap(), r#"[{"type":"delete","id":"1"}]"#);
    }

    #[test]
    fn test_null_becomes_empty_string() {
        let fields = Fields::new()
            .with("name", "fritters")
            .with("email", Option::<String>::None);
        let body = DocumentBatch::single(DocumentOperation::add("1", fields))
            .to_json()
            .unwrap();
        assert_eq!(
            body,
            r#"[{"type":"add","id":"1","fields":{"name":"fritters","email":""}}]"#
        );
    }

    #[test]
    fn test_dates_become_epoch_seconds() {
        let fields = Fields::new()
            .with("time", Utc.with_ymd_and_hms(2012, 4, 1, 7, 0, 0).unwrap())
            .with("date", NaiveDate::from_ymd_opt(2012, 4, 1).unwrap());
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value, json!({ "time": 1333263600, "date": 1333238400 }));
    }

    #[test]
    fn test_scalars_and_lists() {
        let fields = Fields::new()
            .with("year", 1977)
            .with("rating", 8.5)
            .with("released", true)
            .with("genres", vec!["scifi", "adventure"]);
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"{"year":1977,"rating":8.5,"released":true,"genres":["scifi","adventure"]}"#
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut fields = Fields::new().with("a", 1).with("b", 2);
        fields.insert("a", 3);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("a"), Some(&FieldValue::Integer(3)));
        assert_eq!(serde_json::to_string(&fields).unwrap(), r#"{"a":3,"b":2}"#);
    }

    #[test]
    fn test_fields_from_json_keeps_order() {
        let fields = Fields::from_json(&json!({
            "title": "Star Wars",
            "year": 1977,
            "score": 0.5,
            "tags": ["a", "b"],
            "note": null
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_string(&fields).unwrap(),
            r#"{"title":"Star Wars","year":1977,"score":0.5,"tags":["a","b"],"note":""}"#
        );
    }

    #[test]
    fn test_fields_from_json_rejects_objects() {
        let err = Fields::from_json(&json!({ "meta": { "x": 1 } })).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedValueType { ref field, .. } if field == "meta"
        ));
        assert!(Fields::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut batch = DocumentBatch::new();
        assert!(batch.is_empty());
        batch.push(DocumentOperation::delete("2"));
        batch.push(DocumentOperation::add("3", Fields::new()));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.operations()[0].id(), "2");
        assert_eq!(
            batch.to_json().unwrap(),
            r#"[{"type":"delete","id":"2"},{"type":"add","id":"3","fields":{}}]"#
        );
    }
}
