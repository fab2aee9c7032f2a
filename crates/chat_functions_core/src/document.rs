//! Firestore REST document and value codec.
//!
//! Documents travel over the REST API as typed value maps
//! (`{"college": {"stringValue": "mit"}}`). The types here mirror that wire
//! shape so both the HTTP adapter and the in-memory store speak the same
//! representation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// int64 values are transported as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    pub fn null() -> Self {
        Self::NullValue(())
    }

    pub fn integer(value: i64) -> Self {
        Self::IntegerValue(value.to_string())
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Self::TimestampValue(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::NullValue(()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the string payload only when it is non-empty.
    pub fn as_non_empty_str(&self) -> Option<&str> {
        self.as_str().filter(|text| !text.is_empty())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::IntegerValue(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::TimestampValue(value) => Some(*value),
            _ => None,
        }
    }

    /// Orders two values of the same kind. Values of different kinds, and
    /// kinds without a natural order, are incomparable.
    pub fn compare_same_kind(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::TimestampValue(left), Self::TimestampValue(right)) => Some(left.cmp(right)),
            (Self::StringValue(left), Self::StringValue(right)) => Some(left.cmp(right)),
            (Self::BooleanValue(left), Self::BooleanValue(right)) => Some(left.cmp(right)),
            (Self::DoubleValue(left), Self::DoubleValue(right)) => left.partial_cmp(right),
            (Self::IntegerValue(_), Self::IntegerValue(_)) => {
                Some(self.as_integer()?.cmp(&other.as_integer()?))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(name: impl Into<String>, fields: Fields) -> Self {
        Self {
            name: name.into(),
            fields,
            create_time: None,
            update_time: None,
        }
    }

    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        crate::collections::document_id_from_name(&self.name)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn non_empty_string(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_non_empty_str)
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(Value::as_timestamp)
    }
}
