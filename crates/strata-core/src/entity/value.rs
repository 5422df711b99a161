//! Scalar values stored in a property bag.

use chrono::{DateTime, Utc};

/// One scalar table property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
}

impl PropertyValue {
    /// EDM type name, as used in JSON annotations.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "Edm.String",
            PropertyValue::Int32(_) => "Edm.Int32",
            PropertyValue::Int64(_) => "Edm.Int64",
            PropertyValue::Double(_) => "Edm.Double",
            PropertyValue::Bool(_) => "Edm.Boolean",
            PropertyValue::DateTime(_) => "Edm.DateTime",
            PropertyValue::Binary(_) => "Edm.Binary",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_owned())
    }
}

impl From<&String> for PropertyValue {
    fn from(v: &String) -> Self {
        PropertyValue::String(v.clone())
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int32(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int64(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(v: DateTime<Utc>) -> Self {
        PropertyValue::DateTime(v)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(v: Vec<u8>) -> Self {
        PropertyValue::Binary(v)
    }
}

impl From<&[u8]> for PropertyValue {
    fn from(v: &[u8]) -> Self {
        PropertyValue::Binary(v.to_vec())
    }
}
