//! Table-entity JSON wire form.
//!
//! Keys and the timestamp use their system names, the concurrency tag is
//! `odata.etag`, and types that plain JSON cannot carry losslessly get a
//! `<name>@odata.type` annotation (`Edm.Int64`, `Edm.Double`, `Edm.DateTime`,
//! `Edm.Binary`). Unannotated numbers read back as `Int32` when they fit,
//! `Int64` otherwise, and `Double` when fractional.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use super::bag::{is_reserved, PropertyBag, PARTITION_KEY, ROW_KEY, TIMESTAMP};
use super::error::EntityError;
use super::value::PropertyValue;

const ETAG: &str = "odata.etag";
const TYPE_SUFFIX: &str = "@odata.type";

fn annotate(map: &mut Map<String, Value>, name: &str, edm: &str) {
    map.insert(format!("{name}{TYPE_SUFFIX}"), Value::String(edm.to_owned()));
}

fn double_to_json(v: f64) -> Value {
    match Number::from_f64(v) {
        Some(n) => Value::Number(n),
        None if v.is_nan() => Value::String("NaN".into()),
        None if v > 0.0 => Value::String("Infinity".into()),
        None => Value::String("-Infinity".into()),
    }
}

impl PropertyBag {
    pub fn to_json(&self) -> Value {
        let b64 = base64::engine::general_purpose::STANDARD;
        let mut map = Map::new();
        map.insert(PARTITION_KEY.into(), Value::String(self.partition_key().into()));
        map.insert(ROW_KEY.into(), Value::String(self.row_key().into()));
        if let Some(ts) = self.timestamp() {
            map.insert(TIMESTAMP.into(), Value::String(ts.to_rfc3339()));
            annotate(&mut map, TIMESTAMP, "Edm.DateTime");
        }
        if let Some(etag) = self.etag() {
            map.insert(ETAG.into(), Value::String(etag.into()));
        }
        for (name, value) in self.iter() {
            let json = match value {
                PropertyValue::String(s) => Value::String(s.clone()),
                PropertyValue::Int32(v) => Value::from(*v),
                PropertyValue::Bool(v) => Value::Bool(*v),
                PropertyValue::Int64(v) => {
                    annotate(&mut map, name, value.type_name());
                    Value::String(v.to_string())
                }
                PropertyValue::Double(v) => {
                    annotate(&mut map, name, value.type_name());
                    double_to_json(*v)
                }
                PropertyValue::DateTime(v) => {
                    annotate(&mut map, name, value.type_name());
                    Value::String(v.to_rfc3339())
                }
                PropertyValue::Binary(v) => {
                    annotate(&mut map, name, value.type_name());
                    Value::String(b64.encode(v))
                }
            };
            map.insert(name.to_owned(), json);
        }
        Value::Object(map)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    pub fn from_json(json: &Value) -> Result<Self, EntityError> {
        let map = json
            .as_object()
            .ok_or_else(|| EntityError::InvalidJson("expected a JSON object".into()))?;
        let key = |name: &'static str| -> Result<String, EntityError> {
            match map.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(EntityError::InvalidJson(format!("'{name}' must be a string"))),
                None => Err(EntityError::MissingKey(name)),
            }
        };
        let mut bag = PropertyBag::new(key(PARTITION_KEY)?, key(ROW_KEY)?);

        if let Some(ts) = map.get(TIMESTAMP) {
            bag.set_timestamp(Some(parse_datetime(TIMESTAMP, ts)?));
        }
        if let Some(etag) = map.get(ETAG).and_then(Value::as_str) {
            bag.set_etag(Some(etag.to_owned()));
        }

        for (name, value) in map {
            if is_reserved(name) || name == ETAG || name.ends_with(TYPE_SUFFIX) {
                continue;
            }
            let edm = map
                .get(&format!("{name}{TYPE_SUFFIX}"))
                .and_then(Value::as_str);
            if let Some(v) = property_from_json(name, value, edm)? {
                bag.insert(name.as_str(), v);
            }
        }
        Ok(bag)
    }

    pub fn from_json_str(s: &str) -> Result<Self, EntityError> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }
}

fn invalid(name: &str, what: &str) -> EntityError {
    EntityError::InvalidJson(format!("property '{name}': {what}"))
}

fn parse_datetime(name: &str, value: &Value) -> Result<DateTime<Utc>, EntityError> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .ok_or_else(|| invalid(name, "expected an RFC 3339 date-time"))
}

fn property_from_json(
    name: &str,
    value: &Value,
    edm: Option<&str>,
) -> Result<Option<PropertyValue>, EntityError> {
    if value.is_null() {
        return Ok(None);
    }
    let v = match edm {
        Some("Edm.String") => PropertyValue::String(
            value
                .as_str()
                .ok_or_else(|| invalid(name, "expected a string"))?
                .to_owned(),
        ),
        Some("Edm.Int32") => {
            let n = value.as_i64().ok_or_else(|| invalid(name, "expected an integer"))?;
            PropertyValue::Int32(i32::try_from(n).map_err(|_| invalid(name, "out of Int32 range"))?)
        }
        Some("Edm.Int64") => {
            let n = match value {
                Value::String(s) => s.parse().ok(),
                other => other.as_i64(),
            };
            PropertyValue::Int64(n.ok_or_else(|| invalid(name, "expected an Int64"))?)
        }
        Some("Edm.Double") => {
            let n = match value {
                Value::String(s) => match s.as_str() {
                    "NaN" => Some(f64::NAN),
                    "Infinity" => Some(f64::INFINITY),
                    "-Infinity" => Some(f64::NEG_INFINITY),
                    other => other.parse().ok(),
                },
                other => other.as_f64(),
            };
            PropertyValue::Double(n.ok_or_else(|| invalid(name, "expected a double"))?)
        }
        Some("Edm.Boolean") => {
            PropertyValue::Bool(value.as_bool().ok_or_else(|| invalid(name, "expected a boolean"))?)
        }
        Some("Edm.DateTime") => PropertyValue::DateTime(parse_datetime(name, value)?),
        Some("Edm.Binary") => {
            let s = value.as_str().ok_or_else(|| invalid(name, "expected base64"))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(s)
                .map_err(|_| invalid(name, "expected base64"))?;
            PropertyValue::Binary(bytes)
        }
        Some(other) => return Err(invalid(name, &format!("unsupported type {other}"))),
        None => match value {
            Value::String(s) => PropertyValue::String(s.clone()),
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => match i32::try_from(i) {
                    Ok(small) => PropertyValue::Int32(small),
                    Err(_) => PropertyValue::Int64(i),
                },
                None => PropertyValue::Double(
                    n.as_f64().ok_or_else(|| invalid(name, "unrepresentable number"))?,
                ),
            },
            _ => return Err(invalid(name, "nested values are not supported")),
        },
    };
    Ok(Some(v))
}
