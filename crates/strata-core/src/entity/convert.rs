//! Typed conversions out of [`PropertyValue`].
//!
//! Matching types convert directly. Mismatches follow a small set of scalar
//! rules: integers widen, narrow with a range check, and convert to and from
//! integral doubles; strings parse into numbers, booleans, RFC 3339 dates and
//! base64 binary; any scalar renders to a string.

use base64::Engine;
use chrono::{DateTime, Utc};

use super::value::PropertyValue;

/// A field type that can be read from a property value.
pub trait FromProperty: Sized {
    /// Name used in conversion errors.
    const EXPECTED: &'static str;

    /// `None` when the value cannot represent `Self`.
    fn from_property(value: &PropertyValue) -> Option<Self>;
}

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

fn integral(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

impl FromProperty for String {
    const EXPECTED: &'static str = "Edm.String";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        Some(match value {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Int32(v) => v.to_string(),
            PropertyValue::Int64(v) => v.to_string(),
            PropertyValue::Double(v) => v.to_string(),
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::DateTime(v) => v.to_rfc3339(),
            PropertyValue::Binary(v) => b64().encode(v),
        })
    }
}

impl FromProperty for i64 {
    const EXPECTED: &'static str = "Edm.Int64";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Int64(v) => Some(*v),
            PropertyValue::Int32(v) => Some(i64::from(*v)),
            PropertyValue::Double(v) => integral(*v),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromProperty for i32 {
    const EXPECTED: &'static str = "Edm.Int32";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Int32(v) => Some(*v),
            other => i64::from_property(other).and_then(|v| i32::try_from(v).ok()),
        }
    }
}

impl FromProperty for f64 {
    const EXPECTED: &'static str = "Edm.Double";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Int32(v) => Some(f64::from(*v)),
            PropertyValue::Int64(v) => Some(*v as f64),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromProperty for bool {
    const EXPECTED: &'static str = "Edm.Boolean";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(v) => Some(*v),
            PropertyValue::String(s) => s.trim().to_ascii_lowercase().parse().ok(),
            _ => None,
        }
    }
}

impl FromProperty for DateTime<Utc> {
    const EXPECTED: &'static str = "Edm.DateTime";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::DateTime(v) => Some(*v),
            PropertyValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl FromProperty for Vec<u8> {
    const EXPECTED: &'static str = "Edm.Binary";

    fn from_property(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Binary(v) => Some(v.clone()),
            PropertyValue::String(s) => b64().decode(s.trim()).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn integers_widen_and_narrow_with_range_check() {
        assert_eq!(i64::from_property(&PropertyValue::Int32(7)), Some(7));
        assert_eq!(i32::from_property(&PropertyValue::Int64(7)), Some(7));
        assert_eq!(i32::from_property(&PropertyValue::Int64(i64::MAX)), None);
        assert_eq!(i32::from_property(&PropertyValue::Double(3.0)), Some(3));
        assert_eq!(i32::from_property(&PropertyValue::Double(3.5)), None);
    }

    #[test]
    fn strings_parse_into_scalars() {
        let s = |v: &str| PropertyValue::String(v.to_string());
        assert_eq!(i64::from_property(&s(" 42 ")), Some(42));
        assert_eq!(f64::from_property(&s("2.5")), Some(2.5));
        assert_eq!(bool::from_property(&s("TRUE")), Some(true));
        assert_eq!(
            DateTime::<Utc>::from_property(&s("2024-03-01T12:00:00Z")),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(Vec::<u8>::from_property(&s("AQID")), Some(vec![1, 2, 3]));
        assert_eq!(i64::from_property(&s("forty-two")), None);
    }

    #[test]
    fn everything_renders_to_string() {
        assert_eq!(
            String::from_property(&PropertyValue::Int64(-3)).as_deref(),
            Some("-3")
        );
        assert_eq!(
            String::from_property(&PropertyValue::Binary(vec![1, 2, 3])).as_deref(),
            Some("AQID")
        );
    }

    #[test]
    fn unrelated_types_do_not_convert() {
        assert_eq!(bool::from_property(&PropertyValue::Int32(1)), None);
        assert_eq!(f64::from_property(&PropertyValue::Bool(true)), None);
        assert_eq!(Vec::<u8>::from_property(&PropertyValue::Int32(1)), None);
    }
}
