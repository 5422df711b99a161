//! Ordered, schema-less property bag for table entities.

use chrono::{DateTime, Utc};

use super::value::PropertyValue;

pub const PARTITION_KEY: &str = "PartitionKey";
pub const ROW_KEY: &str = "RowKey";
pub const TIMESTAMP: &str = "Timestamp";

/// System property names that never appear as ordinary properties.
pub fn is_reserved(name: &str) -> bool {
    matches!(name, PARTITION_KEY | ROW_KEY | TIMESTAMP)
}

/// Name → scalar map in insertion order, plus the entity's keys and metadata.
///
/// The two keys are always present. `timestamp` and `etag` are set by the
/// store and are absent on entities that have not been written yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyBag {
    partition_key: String,
    row_key: String,
    timestamp: Option<DateTime<Utc>>,
    etag: Option<String>,
    properties: Vec<(String, PropertyValue)>,
}

impl PropertyBag {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            ..Self::default()
        }
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, ts: Option<DateTime<Utc>>) {
        self.timestamp = ts;
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn set_etag(&mut self, etag: Option<String>) {
        self.etag = etag;
    }

    /// Insert or replace a property. A replaced property keeps its position.
    ///
    /// Reserved names (`PartitionKey`, `RowKey`, `Timestamp`) are ignored here;
    /// keys are fixed at construction and the timestamp has its own setter.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let name = name.into();
        if is_reserved(&name) {
            tracing::warn!(property = %name, "ignoring reserved property name");
            return None;
        }
        let value = value.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.properties.push((name, value));
                None
            }
        }
    }

    /// Insert only when `value` is `Some`.
    pub fn insert_opt<V: Into<PropertyValue>>(&mut self, name: &str, value: Option<V>) {
        if let Some(v) = value {
            self.insert(name, v);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let idx = self.properties.iter().position(|(n, _)| n == name)?;
        Some(self.properties.remove(idx).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of ordinary properties (keys and metadata excluded).
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }
}
