//! Typed record ↔ property bag mapping.
//!
//! Each record type spells out its own mapping by implementing
//! [`TableEntity`]; there is no runtime reflection. A present property that
//! cannot be converted is an error naming the field. An absent property
//! leaves the field at its default.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::bag::PropertyBag;
use super::convert::FromProperty;
use super::error::EntityError;

/// A record stored in a table, keyed by partition key and row key.
pub trait TableEntity: Sized {
    fn partition_key(&self) -> &str;

    fn row_key(&self) -> &str;

    /// Concurrency tag from the last read, if the record carries one.
    fn etag(&self) -> Option<&str> {
        None
    }

    /// Copy every non-key, non-metadata field into `bag`. `None` fields are skipped.
    fn write_properties(&self, bag: &mut PropertyBag);

    /// Build a record from a bag. Keys and metadata are available on `reader`.
    fn read_properties(reader: &EntityReader<'_>) -> Result<Self, EntityError>;
}

/// Typed, read-only view over a bag, used by [`TableEntity::read_properties`].
pub struct EntityReader<'a> {
    bag: &'a PropertyBag,
}

impl<'a> EntityReader<'a> {
    pub fn new(bag: &'a PropertyBag) -> Self {
        Self { bag }
    }

    pub fn partition_key(&self) -> String {
        self.bag.partition_key().to_owned()
    }

    pub fn row_key(&self) -> String {
        self.bag.row_key().to_owned()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.bag.timestamp()
    }

    pub fn etag(&self) -> Option<String> {
        self.bag.etag().map(str::to_owned)
    }

    /// Field value, or `T::default()` when the bag has no such property.
    pub fn get<T: FromProperty + Default>(&self, field: &str) -> Result<T, EntityError> {
        Ok(self.get_opt(field)?.unwrap_or_default())
    }

    /// Field value, or `None` when the bag has no such property.
    pub fn get_opt<T: FromProperty>(&self, field: &str) -> Result<Option<T>, EntityError> {
        let Some(value) = self.bag.get(field) else {
            return Ok(None);
        };
        T::from_property(value)
            .map(Some)
            .ok_or_else(|| EntityError::Conversion {
                field: field.to_owned(),
                expected: T::EXPECTED,
                found: value.type_name(),
            })
    }

    /// Enumeration field stored in its string form.
    pub fn parse_enum<T: FromStr + Default>(&self, field: &str) -> Result<T, EntityError> {
        let Some(value) = self.bag.get(field) else {
            return Ok(T::default());
        };
        String::from_property(value)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| EntityError::Conversion {
                field: field.to_owned(),
                expected: std::any::type_name::<T>(),
                found: value.type_name(),
            })
    }
}

/// Record → bag. Keys are always set; the concurrency tag is copied when present.
pub fn to_bag<T: TableEntity>(record: &T) -> PropertyBag {
    let mut bag = PropertyBag::new(record.partition_key(), record.row_key());
    record.write_properties(&mut bag);
    bag.set_etag(record.etag().map(str::to_owned));
    bag
}

/// Bag → record.
pub fn from_bag<T: TableEntity>(bag: &PropertyBag) -> Result<T, EntityError> {
    T::read_properties(&EntityReader::new(bag))
}

#[cfg(test)]
mod tests;
