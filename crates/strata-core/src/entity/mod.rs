//! Table entities: typed records, the generic property bag, and the mapping between them.
//!
//! The table surface stores [`PropertyBag`]s. Record types opt in by
//! implementing [`TableEntity`], which spells out the field ↔ property mapping
//! at compile time; [`to_bag`] and [`from_bag`] drive it.

mod bag;
mod convert;
mod error;
mod json;
mod mapper;
mod value;

pub use bag::{is_reserved, PropertyBag, PARTITION_KEY, ROW_KEY, TIMESTAMP};
pub use convert::FromProperty;
pub use error::EntityError;
pub use mapper::{from_bag, to_bag, EntityReader, TableEntity};
pub use value::PropertyValue;
