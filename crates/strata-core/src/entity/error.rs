/// Errors raised while mapping entities to and from property bags.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// A property was present but could not be converted to the field's type.
    #[error("property '{field}': expected {expected}, found {found}")]
    Conversion {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A required system property was missing from the wire form.
    #[error("missing required property '{0}'")]
    MissingKey(&'static str),
    /// The wire form was not a table entity object.
    #[error("invalid entity JSON: {0}")]
    InvalidJson(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
