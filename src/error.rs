//! Error kinds surfaced by the mapping engine.
use thiserror::Error;

/// Every failure the engine can report. The first failing field aborts the
/// whole call; nothing is accumulated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    /// The value tree could not be turned into JSON text.
    #[error("json encode failed: {0}")]
    Encode(String),

    /// The JSON text could not be turned into a value tree.
    #[error("json decode failed: {0}")]
    Decode(String),

    /// The target type cannot be allocated as an empty instance.
    #[error("cannot instantiate `{0}`")]
    Instantiation(String),

    /// Declared scalar/array kind and source kind differ and no coercion applies.
    #[error("type match failed param {field}")]
    TypeMismatch { field: String },

    /// No enumeration case matches the source value.
    #[error("invalid enum value: {value} for enum {field}")]
    InvalidEnumValue { field: String, value: String },

    /// Neither the epoch rule nor the general parser accepted the source value.
    #[error("invalid DateTime format: {value} for param {field}")]
    InvalidDateTime { field: String, value: String },
}

impl MapError {
    pub fn type_mismatch(field: impl Into<String>) -> Self {
        Self::TypeMismatch { field: field.into() }
    }

    pub fn invalid_enum_value(field: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::InvalidEnumValue { field: field.into(), value: raw_display(value) }
    }

    pub fn invalid_date_time(field: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::InvalidDateTime { field: field.into(), value: raw_display(value) }
    }
}

// Strings are shown bare; everything else as compact JSON.
fn raw_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_values_render_without_quotes_for_strings() {
        let err = MapError::invalid_enum_value("type", &json!("Admin"));
        assert_eq!(err.to_string(), "invalid enum value: Admin for enum type");

        let err = MapError::invalid_date_time("created", &json!([1, 2]));
        assert_eq!(err.to_string(), "invalid DateTime format: [1,2] for param created");
    }
}
