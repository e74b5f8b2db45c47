//! Public entry points: JSON text (or an already decoded tree) in and out.
use serde_json::Value;

use crate::data::Object;
use crate::deserializer::Deserializer;
use crate::error::MapError;
use crate::registry::TypeRegistry;
use crate::serializer::Serializer;

/// Serializer and deserializer bound to one registry. Holds no other state,
/// so a shared reference can be used from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct JsonMapper {
    registry: TypeRegistry,
}

impl JsonMapper {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Object (or mapping / coerced sequence) → value tree.
    pub fn to_value(&self, value: &Object) -> Result<Value, MapError> {
        Serializer::new(&self.registry).serialize(value)
    }

    /// Object → JSON text. Non-ASCII characters are left unescaped.
    pub fn serialize(&self, value: &Object) -> Result<String, MapError> {
        encode_text(&self.to_value(value)?)
    }

    pub fn from_value(&self, tree: &Value, class: &str) -> Result<Object, MapError> {
        Deserializer::new(&self.registry).deserialize(tree, class)
    }

    pub fn from_value_into(&self, tree: &Value, target: Object) -> Result<Object, MapError> {
        Deserializer::new(&self.registry).deserialize_into(tree, target)
    }

    /// JSON text → new instance of `class`.
    pub fn deserialize(&self, text: &str, class: &str) -> Result<Object, MapError> {
        self.from_value(&decode_text(text)?, class)
    }

    /// JSON text → fields of an existing instance.
    pub fn deserialize_into(&self, text: &str, target: Object) -> Result<Object, MapError> {
        self.from_value_into(&decode_text(text)?, target)
    }
}

pub fn encode_text(value: &Value) -> Result<String, MapError> {
    serde_json::to_string(value).map_err(|e| MapError::Encode(e.to_string()))
}

pub fn decode_text(text: &str) -> Result<Value, MapError> {
    serde_json::from_str(text).map_err(|e| MapError::Decode(e.to_string()))
}
