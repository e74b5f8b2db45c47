//! Instance → value tree.
//!
//! Walks the fields of an [`Object`] in descriptor order and builds the JSON
//! node for each one, consulting its declared kind and annotations.
//!
//! Contract notes:
//! - Untyped fields, and fields whose output key is numeric, are emitted
//!   verbatim (objects inside them still recurse). Deserialization never
//!   populates untyped fields; the asymmetry is intended.
//! - `DateTimeFormat` applies here only.
//! - Array fields collapse every element into one slot keyed by the field's
//!   own key, so only the last element survives, and elements typed as an
//!   enumeration are dropped by the collection that replaces them.

use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Map, Value};

use crate::coerce::is_numeric_key;
use crate::data::{Data, Object};
use crate::descriptor::{DeclaredKind, FieldMetadata};
use crate::error::MapError;
use crate::registry::{NamedType, TypeRegistry};
use crate::temporal;

pub struct Serializer<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Serializer<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Serializes `object`. An object with no visible fields becomes `{}`.
    pub fn serialize(&self, object: &Object) -> Result<Value, MapError> {
        let values = self.serialize_fields(object)?;
        if values.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(pack(values))
    }

    fn serialize_fields(&self, object: &Object) -> Result<IndexMap<String, Value>, MapError> {
        let mut values = IndexMap::new();

        for field in self.registry.describe_object(object) {
            let Some(value) = object.get(&field.name) else {
                trace!("skipping uninitialized field `{}`", field.name);
                continue;
            };
            if field.annotations.is_ignored() {
                debug!("skipping ignored field `{}`", field.name);
                continue;
            }

            let key = field.key().to_owned();

            if field.nullable && matches!(value, Data::Null) {
                values.insert(key, Value::Null);
                continue;
            }

            let declared = match &field.declared {
                Some(declared) if !is_numeric_key(&key) => declared,
                _ => {
                    values.insert(key, self.raw(value)?);
                    continue;
                }
            };

            if declared.is_builtin() {
                if *declared == DeclaredKind::Array || matches!(value, Data::Array(_)) {
                    let collection = self.serialize_collection(&field, &key, value, &mut values)?;
                    values.insert(key, collection);
                } else if *declared == DeclaredKind::Object || matches!(value, Data::Object(_)) {
                    values.insert(key, self.nested(value)?);
                } else {
                    values.insert(key, self.raw(value)?);
                }
                continue;
            }

            match (declared, value) {
                (_, Data::DateTime(dt)) => {
                    values.insert(key, date_time(dt, &field));
                }
                (DeclaredKind::Enum(_), Data::Enum(e)) => {
                    values.insert(key, e.to_json());
                }
                (DeclaredKind::Enum(name), _) => {
                    debug!("field `{}` holds no case of enum `{name}`, skipping", field.name);
                }
                _ => {
                    values.insert(key, self.nested(value)?);
                }
            }
        }

        Ok(values)
    }

    /// Builds the collection stored under `key` for an array field. Each
    /// element overwrites the single slot; enum elements write to the field
    /// entry in `values`, which the caller then replaces with the collection.
    fn serialize_collection(
        &self,
        field: &FieldMetadata,
        key: &str,
        value: &Data,
        values: &mut IndexMap<String, Value>,
    ) -> Result<Value, MapError> {
        let items: Vec<&Data> = match value {
            Data::Array(xs) => xs.iter().collect(),
            Data::Object(o) => o.iter().map(|(_, x)| x).collect(),
            _ => Vec::new(),
        };
        let hint = field
            .annotations
            .property_type
            .as_ref()
            .map(|t| self.registry.resolve(t.name()));

        let mut slot: Option<Value> = None;
        for item in items {
            if let Data::DateTime(dt) = item {
                slot = Some(date_time(dt, field));
                continue;
            }
            match hint {
                Some(NamedType::Enum(_)) => {
                    if let Data::Enum(e) = item {
                        values.insert(key.to_owned(), e.to_json());
                    }
                }
                Some(NamedType::Class(_) | NamedType::DateTime) => {
                    slot = Some(self.nested(item)?);
                }
                _ => {
                    slot = Some(self.raw(item)?);
                }
            }
        }

        Ok(match slot {
            Some(last) => pack(IndexMap::from([(key.to_owned(), last)])),
            None => Value::Array(Vec::new()),
        })
    }

    /// Recurses into objects and sequences; anything else is emitted raw.
    fn nested(&self, value: &Data) -> Result<Value, MapError> {
        match value {
            Data::Object(o) => self.serialize(o),
            Data::Array(xs) => self.serialize(&Object::from_sequence(xs.clone())),
            other => self.raw(other),
        }
    }

    /// Verbatim value. Date-times fall back to epoch seconds and enum cases
    /// to their external representation.
    fn raw(&self, value: &Data) -> Result<Value, MapError> {
        Ok(match value {
            Data::Null => Value::Null,
            Data::Bool(b) => Value::Bool(*b),
            Data::Int(i) => Value::from(*i),
            Data::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| MapError::Encode("Inf and NaN cannot be JSON encoded".to_owned()))?,
            Data::String(s) => Value::String(s.clone()),
            Data::Array(xs) => {
                Value::Array(xs.iter().map(|x| self.raw(x)).collect::<Result<_, _>>()?)
            }
            Data::Object(o) => self.serialize(o)?,
            Data::DateTime(dt) => Value::from(dt.timestamp()),
            Data::Enum(e) => e.to_json(),
        })
    }
}

fn date_time(dt: &chrono::DateTime<chrono::FixedOffset>, field: &FieldMetadata) -> Value {
    match &field.annotations.date_time_format {
        Some(format) => Value::String(temporal::format(dt, format.format())),
        None => Value::from(dt.timestamp()),
    }
}

/// A map keyed exactly `"0".."n-1"` in order is a list; anything else is an
/// object. Empty maps are left to the caller.
fn pack(values: IndexMap<String, Value>) -> Value {
    let is_list = values.keys().enumerate().all(|(i, k)| *k == i.to_string());
    if is_list {
        Value::Array(values.into_values().collect())
    } else {
        Value::Object(values.into_iter().collect())
    }
}
