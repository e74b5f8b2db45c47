//! Value tree → instance.
//!
//! Branches on the target field's declared kind, never on the shape of the
//! source value. Keys missing from the source are skipped, so partial
//! population is fine; the first field that fails aborts the whole call.
//!
//! Contract notes:
//! - Untyped target fields are never populated.
//! - `Ignore` has no effect here; a renamed field is looked up by its
//!   renamed key.
//! - Date-times are parsed by the fixed dual rule in [`crate::temporal`];
//!   `DateTimeFormat` is not consulted.

use log::{debug, trace};
use serde_json::{Map, Value};

use crate::coerce::coerce_scalar;
use crate::data::{Backing, Data, EnumValue, Object};
use crate::descriptor::{DeclaredKind, EnumDescriptor, FieldMetadata};
use crate::error::MapError;
use crate::registry::{NamedType, TypeRegistry};
use crate::temporal;

pub struct Deserializer<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Deserializer<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Allocates an empty instance of `class` and populates it from `tree`.
    pub fn deserialize(&self, tree: &Value, class: &str) -> Result<Object, MapError> {
        let source = top_level(tree)?;
        let target = self.registry.instantiate(class)?;
        self.populate(source, target)
    }

    /// Populates an existing instance. Fields the source does not mention keep
    /// their current value.
    pub fn deserialize_into(&self, tree: &Value, target: Object) -> Result<Object, MapError> {
        let source = top_level(tree)?;
        self.populate(source, target)
    }

    fn populate(
        &self,
        source: &Map<String, Value>,
        mut target: Object,
    ) -> Result<Object, MapError> {
        for field in self.registry.describe_object(&target) {
            let Some(declared) = &field.declared else {
                continue;
            };
            let key = field.key();
            let Some(raw) = source.get(key) else {
                trace!("no `{key}` in source, leaving `{}` as is", field.name);
                continue;
            };
            let value = self.convert_field(&field, declared, raw)?;
            target.set(field.name.clone(), value);
        }
        Ok(target)
    }

    fn convert_field(
        &self,
        field: &FieldMetadata,
        declared: &DeclaredKind,
        raw: &Value,
    ) -> Result<Data, MapError> {
        let key = field.key();
        if raw.is_null() && field.nullable {
            return Ok(Data::Null);
        }
        match declared {
            DeclaredKind::Scalar(kind) => {
                coerce_scalar(raw, *kind).ok_or_else(|| MapError::type_mismatch(key))
            }
            DeclaredKind::Object => match raw {
                Value::Object(_) => Ok(Data::from_json(raw)),
                _ => Err(MapError::type_mismatch(key)),
            },
            DeclaredKind::Array => self.convert_array(field, raw),
            DeclaredKind::DateTime => temporal::parse_value(raw)
                .map(Data::DateTime)
                .ok_or_else(|| MapError::invalid_date_time(key, raw)),
            DeclaredKind::Enum(name) => {
                let enumeration = self
                    .registry
                    .enumeration(name)
                    .ok_or_else(|| MapError::invalid_enum_value(key, raw))?;
                resolve_case(enumeration, key, raw).map(Data::Enum)
            }
            DeclaredKind::Class(name) => self.nested(key, name, raw).map(Data::Object),
        }
    }

    fn convert_array(&self, field: &FieldMetadata, raw: &Value) -> Result<Data, MapError> {
        let key = field.key();
        let Value::Array(items) = raw else {
            return Err(MapError::type_mismatch(key));
        };
        let Some(hint) = &field.annotations.property_type else {
            return Ok(Data::from_json(raw));
        };
        let element = self.registry.resolve(hint.name());
        items
            .iter()
            .map(|item| self.convert_element(key, element, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Data::Array)
    }

    fn convert_element(
        &self,
        key: &str,
        element: NamedType<'_>,
        item: &Value,
    ) -> Result<Data, MapError> {
        match element {
            NamedType::DateTime => temporal::parse_value(item)
                .map(Data::DateTime)
                .ok_or_else(|| MapError::invalid_date_time(key, item)),
            NamedType::Enum(enumeration) => resolve_case(enumeration, key, item).map(Data::Enum),
            NamedType::Class(class) => self.nested(key, &class.name, item).map(Data::Object),
            NamedType::Scalar(kind) => {
                coerce_scalar(item, kind).ok_or_else(|| MapError::type_mismatch(key))
            }
            NamedType::Array if item.is_array() => Ok(Data::from_json(item)),
            NamedType::Object if item.is_object() => Ok(Data::from_json(item)),
            NamedType::Array | NamedType::Object | NamedType::Unknown => {
                Err(MapError::type_mismatch(key))
            }
        }
    }

    fn nested(&self, key: &str, class: &str, raw: &Value) -> Result<Object, MapError> {
        let Value::Object(source) = raw else {
            return Err(MapError::type_mismatch(key));
        };
        debug!("deserializing `{key}` as `{class}`");
        let target = self.registry.instantiate(class)?;
        self.populate(source, target)
    }
}

fn top_level(tree: &Value) -> Result<&Map<String, Value>, MapError> {
    match tree {
        Value::Object(map) => Ok(map),
        _ => Err(MapError::Decode("expected a JSON object at the top level".to_owned())),
    }
}

/// Backed enums match on the backing scalar, unit enums on the case name.
fn resolve_case(
    enumeration: &EnumDescriptor,
    key: &str,
    raw: &Value,
) -> Result<EnumValue, MapError> {
    let case = if enumeration.is_backed() {
        enumeration
            .cases
            .iter()
            .find(|c| c.backing.as_ref().is_some_and(|b| loosely_equal(b, raw)))
    } else {
        match raw {
            Value::String(name) => enumeration.cases.iter().find(|c| c.name == *name),
            _ => None,
        }
    };
    case.map(|c| enumeration.value_of(c))
        .ok_or_else(|| MapError::invalid_enum_value(key, raw))
}

/// Numeric/string tolerant equality: `"1"` matches backing `1`, `1` matches
/// backing `"1"`. Booleans, nulls and structures never match a backing.
fn loosely_equal(backing: &Backing, raw: &Value) -> bool {
    let as_number = |s: &str| s.trim().parse::<f64>().ok().filter(|f| f.is_finite());
    match (backing, raw) {
        (Backing::Int(i), Value::Number(n)) => {
            n.as_i64() == Some(*i) || n.as_f64() == Some(*i as f64)
        }
        (Backing::Int(i), Value::String(s)) => {
            s.trim().parse::<i64>() == Ok(*i) || as_number(s) == Some(*i as f64)
        }
        (Backing::String(b), Value::String(s)) => b == s,
        (Backing::String(b), Value::Number(n)) => {
            n.to_string() == *b || (as_number(b).is_some() && as_number(b) == n.as_f64())
        }
        _ => false,
    }
}
