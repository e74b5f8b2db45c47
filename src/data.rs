// Dynamic instance model. A `Data` tree is what the engine walks on
// serialize and what it builds on deserialize.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Data>),
    Object(Object),
    DateTime(DateTime<FixedOffset>),
    Enum(EnumValue),
}

/// Scalar carried by a case of a backed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    Int(i64),
    String(String),
}

/// One case of an enumeration, as stored in a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub enum_name: String,
    pub case: String,
    pub backing: Option<Backing>, // None for unit enumerations
}

/// An instance: optional class name plus its initialized fields, in
/// assignment order. A declared field that is absent here is uninitialized.
/// Keys not declared by the class are dynamic (untyped) fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    class: Option<String>,
    fields: IndexMap<String, Data>,
}

impl Object {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: Some(class.into()), fields: IndexMap::new() }
    }

    /// A classless object; every field on it is dynamic.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Coerce a sequence to an object keyed by position ("0", "1", ...).
    pub fn from_sequence(items: Vec<Data>) -> Self {
        let fields = items
            .into_iter()
            .enumerate()
            .map(|(i, x)| (i.to_string(), x))
            .collect();
        Self { class: None, fields }
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn get(&self, field: &str) -> Option<&Data> {
        self.fields.get(field)
    }

    pub fn is_initialized(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Data>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Data>) -> Self {
        self.set(field, value);
        self
    }

    pub fn unset(&mut self, field: &str) -> Option<Data> {
        self.fields.shift_remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Data)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<IndexMap<String, Data>> for Object {
    fn from(fields: IndexMap<String, Data>) -> Self {
        Self { class: None, fields }
    }
}

impl Data {
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Data::Object(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Data::DateTime(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Data::Enum(x) => Some(x),
            _ => None,
        }
    }

    /// Untyped conversion of a decoded JSON node: mappings become anonymous
    /// objects, numbers become `Int` when they fit in an `i64`.
    pub fn from_json(value: &Value) -> Data {
        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Data::Int(i),
                None => Data::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Data::String(s.clone()),
            Value::Array(xs) => Data::Array(xs.iter().map(Data::from_json).collect()),
            Value::Object(map) => Data::Object(Object::from(
                map.iter()
                    .map(|(k, v)| (k.clone(), Data::from_json(v)))
                    .collect::<IndexMap<_, _>>(),
            )),
        }
    }
}

impl EnumValue {
    /// The external representation: the backing scalar, or the case name.
    pub fn to_json(&self) -> Value {
        match &self.backing {
            Some(Backing::Int(i)) => Value::from(*i),
            Some(Backing::String(s)) => Value::from(s.clone()),
            None => Value::from(self.case.clone()),
        }
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Bool(value)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Int(value)
    }
}

impl From<i32> for Data {
    fn from(value: i32) -> Self {
        Data::Int(value.into())
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Float(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_owned())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<Vec<Data>> for Data {
    fn from(value: Vec<Data>) -> Self {
        Data::Array(value)
    }
}

impl From<Object> for Data {
    fn from(value: Object) -> Self {
        Data::Object(value)
    }
}

impl From<DateTime<FixedOffset>> for Data {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Data::DateTime(value)
    }
}

impl From<EnumValue> for Data {
    fn from(value: EnumValue) -> Self {
        Data::Enum(value)
    }
}
