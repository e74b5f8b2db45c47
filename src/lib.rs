//! Registry-driven mapping between dynamic objects and JSON.
//!
//! Classes and enumerations are described once in a [`TypeRegistry`]; a
//! [`JsonMapper`] then turns [`Object`] instances into JSON text and back,
//! guided by each field's declared kind and its annotations.
pub mod annotations;
pub mod cli;
pub mod coerce;
pub mod data;
pub mod descriptor;
pub mod deserializer;
pub mod error;
pub mod jq_exec;
pub mod json;
pub mod registry;
pub mod registry_file;
pub mod serializer;
pub mod temporal;

pub use annotations::{
    Annotation, DateTimeFormat, FieldAnnotations, Ignore, PropertyName, PropertyType,
};
pub use data::{Backing, Data, EnumValue, Object};
pub use descriptor::{
    ClassDescriptor, DeclaredKind, EnumCase, EnumDescriptor, FieldMetadata, ScalarKind,
};
pub use error::MapError;
pub use json::JsonMapper;
pub use registry::TypeRegistry;
