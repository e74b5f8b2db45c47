//! Registry of class and enumeration descriptors, keyed by type name.
//!
//! The registry is built once and then only read, so a shared reference can
//! be handed to any number of concurrent mapping calls.

use indexmap::IndexMap;

use crate::data::{EnumValue, Object};
use crate::descriptor::{ClassDescriptor, DeclaredKind, EnumDescriptor, FieldMetadata, ScalarKind};
use crate::error::MapError;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Class(ClassDescriptor),
    Enum(EnumDescriptor),
}

/// What a type name (typically from a `PropertyType` annotation) refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NamedType<'r> {
    Scalar(ScalarKind),
    Array,
    Object,
    DateTime,
    Enum(&'r EnumDescriptor),
    Class(&'r ClassDescriptor),
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.register_class(class);
        self
    }

    pub fn with_enum(mut self, enumeration: EnumDescriptor) -> Self {
        self.register_enum(enumeration);
        self
    }

    /// Registering a name twice replaces the earlier definition.
    pub fn register_class(&mut self, class: ClassDescriptor) {
        self.types.insert(class.name.clone(), TypeDef::Class(class));
    }

    pub fn register_enum(&mut self, enumeration: EnumDescriptor) {
        self.types.insert(enumeration.name.clone(), TypeDef::Enum(enumeration));
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        match self.types.get(name)? {
            TypeDef::Class(x) => Some(x),
            TypeDef::Enum(_) => None,
        }
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        match self.types.get(name)? {
            TypeDef::Enum(x) => Some(x),
            TypeDef::Class(_) => None,
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Shorthand for building a field value: the case `case` of enum `name`.
    pub fn enum_case(&self, name: &str, case: &str) -> Option<EnumValue> {
        self.enumeration(name)?.case(case)
    }

    /// Resolves a type name: builtin and temporal names first, then
    /// registered enumerations and classes.
    pub fn resolve(&self, name: &str) -> NamedType<'_> {
        match DeclaredKind::parse_builtin(name) {
            Some(DeclaredKind::Scalar(k)) => return NamedType::Scalar(k),
            Some(DeclaredKind::Array) => return NamedType::Array,
            Some(DeclaredKind::Object) => return NamedType::Object,
            Some(DeclaredKind::DateTime) => return NamedType::DateTime,
            _ => {}
        }
        match self.types.get(name) {
            Some(TypeDef::Enum(x)) => NamedType::Enum(x),
            Some(TypeDef::Class(x)) => NamedType::Class(x),
            None => NamedType::Unknown,
        }
    }

    /// Declared kind for a type name, assuming unregistered names are classes
    /// that may be registered later.
    pub fn declared_kind(&self, name: &str) -> DeclaredKind {
        if let Some(kind) = DeclaredKind::parse_builtin(name) {
            return kind;
        }
        match self.types.get(name) {
            Some(TypeDef::Enum(_)) => DeclaredKind::Enum(name.to_owned()),
            _ => DeclaredKind::Class(name.to_owned()),
        }
    }

    /// Field metadata of a class, in declaration order. Recomputed per call.
    pub fn describe(&self, class: &str) -> Option<Vec<FieldMetadata>> {
        self.class(class).map(|c| c.fields.clone())
    }

    /// Field metadata of a live instance: the class's declared fields, then
    /// the instance's dynamic fields as untyped entries.
    pub fn describe_object(&self, object: &Object) -> Vec<FieldMetadata> {
        let mut fields = object
            .class()
            .and_then(|name| self.describe(name))
            .unwrap_or_default();
        let dynamic: Vec<FieldMetadata> = object
            .iter()
            .filter(|(name, _)| !fields.iter().any(|f| f.name == *name))
            .map(|(name, _)| FieldMetadata::untyped(name))
            .collect();
        fields.extend(dynamic);
        fields
    }

    /// Allocates an empty instance of a registered class. No field is
    /// initialized and no user logic runs.
    pub fn instantiate(&self, name: &str) -> Result<Object, MapError> {
        match self.types.get(name) {
            Some(TypeDef::Class(_)) => Ok(Object::new(name)),
            Some(TypeDef::Enum(_)) => {
                Err(MapError::Instantiation(format!("{name} is an enum")))
            }
            None => Err(MapError::Instantiation(format!("class \"{name}\" does not exist"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with_enum(EnumDescriptor::unit("Type", ["User", "Admin"]))
            .with_class(
                ClassDescriptor::new("User")
                    .field(FieldMetadata::scalar("name", ScalarKind::String))
                    .field(FieldMetadata::new("type", DeclaredKind::Enum("Type".into()))),
            )
    }

    #[test]
    fn resolve_prefers_builtins_then_registry() {
        let r = registry();
        assert_eq!(r.resolve("integer"), NamedType::Scalar(ScalarKind::Int));
        assert_eq!(r.resolve("DateTime"), NamedType::DateTime);
        assert!(matches!(r.resolve("Type"), NamedType::Enum(e) if e.name == "Type"));
        assert!(matches!(r.resolve("User"), NamedType::Class(c) if c.name == "User"));
        assert_eq!(r.resolve("Nope"), NamedType::Unknown);
    }

    #[test]
    fn describe_object_appends_dynamic_fields() {
        let r = registry();
        let obj = Object::new("User").with("extra", 1).with("name", "n");
        let names: Vec<String> = r.describe_object(&obj).into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["name", "type", "extra"]);
        let extra = r.describe_object(&obj).pop().unwrap();
        assert!(extra.declared.is_none());
    }

    #[test]
    fn instantiate_rejects_enums_and_unknown_names() {
        let r = registry();
        let user = r.instantiate("User").unwrap();
        assert_eq!(user.class(), Some("User"));
        assert!(user.is_empty());
        assert!(matches!(r.instantiate("Type"), Err(MapError::Instantiation(_))));
        assert!(matches!(r.instantiate("Ghost"), Err(MapError::Instantiation(_))));
        assert!(matches!(r.instantiate("DateTime"), Err(MapError::Instantiation(_))));
    }
}
