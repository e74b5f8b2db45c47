//! Type descriptors: the ordered field list of a class, and the case list of
//! an enumeration.
//!
//! Descriptors stand in for runtime reflection. They are registered once
//! (see [`crate::registry::TypeRegistry`]) and cloned out per call by
//! [`crate::registry::TypeRegistry::describe`].

use crate::annotations::{Annotation, FieldAnnotations};
use crate::data::{Backing, EnumValue};

pub const DATE_TIME: &str = "DateTime";

/// Builtin scalar kinds. Coercion only ever happens between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Null,
    Bool,
    Int,
    Float,
    String,
}

/// What a field is declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredKind {
    Scalar(ScalarKind),
    /// builtin `array`
    Array,
    /// builtin `object`: any mapping
    Object,
    DateTime,
    Enum(String),
    Class(String),
}

impl ScalarKind {
    /// Accepts the usual spellings: `int`/`integer`, `float`/`double`,
    /// `bool`/`boolean`, `string`, `null`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" | "NULL" => Some(Self::Null),
            "bool" | "boolean" => Some(Self::Bool),
            "int" | "integer" => Some(Self::Int),
            "float" | "double" => Some(Self::Float),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

impl DeclaredKind {
    /// Builtin kinds are scalars, `array` and `object`.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Array | Self::Object)
    }

    /// Parses a builtin or temporal type name. Anything else is a user type
    /// and has to be resolved against a registry.
    pub fn parse_builtin(name: &str) -> Option<Self> {
        match name {
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            DATE_TIME => Some(Self::DateTime),
            _ => ScalarKind::parse(name).map(Self::Scalar),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(k) => k.name(),
            Self::Array => "array",
            Self::Object => "object",
            Self::DateTime => DATE_TIME,
            Self::Enum(name) | Self::Class(name) => name,
        }
    }
}

/// The resolved description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub name: String,
    /// `None` for untyped fields: passed through on serialize, never
    /// populated on deserialize.
    pub declared: Option<DeclaredKind>,
    /// Accepts `null` in addition to the declared kind.
    pub nullable: bool,
    pub annotations: FieldAnnotations,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, declared: DeclaredKind) -> Self {
        Self {
            name: name.into(),
            declared: Some(declared),
            nullable: false,
            annotations: FieldAnnotations::default(),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared: None,
            nullable: false,
            annotations: FieldAnnotations::default(),
        }
    }

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, DeclaredKind::Scalar(kind))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.insert(annotation);
        self
    }

    /// JSON key for this field: the renamed key if any.
    pub fn key(&self) -> &str {
        self.annotations.key(&self.name)
    }
}

/// Field list of a class, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: String,
    pub fields: Vec<FieldMetadata>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    /// Appends a field. Redeclaring a name replaces the earlier field in place.
    pub fn field(mut self, field: FieldMetadata) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(slot) => *slot = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    pub name: String,
    pub backing: Option<Backing>,
}

/// Cases of an enumeration. Either every case is backed or none is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub cases: Vec<EnumCase>,
}

impl EnumDescriptor {
    pub fn unit<I, S>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            cases: cases
                .into_iter()
                .map(|c| EnumCase { name: c.into(), backing: None })
                .collect(),
        }
    }

    pub fn backed<I, S>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (S, Backing)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            cases: cases
                .into_iter()
                .map(|(c, b)| EnumCase { name: c.into(), backing: Some(b) })
                .collect(),
        }
    }

    pub fn is_backed(&self) -> bool {
        self.cases.first().is_some_and(|c| c.backing.is_some())
    }

    /// Builds the value for the case called `name`.
    pub fn case(&self, name: &str) -> Option<EnumValue> {
        self.cases.iter().find(|c| c.name == name).map(|c| self.value_of(c))
    }

    pub fn value_of(&self, case: &EnumCase) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            case: case.name.clone(),
            backing: case.backing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::PropertyName;

    #[test]
    fn builtin_names_parse_with_aliases() {
        assert_eq!(DeclaredKind::parse_builtin("integer"), Some(DeclaredKind::Scalar(ScalarKind::Int)));
        assert_eq!(DeclaredKind::parse_builtin("double"), Some(DeclaredKind::Scalar(ScalarKind::Float)));
        assert_eq!(DeclaredKind::parse_builtin("array"), Some(DeclaredKind::Array));
        assert_eq!(DeclaredKind::parse_builtin("DateTime"), Some(DeclaredKind::DateTime));
        assert_eq!(DeclaredKind::parse_builtin("User"), None);
        assert!(!DeclaredKind::DateTime.is_builtin());
    }

    #[test]
    fn redeclared_field_keeps_position() {
        let class = ClassDescriptor::new("User")
            .field(FieldMetadata::scalar("a", ScalarKind::Int))
            .field(FieldMetadata::scalar("b", ScalarKind::Int))
            .field(FieldMetadata::scalar("a", ScalarKind::String).annotate(PropertyName::new("x")));
        let names: Vec<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(class.get("a").unwrap().key(), "x");
    }

    #[test]
    fn backed_cases_carry_their_scalar() {
        let level = EnumDescriptor::backed("Level", [("Low", Backing::Int(1)), ("High", Backing::Int(9))]);
        assert!(level.is_backed());
        let high = level.case("High").unwrap();
        assert_eq!(high.backing, Some(Backing::Int(9)));
        assert!(level.case("Mid").is_none());
        assert!(!EnumDescriptor::unit("Type", ["User"]).is_backed());
    }
}
