//! Registry files: a JSON document declaring enums and classes.
//!
//! ```json
//! {
//!   "enums":   [{"name": "Type", "cases": [{"name": "User"}]}],
//!   "classes": [{"name": "User", "fields": [
//!       {"name": "name", "type": "string"},
//!       {"name": "type", "type": "Type"},
//!       {"name": "created", "type": "DateTime", "date_format": "Y-m-d"}
//!   ]}]
//! }
//! ```
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::annotations::{DateTimeFormat, Ignore, PropertyName, PropertyType};
use crate::data::Backing;
use crate::descriptor::{ClassDescriptor, EnumCase, EnumDescriptor, FieldMetadata};
use crate::registry::TypeRegistry;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default)]
    enums: Vec<EnumDecl>,
    #[serde(default)]
    classes: Vec<ClassDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumDecl {
    name: String,
    cases: Vec<CaseDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseDecl {
    name: String,
    #[serde(default)]
    value: Option<BackingDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackingDecl {
    Int(i64),
    String(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassDecl {
    name: String,
    #[serde(default)]
    fields: Vec<FieldDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDecl {
    name: String,
    /// absent → untyped
    #[serde(default, rename = "type")]
    ty: Option<String>,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    ignore: bool,
    #[serde(default)]
    rename: Option<String>,
    #[serde(default)]
    element_type: Option<String>,
    #[serde(default)]
    date_format: Option<String>,
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path(src: &str) -> Result<RegistryFile, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, RegistryFile>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

pub fn load_registry(path: &Path) -> Result<TypeRegistry> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read registry file {}", path.display()))?;
    parse_registry(&source).with_context(|| format!("invalid registry file {}", path.display()))
}

pub fn parse_registry(source: &str) -> Result<TypeRegistry> {
    let file = from_str_with_path(source).map_err(anyhow::Error::msg)?;
    let mut registry = TypeRegistry::new();

    // enums first, so field types can tell enum names from class names
    for decl in file.enums {
        registry.register_enum(build_enum(decl)?);
    }
    let mut classes = Vec::with_capacity(file.classes.len());
    for decl in file.classes {
        let mut class = ClassDescriptor::new(decl.name);
        for field in decl.fields {
            class = class.field(build_field(&registry, field));
        }
        classes.push(class);
    }
    for class in classes {
        registry.register_class(class);
    }
    Ok(registry)
}

fn build_enum(decl: EnumDecl) -> Result<EnumDescriptor> {
    let backed = decl.cases.first().is_some_and(|c| c.value.is_some());
    let mut cases = Vec::with_capacity(decl.cases.len());
    for case in decl.cases {
        let backing = match (&case.value, backed) {
            (None, false) => None,
            (Some(BackingDecl::Int(i)), true) => Some(Backing::Int(*i)),
            (Some(BackingDecl::String(s)), true) => Some(Backing::String(s.clone())),
            _ => bail!("enum {}: either every case has a value or none does", decl.name),
        };
        cases.push(EnumCase { name: case.name, backing });
    }
    let mixed = cases.windows(2).any(|w| {
        matches!(
            (&w[0].backing, &w[1].backing),
            (Some(Backing::Int(_)), Some(Backing::String(_)))
                | (Some(Backing::String(_)), Some(Backing::Int(_)))
        )
    });
    if mixed {
        bail!("enum {}: case values must all be integers or all strings", decl.name);
    }
    Ok(EnumDescriptor { name: decl.name, cases })
}

fn build_field(registry: &TypeRegistry, decl: FieldDecl) -> FieldMetadata {
    let mut field = match &decl.ty {
        Some(ty) => FieldMetadata::new(decl.name, registry.declared_kind(ty)),
        None => FieldMetadata::untyped(decl.name),
    };
    field.nullable = decl.nullable;
    if decl.ignore {
        field = field.annotate(Ignore);
    }
    if let Some(rename) = decl.rename {
        field = field.annotate(PropertyName(rename));
    }
    if let Some(element_type) = decl.element_type {
        field = field.annotate(PropertyType(element_type));
    }
    if let Some(format) = decl.date_format {
        field = field.annotate(DateTimeFormat(format));
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DeclaredKind, ScalarKind};

    #[test]
    fn parses_enums_classes_and_annotations() {
        let registry = parse_registry(r#"{
            "enums": [
                {"name": "Type", "cases": [{"name": "User"}, {"name": "Admin"}]},
                {"name": "Level", "cases": [{"name": "Low", "value": 1}, {"name": "High", "value": 9}]}
            ],
            "classes": [
                {"name": "User", "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "secret", "type": "string", "ignore": true},
                    {"name": "id", "type": "integer", "rename": "user_id"},
                    {"name": "type", "type": "Type"},
                    {"name": "address", "type": "Address"},
                    {"name": "tags", "type": "array", "element_type": "string"},
                    {"name": "created", "type": "DateTime", "date_format": "Y-m-d"},
                    {"name": "note", "type": "string", "nullable": true},
                    {"name": "extra"}
                ]},
                {"name": "Address", "fields": [{"name": "city", "type": "string"}]}
            ]
        }"#).unwrap();

        let fields = registry.describe("User").unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "secret", "id", "type", "address", "tags", "created", "note", "extra"]);
        assert!(fields[1].annotations.is_ignored());
        assert_eq!(fields[2].key(), "user_id");
        assert_eq!(fields[2].declared, Some(DeclaredKind::Scalar(ScalarKind::Int)));
        assert_eq!(fields[3].declared, Some(DeclaredKind::Enum("Type".into())));
        assert_eq!(fields[4].declared, Some(DeclaredKind::Class("Address".into())));
        assert_eq!(fields[5].annotations.property_type.as_ref().map(|t| t.name()), Some("string"));
        assert_eq!(fields[6].annotations.date_time_format.as_ref().map(|f| f.format()), Some("Y-m-d"));
        assert!(fields[7].nullable);
        assert!(fields[8].declared.is_none());

        assert!(registry.enumeration("Level").unwrap().is_backed());
        assert!(registry.class("Address").is_some());
    }

    #[test]
    fn errors_carry_the_json_path() {
        let err = parse_registry(r#"{"classes": [{"name": "A", "fields": [{"name": "x", "typo": 1}]}]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("classes[0].fields[0]"), "{err}");
    }

    #[test]
    fn mixed_enum_backing_is_rejected() {
        let err = parse_registry(r#"{"enums": [{"name": "E", "cases": [{"name": "A", "value": 1}, {"name": "B"}]}]}"#);
        assert!(err.is_err());
        let err = parse_registry(r#"{"enums": [{"name": "E", "cases": [{"name": "A", "value": 1}, {"name": "B", "value": "b"}]}]}"#);
        assert!(err.is_err());
    }
}
