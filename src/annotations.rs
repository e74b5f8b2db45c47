//! Declarative per-field directives.
//!
//! Annotations are plain data attached to a field at registration time. A field
//! holds at most one annotation of each kind; attaching another of the same
//! kind replaces the earlier one.

pub const DEFAULT_DATE_TIME_FORMAT: &str = "Y-m-d H:i:s";

/// Omit the field from serialized output. Deserialization still reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ignore;

/// JSON key used both when writing and when looking up the source value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyName(pub String);

/// Effective element type (for arrays) or target type (for ambiguous fields):
/// a scalar kind name, `"array"`, `"object"`, `"DateTime"`, an enum name or a
/// class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyType(pub String);

/// Output format for date-time values, in `date()` token syntax.
/// Only consulted when serializing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeFormat(pub String);

impl Default for DateTimeFormat {
    fn default() -> Self {
        Self(DEFAULT_DATE_TIME_FORMAT.to_owned())
    }
}

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PropertyType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl DateTimeFormat {
    pub fn new(format: impl Into<String>) -> Self {
        Self(format.into())
    }
    pub fn format(&self) -> &str {
        &self.0
    }
}

/// Any single annotation, for attaching through one entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Ignore(Ignore),
    PropertyName(PropertyName),
    PropertyType(PropertyType),
    DateTimeFormat(DateTimeFormat),
}

impl From<Ignore> for Annotation {
    fn from(value: Ignore) -> Self {
        Self::Ignore(value)
    }
}

impl From<PropertyName> for Annotation {
    fn from(value: PropertyName) -> Self {
        Self::PropertyName(value)
    }
}

impl From<PropertyType> for Annotation {
    fn from(value: PropertyType) -> Self {
        Self::PropertyType(value)
    }
}

impl From<DateTimeFormat> for Annotation {
    fn from(value: DateTimeFormat) -> Self {
        Self::DateTimeFormat(value)
    }
}

/// The resolved annotation set of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAnnotations {
    pub ignore: Option<Ignore>,
    pub property_name: Option<PropertyName>,
    pub property_type: Option<PropertyType>,
    pub date_time_format: Option<DateTimeFormat>,
}

impl FieldAnnotations {
    pub fn insert(&mut self, annotation: impl Into<Annotation>) {
        match annotation.into() {
            Annotation::Ignore(x) => self.ignore = Some(x),
            Annotation::PropertyName(x) => self.property_name = Some(x),
            Annotation::PropertyType(x) => self.property_type = Some(x),
            Annotation::DateTimeFormat(x) => self.date_time_format = Some(x),
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore.is_some()
    }

    /// `PropertyName` if present, else the field's own name.
    pub fn key<'a>(&'a self, field_name: &'a str) -> &'a str {
        self.property_name.as_ref().map_or(field_name, PropertyName::name)
    }

    pub fn is_empty(&self) -> bool {
        self.ignore.is_none()
            && self.property_name.is_none()
            && self.property_type.is_none()
            && self.date_time_format.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_replaces_previous() {
        let mut a = FieldAnnotations::default();
        a.insert(PropertyName::new("first"));
        a.insert(PropertyName::new("second"));
        assert_eq!(a.key("field"), "second");
    }

    #[test]
    fn key_falls_back_to_field_name() {
        let mut a = FieldAnnotations::default();
        assert_eq!(a.key("field"), "field");
        a.insert(Ignore);
        assert!(a.is_ignored());
        assert_eq!(a.key("field"), "field");
    }

    #[test]
    fn date_format_defaults() {
        assert_eq!(DateTimeFormat::default().format(), "Y-m-d H:i:s");
    }
}
