use serde::Serialize;

use crate::attribute::AttributeRule;
use crate::namespaces::NamespaceRegistrations;

/// Name of the field holding an element's own text.
pub const CONTENT_FIELD: &str = "content";

/// Inferred (or hand-written) description of one element shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TypeDefinition {
    /// Local element name matched during extraction.
    pub tag: String,
    pub namespace_prefix: Option<String>,
    /// Namespace bindings visible at the element.
    pub namespaces: NamespaceRegistrations,
    pub attribute_fields: Vec<AttributeRule>,
    pub element_fields: Vec<FieldDefinition>,
    /// The element carries text of its own, surfaced as the [`CONTENT_FIELD`].
    pub has_text_content: bool,
}

impl TypeDefinition {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// The element field matching the raw child tag.
    pub fn element_field(&self, tag: &str) -> Option<&FieldDefinition> {
        self.element_fields.iter().find(|field| field.tag == tag)
    }

    /// The attribute field with the given normalized name.
    pub fn attribute_field(&self, name: &str) -> Option<&AttributeRule> {
        self.attribute_fields.iter().find(|rule| rule.name == name)
    }

    /// Names of all fields an extracted object will carry, in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.attribute_fields
            .iter()
            .map(|rule| rule.name.as_str())
            .chain(self.element_fields.iter().map(|field| field.name.as_str()))
            .chain(self.has_text_content.then_some(CONTENT_FIELD))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    Repeated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "type")]
pub enum ValueType {
    Text,
    Nested(Box<TypeDefinition>),
}

impl ValueType {
    pub fn nested(&self) -> Option<&TypeDefinition> {
        match self {
            Self::Nested(type_def) => Some(type_def),
            Self::Text => None,
        }
    }
}

/// Child element field of a [`TypeDefinition`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    /// Normalized field name.
    pub name: String,
    /// Raw local element name.
    pub tag: String,
    pub namespace_prefix: Option<String>,
    /// Namespace URI the element was seen in. When set, it is matched instead of resolving
    /// `namespace_prefix` through the parent's bindings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub value_type: ValueType,
    pub cardinality: Cardinality,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            namespace_prefix: None,
            namespace: None,
            value_type,
            cardinality: Cardinality::Single,
        }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = Some(prefix.into());
        self
    }

    pub fn in_namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespace = Some(uri.into());
        self
    }

    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}
