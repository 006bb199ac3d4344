use roxmltree::{Attribute, Node};
use serde::Serialize;

use crate::namespaces::NamespaceRegistrations;
use crate::path::{PathError, PathExpression, PathMatch, PathOptions};
use crate::value::Value;

/// How an attribute field finds its value. Fixed when the field is defined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeLookup {
    /// Direct lookup of the attribute with this local name on the element.
    Tag(String),
    /// Evaluate a path expression relative to the element.
    Path(PathExpression),
}

/// What an [`AttributeRule`] found on a node. Absence is a regular outcome.
pub enum Found<'a, 'input: 'a> {
    Attribute(Option<Attribute<'a, 'input>>),
    Path(Vec<PathMatch<'a, 'input>>),
}

impl<'a, 'input: 'a> Found<'a, 'input> {
    /// The text of the attribute or of the first path match; [`Value::Null`] if nothing was found.
    pub fn into_value(self) -> Value {
        let text = match self {
            Self::Attribute(attribute) => attribute.map(|a| a.value().to_string()),
            Self::Path(matches) => matches.first().map(PathMatch::string_value),
        };
        text.map_or(Value::Null, Value::Text)
    }

    pub fn is_absent(&self) -> bool {
        match self {
            Self::Attribute(attribute) => attribute.is_none(),
            Self::Path(matches) => matches.is_empty(),
        }
    }
}

/// Attribute field of a [`TypeDefinition`](crate::TypeDefinition). The declared type of an
/// attribute field is always text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttributeRule {
    /// Normalized field name.
    pub name: String,
    pub lookup: AttributeLookup,
    /// Text used when the lookup finds nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl AttributeRule {
    pub fn by_tag(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lookup: AttributeLookup::Tag(tag.into()),
            default: None,
        }
    }

    pub fn by_path(name: impl Into<String>, path: &str) -> Result<Self, PathError> {
        Ok(Self {
            name: name.into(),
            lookup: AttributeLookup::Path(PathExpression::parse(path)?),
            default: None,
        })
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// [`Found::into_value`], falling back to the rule's default when nothing was found.
    pub fn value_of(&self, found: Found) -> Value {
        match &self.default {
            Some(default) if found.is_absent() => Value::Text(default.clone()),
            _ => found.into_value(),
        }
    }

    /// The raw attribute name, for rules that look up by name.
    pub fn tag(&self) -> Option<&str> {
        match &self.lookup {
            AttributeLookup::Tag(tag) => Some(tag),
            AttributeLookup::Path(_) => None,
        }
    }

    /// Locate this rule's value on `node` and hand it to `consume`.
    ///
    /// Name lookups match the attribute's local name and ignore `namespaces`; path lookups are
    /// evaluated with `options`.
    pub fn find<'a, 'input: 'a, R>(
        &self,
        node: Node<'a, 'input>,
        _namespaces: &NamespaceRegistrations,
        options: &PathOptions,
        consume: impl FnOnce(Found<'a, 'input>) -> R,
    ) -> R {
        match &self.lookup {
            AttributeLookup::Path(path) => consume(Found::Path(path.evaluate(node, options))),
            AttributeLookup::Tag(tag) => {
                consume(Found::Attribute(node.attributes().find(|a| a.name() == tag.as_str())))
            }
        }
    }
}
