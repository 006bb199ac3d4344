//! Schema-driven extraction: walk a document guided by a [`TypeDefinition`] and build [`Object`]s.

use std::fmt;

use roxmltree::{Document, Node};
use tracing::{debug, trace, warn};

use crate::error::MapperError;
use crate::namespaces::NamespaceRegistrations;
use crate::node::{direct_text, element_children, text_content};
use crate::path::PathOptions;
use crate::type_def::{Cardinality, FieldDefinition, TypeDefinition, ValueType, CONTENT_FIELD};
use crate::value::{Object, Value};
use crate::MapperOptions;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultMode {
    /// Only the first matching element.
    Single,
    /// Every matching element, in document order.
    Collection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    Single(Option<Object>),
    Collection(Vec<Object>),
}

impl Extraction {
    pub fn into_single(self) -> Option<Object> {
        match self {
            Self::Single(object) => object,
            Self::Collection(objects) => objects.into_iter().next(),
        }
    }

    pub fn into_collection(self) -> Vec<Object> {
        match self {
            Self::Single(object) => object.into_iter().collect(),
            Self::Collection(objects) => objects,
        }
    }
}

type AfterParse = Box<dyn Fn(&Object) + Send + Sync>;

/// Populates objects from elements according to a [`TypeDefinition`].
///
/// Callbacks registered with [`after_parse`](Self::after_parse) run for every object right after
/// it has been populated, nested objects before their parent.
#[derive(Default)]
pub struct Extractor {
    path_options: PathOptions,
    after_parse: Vec<AfterParse>,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("path_options", &self.path_options)
            .field("after_parse", &self.after_parse.len())
            .finish()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for path-based attribute rules. Their namespace bindings are layered over the
    /// bindings recorded in each type definition.
    pub fn with_path_options(mut self, options: PathOptions) -> Self {
        self.path_options = options;
        self
    }

    pub fn after_parse(mut self, callback: impl Fn(&Object) + Send + Sync + 'static) -> Self {
        self.after_parse.push(Box::new(callback));
        self
    }

    /// Parse `xml` and extract from it.
    pub fn parse(
        &self,
        type_def: &TypeDefinition,
        xml: &str,
        options: &MapperOptions,
        mode: ResultMode,
    ) -> Result<Extraction, MapperError> {
        let document = Document::parse_with_options(xml, options.parsing_options())?;
        Ok(self.extract(type_def, &document, mode))
    }

    /// Extract every element of `document` matching the type definition's tag and namespace.
    pub fn extract(
        &self,
        type_def: &TypeDefinition,
        document: &Document,
        mode: ResultMode,
    ) -> Extraction {
        let mut candidates = document.root().descendants().filter(|node| {
            matches_element(
                *node,
                &type_def.tag,
                type_def.namespace_prefix.as_deref(),
                &type_def.namespaces,
            )
        });
        let extraction = match mode {
            ResultMode::Single => {
                Extraction::Single(candidates.next().map(|node| self.extract_node(type_def, node)))
            }
            ResultMode::Collection => Extraction::Collection(
                candidates
                    .map(|node| self.extract_node(type_def, node))
                    .collect(),
            ),
        };
        debug!(tag = %type_def.tag, ?mode, "extracted from document");
        extraction
    }

    /// Populate an object from `node`, which is assumed to match `type_def`.
    pub fn extract_node(&self, type_def: &TypeDefinition, node: Node) -> Object {
        let options = self.path_options.layered_over(&type_def.namespaces);
        let mut object = Object::new(type_def.tag.as_str());

        for rule in &type_def.attribute_fields {
            let value = rule.find(node, &type_def.namespaces, &options, |found| {
                if found.is_absent() {
                    trace!(tag = %type_def.tag, field = %rule.name, "attribute not found");
                }
                rule.value_of(found)
            });
            object.insert(rule.name.as_str(), value);
        }

        for field in &type_def.element_fields {
            let value = self.element_value(type_def, field, node);
            object.insert(field.name.as_str(), value);
        }

        if type_def.has_text_content {
            object.insert(CONTENT_FIELD, Value::Text(direct_text(node)));
        }

        for callback in &self.after_parse {
            callback(&object);
        }
        object
    }

    fn element_value(&self, parent: &TypeDefinition, field: &FieldDefinition, node: Node) -> Value {
        let mut matching = element_children(node).filter(|child| match &field.namespace {
            Some(uri) => {
                child.tag_name().name() == field.tag
                    && child.tag_name().namespace() == Some(uri.as_str())
            }
            None => matches_element(
                *child,
                &field.tag,
                field.namespace_prefix.as_deref(),
                &parent.namespaces,
            ),
        });
        match field.cardinality {
            Cardinality::Single => match matching.next() {
                Some(child) => self.child_value(field, child),
                None => {
                    trace!(tag = %parent.tag, field = %field.name, "element not found");
                    Value::Null
                }
            },
            Cardinality::Repeated => {
                Value::List(matching.map(|child| self.child_value(field, child)).collect())
            }
        }
    }

    fn child_value(&self, field: &FieldDefinition, child: Node) -> Value {
        match &field.value_type {
            ValueType::Text => Value::Text(text_content(child)),
            ValueType::Nested(type_def) => Value::Object(self.extract_node(type_def, child)),
        }
    }
}

/// Does `node` have the local name `tag` and sit in the namespace `prefix` stands for?
///
/// Without a prefix the element may be unqualified or in the default namespace. A prefix that is
/// not registered is reported and matched by local name alone.
fn matches_element(
    node: Node,
    tag: &str,
    prefix: Option<&str>,
    namespaces: &NamespaceRegistrations,
) -> bool {
    if !node.is_element() || node.tag_name().name() != tag {
        return false;
    }
    let namespace = node.tag_name().namespace();
    match prefix {
        Some(prefix) => match namespaces.resolve(Some(prefix)) {
            Some(uri) => namespace == Some(uri),
            None => {
                warn!(%prefix, %tag, "namespace prefix is not registered");
                true
            }
        },
        None => namespace.is_none() || namespace == namespaces.default_namespace(),
    }
}
