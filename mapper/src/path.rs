//! Abbreviated location paths (`a/b`, `//item`, `@href`, `../x:title`, `text()`), evaluated
//! directly over a `roxmltree` document.

use std::collections::HashSet;
use std::fmt;

use roxmltree::{Attribute, Node, NodeId};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::namespaces::NamespaceRegistrations;
use crate::node::text_content;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,
    #[error("unsupported step {step:?} in path expression {expression:?}")]
    InvalidStep { step: String, expression: String },
    #[error("path expression {0:?} ends with a separator")]
    TrailingSeparator(String),
}

/// Evaluation context for path expressions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Bindings used to resolve prefixed name tests.
    pub namespaces: NamespaceRegistrations,
}

impl PathOptions {
    pub fn with_namespaces(namespaces: NamespaceRegistrations) -> Self {
        Self { namespaces }
    }

    /// These options with `base` underneath; bindings already present here take precedence.
    pub fn layered_over(&self, base: &NamespaceRegistrations) -> Self {
        Self {
            namespaces: base.merged(&self.namespaces),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Anchor {
    Context,
    Document,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
    Parent,
    SelfNode,
    Attribute,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum NodeTest {
    Name {
        prefix: Option<String>,
        local: String,
    },
    Wildcard,
    Text,
    AnyNode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
}

impl Step {
    const fn descendant_or_self() -> Self {
        Self {
            axis: Axis::DescendantOrSelf,
            test: NodeTest::AnyNode,
        }
    }

    fn parse(token: &str, expression: &str) -> Result<Self, PathError> {
        let invalid = || PathError::InvalidStep {
            step: token.to_string(),
            expression: expression.to_string(),
        };
        let (axis, test) = match token {
            "." => (Axis::SelfNode, NodeTest::AnyNode),
            ".." => (Axis::Parent, NodeTest::AnyNode),
            "*" => (Axis::Child, NodeTest::Wildcard),
            "text()" => (Axis::Child, NodeTest::Text),
            "node()" => (Axis::Child, NodeTest::AnyNode),
            "@*" => (Axis::Attribute, NodeTest::Wildcard),
            _ => match token.strip_prefix('@') {
                Some(name) => (Axis::Attribute, name_test(name).ok_or_else(invalid)?),
                None => (Axis::Child, name_test(token).ok_or_else(invalid)?),
            },
        };
        Ok(Self { axis, test })
    }
}

fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn name_test(name: &str) -> Option<NodeTest> {
    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    };
    if !is_ncname(local) || !prefix.map_or(true, is_ncname) {
        return None;
    }
    Some(NodeTest::Name {
        prefix: prefix.map(str::to_string),
        local: local.to_string(),
    })
}

/// A single result of evaluating a [`PathExpression`].
#[derive(Copy, Clone, Debug)]
pub enum PathMatch<'a, 'input: 'a> {
    Node(Node<'a, 'input>),
    Attribute(Attribute<'a, 'input>),
}

impl<'a, 'input: 'a> PathMatch<'a, 'input> {
    /// The attribute's value, or the node's text content.
    pub fn string_value(&self) -> String {
        match self {
            Self::Node(node) => text_content(*node),
            Self::Attribute(attribute) => attribute.value().to_string(),
        }
    }

    pub fn node(&self) -> Option<Node<'a, 'input>> {
        match self {
            Self::Node(node) => Some(*node),
            Self::Attribute(_) => None,
        }
    }
}

/// A parsed path expression.
///
/// The supported subset: an optional leading `/` or `//`, then steps separated by `/` or `//`,
/// where each step is `.`, `..`, `*`, `name`, `prefix:name`, `@name`, `@prefix:name`, `@*`,
/// `text()` or `node()`. A lone `/` selects the document root. Predicates and function calls are
/// rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathExpression {
    source: String,
    anchor: Anchor,
    steps: Vec<Step>,
}

impl PathExpression {
    pub fn parse(source: &str) -> Result<Self, PathError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let mut steps = Vec::new();
        let (anchor, mut rest) = if let Some(rest) = trimmed.strip_prefix("//") {
            steps.push(Step::descendant_or_self());
            (Anchor::Document, rest)
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            if rest.is_empty() {
                return Ok(Self {
                    source: trimmed.to_string(),
                    anchor: Anchor::Document,
                    steps,
                });
            }
            (Anchor::Document, rest)
        } else {
            (Anchor::Context, trimmed)
        };

        loop {
            let end = rest.find('/').unwrap_or(rest.len());
            let (token, tail) = rest.split_at(end);
            steps.push(Step::parse(token, trimmed)?);
            if tail.is_empty() {
                break;
            }
            rest = match tail.strip_prefix("//") {
                Some(after) => {
                    steps.push(Step::descendant_or_self());
                    after
                }
                None => &tail[1..],
            };
            if rest.is_empty() {
                return Err(PathError::TrailingSeparator(trimmed.to_string()));
            }
        }

        Ok(Self {
            source: trimmed.to_string(),
            anchor,
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn unbound_prefixes<'s>(&'s self, options: &PathOptions) -> Vec<&'s str> {
        self.steps
            .iter()
            .filter_map(|step| match &step.test {
                NodeTest::Name {
                    prefix: Some(prefix),
                    ..
                } if options.namespaces.resolve(Some(prefix.as_str())).is_none() => {
                    Some(prefix.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Evaluate against `context`. Results are deduplicated and otherwise kept in the order they
    /// were reached.
    pub fn evaluate<'a, 'input: 'a>(
        &self,
        context: Node<'a, 'input>,
        options: &PathOptions,
    ) -> Vec<PathMatch<'a, 'input>> {
        let unbound = self.unbound_prefixes(options);
        if !unbound.is_empty() {
            warn!(
                expression = %self.source,
                prefixes = ?unbound,
                "unbound namespace prefix in path"
            );
            return Vec::new();
        }

        let start = match self.anchor {
            Anchor::Context => context,
            Anchor::Document => context.document().root(),
        };
        let mut current = vec![PathMatch::Node(start)];
        for step in &self.steps {
            let mut seen = HashSet::<NodeId>::new();
            let mut next = Vec::new();
            for item in &current {
                match item {
                    PathMatch::Node(node) => {
                        for found in step.apply(*node, options) {
                            let fresh = match found {
                                PathMatch::Node(n) => seen.insert(n.id()),
                                PathMatch::Attribute(_) => true,
                            };
                            if fresh {
                                next.push(found);
                            }
                        }
                    }
                    PathMatch::Attribute(_) if step.axis == Axis::SelfNode => next.push(*item),
                    PathMatch::Attribute(_) => {}
                }
            }
            current = next;
        }
        current
    }
}

impl Step {
    fn apply<'a, 'input: 'a>(
        &self,
        node: Node<'a, 'input>,
        options: &PathOptions,
    ) -> Vec<PathMatch<'a, 'input>> {
        let matches_node = |n: &Node| self.test.matches_node(*n, options);
        match self.axis {
            Axis::Child => node
                .children()
                .filter(matches_node)
                .map(PathMatch::Node)
                .collect(),
            Axis::DescendantOrSelf => node
                .descendants()
                .filter(matches_node)
                .map(PathMatch::Node)
                .collect(),
            Axis::Parent => node
                .parent()
                .filter(matches_node)
                .map(PathMatch::Node)
                .into_iter()
                .collect(),
            Axis::SelfNode => Some(node)
                .filter(matches_node)
                .map(PathMatch::Node)
                .into_iter()
                .collect(),
            Axis::Attribute => node
                .attributes()
                .filter(|attribute| self.test.matches_attribute(attribute, options))
                .map(PathMatch::Attribute)
                .collect(),
        }
    }
}

impl NodeTest {
    fn matches_name(
        &self,
        local: &str,
        namespace: Option<&str>,
        options: &PathOptions,
    ) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Name {
                prefix,
                local: expected,
            } => {
                if local != expected.as_str() {
                    return false;
                }
                match prefix {
                    Some(prefix) => {
                        let uri = options.namespaces.resolve(Some(prefix.as_str()));
                        uri.is_some() && uri == namespace
                    }
                    None => true,
                }
            }
            Self::Text | Self::AnyNode => false,
        }
    }

    fn matches_node(&self, node: Node, options: &PathOptions) -> bool {
        match self {
            Self::AnyNode => true,
            Self::Text => node.is_text(),
            Self::Wildcard | Self::Name { .. } => {
                node.is_element()
                    && self.matches_name(
                        node.tag_name().name(),
                        node.tag_name().namespace(),
                        options,
                    )
            }
        }
    }

    fn matches_attribute(&self, attribute: &Attribute, options: &PathOptions) -> bool {
        self.matches_name(attribute.name(), attribute.namespace(), options)
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for PathExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}
