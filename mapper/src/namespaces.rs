use indexmap::IndexMap;
use roxmltree::Node;
use serde::Serialize;

/// The prefix `xml` is by definition bound to this namespace name.
/// (Namespaces in XML 1.0, §3, Reserved Prefixes and Namespace Names)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const XML_PREFIX: &str = "xml";

/// Key under which the default namespace (`xmlns="..."`) is stored.
const DEFAULT_PREFIX: &str = "";

/// Namespace prefixes and the URIs they are bound to at some point in a document.
///
/// Registrations are inherited down the element tree: [`scoped`](Self::scoped) copies the parent's
/// bindings and adds the ones in scope at the child, so a prefix is only ever rebound from the
/// element that redeclares it downwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceRegistrations {
    bindings: IndexMap<String, String>,
}

impl NamespaceRegistrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` (or the default namespace, for `None`) to `uri`, replacing an earlier binding.
    pub fn register(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        let key = prefix.unwrap_or(DEFAULT_PREFIX);
        if key == XML_PREFIX {
            return;
        }
        self.bindings.insert(key.to_string(), uri.into());
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, prefix: Option<&str>, uri: impl Into<String>) -> Self {
        self.register(prefix, uri);
        self
    }

    /// Look up the URI bound to `prefix`; `None` asks for the default namespace.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some(XML_PREFIX) => Some(XML_NAMESPACE),
            _ => self
                .bindings
                .get(prefix.unwrap_or(DEFAULT_PREFIX))
                .map(String::as_str),
        }
    }

    /// The default namespace, if one is registered.
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve(None)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.bindings.iter().map(|(prefix, uri)| {
            let prefix = (prefix != DEFAULT_PREFIX).then_some(prefix.as_str());
            (prefix, uri.as_str())
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Registrations visible at `node`: everything registered here, plus the namespaces in scope
    /// at the node. Bindings at the node win over inherited ones with the same prefix.
    pub fn scoped(&self, node: Node) -> Self {
        let mut scoped = self.clone();
        for namespace in node.namespaces() {
            scoped.register(namespace.name(), namespace.uri());
        }
        scoped
    }

    /// Layer `overrides` on top of these registrations.
    pub fn merged(&self, overrides: &NamespaceRegistrations) -> Self {
        let mut merged = self.clone();
        for (prefix, uri) in overrides.iter() {
            merged.register(prefix, uri);
        }
        merged
    }
}

/// The prefix bound to the namespace of `element`, if it has one. Unqualified elements and
/// elements in the default namespace have no prefix.
pub fn element_prefix(element: Node) -> Option<String> {
    let uri = element.tag_name().namespace()?;
    element
        .lookup_prefix(uri)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn default_namespace_has_no_prefix() {
        let ns = NamespaceRegistrations::new()
            .with(None, "urn:default")
            .with(Some("a"), "urn:a");
        assert_eq!(ns.default_namespace(), Some("urn:default"));
        assert_eq!(ns.resolve(Some("a")), Some("urn:a"));
        assert_eq!(ns.resolve(Some("b")), None);
        assert_eq!(
            ns.iter().collect::<Vec<_>>(),
            vec![(None, "urn:default"), (Some("a"), "urn:a")]
        );
    }

    #[test]
    fn xml_prefix_is_implicit() {
        let mut ns = NamespaceRegistrations::new();
        ns.register(Some("xml"), "urn:not-xml");
        assert!(ns.is_empty());
        assert_eq!(ns.resolve(Some("xml")), Some(XML_NAMESPACE));
    }

    #[test]
    fn scoped_inherits_and_overrides() {
        let xml = r#"<a:root xmlns:a="urn:a" xmlns:b="urn:b">
            <b:child xmlns:a="urn:other"><leaf/></b:child>
        </a:root>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element();
        let child = root.children().find(|n| n.is_element()).unwrap();

        let at_root = NamespaceRegistrations::new().scoped(root);
        assert_eq!(at_root.resolve(Some("a")), Some("urn:a"));
        assert_eq!(at_root.resolve(Some("b")), Some("urn:b"));

        let at_child = at_root.scoped(child);
        assert_eq!(at_child.resolve(Some("a")), Some("urn:other"));
        assert_eq!(at_child.resolve(Some("b")), Some("urn:b"));
        // the parent's view is untouched
        assert_eq!(at_root.resolve(Some("a")), Some("urn:a"));
    }

    #[test]
    fn merged_prefers_overrides() {
        let base = NamespaceRegistrations::new()
            .with(Some("a"), "urn:a")
            .with(Some("b"), "urn:b");
        let overrides = NamespaceRegistrations::new().with(Some("b"), "urn:x");
        let merged = base.merged(&overrides);
        assert_eq!(merged.resolve(Some("a")), Some("urn:a"));
        assert_eq!(merged.resolve(Some("b")), Some("urn:x"));
    }

    #[test]
    fn element_prefix_follows_namespace() {
        let xml = r#"<a:root xmlns:a="urn:a" xmlns="urn:d"><plain/><a:qualified/></a:root>"#;
        let doc = Document::parse(xml).unwrap();
        let root = doc.root_element();
        let children: Vec<_> = root.children().filter(|n| n.is_element()).collect();
        assert_eq!(element_prefix(root).as_deref(), Some("a"));
        assert_eq!(element_prefix(children[0]), None);
        assert_eq!(element_prefix(children[1]).as_deref(), Some("a"));
    }
}
