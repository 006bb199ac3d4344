//! Schema inference: derive a [`TypeDefinition`] tree from a sample element.

use roxmltree::Node;
use tracing::{debug, trace};

use crate::attribute::AttributeRule;
use crate::namespaces::{element_prefix, NamespaceRegistrations};
use crate::naming::normalize;
use crate::node::{element_children, has_meaningful_text, has_structure};
use crate::type_def::{Cardinality, FieldDefinition, TypeDefinition, ValueType};

/// Infer the type definition of `element` and, recursively, of every child element that has
/// attributes or children of its own.
///
/// Child tags become one field each. A tag seen a second time under the same parent turns its
/// field into a repeated one; the shape of the first occurrence is kept, later occurrences are
/// not compared against it.
pub fn build(element: Node) -> TypeDefinition {
    let type_def = build_in_scope(element, &NamespaceRegistrations::new());
    debug!(
        tag = %type_def.tag,
        attributes = type_def.attribute_fields.len(),
        elements = type_def.element_fields.len(),
        "inferred root type definition"
    );
    type_def
}

fn build_in_scope(element: Node, inherited: &NamespaceRegistrations) -> TypeDefinition {
    let namespaces = inherited.scoped(element);

    let mut type_def = TypeDefinition::new(element.tag_name().name());
    type_def.namespace_prefix = element_prefix(element);

    for attribute in element.attributes() {
        let tag = attribute.name();
        if type_def.attribute_fields.iter().any(|rule| rule.tag() == Some(tag)) {
            continue;
        }
        type_def
            .attribute_fields
            .push(AttributeRule::by_tag(normalize(tag), tag));
    }

    type_def.has_text_content = has_meaningful_text(element);

    for child in element_children(element) {
        let tag = child.tag_name().name();
        let existing = type_def.element_fields.iter_mut().find(|f| f.tag == tag);
        if let Some(field) = existing {
            if field.cardinality == Cardinality::Single {
                trace!(parent = %type_def.tag, %tag, "promoting field to repeated");
            }
            field.cardinality = Cardinality::Repeated;
            continue;
        }

        let value_type = if has_structure(child) {
            ValueType::Nested(Box::new(build_in_scope(child, &namespaces)))
        } else {
            ValueType::Text
        };
        let mut field = FieldDefinition::new(normalize(tag), tag, value_type);
        field.namespace_prefix = element_prefix(child);
        field.namespace = child.tag_name().namespace().map(str::to_string);
        type_def.element_fields.push(field);
    }

    type_def.namespaces = namespaces;
    type_def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeLookup;
    use crate::type_def::CONTENT_FIELD;
    use pretty_assertions::assert_eq;
    use roxmltree::Document;

    fn infer(xml: &str) -> TypeDefinition {
        let doc = Document::parse(xml).unwrap();
        build(doc.root_element())
    }

    fn cardinalities(type_def: &TypeDefinition) -> Vec<(&str, Cardinality)> {
        type_def
            .element_fields
            .iter()
            .map(|f| (f.name.as_str(), f.cardinality))
            .collect()
    }

    #[test]
    fn leaf_children_are_text_fields() {
        let type_def =
            infer("<address><street>Milchstrasse</street><city>Oldenburg</city></address>");
        assert_eq!(type_def.tag, "address");
        assert!(!type_def.has_text_content);
        assert_eq!(
            type_def.element_fields,
            vec![
                FieldDefinition::new("street", "street", ValueType::Text),
                FieldDefinition::new("city", "city", ValueType::Text),
            ]
        );
    }

    #[test]
    fn second_sibling_promotes_to_repeated() {
        let type_def = infer("<items><item>a</item></items>");
        assert_eq!(cardinalities(&type_def), vec![("item", Cardinality::Single)]);

        let type_def = infer("<items><item>a</item><other/><item>b</item><item>c</item></items>");
        assert_eq!(
            cardinalities(&type_def),
            vec![("item", Cardinality::Repeated), ("other", Cardinality::Single)]
        );
    }

    #[test]
    fn attributes_or_children_make_a_nested_type() {
        let type_def = infer(
            r#"<r><a code="x"/><b><c>1</c></b><d>text</d><e/><f><!-- comment --></f></r>"#,
        );
        let kinds: Vec<_> = type_def
            .element_fields
            .iter()
            .map(|f| (f.tag.as_str(), f.value_type.nested().is_some()))
            .collect();
        assert_eq!(
            kinds,
            vec![("a", true), ("b", true), ("d", false), ("e", false), ("f", false)]
        );
    }

    #[test]
    fn text_with_attributes_gets_content() {
        let type_def = infer(r#"<address><country code="de">Germany</country></address>"#);
        let country = type_def.element_field("country").unwrap();
        let country = country.value_type.nested().unwrap();
        assert!(country.has_text_content);
        assert_eq!(
            country.attribute_fields,
            vec![AttributeRule::by_tag("code", "code")]
        );
        assert_eq!(
            country.field_names().collect::<Vec<_>>(),
            vec!["code", CONTENT_FIELD]
        );
    }

    #[test]
    fn whitespace_is_not_content() {
        let type_def = infer("<a>\n   <b>x</b>\n</a>");
        assert!(!type_def.has_text_content);
        let type_def = infer("<a/>");
        assert!(!type_def.has_text_content);
        assert!(type_def.element_fields.is_empty());
    }

    #[test]
    fn text_and_children_coexist() {
        let type_def = infer("<p>Hello <b>world</b></p>");
        assert!(type_def.has_text_content);
        assert_eq!(cardinalities(&type_def), vec![("b", Cardinality::Single)]);
    }

    #[test]
    fn field_names_are_normalized() {
        let type_def =
            infer(r#"<foo barBaz="quuz" HTTPMode="x"><my-items/><publishOptions/></foo>"#);
        assert_eq!(
            type_def.field_names().collect::<Vec<_>>(),
            vec!["bar_baz", "http_mode", "my_items", "publish_options"]
        );
        assert_eq!(
            type_def.attribute_fields[0].lookup,
            AttributeLookup::Tag("barBaz".into())
        );
        assert_eq!(type_def.element_fields[1].tag, "publishOptions");
    }

    #[test]
    fn first_occurrence_defines_the_shape() {
        let type_def = infer(
            r#"<list>
                <entry>plain</entry>
                <entry id="2"><name>second</name></entry>
            </list>"#,
        );
        let entry = type_def.element_field("entry").unwrap();
        assert!(entry.is_repeated());
        assert_eq!(entry.value_type, ValueType::Text);

        let type_def = infer(
            r#"<list>
                <entry id="1"><name>first</name></entry>
                <entry><name>second</name><extra>x</extra></entry>
            </list>"#,
        );
        let entry = type_def.element_field("entry").unwrap();
        let entry = entry.value_type.nested().unwrap();
        assert_eq!(entry.field_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn repeated_nested_children() {
        let type_def = infer(
            r#"<items>
                <item><name>one</name><item><name>inner</name></item></item>
                <item><name>two</name></item>
            </items>"#,
        );
        let item = type_def.element_field("item").unwrap();
        assert!(item.is_repeated());
        let inner = item.value_type.nested().unwrap().element_field("item").unwrap();
        assert!(!inner.is_repeated());
        assert!(inner.value_type.nested().is_some());
    }

    #[test]
    fn namespaces_are_recorded_and_inherited() {
        let type_def = infer(
            r#"<a:foo xmlns:a="urn:a" xmlns:b="urn:b">
                <b:bar>Hello</b:bar>
                <b:baz xmlns:a="urn:a2" xmlns:c="urn:c"><c:leaf>1</c:leaf></b:baz>
            </a:foo>"#,
        );
        assert_eq!(type_def.tag, "foo");
        assert_eq!(type_def.namespace_prefix.as_deref(), Some("a"));
        assert_eq!(type_def.namespaces.resolve(Some("a")), Some("urn:a"));
        assert_eq!(type_def.namespaces.resolve(Some("b")), Some("urn:b"));

        let bar = type_def.element_field("bar").unwrap();
        assert_eq!(bar.namespace_prefix.as_deref(), Some("b"));
        assert_eq!(bar.namespace.as_deref(), Some("urn:b"));
        assert_eq!(bar.value_type, ValueType::Text);

        let baz = type_def.element_field("baz").unwrap();
        let baz = baz.value_type.nested().unwrap();
        assert_eq!(baz.namespace_prefix.as_deref(), Some("b"));
        assert_eq!(baz.namespaces.resolve(Some("a")), Some("urn:a2"));
        assert_eq!(baz.namespaces.resolve(Some("b")), Some("urn:b"));
        assert_eq!(baz.namespaces.resolve(Some("c")), Some("urn:c"));
        assert_eq!(
            baz.element_field("leaf").unwrap().namespace_prefix.as_deref(),
            Some("c")
        );
        assert_eq!(type_def.namespaces.resolve(Some("c")), None);
    }

    #[test]
    fn default_namespace_is_registered_without_prefix() {
        let type_def = infer(r#"<feed xmlns="urn:atom"><entry><title>t</title></entry></feed>"#);
        assert_eq!(type_def.namespace_prefix, None);
        assert_eq!(type_def.namespaces.default_namespace(), Some("urn:atom"));
        let entry = type_def.element_field("entry").unwrap();
        assert_eq!(entry.namespace_prefix, None);
        assert_eq!(
            entry.value_type.nested().unwrap().namespaces.default_namespace(),
            Some("urn:atom")
        );
    }

    #[test]
    fn child_namespace_is_taken_from_its_own_scope() {
        let type_def = infer(
            r#"<r xmlns:a="urn:1"><a:x xmlns:a="urn:2">v</a:x><y xmlns="urn:y"/><z/></r>"#,
        );
        let x = type_def.element_field("x").unwrap();
        assert_eq!(x.namespace_prefix.as_deref(), Some("a"));
        assert_eq!(x.namespace.as_deref(), Some("urn:2"));
        assert_eq!(type_def.namespaces.resolve(Some("a")), Some("urn:1"));
        let y = type_def.element_field("y").unwrap();
        assert_eq!(y.namespace_prefix, None);
        assert_eq!(y.namespace.as_deref(), Some("urn:y"));
        assert_eq!(type_def.element_field("z").unwrap().namespace, None);
    }

    #[test]
    fn non_element_nodes_yield_empty_definitions() {
        let doc = Document::parse("<a>text</a>").unwrap();
        let text = doc.root_element().first_child().unwrap();
        let type_def = build(text);
        assert!(type_def.attribute_fields.is_empty());
        assert!(type_def.element_fields.is_empty());
        assert!(!type_def.has_text_content);
    }

    #[test]
    fn type_definitions_can_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeDefinition>();
    }
}
