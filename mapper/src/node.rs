//! Helpers over the `roxmltree` node view.

use roxmltree::Node;

pub(crate) fn element_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// Does the element have structure of its own, i.e. attributes or element children?
pub(crate) fn has_structure(node: Node) -> bool {
    node.attributes().next().is_some() || element_children(node).next().is_some()
}

/// True if at least one direct text child contains something other than whitespace.
pub(crate) fn has_meaningful_text(node: Node) -> bool {
    node.children()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .any(|text| !text.trim().is_empty())
}

/// Concatenation of the direct text children, trimmed.
pub(crate) fn direct_text(node: Node) -> String {
    let text: String = node
        .children()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .collect();
    text.trim().to_string()
}

/// Concatenation of all descendant text, in document order.
pub(crate) fn text_content(node: Node) -> String {
    if node.is_text() {
        return node.text().unwrap_or_default().to_string();
    }
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .collect()
}
