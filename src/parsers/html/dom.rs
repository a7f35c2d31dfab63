use std::rc::Rc;

use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, StrTendril, TendrilSink};
use html5ever::tree_builder::create_element;
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use crate::core::WcagError;

/// Parse an HTML string into a DOM
pub fn parse_html(html: &str) -> Result<RcDom, WcagError> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| WcagError::Parse(e.to_string()))
}

/// Parse a markup fragment and return its top-level nodes, detached
///
/// The fragment is parsed as the body of a throwaway document so that
/// foreign content such as `<math>` ends up in the right namespace.
pub fn parse_fragment_nodes(markup: &str) -> Result<Vec<Handle>, WcagError> {
    let wrapper = format!("<!DOCTYPE html><html><head></head><body>{markup}</body></html>");
    let dom = parse_html(&wrapper)?;

    let body = match find_path(&dom.document, &["html", "body"]).first() {
        Some(body) => body.clone(),
        None => return Err(WcagError::Parse("fragment has no body".to_string())),
    };

    let nodes: Vec<Handle> = body.children.borrow().iter().cloned().collect();
    for node in &nodes {
        detach(node);
    }

    Ok(nodes)
}

/// Elements reached by walking `path` through direct children of `root`
///
/// `find_path(&dom.document, &["html", "head", "meta"])` yields every
/// `<meta>` in the head. An empty path yields `root` itself.
pub fn find_path(root: &Handle, path: &[&str]) -> Vec<Handle> {
    path.iter().fold(vec![root.clone()], |level, name| {
        level
            .iter()
            .flat_map(element_children)
            .filter(|child| is_element(child, name))
            .collect()
    })
}

/// All descendant elements (excluding `root`) whose name is in `names`, in document order
pub fn find_elements(root: &Handle, names: &[&str]) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_elements(root, &|node| names.iter().any(|n| is_element(node, n)), &mut found);
    found
}

/// All descendant elements (excluding `root`) matching a predicate, in document order
pub fn find_elements_where<F>(root: &Handle, predicate: F) -> Vec<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut found = Vec::new();
    collect_elements(root, &predicate, &mut found);
    found
}

fn collect_elements<F>(node: &Handle, predicate: &F, found: &mut Vec<Handle>)
where
    F: Fn(&Handle) -> bool,
{
    for child in node.children.borrow().iter() {
        if matches!(child.data, NodeData::Element { .. }) && predicate(child) {
            found.push(child.clone());
        }
        collect_elements(child, predicate, found);
    }
}

/// First descendant element whose name is in `names`
pub fn find_first_element(root: &Handle, names: &[&str]) -> Option<Handle> {
    for child in root.children.borrow().iter() {
        if names.iter().any(|n| is_element(child, n)) {
            return Some(child.clone());
        }
        if let Some(found) = find_first_element(child, names) {
            return Some(found);
        }
    }
    None
}

/// All descendant text nodes, in document order
pub fn find_text_nodes(root: &Handle) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_text_nodes(root, &mut found);
    found
}

fn collect_text_nodes(node: &Handle, found: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if let NodeData::Text { .. } = child.data {
            found.push(child.clone());
        } else {
            collect_text_nodes(child, found);
        }
    }
}

/// First direct child element called `name`
pub fn child_element(parent: &Handle, name: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| is_element(child, name))
        .cloned()
}

pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let attrs = attrs.borrow();
    attrs
        .iter()
        .find(|attr| &*attr.name.local == attr_name)
        .map(|attr| attr.value.to_string())
}

/// Local name of an element node
pub fn get_node_name(node: &Handle) -> Option<&str> {
    if let NodeData::Element { name, .. } = &node.data {
        Some(&*name.local)
    } else {
        None
    }
}

pub fn is_element(node: &Handle, name: &str) -> bool {
    get_node_name(node) == Some(name)
}

/// Get the parent node, leaving the child's parent link intact
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// Whether any ancestor of `node` satisfies the predicate
pub fn has_ancestor_where<F>(node: &Handle, predicate: F) -> bool
where
    F: Fn(&Handle) -> bool,
{
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        if predicate(&parent) {
            return true;
        }
        current = get_parent_node(&parent);
    }
    false
}

/// Whether any ancestor of `node` is an element named in `names`
pub fn has_ancestor(node: &Handle, names: &[&str]) -> bool {
    has_ancestor_where(node, |parent| names.iter().any(|n| is_element(parent, n)))
}

/// Set (or remove, when `attr_value` is `None`) an attribute
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    let NodeData::Element { attrs, .. } = &node.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();
    let position = attrs.iter().position(|attr| &*attr.name.local == attr_name);

    match (position, attr_value) {
        (Some(index), Some(value)) => attrs[index].value = StrTendril::from_slice(&value),
        (Some(_), None) => attrs.retain(|attr| &*attr.name.local != attr_name),
        (None, Some(value)) => attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(attr_name)),
            value: StrTendril::from_slice(&value),
        }),
        (None, None) => {}
    }
}

/// Whether the element's `class` attribute contains `class_name`
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

pub fn add_class(node: &Handle, class_name: &str) {
    if has_class(node, class_name) {
        return;
    }
    let classes = match get_node_attr(node, "class") {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{} {}", existing.trim(), class_name)
        }
        _ => class_name.to_string(),
    };
    set_node_attr(node, "class", Some(classes));
}

/// Create a detached HTML element
pub fn create_element_node(dom: &RcDom, element_name: &str, attributes: &[(&str, &str)]) -> Handle {
    create_element(
        dom,
        QualName::new(None, ns!(html), LocalName::from(element_name)),
        attributes
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: format_tendril!("{}", value),
            })
            .collect(),
    )
}

/// Create a detached text node
pub fn create_text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: std::cell::RefCell::new(StrTendril::from_slice(text)),
    })
}

/// Text of a text node, `None` for anything else
pub fn node_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// Concatenated text of all descendant text nodes
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    append_text(node, &mut text);
    text
}

fn append_text(node: &Handle, text: &mut String) {
    match &node.data {
        NodeData::Text { contents } => text.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                append_text(child, text);
            }
        }
    }
}

pub fn is_whitespace_text(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => contents.borrow().trim().is_empty(),
        _ => false,
    }
}

/// Remove a node from its parent
pub fn detach(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

pub fn append_child(parent: &Handle, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

/// Insert `child` at `index` among `parent`'s children (clamped to the end)
pub fn insert_child(parent: &Handle, index: usize, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    let mut children = parent.children.borrow_mut();
    let index = index.min(children.len());
    children.insert(index, child.clone());
}

/// Insert `new_node` immediately before `reference`
pub fn insert_before(reference: &Handle, new_node: &Handle) {
    if Rc::ptr_eq(reference, new_node) {
        return;
    }
    detach(new_node);
    if let Some(parent) = get_parent_node(reference) {
        if let Some(index) = child_index(reference) {
            insert_child(&parent, index, new_node);
        }
    }
}

/// Position of `node` among its parent's children
pub fn child_index(node: &Handle) -> Option<usize> {
    let parent = get_parent_node(node)?;
    let children = parent.children.borrow();
    children.iter().position(|child| Rc::ptr_eq(child, node))
}

/// Replace `old` with `new_node` in the tree
pub fn replace_node(old: &Handle, new_node: &Handle) {
    insert_before(old, new_node);
    detach(old);
}

/// Replace all children with a single text node
pub fn set_text_content(node: &Handle, text: &str) {
    let children: Vec<Handle> = node.children.borrow().iter().cloned().collect();
    for child in &children {
        detach(child);
    }
    append_child(node, &create_text_node(text));
}

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// Siblings following `node`, in order
pub fn following_siblings(node: &Handle) -> Vec<Handle> {
    let parent = match get_parent_node(node) {
        Some(parent) => parent,
        None => return Vec::new(),
    };
    let children = parent.children.borrow();
    match children.iter().position(|child| Rc::ptr_eq(child, node)) {
        Some(index) => children[index + 1..].to_vec(),
        None => Vec::new(),
    }
}

pub fn previous_element_sibling(node: &Handle) -> Option<Handle> {
    let parent = get_parent_node(node)?;
    let children = parent.children.borrow();
    let index = children.iter().position(|child| Rc::ptr_eq(child, node))?;
    children[..index]
        .iter()
        .rev()
        .find(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
}

/// Heading level for `h1`..`h6`
pub fn heading_level(node: &Handle) -> Option<u8> {
    match get_node_name(node)? {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Every `id` attribute value in the subtree
pub fn collect_ids(root: &Handle) -> Vec<String> {
    find_elements_where(root, |node| get_node_attr(node, "id").is_some())
        .iter()
        .filter_map(|node| get_node_attr(node, "id"))
        .collect()
}
