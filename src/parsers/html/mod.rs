//! HTML parsing and tree manipulation
//!
//! - `dom`: parsing plus node navigation and mutation primitives
//! - `metadata`: document skeleton and `<head>` metadata
//! - `serializer`: DOM back to an HTML string

pub mod dom;
pub mod metadata;
pub mod serializer;

pub use dom::{
    add_class, append_child, child_element, child_index, collect_ids, create_element_node,
    create_text_node, detach, element_children, find_elements, find_elements_where,
    find_first_element, find_path, find_text_nodes, following_siblings, get_node_attr,
    get_node_name, get_parent_node, has_ancestor, has_ancestor_where, has_class, heading_level,
    insert_before, insert_child, is_element, is_whitespace_text, node_text, parse_fragment_nodes,
    parse_html, previous_element_sibling, replace_node, set_node_attr, set_text_content,
    text_content,
};
pub use metadata::{
    document_body, document_head, document_html, ensure_head, get_document_lang, get_meta,
    get_title, has_charset, set_charset, set_document_lang, set_meta, set_title,
};
pub use serializer::{serialize_document, serialize_node};
