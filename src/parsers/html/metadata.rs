//! Document metadata handling
//!
//! Accessors for the document skeleton (`<html>`, `<head>`, `<body>`) and
//! helpers for the head metadata the enhancer maintains:
//! - document title
//! - charset and viewport declarations
//! - named `<meta>` tags (author, description, keywords)
//! - the root `lang` attribute

use markup5ever_rcdom::{Handle, RcDom};

use super::dom::{
    append_child, child_element, create_element_node, find_path, get_node_attr,
    insert_child, set_node_attr, set_text_content, text_content,
};

/// The `<html>` element
pub fn document_html(dom: &RcDom) -> Option<Handle> {
    child_element(&dom.document, "html")
}

/// The `<head>` element
pub fn document_head(dom: &RcDom) -> Option<Handle> {
    document_html(dom).and_then(|html| child_element(&html, "head"))
}

/// The `<body>` element
pub fn document_body(dom: &RcDom) -> Option<Handle> {
    document_html(dom).and_then(|html| child_element(&html, "body"))
}

/// Get the `<head>` element, creating it as the first child of `<html>` when missing
pub fn ensure_head(dom: &RcDom) -> Option<Handle> {
    if let Some(head) = document_head(dom) {
        return Some(head);
    }

    let html = document_html(dom)?;
    let head = create_element_node(dom, "head", &[]);
    insert_child(&html, 0, &head);
    Some(head)
}

/// Get the document title
///
/// # Arguments
///
/// * `node` - document root handle
///
/// # Returns
///
/// * `Some(String)` - text of the first `<title>` in `<head>`
/// * `None` - no title element
///
/// # Examples
///
/// ```ignore
/// // for a document containing <title>Paper</title>
/// assert_eq!(get_title(&dom.document), Some("Paper".to_string()));
/// ```
pub fn get_title(node: &Handle) -> Option<String> {
    find_path(node, &["html", "head", "title"])
        .first()
        .map(text_content)
}

/// Set the document title, creating `<title>` when missing
pub fn set_title(dom: &RcDom, title: &str) {
    if let Some(title_node) = find_path(&dom.document, &["html", "head", "title"]).first() {
        set_text_content(title_node, title);
        return;
    }

    if let Some(head) = ensure_head(dom) {
        let title_node = create_element_node(dom, "title", &[]);
        set_text_content(&title_node, title);
        append_child(&head, &title_node);
    }
}

/// Whether `<head>` declares a character encoding
pub fn has_charset(dom: &RcDom) -> bool {
    find_path(&dom.document, &["html", "head", "meta"])
        .iter()
        .any(|meta| {
            get_node_attr(meta, "charset").is_some()
                || get_node_attr(meta, "http-equiv")
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("content-type")
        })
}

/// Prepend a `<meta charset>` declaration to `<head>`
pub fn set_charset(dom: &RcDom, charset: &str) {
    if let Some(head) = ensure_head(dom) {
        let meta = create_element_node(dom, "meta", &[("charset", charset)]);
        insert_child(&head, 0, &meta);
    }
}

/// Content of `<meta name="...">`
pub fn get_meta(dom: &RcDom, meta_name: &str) -> Option<String> {
    find_path(&dom.document, &["html", "head", "meta"])
        .iter()
        .find(|meta| {
            get_node_attr(meta, "name")
                .map(|name| name.eq_ignore_ascii_case(meta_name))
                .unwrap_or(false)
        })
        .and_then(|meta| get_node_attr(meta, "content"))
}

/// Create or update `<meta name="..." content="...">`
pub fn set_meta(dom: &RcDom, meta_name: &str, content: &str) {
    let existing = find_path(&dom.document, &["html", "head", "meta"])
        .into_iter()
        .find(|meta| {
            get_node_attr(meta, "name")
                .map(|name| name.eq_ignore_ascii_case(meta_name))
                .unwrap_or(false)
        });

    match existing {
        Some(meta) => set_node_attr(&meta, "content", Some(content.to_string())),
        None => {
            if let Some(head) = ensure_head(dom) {
                let meta =
                    create_element_node(dom, "meta", &[("name", meta_name), ("content", content)]);
                append_child(&head, &meta);
            }
        }
    }
}

/// Root `lang` attribute, if any
pub fn get_document_lang(dom: &RcDom) -> Option<String> {
    document_html(dom).and_then(|html| get_node_attr(&html, "lang"))
}

pub fn set_document_lang(dom: &RcDom, lang: &str) {
    if let Some(html) = document_html(dom) {
        set_node_attr(&html, "lang", Some(lang.to_string()));
    }
}
