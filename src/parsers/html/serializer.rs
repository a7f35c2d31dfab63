use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

use crate::core::WcagError;

/// Serialize a DOM back into an HTML string
///
/// The output always starts with an HTML5 doctype, even if the parsed
/// input had none.
pub fn serialize_document(dom: RcDom) -> Result<String, WcagError> {
    let html = serialize_node(&dom.document)?;

    if html.trim_start().to_ascii_lowercase().starts_with("<!doctype") {
        Ok(html)
    } else {
        Ok(format!("<!DOCTYPE html>{html}"))
    }
}

/// Serialize the children of a node without consuming the DOM
pub fn serialize_node(node: &Handle) -> Result<String, WcagError> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = node.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())
        .map_err(|e| WcagError::Serialization(e.to_string()))?;

    Ok(String::from_utf8_lossy(&buf).to_string())
}
