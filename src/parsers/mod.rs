//! # Parsers
//!
//! - `html` - HTML parsing, DOM primitives, metadata, serialization
//! - `css` - token-level stylesheet filtering

pub mod css;
pub mod html;

pub use css::drop_media_rules;
pub use html::{parse_html, serialize_document};
