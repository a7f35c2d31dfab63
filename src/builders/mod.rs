//! # Builders
//!
//! Turn extracted document structure into semantic HTML that the enhancer
//! can take from there.
//!
//! - `html_builder` - block classification for raw text and HTML rendering

pub mod html_builder;

pub use html_builder::{build_html, structure_raw_text, BlockType, DocumentStructure, TextBlock};
