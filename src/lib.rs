//! # wcagify
//!
//! Turns HTML extracted from PDF documents into WCAG 2.2 AA accessible HTML
//! and audits HTML against the same rules.
//!
//! ## Modules
//!
//! - `core` - error type and top-level entry points
//! - `enhancer` - the phase pipeline that rewrites a document
//! - `validator` - rule checks producing a `ValidationReport`
//! - `report` - issues, severities and report rendering
//! - `heuristics` - structure recovery from flattened extracted text
//! - `builders` - semantic HTML from extracted document structure
//! - `math` - math detection and MathML conversion
//! - `alt_text` - alt text providers for images
//! - `parsers` - HTML and CSS plumbing
//! - `env` - typed environment variables
//! - `utils` - small shared helpers

mod utils;

pub mod alt_text;
pub mod builders;
pub mod core;
pub mod enhancer;
pub mod env;
pub mod heuristics;
pub mod math;
pub mod parsers;
pub mod report;
pub mod validator;

pub use crate::core::{convert_text, enhance_html, validate_html, WcagError};
pub use alt_text::{AltTextProvider, AltTextResult, CaptionAltTextProvider};
pub use builders::{build_html, structure_raw_text, BlockType, DocumentStructure, TextBlock};
pub use enhancer::{EnhancementReport, Enhancer, Phase, PhaseOutcome, WcagOptions};
pub use math::{MathConverter, MathDetector, PatternMathConverter};
pub use report::{Severity, ValidationReport, WcagIssue};
pub use utils::create_data_url;
pub use validator::Validator;
