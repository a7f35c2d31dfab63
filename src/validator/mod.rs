//! WCAG validator
//!
//! Independent auditor for finished HTML. The validator knows nothing about
//! the enhancer: it parses whatever markup it is given and runs a fixed
//! battery of checks over the tree (and, for CSS rules, over the
//! stylesheet text found in the tree).
//!
//! # Architecture
//!
//! - `Check` defines one family of rules
//! - the concrete checks live in `checks`
//! - `CheckRegistry` owns the checks and isolates their failures
//!
//! ```rust
//! use wcagify::validator::Validator;
//!
//! let report = Validator::new(false)
//!     .validate("<html><body><h1>T</h1><img src=\"a.png\"></body></html>")
//!     .unwrap();
//! assert!(!report.wcag_aa_compliant);
//! ```

pub mod checks;

use std::path::Path;

use markup5ever_rcdom::RcDom;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{read_document, WcagError};
use crate::parsers::html::{find_elements, find_elements_where, get_node_attr, parse_html, text_content};
use crate::report::{ValidationReport, WcagIssue};

pub use checks::*;

/// Failure inside a single check
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Unexpected document shape: {0}")]
    Document(String),

    #[error("Check failed: {0}")]
    Internal(String),
}

/// Everything a check may look at
pub struct CheckContext<'a> {
    pub dom: &'a RcDom,
    /// The markup exactly as handed to the validator
    pub raw_html: &'a str,
    /// `<style>` contents followed by `style` attribute values
    pub stylesheet: String,
}

impl<'a> CheckContext<'a> {
    pub fn new(dom: &'a RcDom, raw_html: &'a str) -> Self {
        let mut stylesheet = String::new();

        for style in find_elements(&dom.document, &["style"]) {
            stylesheet.push_str(&text_content(&style));
            stylesheet.push('\n');
        }
        for node in find_elements_where(&dom.document, |node| get_node_attr(node, "style").is_some()) {
            if let Some(inline) = get_node_attr(&node, "style") {
                stylesheet.push_str(&inline);
                stylesheet.push('\n');
            }
        }

        CheckContext {
            dom,
            raw_html,
            stylesheet,
        }
    }
}

/// One family of accessibility rules
pub trait Check {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Inspect the document and return every violation found
    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError>;
}

/// Ordered collection of checks
///
/// Checks are independent of each other; a check that fails is logged and
/// contributes no issues while the rest still run.
pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
}

impl CheckRegistry {
    /// Registry with every built-in check
    pub fn new() -> Self {
        let mut registry = CheckRegistry::empty();

        registry.register(Box::new(LanguageCheck));
        registry.register(Box::new(TitleCheck));
        registry.register(Box::new(ImageCheck));
        registry.register(Box::new(HeadingCheck));
        registry.register(Box::new(LinkCheck));
        registry.register(Box::new(FormCheck));
        registry.register(Box::new(TableCheck));
        registry.register(Box::new(LandmarkCheck));
        registry.register(Box::new(SkipLinkCheck));
        registry.register(Box::new(FocusIndicatorCheck));
        registry.register(Box::new(FocusNotObscuredCheck));
        registry.register(Box::new(FocusAppearanceCheck));
        registry.register(Box::new(TargetSizeCheck));

        registry
    }

    pub fn empty() -> Self {
        CheckRegistry { checks: Vec::new() }
    }

    pub fn register(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check, in registration order
    pub fn run_all(&self, context: &CheckContext) -> Vec<WcagIssue> {
        let mut issues = Vec::new();

        for check in &self.checks {
            match check.run(context) {
                Ok(found) => {
                    debug!(check = check.name(), issues = found.len(), "check finished");
                    issues.extend(found);
                }
                Err(e) => {
                    warn!(check = check.name(), error = %e, "check failed, skipping");
                }
            }
        }

        issues
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule-based WCAG 2.2 AA auditor
pub struct Validator {
    strict_mode: bool,
    registry: CheckRegistry,
}

impl Validator {
    /// In strict mode high severity issues also break compliance
    pub fn new(strict_mode: bool) -> Self {
        Validator {
            strict_mode,
            registry: CheckRegistry::new(),
        }
    }

    pub fn with_registry(strict_mode: bool, registry: CheckRegistry) -> Self {
        Validator {
            strict_mode,
            registry,
        }
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Validate an HTML string, reported as `inline`
    pub fn validate(&self, html: &str) -> Result<ValidationReport, WcagError> {
        self.validate_named(html, "inline")
    }

    /// Validate an HTML string, reporting it under `file_path`
    pub fn validate_named(&self, html: &str, file_path: &str) -> Result<ValidationReport, WcagError> {
        let dom = parse_html(html)?;
        let context = CheckContext::new(&dom, html);

        let issues = self.registry.run_all(&context);
        let report = ValidationReport::from_issues(file_path, issues, self.strict_mode);

        info!(
            file = file_path,
            total = report.total_issues,
            critical = report.critical_count,
            compliant = report.wcag_aa_compliant,
            "validation finished"
        );

        Ok(report)
    }

    /// Read, decode and validate an HTML file
    pub fn validate_file(&self, path: &Path) -> Result<ValidationReport, WcagError> {
        let html = read_document(path)?;
        self.validate_named(&html, &path.display().to_string())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    struct BrokenCheck;

    impl Check for BrokenCheck {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn run(&self, _context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
            Err(CheckError::Internal("boom".to_string()))
        }
    }

    struct AlwaysLow;

    impl Check for AlwaysLow {
        fn name(&self) -> &'static str {
            "always-low"
        }

        fn run(&self, _context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
            Ok(vec![WcagIssue::new("1.3.2", Severity::Low, "document", "note")])
        }
    }

    #[test]
    fn test_failing_check_contributes_nothing() {
        let mut registry = CheckRegistry::empty();
        registry.register(Box::new(BrokenCheck));
        registry.register(Box::new(AlwaysLow));

        let report = Validator::with_registry(true, registry)
            .validate("<p>x</p>")
            .unwrap();

        assert_eq!(report.total_issues, 1);
        assert_eq!(report.low_count, 1);
        assert!(report.wcag_aa_compliant);
    }

    #[test]
    fn test_default_registry_has_all_checks() {
        assert_eq!(CheckRegistry::new().len(), 13);
        assert!(CheckRegistry::empty().is_empty());
    }

    #[test]
    fn test_stylesheet_collects_inline_styles() {
        let html = "<html><head><style>a { color: red; }</style></head>\
                    <body><div style=\"position: fixed\"></div></body></html>";
        let dom = parse_html(html).unwrap();
        let context = CheckContext::new(&dom, html);

        assert!(context.stylesheet.contains("a { color: red; }"));
        assert!(context.stylesheet.contains("position: fixed"));
    }

    #[test]
    fn test_file_path_in_report() {
        let report = Validator::default()
            .validate_named("<html lang=en></html>", "paper.html")
            .unwrap();
        assert_eq!(report.file_path, "paper.html");
    }
}
