//! WCAG enhancer
//!
//! Runs six ordered phases over one parsed document:
//!
//! 1. structure: landmarks, skip link, sections
//! 2. semantic content: subsections, references, tables
//! 3. figures: numbering, captions, descriptions, alt text, image embedding
//! 4. math: text math to MathML or accessible fallbacks
//! 5. cross references: "Figure N" / "Table N" to in-page links
//! 6. presentation: stylesheet, metadata, accessibility statement
//!
//! Later phases rely on what earlier ones established (the cross reference
//! phase links to ids the figure and table steps assigned). Every phase is
//! a no-op when its guard already holds, so the enhancer can run over its
//! own output.
//!
//! A phase that fails is rolled back and reported; the remaining phases
//! still run.
//!
//! ```rust
//! use wcagify::enhancer::{Enhancer, Phase, PhaseOutcome, WcagOptions};
//!
//! let (html, report) = Enhancer::new(WcagOptions::default())
//!     .enhance_with_report("<h1>X</h1><p>hi</p>")
//!     .unwrap();
//!
//! assert!(html.contains("class=\"skip-link\""));
//! assert!(matches!(report.outcome(Phase::Structure), Some(PhaseOutcome::Applied { .. })));
//! ```

pub mod figures;
pub mod ids;
pub mod links;
pub mod math;
pub mod options;
pub mod presentation;
pub mod semantic;
pub mod structure;

use std::fmt;
use std::path::{Path, PathBuf};

use markup5ever_rcdom::{Handle, RcDom};
use tracing::{debug, info, warn};

use crate::alt_text::{AltTextProvider, CaptionAltTextProvider};
use crate::core::WcagError;
use crate::math::{MathConverter, PatternMathConverter};
use crate::parsers::html::{
    create_element_node, document_body, find_first_element, parse_html, serialize_document,
    serialize_node,
};

pub use ids::IdRegistry;
pub use options::WcagOptions;

/// The enhancement phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Structure,
    SemanticContent,
    Figures,
    Math,
    CrossReferences,
    Presentation,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Structure,
        Phase::SemanticContent,
        Phase::Figures,
        Phase::Math,
        Phase::CrossReferences,
        Phase::Presentation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Structure => "structure",
            Phase::SemanticContent => "semantic-content",
            Phase::Figures => "figures",
            Phase::Math => "math",
            Phase::CrossReferences => "cross-references",
            Phase::Presentation => "presentation",
        }
    }

    /// Why the phase will not run with these options, if it won't
    fn skip_reason(&self, options: &WcagOptions) -> Option<&'static str> {
        match self {
            Phase::Structure
                if !(options.add_skip_link || options.add_aria_landmarks || options.use_sections) =>
            {
                Some("skip link, landmarks and sections disabled")
            }
            Phase::SemanticContent
                if !(options.detect_subsections || options.detect_references || options.detect_tables) =>
            {
                Some("subsection, reference and table detection disabled")
            }
            Phase::Figures if !(options.enhance_figures || options.embed_images) => {
                Some("figure enhancement and image embedding disabled")
            }
            Phase::Math if !options.enhance_math => Some("math enhancement disabled"),
            Phase::CrossReferences if !options.create_figure_links => {
                Some("figure links disabled")
            }
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What happened to one phase during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase ran; `changes` counts the nodes it created or rewrote
    Applied { changes: usize },
    Skipped(String),
    /// The phase failed and its changes were rolled back
    Failed(String),
}

/// Per-phase outcomes of one `enhance_with_report` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancementReport {
    pub outcomes: Vec<(Phase, PhaseOutcome)>,
}

impl EnhancementReport {
    pub fn outcome(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.outcomes
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> Vec<Phase> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, PhaseOutcome::Failed(_)))
            .map(|(phase, _)| *phase)
            .collect()
    }

    pub fn total_changes(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                PhaseOutcome::Applied { changes } => *changes,
                _ => 0,
            })
            .sum()
    }
}

/// State of one enhancement run, handed to every phase
pub struct PhaseContext<'a> {
    pub dom: RcDom,
    pub ids: IdRegistry,
    pub options: &'a WcagOptions,
    pub math: &'a dyn MathConverter,
    pub alt_text: &'a dyn AltTextProvider,
    pub asset_root: Option<&'a Path>,
}

impl<'a> PhaseContext<'a> {
    pub fn body(&self) -> Result<Handle, WcagError> {
        document_body(&self.dom).ok_or_else(|| WcagError::Document("no <body> element".to_string()))
    }

    /// `<main>` when present, `<body>` otherwise
    pub fn content_root(&self) -> Result<Handle, WcagError> {
        let body = self.body()?;
        Ok(find_first_element(&body, &["main"]).unwrap_or(body))
    }

    /// Create a detached element owned by this run's document
    pub fn element(&self, name: &str, attributes: &[(&str, &str)]) -> Handle {
        create_element_node(&self.dom, name, attributes)
    }
}

/// Rewrites loosely structured HTML into accessible HTML
///
/// Holds configuration and collaborators only; ids and counters are
/// created fresh for every call, so one instance can enhance any number of
/// documents.
pub struct Enhancer {
    options: WcagOptions,
    math_converter: Box<dyn MathConverter>,
    alt_text_provider: Box<dyn AltTextProvider>,
    asset_root: Option<PathBuf>,
}

impl Enhancer {
    pub fn new(options: WcagOptions) -> Self {
        Enhancer {
            options,
            math_converter: Box::new(PatternMathConverter::new()),
            alt_text_provider: Box::new(CaptionAltTextProvider),
            asset_root: None,
        }
    }

    pub fn with_math_converter(mut self, converter: Box<dyn MathConverter>) -> Self {
        self.math_converter = converter;
        self
    }

    /// Consulted for images without an `alt` attribute; captions by default
    pub fn with_alt_text_provider(mut self, provider: Box<dyn AltTextProvider>) -> Self {
        self.alt_text_provider = provider;
        self
    }

    /// Directory that relative image paths are resolved against
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    pub fn options(&self) -> &WcagOptions {
        &self.options
    }

    /// Enhance a document; fails only when the input cannot be parsed
    pub fn enhance(&self, html: &str) -> Result<String, WcagError> {
        self.enhance_with_report(html).map(|(html, _)| html)
    }

    /// Enhance a document and report what each phase did
    pub fn enhance_with_report(&self, html: &str) -> Result<(String, EnhancementReport), WcagError> {
        let dom = parse_html(html)?;
        let ids = IdRegistry::from_document(&dom.document);

        let mut context = PhaseContext {
            dom,
            ids,
            options: &self.options,
            math: self.math_converter.as_ref(),
            alt_text: self.alt_text_provider.as_ref(),
            asset_root: self.asset_root.as_deref(),
        };
        let mut report = EnhancementReport::default();

        for phase in Phase::ALL {
            let outcome = match phase.skip_reason(&self.options) {
                Some(reason) => {
                    debug!(phase = phase.name(), reason, "phase skipped");
                    PhaseOutcome::Skipped(reason.to_string())
                }
                None => run_phase(phase, &mut context),
            };
            report.outcomes.push((phase, outcome));
        }

        info!(
            figures = context.ids.figure_count(),
            tables = context.ids.table_count(),
            changes = report.total_changes(),
            "enhancement finished"
        );

        let html = serialize_document(context.dom)?;
        Ok((html, report))
    }
}

fn run_phase(phase: Phase, context: &mut PhaseContext) -> PhaseOutcome {
    let snapshot = serialize_node(&context.dom.document).ok();
    let ids_before = context.ids.clone();

    let result = match phase {
        Phase::Structure => structure::apply(context),
        Phase::SemanticContent => semantic::apply(context),
        Phase::Figures => figures::apply(context),
        Phase::Math => math::apply(context),
        Phase::CrossReferences => links::apply(context),
        Phase::Presentation => presentation::apply(context),
    };

    match result {
        Ok(changes) => {
            debug!(phase = phase.name(), changes, "phase applied");
            PhaseOutcome::Applied { changes }
        }
        Err(e) => {
            warn!(phase = phase.name(), error = %e, "phase failed, rolling back");
            if let Some(Ok(dom)) = snapshot.map(|html| parse_html(&html)) {
                context.dom = dom;
                context.ids = ids_before;
            }
            PhaseOutcome::Failed(e.to_string())
        }
    }
}
