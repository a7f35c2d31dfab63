//! Built-in WCAG checks
//!
//! Each check covers one family of success criteria and can be run and
//! tested on its own.

use markup5ever_rcdom::Handle;

use crate::parsers::html::{
    document_html, find_elements, find_elements_where, find_first_element, get_node_attr,
    get_node_name, has_ancestor, has_class, heading_level, text_content,
};
use crate::report::{criteria, Severity, WcagIssue};
use crate::utils::static_regex;

use super::{Check, CheckContext, CheckError};

const GENERIC_ALT_TEXT: [&str; 5] = ["image", "photo", "picture", "graphic", "icon"];

const GENERIC_LINK_TEXT: [&str; 9] = [
    "click here",
    "read more",
    "learn more",
    "more",
    "here",
    "link",
    "this",
    "page",
    "info",
];

const SKIP_LINK_PHRASES: [&str; 4] = ["skip", "jump to", "go to main", "skip to main"];

const UNLABELLED_INPUT_TYPES: [&str; 4] = ["hidden", "submit", "button", "reset"];

const MIN_TARGET_SIZE_PX: u32 = 24;
const MIN_FOCUS_OUTLINE_PX: u32 = 2;

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn non_empty_attr(node: &Handle, attr_name: &str) -> Option<String> {
    get_node_attr(node, attr_name).filter(|value| !value.trim().is_empty())
}

/// Language of page (3.1.1)
pub struct LanguageCheck;

impl Check for LanguageCheck {
    fn name(&self) -> &'static str {
        "language"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        // The parser always synthesizes <html>, so look at the source text
        if !static_regex!(r"(?i)<html[\s>/]").is_match(context.raw_html) {
            return Ok(vec![WcagIssue::new(
                criteria::LANGUAGE_OF_PAGE,
                Severity::Critical,
                "<html>",
                "Missing <html> element",
            )
            .with_suggestion("Add proper HTML document structure with <html> element")]);
        }

        let html = document_html(context.dom)
            .ok_or_else(|| CheckError::Document("parsed document has no root element".to_string()))?;

        if non_empty_attr(&html, "lang").is_none() {
            return Ok(vec![WcagIssue::new(
                criteria::LANGUAGE_OF_PAGE,
                Severity::Critical,
                "<html>",
                "Missing language declaration (lang attribute)",
            )
            .with_suggestion("Add lang attribute: <html lang=\"en\">")]);
        }

        Ok(Vec::new())
    }
}

/// Page titled (2.4.2)
pub struct TitleCheck;

impl Check for TitleCheck {
    fn name(&self) -> &'static str {
        "title"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let has_title = find_first_element(&context.dom.document, &["title"])
            .map(|title| !text_content(&title).trim().is_empty())
            .unwrap_or(false);

        if has_title {
            return Ok(Vec::new());
        }

        Ok(vec![WcagIssue::new(
            criteria::PAGE_TITLED,
            Severity::High,
            "<title>",
            "Missing or empty page title",
        )
        .with_suggestion("Add descriptive <title> element in <head>")])
    }
}

/// Non-text content (1.1.1)
pub struct ImageCheck;

impl Check for ImageCheck {
    fn name(&self) -> &'static str {
        "images"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let mut issues = Vec::new();

        for img in find_elements(&context.dom.document, &["img"]) {
            let src = get_node_attr(&img, "src").unwrap_or_else(|| "unknown".to_string());
            let element = format!("<img src=\"{}...\">", truncate(&src, 50));

            match get_node_attr(&img, "alt") {
                None => issues.push(
                    WcagIssue::new(
                        criteria::NON_TEXT_CONTENT,
                        Severity::Critical,
                        &element,
                        "Image missing alt attribute",
                    )
                    .with_suggestion(
                        "Add alt attribute with descriptive text or alt='' for decorative images",
                    ),
                ),
                Some(alt) if alt.trim().is_empty() => {
                    if get_node_attr(&img, "role").as_deref() != Some("presentation") {
                        issues.push(
                            WcagIssue::new(
                                criteria::NON_TEXT_CONTENT,
                                Severity::Medium,
                                &element,
                                "Empty alt text - verify image is decorative",
                            )
                            .with_suggestion(
                                "If decorative, add role='presentation'. If meaningful, add descriptive alt text",
                            ),
                        );
                    }
                }
                Some(alt) if GENERIC_ALT_TEXT.contains(&alt.trim().to_lowercase().as_str()) => {
                    issues.push(
                        WcagIssue::new(
                            criteria::NON_TEXT_CONTENT,
                            Severity::High,
                            &format!("<img alt=\"{alt}\">"),
                            "Generic alt text does not describe image content",
                        )
                        .with_suggestion("Replace with specific description of what the image shows"),
                    );
                }
                Some(_) => {}
            }
        }

        Ok(issues)
    }
}

/// Info and relationships (1.3.1), headings and labels (2.4.6)
pub struct HeadingCheck;

impl Check for HeadingCheck {
    fn name(&self) -> &'static str {
        "headings"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let headings = find_elements(&context.dom.document, &["h1", "h2", "h3", "h4", "h5", "h6"]);

        if headings.is_empty() {
            return Ok(vec![WcagIssue::new(
                criteria::HEADINGS_AND_LABELS,
                Severity::Medium,
                "document",
                "No headings found in document",
            )
            .with_suggestion("Add heading structure to organize content")]);
        }

        let mut issues = Vec::new();

        let h1_count = headings
            .iter()
            .filter(|heading| heading_level(heading) == Some(1))
            .count();
        if h1_count > 1 {
            issues.push(
                WcagIssue::new(
                    criteria::INFO_AND_RELATIONSHIPS,
                    Severity::Medium,
                    "<h1>",
                    &format!("Multiple h1 elements found ({h1_count})"),
                )
                .with_suggestion("Use single h1 for main page heading, use h2-h6 for subheadings"),
            );
        } else if h1_count == 0 {
            issues.push(
                WcagIssue::new(
                    criteria::HEADINGS_AND_LABELS,
                    Severity::High,
                    "document",
                    "No h1 element found",
                )
                .with_suggestion("Add h1 element as main page heading"),
            );
        }

        let mut previous_level: u8 = 0;
        for heading in &headings {
            let level = heading_level(heading).unwrap_or(previous_level);
            let element = format!("<h{level}>");

            if previous_level > 0 && level > previous_level + 1 {
                issues.push(
                    WcagIssue::new(
                        criteria::INFO_AND_RELATIONSHIPS,
                        Severity::High,
                        &element,
                        &format!("Skipped heading level: h{previous_level} to h{level}"),
                    )
                    .with_suggestion(&format!("Use h{} instead of h{level}", previous_level + 1)),
                );
            }
            previous_level = level;

            if text_content(heading).trim().is_empty() {
                issues.push(
                    WcagIssue::new(
                        criteria::HEADINGS_AND_LABELS,
                        Severity::High,
                        &element,
                        "Empty heading element",
                    )
                    .with_suggestion("Add text content or remove empty heading"),
                );
            }
        }

        Ok(issues)
    }
}

/// Link purpose (2.4.4)
pub struct LinkCheck;

impl Check for LinkCheck {
    fn name(&self) -> &'static str {
        "links"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let mut issues = Vec::new();

        for link in find_elements(&context.dom.document, &["a"]) {
            let href = get_node_attr(&link, "href").unwrap_or_default();
            let text = text_content(&link).trim().to_lowercase();

            if text.contains("skip") {
                continue;
            }

            if GENERIC_LINK_TEXT.contains(&text.as_str()) {
                issues.push(
                    WcagIssue::new(
                        criteria::LINK_PURPOSE,
                        Severity::High,
                        &format!("<a href=\"{}...\">{text}</a>", truncate(&href, 30)),
                        &format!("Generic link text: '{text}'"),
                    )
                    .with_suggestion("Use descriptive link text that indicates destination"),
                );
            }

            let has_image = find_first_element(&link, &["img"]).is_some();
            if text.is_empty() && !has_image && non_empty_attr(&link, "aria-label").is_none() {
                issues.push(
                    WcagIssue::new(
                        criteria::LINK_PURPOSE,
                        Severity::Critical,
                        &format!("<a href=\"{}...\">", truncate(&href, 30)),
                        "Link has no accessible text",
                    )
                    .with_suggestion("Add link text or aria-label for accessible name"),
                );
            }
        }

        Ok(issues)
    }
}

/// Labelled form controls (1.3.1)
pub struct FormCheck;

impl Check for FormCheck {
    fn name(&self) -> &'static str {
        "forms"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let document = &context.dom.document;
        let labels = find_elements(document, &["label"]);
        let mut issues = Vec::new();

        for control in find_elements(document, &["input", "select", "textarea"]) {
            let input_type = get_node_attr(&control, "type")
                .unwrap_or_else(|| "text".to_string())
                .to_lowercase();
            if UNLABELLED_INPUT_TYPES.contains(&input_type.as_str()) {
                continue;
            }

            let labelled_by_for = non_empty_attr(&control, "id")
                .map(|id| {
                    labels
                        .iter()
                        .any(|label| get_node_attr(label, "for").as_deref() == Some(id.as_str()))
                })
                .unwrap_or(false);
            let labelled_by_aria = non_empty_attr(&control, "aria-label").is_some()
                || non_empty_attr(&control, "aria-labelledby").is_some();
            let wrapped = has_ancestor(&control, &["label"]);

            if !(labelled_by_for || labelled_by_aria || wrapped) {
                let control_name = get_node_name(&control).unwrap_or("input");
                let name = get_node_attr(&control, "name").unwrap_or_else(|| "unnamed".to_string());
                issues.push(
                    WcagIssue::new(
                        criteria::INFO_AND_RELATIONSHIPS,
                        Severity::Critical,
                        &format!("<{control_name} name=\"{name}\">"),
                        "Form control missing associated label",
                    )
                    .with_suggestion("Add <label for='id'> or aria-label attribute"),
                );
            }
        }

        Ok(issues)
    }
}

/// Data table structure (1.3.1)
pub struct TableCheck;

impl Check for TableCheck {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let mut issues = Vec::new();

        for table in find_elements(&context.dom.document, &["table"]) {
            let named = find_first_element(&table, &["caption"]).is_some()
                || non_empty_attr(&table, "aria-label").is_some()
                || non_empty_attr(&table, "aria-labelledby").is_some();
            if !named {
                issues.push(
                    WcagIssue::new(
                        criteria::INFO_AND_RELATIONSHIPS,
                        Severity::Medium,
                        "<table>",
                        "Data table missing caption or accessible name",
                    )
                    .with_suggestion("Add <caption> or aria-label to describe table purpose"),
                );
            }

            let headers = find_elements(&table, &["th"]);
            if headers.is_empty() {
                issues.push(
                    WcagIssue::new(
                        criteria::INFO_AND_RELATIONSHIPS,
                        Severity::High,
                        "<table>",
                        "Data table missing header cells (<th>)",
                    )
                    .with_suggestion("Add <th> elements for column/row headers"),
                );
                continue;
            }

            for th in headers {
                if non_empty_attr(&th, "scope").is_none() {
                    issues.push(
                        WcagIssue::new(
                            criteria::INFO_AND_RELATIONSHIPS,
                            Severity::Medium,
                            &format!("<th>{}...</th>", truncate(&text_content(&th), 20)),
                            "Table header missing scope attribute",
                        )
                        .with_suggestion("Add scope=\"col\" or scope=\"row\" to header cells"),
                    );
                }
            }
        }

        Ok(issues)
    }
}

/// Number of main landmarks, counting `<main role="main">` once
pub fn count_main_landmarks(root: &Handle) -> usize {
    find_elements_where(root, |node| {
        get_node_name(node) == Some("main")
            || get_node_attr(node, "role")
                .map(|role| role.trim().eq_ignore_ascii_case("main"))
                .unwrap_or(false)
    })
    .len()
}

/// Main landmark presence and uniqueness (2.4.1, 1.3.1)
pub struct LandmarkCheck;

impl Check for LandmarkCheck {
    fn name(&self) -> &'static str {
        "landmarks"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let mains = count_main_landmarks(&context.dom.document);

        let issue = match mains {
            0 => WcagIssue::new(
                criteria::BYPASS_BLOCKS,
                Severity::Medium,
                "document",
                "Missing main landmark",
            )
            .with_suggestion("Add <main> element to wrap primary content"),
            1 => return Ok(Vec::new()),
            _ => WcagIssue::new(
                criteria::INFO_AND_RELATIONSHIPS,
                Severity::High,
                "<main>",
                "Multiple main landmarks found",
            )
            .with_suggestion("Use only one main landmark per page")
            .with_context(&format!("{mains} main landmarks")),
        };

        Ok(vec![issue])
    }
}

/// Bypass blocks (2.4.1)
pub struct SkipLinkCheck;

impl Check for SkipLinkCheck {
    fn name(&self) -> &'static str {
        "skip-links"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let document = &context.dom.document;

        let has_skip_link = find_elements(document, &["a"]).iter().any(|link| {
            let text = text_content(link).to_lowercase();
            let href = get_node_attr(link, "href").unwrap_or_default();

            SKIP_LINK_PHRASES.iter().any(|phrase| text.contains(phrase))
                || href.starts_with("#main")
                || has_class(link, "skip-link")
        });

        if has_skip_link || find_first_element(document, &["nav", "header"]).is_none() {
            return Ok(Vec::new());
        }

        Ok(vec![WcagIssue::new(
            criteria::BYPASS_BLOCKS,
            Severity::Medium,
            "document",
            "Consider adding skip navigation link",
        )
        .with_suggestion("Add <a href=\"#main\" class=\"skip-link\">Skip to main content</a>")])
    }
}

/// Focus visible (2.4.7)
pub struct FocusIndicatorCheck;

impl Check for FocusIndicatorCheck {
    fn name(&self) -> &'static str {
        "focus-indicator"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let css = &context.stylesheet;
        let removes_outline = static_regex!(r"(?i)outline\s*:\s*(none|0)[^;]*;").is_match(css);
        let has_focus_visible = static_regex!(r"(?i):focus-visible\s*\{[^}]*outline").is_match(css);

        if !removes_outline || has_focus_visible {
            return Ok(Vec::new());
        }

        Ok(vec![WcagIssue::new(
            criteria::FOCUS_VISIBLE,
            Severity::High,
            "<style>",
            "Focus indicator may be removed (outline:none detected)",
        )
        .with_suggestion("Ensure custom focus styles are provided when removing default outline")])
    }
}

/// Focus not obscured (2.4.11, 2.4.12)
pub struct FocusNotObscuredCheck;

impl Check for FocusNotObscuredCheck {
    fn name(&self) -> &'static str {
        "focus-not-obscured"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let css = &context.stylesheet;
        let pinned = static_regex!(r"(?i)position\s*:\s*(fixed|sticky)").is_match(css);
        let scroll_margin = static_regex!(r"(?i)scroll-margin").is_match(css);

        if !pinned || scroll_margin {
            return Ok(Vec::new());
        }

        Ok(vec![WcagIssue::new(
            criteria::FOCUS_NOT_OBSCURED_MINIMUM,
            Severity::Medium,
            "<style>",
            "Fixed/sticky positioned elements detected without scroll-margin",
        )
        .with_suggestion(
            "Add scroll-margin-top/bottom to focused elements to prevent obscuring by fixed headers/footers",
        )])
    }
}

/// Focus appearance (2.4.13)
pub struct FocusAppearanceCheck;

impl Check for FocusAppearanceCheck {
    fn name(&self) -> &'static str {
        "focus-appearance"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let focus_rule = static_regex!(r"(?i):focus[^{]*\{[^}]*outline\s*:\s*(\d+)px");
        let mut issues = Vec::new();

        for captures in focus_rule.captures_iter(&context.stylesheet) {
            let width: u32 = match captures.get(1).and_then(|m| m.as_str().parse().ok()) {
                Some(width) => width,
                None => continue,
            };

            if width < MIN_FOCUS_OUTLINE_PX {
                issues.push(
                    WcagIssue::new(
                        criteria::FOCUS_APPEARANCE,
                        Severity::High,
                        ":focus",
                        &format!("Focus outline width ({width}px) below 2px minimum"),
                    )
                    .with_suggestion("Set focus outline to minimum 2px solid with 3:1 contrast ratio"),
                );
            }
        }

        Ok(issues)
    }
}

/// Target size minimum (2.5.8)
pub struct TargetSizeCheck;

impl Check for TargetSizeCheck {
    fn name(&self) -> &'static str {
        "target-size"
    }

    fn run(&self, context: &CheckContext) -> Result<Vec<WcagIssue>, CheckError> {
        let css = &context.stylesheet;
        let rule = static_regex!(r"([^{}]*)\{([^{}]*)\}");
        let interactive = static_regex!(r"(?i)\bbutton\b|\.btn\b|input\[type");
        let mut issues = Vec::new();

        for captures in rule.captures_iter(css) {
            let (selector, block) = match (captures.get(1), captures.get(2)) {
                (Some(selector), Some(block)) => (selector.as_str().trim(), block.as_str()),
                _ => continue,
            };
            if !interactive.is_match(selector) {
                continue;
            }

            for size in declared_sizes(block) {
                if size > 0 && size < MIN_TARGET_SIZE_PX {
                    issues.push(
                        WcagIssue::new(
                            criteria::TARGET_SIZE_MINIMUM,
                            Severity::High,
                            &truncate(selector, 50),
                            &format!("Interactive element size ({size}px) below 24px minimum"),
                        )
                        .with_suggestion("Ensure interactive elements are at least 24x24 CSS pixels"),
                    );
                }
            }
        }

        let uses_extra_small = css.to_lowercase().contains("btn-xs")
            || !find_elements_where(&context.dom.document, |node| has_class(node, "btn-xs")).is_empty();
        if uses_extra_small {
            issues.push(
                WcagIssue::new(
                    criteria::TARGET_SIZE_MINIMUM,
                    Severity::Medium,
                    ".btn-xs",
                    "Extra-small button class may not meet 24px target size",
                )
                .with_suggestion(
                    "Ensure clickable area is at least 24x24 CSS pixels or has adequate spacing",
                ),
            );
        }

        Ok(issues)
    }
}

/// Pixel values of every `width`, `height`, `min-width` and `min-height` in a rule body
fn declared_sizes(block: &str) -> Vec<u32> {
    let size = static_regex!(r"^(\d+)px$");

    block
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .filter(|(property, _)| {
            matches!(
                property.trim().to_lowercase().as_str(),
                "width" | "height" | "min-width" | "min-height"
            )
        })
        .filter_map(|(_, value)| {
            let value = value.trim().trim_end_matches("!important").trim();
            size.captures(value)?.get(1)?.as_str().parse().ok()
        })
        .collect()
}
