//! Presentation phase
//!
//! Injects the accessibility stylesheet, fills in head metadata and
//! appends the accessibility statement to the page footer.

use markup5ever_rcdom::Handle;
use tracing::debug;

use super::{PhaseContext, WcagOptions};
use crate::core::WcagError;
use crate::parsers::css::drop_media_rules;
use crate::parsers::html::{
    append_child, create_text_node, element_children, ensure_head, find_elements_where,
    find_first_element, get_document_lang, get_meta, get_node_attr, get_title, has_charset,
    has_class, is_element, set_charset, set_document_lang, set_meta, set_node_attr,
    set_text_content, set_title, text_content,
};

const BASE_STYLESHEET: &str = include_str!("wcag.css");

const FOCUS_APPEARANCE_RULES: &str = "
/* 2.4.13 */
a:focus-visible, summary:focus-visible, [tabindex]:focus-visible {
  outline: 3px solid var(--color-focus);
  outline-offset: 3px;
  box-shadow: 0 0 0 5px var(--color-bg);
}
";

const FOCUS_NOT_OBSCURED_RULES: &str = "
/* 2.4.11 */
a, summary, [tabindex], input, select, textarea {
  scroll-margin-top: 80px;
  scroll-margin-bottom: 80px;
}
";

const TARGET_SIZE_RULES: &str = "
/* 2.5.8 */
button, summary, select, [role=\"button\"] {
  min-height: 24px;
  min-width: 24px;
}
p a, li a, td a, figcaption a {
  min-height: auto;
  min-width: auto;
}
";

pub const WCAG_STYLE_ATTR: &str = "data-wcag";
const DEFAULT_LANG: &str = "en";
const VIEWPORT: &str = "width=device-width, initial-scale=1";

/// The stylesheet for the given options
///
/// Media blocks for disabled preferences are dropped from the baseline,
/// and the 2.2 rules are appended per toggle.
pub fn build_stylesheet(options: &WcagOptions) -> String {
    let mut css = format!(
        "/* WCAG {} AA accessibility stylesheet */\n",
        options.wcag_version
    );

    if options.dark_mode && options.reduced_motion && options.print_styles {
        css.push_str(BASE_STYLESHEET);
    } else {
        css.push_str(&drop_media_rules(BASE_STYLESHEET, |prelude| {
            (!options.dark_mode && prelude.contains("prefers-color-scheme"))
                || (!options.reduced_motion && prelude.contains("prefers-reduced-motion"))
                || (!options.print_styles && prelude.contains("print"))
        }));
    }

    if options.focus_appearance_2px {
        css.push_str(FOCUS_APPEARANCE_RULES);
    }
    if options.focus_not_obscured {
        css.push_str(FOCUS_NOT_OBSCURED_RULES);
    }
    if options.target_size_minimum {
        css.push_str(TARGET_SIZE_RULES);
    }

    css
}

/// Fixed statement placed in the page footer
pub fn accessibility_statement(wcag_version: &str) -> String {
    format!(
        "This document has been enhanced for accessibility following WCAG {wcag_version} AA \
         guidelines. It includes keyboard navigation, screen reader support, and adjustable \
         display settings."
    )
}

pub fn apply(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let mut changes = 0;

    changes += inject_stylesheet(context)?;
    changes += fill_metadata(context);
    changes += add_statement(context)?;

    Ok(changes)
}

fn inject_stylesheet(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let css = build_stylesheet(context.options);

    let existing = find_elements_where(&context.dom.document, |node| {
        is_element(node, "style") && get_node_attr(node, WCAG_STYLE_ATTR).is_some()
    });
    if let Some(style) = existing.first() {
        if text_content(style) == css {
            return Ok(0);
        }
        set_text_content(style, &css);
        debug!("replaced accessibility stylesheet");
        return Ok(1);
    }

    let head = ensure_head(&context.dom)
        .ok_or_else(|| WcagError::Document("no <html> element to hold <head>".to_string()))?;
    let style = context.element("style", &[(WCAG_STYLE_ATTR, "true")]);
    set_text_content(&style, &css);
    append_child(&head, &style);

    debug!(bytes = css.len(), "injected accessibility stylesheet");
    Ok(1)
}

fn fill_metadata(context: &mut PhaseContext) -> usize {
    let dom = &context.dom;
    let options = context.options;
    let mut changes = 0;

    if !has_charset(dom) {
        set_charset(dom, "utf-8");
        changes += 1;
    }
    if get_meta(dom, "viewport").is_none() {
        set_meta(dom, "viewport", VIEWPORT);
        changes += 1;
    }

    let has_title = get_title(&dom.document)
        .map(|title| !title.trim().is_empty())
        .unwrap_or(false);
    if !has_title {
        let title = Some(options.document_title.trim().to_string())
            .filter(|title| !title.is_empty())
            .or_else(|| {
                find_first_element(&dom.document, &["h1"])
                    .map(|h1| text_content(&h1).split_whitespace().collect::<Vec<_>>().join(" "))
                    .filter(|title| !title.is_empty())
            });
        if let Some(title) = title {
            set_title(dom, &title);
            changes += 1;
        }
    }

    for (name, value) in [
        ("author", &options.document_author),
        ("description", &options.document_description),
    ] {
        if !value.trim().is_empty() && get_meta(dom, name).is_none() {
            set_meta(dom, name, value.trim());
            changes += 1;
        }
    }

    let has_lang = get_document_lang(dom)
        .map(|lang| !lang.trim().is_empty())
        .unwrap_or(false);
    if !has_lang {
        set_document_lang(dom, DEFAULT_LANG);
        changes += 1;
    }

    changes
}

/// Body-level `<footer>` to hold the statement, created when missing
fn page_footer(context: &PhaseContext, body: &Handle) -> Handle {
    if let Some(footer) = element_children(body)
        .into_iter()
        .find(|child| is_element(child, "footer"))
    {
        if get_node_attr(&footer, "role").is_none() {
            set_node_attr(&footer, "role", Some("contentinfo".to_string()));
        }
        return footer;
    }

    let footer = context.element("footer", &[("role", "contentinfo")]);
    append_child(body, &footer);
    footer
}

fn add_statement(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let body = context.body()?;
    if !find_elements_where(&body, |node| has_class(node, "accessibility-info")).is_empty() {
        return Ok(0);
    }

    let footer = page_footer(context, &body);
    let info = context.element("div", &[("class", "accessibility-info")]);
    let paragraph = context.element("p", &[]);
    append_child(
        &paragraph,
        &create_text_node(&accessibility_statement(&context.options.wcag_version)),
    );
    append_child(&info, &paragraph);
    append_child(&footer, &info);

    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancer::Enhancer;

    fn enhance_with(options: WcagOptions, html: &str) -> String {
        Enhancer::new(options).enhance(html).unwrap()
    }

    fn enhance(html: &str) -> String {
        enhance_with(WcagOptions::default(), html)
    }

    #[test]
    fn test_stylesheet_is_injected_once() {
        let enhancer = Enhancer::new(WcagOptions::default());
        let once = enhancer.enhance("<h1>T</h1><p>x</p>").unwrap();
        let twice = enhancer.enhance(&once).unwrap();

        assert!(once.contains("<style data-wcag=\"true\">/* WCAG 2.2 AA accessibility stylesheet */"));
        assert_eq!(twice.matches("data-wcag").count(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stylesheet_follows_options() {
        let full = build_stylesheet(&WcagOptions::default());
        assert!(full.contains("prefers-color-scheme"));
        assert!(full.contains("prefers-reduced-motion"));
        assert!(full.contains("@media print"));
        assert!(full.contains("min-height: 24px"));
        assert!(full.contains("scroll-margin-top: 80px"));
        assert!(full.contains(":focus-visible"));

        let trimmed = build_stylesheet(&WcagOptions {
            dark_mode: false,
            print_styles: false,
            target_size_minimum: false,
            focus_not_obscured: false,
            wcag_version: "2.1".to_string(),
            ..WcagOptions::default()
        });
        assert!(trimmed.starts_with("/* WCAG 2.1 AA"));
        assert!(!trimmed.contains("prefers-color-scheme"));
        assert!(!trimmed.contains("@media print"));
        assert!(trimmed.contains("prefers-reduced-motion"));
        assert!(trimmed.contains("max-width: 600px"));
        assert!(!trimmed.contains("min-height: 24px"));
        assert!(!trimmed.contains("scroll-margin-top: 80px"));
    }

    #[test]
    fn test_stale_stylesheet_is_replaced() {
        let html = enhance("<html><head><style data-wcag=\"true\">old</style></head><body><p>x</p></body></html>");

        assert_eq!(html.matches("data-wcag").count(), 1);
        assert!(!html.contains(">old<"));
    }

    #[test]
    fn test_metadata_is_filled() {
        let options = WcagOptions {
            document_author: "A. Author".to_string(),
            document_description: "A study".to_string(),
            ..WcagOptions::default()
        };
        let html = enhance_with(options, "<h1>Deep  Parsing</h1><p>x</p>");

        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert!(html.contains("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"));
        assert!(html.contains("<title>Deep Parsing</title>"));
        assert!(html.contains("<meta name=\"author\" content=\"A. Author\">"));
        assert!(html.contains("<meta name=\"description\" content=\"A study\">"));
    }

    #[test]
    fn test_existing_metadata_is_kept() {
        let options = WcagOptions {
            document_title: "Ignored".to_string(),
            ..WcagOptions::default()
        };
        let html = enhance_with(
            options,
            "<html lang=\"de\"><head><title>Original</title></head><body><h1>H</h1></body></html>",
        );

        assert!(html.contains("<html lang=\"de\">"));
        assert!(html.contains("<title>Original</title>"));
        assert!(!html.contains("Ignored"));
    }

    #[test]
    fn test_title_option_fills_empty_title() {
        let options = WcagOptions {
            document_title: "From Options".to_string(),
            ..WcagOptions::default()
        };
        let html = enhance_with(options, "<html><head><title> </title></head><body><h1>H</h1></body></html>");
        assert!(html.contains("<title>From Options</title>"));
    }

    #[test]
    fn test_statement_is_added_to_new_footer() {
        let html = enhance("<p>x</p>");

        assert!(html.contains(
            "<footer role=\"contentinfo\"><div class=\"accessibility-info\"><p>This document has been \
             enhanced for accessibility following WCAG 2.2 AA guidelines."
        ));
    }

    #[test]
    fn test_existing_footer_is_reused() {
        let html = enhance("<body><p>x</p><footer><p>(c) 2024</p></footer></body>");

        assert_eq!(html.matches("<footer").count(), 1);
        assert!(html.contains("<p>(c) 2024</p><div class=\"accessibility-info\">"));
        assert_eq!(html.matches("accessibility-info").count(), 1);
    }

    #[test]
    fn test_statement_version_follows_options() {
        assert!(accessibility_statement("2.1").contains("WCAG 2.1 AA guidelines"));
    }
}
