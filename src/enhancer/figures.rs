//! Figure phase
//!
//! Numbers figures in document order, labels them with a captioned
//! `<figcaption>`, classifies math images, fills in missing alt text and
//! inlines local images.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use markup5ever_rcdom::Handle;
use tracing::{debug, warn};

use super::PhaseContext;
use crate::alt_text::{AltTextResult, AltTextSource, ImageContext};
use crate::core::{detect_media_type, WcagError};
use crate::heuristics::{describe_math, is_math_image};
use crate::parsers::html::{
    add_class, append_child, create_text_node, detach, find_elements, find_first_element,
    get_node_attr, get_parent_node, has_ancestor, insert_before, is_element, is_whitespace_text,
    previous_element_sibling, set_node_attr, text_content,
};
use crate::utils::create_data_url;

/// An `<img>` under one of these is inline content and is not wrapped
const INLINE_CONTEXT: &[&str] = &[
    "a", "button", "label", "span", "em", "strong", "b", "i", "u", "small", "sub", "sup", "code",
    "pre", "caption", "figcaption", "picture", "h1", "h2", "h3", "h4", "h5", "h6", "p",
];

const MAX_SURROUNDING_TEXT: usize = 300;

pub fn apply(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let mut changes = 0;

    if context.options.enhance_figures {
        changes += enhance_figures(context)?;
    }
    if context.options.embed_images {
        changes += embed_local_images(context)?;
    }

    Ok(changes)
}

fn enhance_figures(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let body = context.body()?;
    let mut enhanced = 0;

    // one document-order pass keeps numbering stable across reruns
    for node in find_elements(&body, &["figure", "img"]) {
        if is_element(&node, "figure") {
            enhance_figure(context, &node);
            enhanced += 1;
            continue;
        }

        if get_node_attr(&node, "loading").is_none() {
            set_node_attr(&node, "loading", Some("lazy".to_string()));
        }
        if has_ancestor(&node, &["figure"]) {
            continue;
        }

        match wrap_target(&node) {
            Some(target) => {
                let figure = context.element("figure", &[]);
                insert_before(&target, &figure);
                append_child(&figure, &node);
                if !Rc::ptr_eq(&target, &node) {
                    detach(&target);
                }
                enhance_figure(context, &figure);
                enhanced += 1;
            }
            None => debug!("inline image left unwrapped"),
        }
    }

    debug!(figures = enhanced, "enhanced figures");
    Ok(enhanced)
}

/// Node to replace with a new `<figure>`: the image itself, or a `<p>` holding only the image
fn wrap_target(img: &Handle) -> Option<Handle> {
    let parent = get_parent_node(img)?;

    if is_element(&parent, "p") {
        let only_image = parent
            .children
            .borrow()
            .iter()
            .all(|child| Rc::ptr_eq(child, img) || is_whitespace_text(child));
        if only_image && !has_ancestor(&parent, INLINE_CONTEXT) {
            return Some(parent);
        }
        return None;
    }

    if has_ancestor(img, INLINE_CONTEXT) {
        None
    } else {
        Some(img.clone())
    }
}

fn enhance_figure(context: &mut PhaseContext, figure: &Handle) {
    if let Some(previous) = get_node_attr(figure, "id") {
        context.ids.release(&previous);
    }
    let (number, id) = context.ids.next_figure_id();
    set_node_attr(figure, "id", Some(id.clone()));
    set_node_attr(figure, "role", Some("figure".to_string()));

    let img = find_first_element(figure, &["img"]);
    let mut alt = String::new();
    let mut generic_alt = false;
    let mut math = false;

    if let Some(img) = &img {
        if get_node_attr(img, "loading").is_none() {
            set_node_attr(img, "loading", Some("lazy".to_string()));
        }
        if get_node_attr(img, "alt").is_none() {
            if let Some(result) = generate_alt_text(context, img, figure, number) {
                generic_alt = result.source == AltTextSource::Generic;
                set_node_attr(img, "alt", Some(result.alt_text));
            }
        }

        alt = get_node_attr(img, "alt").unwrap_or_default().trim().to_string();
        generic_alt = generic_alt || alt == format!("Figure {number}");
        let src = get_node_attr(img, "src").unwrap_or_default();
        math = is_math_image(&src, &alt);
        if math {
            add_class(figure, "math-figure");
        }
    }

    let describe = context.options.expandable_descriptions && !alt.is_empty() && !generic_alt;
    let caption_id = format!("{id}-caption");

    let caption_id = match find_first_element(figure, &["figcaption"]) {
        Some(caption) => {
            if let Some(previous) = get_node_attr(&caption, "id") {
                context.ids.release(&previous);
            }
            let caption_id = context.ids.unique_from(&caption_id);
            set_node_attr(&caption, "id", Some(caption_id.clone()));

            if describe && find_first_element(figure, &["details"]).is_none() {
                let details = description_details(context, &alt, math);
                append_child(&caption, &details);
            }
            caption_id
        }
        None => {
            let caption_id = context.ids.unique_from(&caption_id);
            let caption = context.element("figcaption", &[("id", &caption_id)]);

            if alt.is_empty() {
                append_child(&caption, &create_text_node(&format!("Figure {number}")));
            } else if math {
                let code = context.element("code", &[("aria-label", "Mathematical notation")]);
                append_child(&code, &create_text_node(&alt));
                append_child(&caption, &code);
            } else {
                append_child(&caption, &create_text_node(&alt));
            }

            if describe {
                let details = description_details(context, &alt, math);
                append_child(&caption, &details);
            }

            append_child(figure, &caption);
            caption_id
        }
    };

    set_node_attr(figure, "aria-labelledby", Some(caption_id));
}

/// Expandable long description
fn description_details(context: &PhaseContext, alt: &str, math: bool) -> Handle {
    let (summary_text, description) = if math {
        ("Full description", describe_math(alt))
    } else {
        ("Figure description (click to expand)", format!("Image: {alt}"))
    };

    let details = context.element("details", &[]);
    let summary = context.element("summary", &[]);
    append_child(&summary, &create_text_node(summary_text));
    let paragraph = context.element("p", &[]);
    append_child(&paragraph, &create_text_node(&description));

    append_child(&details, &summary);
    append_child(&details, &paragraph);
    details
}

fn generate_alt_text(
    context: &PhaseContext,
    img: &Handle,
    figure: &Handle,
    number: u32,
) -> Option<AltTextResult> {
    if !context.options.generate_alt_text {
        return None;
    }
    let provider = context.alt_text;

    let src = get_node_attr(img, "src").unwrap_or_default();
    let caption = find_first_element(figure, &["figcaption"])
        .map(|caption| text_content(&caption).trim().to_string())
        .filter(|caption| !caption.is_empty());
    let surrounding_text = previous_element_sibling(figure)
        .filter(|previous| is_element(previous, "p"))
        .map(|previous| text_content(&previous))
        .map(|text| last_chars(text.trim(), MAX_SURROUNDING_TEXT))
        .filter(|text| !text.is_empty());
    let image_data = context
        .asset_root
        .and_then(|root| resolve_local_image(root, &src))
        .and_then(|path| fs::read(path).ok());

    let image_context = ImageContext {
        src,
        figure_number: number,
        caption,
        surrounding_text,
        image_data,
        image_quality: context.options.image_quality,
        max_image_width: context.options.max_image_width,
    };

    let result = match provider.generate(&image_context) {
        Ok(result) => result,
        Err(e) => {
            warn!(figure = number, error = %e, "alt text generation failed, using generic text");
            AltTextResult::generic(number)
        }
    };
    Some(result)
}

fn last_chars(text: &str, count: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(count)).collect()
}

/// Filesystem path for a local image `src`, `None` for remote and data URLs
pub fn resolve_local_image(root: &Path, src: &str) -> Option<PathBuf> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") || src.starts_with("//") || src.contains("://") {
        return None;
    }

    let path = src.split(['?', '#']).next().unwrap_or(src);
    let path = path.trim_start_matches("./");
    if path.is_empty() {
        return None;
    }

    Some(root.join(path))
}

fn embed_local_images(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let root = match context.asset_root {
        Some(root) => root,
        None => {
            debug!("no asset root, images stay linked");
            return Ok(0);
        }
    };

    let body = context.body()?;
    let mut embedded = 0;

    for img in find_elements(&body, &["img"]) {
        let src = get_node_attr(&img, "src").unwrap_or_default();
        let path = match resolve_local_image(root, &src) {
            Some(path) => path,
            None => continue,
        };

        match fs::read(&path) {
            Ok(data) => {
                let media_type = detect_media_type(&data, &src);
                set_node_attr(&img, "src", Some(create_data_url(&media_type, &data)));
                embedded += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not embed image"),
        }
    }

    debug!(images = embedded, "embedded local images");
    Ok(embedded)
}
