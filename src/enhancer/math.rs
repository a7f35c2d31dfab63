//! Math phase: text math to MathML, or to a labelled fallback span

use markup5ever_rcdom::Handle;
use tracing::{debug, warn};

use super::PhaseContext;
use crate::core::WcagError;
use crate::math::MathConversion;
use crate::parsers::html::{
    append_child, create_text_node, detach, find_text_nodes, get_node_attr, has_ancestor,
    has_ancestor_where, insert_before, is_element, node_text, parse_fragment_nodes, set_node_attr,
};

/// Text under these is never scanned
const NO_MATH: &[&str] = &[
    "script", "style", "code", "pre", "math", "textarea", "title", "kbd", "samp",
];

pub fn apply(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let root = context.content_root()?;
    let mut replaced = 0;

    for node in find_text_nodes(&root) {
        if has_ancestor(&node, NO_MATH) || has_ancestor_where(&node, is_math_role) {
            continue;
        }

        let text = match node_text(&node) {
            Some(text) => text,
            None => continue,
        };

        let conversions = context.math.convert_text(&text);
        if conversions.is_empty() {
            continue;
        }

        let mut cursor = 0;
        let mut pieces: Vec<Handle> = Vec::new();
        for conversion in &conversions {
            let (start, end) = (conversion.span.start, conversion.span.end);
            // collaborators may report overlapping or bogus ranges
            if start < cursor
                || end > text.len()
                || !text.is_char_boundary(start)
                || !text.is_char_boundary(end)
            {
                debug!(start, end, "ignoring math span outside the text");
                continue;
            }

            if start > cursor {
                pieces.push(create_text_node(&text[cursor..start]));
            }
            pieces.push(math_node(context, conversion));
            cursor = end;
            replaced += 1;
        }

        if cursor == 0 {
            continue;
        }
        if cursor < text.len() {
            pieces.push(create_text_node(&text[cursor..]));
        }

        for piece in &pieces {
            insert_before(&node, piece);
        }
        detach(&node);
    }

    debug!(replaced, "converted math");
    Ok(replaced)
}

fn is_math_role(node: &Handle) -> bool {
    get_node_attr(node, "role")
        .map(|role| role.trim().eq_ignore_ascii_case("math"))
        .unwrap_or(false)
}

fn math_node(context: &PhaseContext, conversion: &MathConversion) -> Handle {
    if conversion.is_converted() {
        match parse_fragment_nodes(&conversion.mathml) {
            Ok(nodes) => {
                if let Some(math) = nodes.into_iter().find(|node| is_element(node, "math")) {
                    if context.options.mathml_fallback_text && !conversion.fallback_text.is_empty() {
                        set_node_attr(&math, "aria-label", Some(conversion.fallback_text.clone()));
                    }
                    return math;
                }
                warn!(source = %conversion.span.source, "converter output has no <math> element");
            }
            Err(e) => {
                warn!(source = %conversion.span.source, error = %e, "could not parse converter output")
            }
        }
    }

    fallback_span(context, conversion)
}

/// `<span role="math" aria-label="..." class="math-fallback">source</span>`
fn fallback_span(context: &PhaseContext, conversion: &MathConversion) -> Handle {
    let label = if conversion.fallback_text.trim().is_empty() {
        conversion.span.content.as_str()
    } else {
        conversion.fallback_text.as_str()
    };

    let span = context.element(
        "span",
        &[("role", "math"), ("aria-label", label), ("class", "math-fallback")],
    );
    append_child(&span, &create_text_node(&conversion.span.source));
    span
}
