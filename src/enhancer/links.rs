//! Cross reference phase: `Figure N` / `Table N` mentions become in-page links

use markup5ever_rcdom::Handle;
use tracing::debug;

use super::PhaseContext;
use crate::core::WcagError;
use crate::heuristics::find_cross_references;
use crate::parsers::html::{
    append_child, create_text_node, detach, find_text_nodes, get_node_attr, has_ancestor,
    has_ancestor_where, insert_before, node_text,
};

/// Text under these is never linked
const NO_LINKS: &[&str] = &[
    "a", "script", "style", "code", "pre", "math", "title", "figcaption", "summary", "textarea",
];

pub fn apply(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let root = context.content_root()?;
    let mut linked = 0;
    let mut dangling = 0;

    for node in find_text_nodes(&root) {
        if has_ancestor(&node, NO_LINKS) || has_ancestor_where(&node, is_math_role) {
            continue;
        }

        let text = match node_text(&node) {
            Some(text) if !text.trim().is_empty() => text,
            _ => continue,
        };

        let mut cursor = 0;
        let mut pieces: Vec<Handle> = Vec::new();
        for reference in find_cross_references(&text) {
            let target = match reference.target_id() {
                Some(target) => target,
                None => continue,
            };
            if !context.ids.is_taken(&target) {
                dangling += 1;
                continue;
            }
            if reference.start < cursor {
                continue;
            }

            if reference.start > cursor {
                pieces.push(create_text_node(&text[cursor..reference.start]));
            }
            let href = format!("#{target}");
            let link = context.element("a", &[("href", &href)]);
            append_child(&link, &create_text_node(&text[reference.start..reference.end]));
            pieces.push(link);

            cursor = reference.end;
            linked += 1;
        }

        if pieces.is_empty() {
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

    debug!(linked, dangling, "linked cross references");
    Ok(linked)
}

fn is_math_role(node: &Handle) -> bool {
    get_node_attr(node, "role")
        .map(|role| role.trim().eq_ignore_ascii_case("math"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use crate::enhancer::{Enhancer, WcagOptions};

    fn enhance(html: &str) -> String {
        let options = WcagOptions {
            enhance_math: false,
            ..WcagOptions::default()
        };
        Enhancer::new(options).enhance(html).unwrap()
    }

    #[test]
    fn test_figure_mention_becomes_link() {
        let html = enhance(
            "<p>As Figure 1 shows, it works.</p><figure><img src=\"a.png\" alt=\"Plot\"></figure>",
        );

        assert!(html.contains("<p>As <a href=\"#figure-1\">Figure 1</a> shows, it works.</p>"));
    }

    #[test]
    fn test_table_mention_becomes_link() {
        let html = enhance("<p>See Table 1.</p><p>a\tb</p><p>1\t2</p>");
        assert!(html.contains("<p>See <a href=\"#table-1\">Table 1</a>.</p>"));
    }

    #[test]
    fn test_ranges_and_missing_targets_stay_text() {
        let html = enhance(
            "<p>Figures 1-2 and Table 9 are discussed.</p><figure><img src=\"a.png\" alt=\"Plot\"></figure>",
        );

        assert!(html.contains("<p>Figures 1-2 and Table 9 are discussed.</p>"));
        assert!(!html.contains("href=\"#table-9\""));
    }

    #[test]
    fn test_existing_links_and_captions_are_skipped() {
        let html = enhance(
            "<p><a href=\"other.html\">Figure 1</a></p>\
             <figure><img src=\"a.png\" alt=\"Plot\"><figcaption>Figure 1: Plot</figcaption></figure>",
        );

        assert_eq!(html.matches("href=\"#figure-1\"").count(), 0);
        assert!(html.contains("<figcaption id=\"figure-1-caption\">Figure 1: Plot<details>"));
    }

    #[test]
    fn test_linking_is_idempotent() {
        let enhancer = Enhancer::new(WcagOptions::default());
        let once = enhancer
            .enhance("<p>Figure 1 below.</p><figure><img src=\"a.png\" alt=\"Plot\"></figure>")
            .unwrap();
        let twice = enhancer.enhance(&once).unwrap();

        assert_eq!(once.matches("href=\"#figure-1\"").count(), 1);
        assert_eq!(once, twice);
    }
}
