//! Semantic content phase
//!
//! Promotes paragraphs that are really something else: lettered/numbered
//! subsection titles become headings, `[N] ...` paragraphs after a
//! references heading become an ordered list, and runs of delimited
//! paragraphs become tables.

use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use super::PhaseContext;
use crate::core::WcagError;
use crate::heuristics::{
    detect_subsection, is_reference_heading, looks_like_table_row, parse_reference_line,
    ReferenceLine, RowDelimiter,
};
use crate::parsers::html::{
    add_class, append_child, create_text_node, detach, find_elements, following_siblings,
    get_parent_node, has_ancestor, heading_level, insert_before, is_element, is_whitespace_text,
    previous_element_sibling, replace_node, text_content,
};
use crate::utils::static_regex;

/// Paragraphs inside these never get promoted
const CONTAINED: &[&str] = &[
    "table", "figure", "figcaption", "li", "blockquote", "header", "footer", "nav", "details",
];

pub fn apply(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let mut changes = 0;

    if context.options.detect_subsections {
        changes += promote_subsections(context)?;
    }
    if context.options.detect_references {
        changes += build_reference_lists(context)?;
    }
    if context.options.detect_tables {
        changes += build_tables(context)?;
    }

    Ok(changes)
}

fn candidate_paragraphs(root: &Handle) -> Vec<Handle> {
    find_elements(root, &["p"])
        .into_iter()
        .filter(|p| !has_ancestor(p, CONTAINED))
        .collect()
}

fn move_children(from: &Handle, to: &Handle) {
    let children: Vec<Handle> = from.children.borrow().iter().cloned().collect();
    for child in &children {
        append_child(to, child);
    }
}

fn promote_subsections(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let root = context.content_root()?;
    let mut promoted = 0;

    for paragraph in candidate_paragraphs(&root) {
        let text = text_content(&paragraph);
        let level = match detect_subsection(&text) {
            Some(level) => level,
            None => continue,
        };

        let id = context.ids.unique_slug(&text);
        let heading = context.element(&format!("h{level}"), &[("id", &id)]);
        move_children(&paragraph, &heading);
        replace_node(&paragraph, &heading);
        promoted += 1;
    }

    debug!(promoted, "promoted subsection headings");
    Ok(promoted)
}

fn build_reference_lists(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let body = context.body()?;
    let mut built = 0;

    let headings = find_elements(&body, &["h1", "h2", "h3", "h4", "h5", "h6"]);
    for heading in headings {
        if !is_reference_heading(&text_content(&heading)) {
            continue;
        }

        let run = reference_run(&heading);
        let first = match run.first() {
            Some((paragraph, _)) => paragraph.clone(),
            None => continue,
        };

        let list = context.element("ol", &[]);
        for (paragraph, reference) in &run {
            let candidate = format!("ref-{}", reference.number);
            let id = context.ids.unique_from(&candidate);
            let value = reference.number.to_string();
            let item = context.element("li", &[("id", &id), ("value", &value)]);
            fill_reference_item(&item, paragraph, reference);
            append_child(&list, &item);
        }

        insert_before(&first, &list);
        for (paragraph, _) in &run {
            detach(paragraph);
        }

        if let Some(parent) = get_parent_node(&heading) {
            if is_element(&parent, "section") {
                add_class(&parent, "references");
            }
        }

        debug!(references = run.len(), "built reference list");
        built += run.len();
    }

    Ok(built)
}

/// The contiguous `[N] ...` paragraphs right after a references heading
fn reference_run(heading: &Handle) -> Vec<(Handle, ReferenceLine)> {
    let mut run = Vec::new();

    for sibling in following_siblings(heading) {
        match &sibling.data {
            NodeData::Text { .. } if is_whitespace_text(&sibling) => continue,
            NodeData::Comment { .. } => continue,
            NodeData::Element { .. } => {
                if heading_level(&sibling).is_some() || is_element(&sibling, "section") {
                    break;
                }
                if !is_element(&sibling, "p") {
                    break;
                }
                match parse_reference_line(&text_content(&sibling)) {
                    Some(reference) => run.push((sibling.clone(), reference)),
                    None => break,
                }
            }
            _ => break,
        }
    }

    run
}

/// Move the paragraph's content into the list item, minus the `[N]` marker
fn fill_reference_item(item: &Handle, paragraph: &Handle, reference: &ReferenceLine) {
    let only_text = paragraph
        .children
        .borrow()
        .iter()
        .all(|child| matches!(child.data, NodeData::Text { .. }));

    if only_text {
        append_child(item, &create_text_node(&reference.content));
        return;
    }

    move_children(paragraph, item);

    let first_text = item
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Text { .. }))
        .cloned();
    if let Some(node) = first_text {
        if let NodeData::Text { contents } = &node.data {
            let stripped = static_regex!(r"^\s*\[\d+\]\s*")
                .replace(&contents.borrow(), "")
                .to_string();
            let mut contents = contents.borrow_mut();
            contents.clear();
            contents.push_slice(&stripped);
        }
    }
}

fn build_tables(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let root = context.content_root()?;
    let paragraphs = candidate_paragraphs(&root);
    let mut built = 0;

    let mut i = 0;
    while i < paragraphs.len() {
        if !looks_like_table_row(text_content(&paragraphs[i]).trim()) {
            i += 1;
            continue;
        }

        let mut run = vec![paragraphs[i].clone()];
        let mut j = i + 1;
        while j < paragraphs.len() {
            let next = &paragraphs[j];
            let adjacent = previous_element_sibling(next)
                .map(|previous| run.last().map(|last| Rc::ptr_eq(&previous, last)).unwrap_or(false))
                .unwrap_or(false);
            if !adjacent || !looks_like_table_row(text_content(next).trim()) {
                break;
            }
            run.push(next.clone());
            j += 1;
        }

        if run.len() >= 2 {
            build_table(context, &run);
            built += 1;
            i = j;
        } else {
            i += 1;
        }
    }

    debug!(tables = built, "built tables from delimited paragraphs");
    Ok(built)
}

fn build_table(context: &mut PhaseContext, rows: &[Handle]) {
    let texts: Vec<String> = rows.iter().map(|row| text_content(row).trim().to_string()).collect();
    let delimiter = RowDelimiter::for_row(&texts[0]).unwrap_or(RowDelimiter::SpaceRun);

    let (_, id) = context.ids.next_table_id();
    let table = context.element("table", &[("id", &id)]);

    let thead = context.element("thead", &[]);
    let header_row = context.element("tr", &[]);
    for cell in delimiter.split(&texts[0]) {
        let th = context.element("th", &[("scope", "col")]);
        append_child(&th, &create_text_node(&cell));
        append_child(&header_row, &th);
    }
    append_child(&thead, &header_row);
    append_child(&table, &thead);

    let tbody = context.element("tbody", &[]);
    for text in &texts[1..] {
        let tr = context.element("tr", &[]);
        for cell in delimiter.split(text) {
            let td = context.element("td", &[]);
            append_child(&td, &create_text_node(&cell));
            append_child(&tr, &td);
        }
        append_child(&tbody, &tr);
    }
    append_child(&table, &tbody);

    insert_before(&rows[0], &table);
    for row in rows {
        detach(row);
    }
}

#[cfg(test)]
mod tests {
    use crate::enhancer::{Enhancer, WcagOptions};

    fn semantic_only() -> WcagOptions {
        WcagOptions {
            add_skip_link: false,
            use_sections: false,
            enhance_figures: false,
            embed_images: false,
            enhance_math: false,
            create_figure_links: false,
            ..WcagOptions::default()
        }
    }

    fn enhance(html: &str) -> String {
        Enhancer::new(semantic_only()).enhance(html).unwrap()
    }

    #[test]
    fn test_references_become_ordered_list() {
        let html = enhance("<h2>References</h2><p>[1] Smith, J.</p><p>[2] Doe, A.</p>");

        assert!(html.contains(
            "<ol><li id=\"ref-1\" value=\"1\">Smith, J.</li><li id=\"ref-2\" value=\"2\">Doe, A.</li></ol>"
        ));
        assert!(!html.contains("<p>[1]"));
    }

    #[test]
    fn test_reference_run_stops_at_plain_paragraph() {
        let html = enhance("<h2>Bibliography</h2><p>[1] A.</p><p>Appendix follows.</p><p>[2] B.</p>");

        assert!(html.contains("<li id=\"ref-1\" value=\"1\">A.</li></ol><p>Appendix follows.</p>"));
        assert!(html.contains("<p>[2] B.</p>"));
    }

    #[test]
    fn test_reference_markup_is_preserved() {
        let html = enhance("<h3>Works Cited</h3><p>[7] Doe, <em>Title</em>.</p>");
        assert!(html.contains("<li id=\"ref-7\" value=\"7\">Doe, <em>Title</em>.</li>"));
    }

    #[test]
    fn test_tab_rows_become_table() {
        let html = enhance("<p>Name\tAge</p>\n<p>Ann\t30</p>");

        assert!(html.contains(
            "<thead><tr><th scope=\"col\">Name</th><th scope=\"col\">Age</th></tr></thead>"
        ));
        assert!(html.contains("<tbody><tr><td>Ann</td><td>30</td></tr></tbody>"));
        assert!(html.contains("<table id=\"table-1\">"));
        assert!(!html.contains("<p>Name"));
    }

    #[test]
    fn test_single_row_is_left_alone() {
        let html = enhance("<p>Name\tAge</p><p>Just prose here.</p>");
        assert!(!html.contains("<table"));
    }

    #[test]
    fn test_pipe_rows_use_first_row_delimiter() {
        let html = enhance("<p>a | b | c</p><p>1 | 2 | 3</p><p>x | y | z</p>");
        assert!(html.contains("<th scope=\"col\">a</th><th scope=\"col\">b</th><th scope=\"col\">c</th>"));
        assert_eq!(html.matches("<tr>").count(), 3);
    }

    #[test]
    fn test_subsection_paragraph_becomes_heading() {
        let html = enhance("<h2>Methods</h2><p>A. Data Collection</p><p>1) Survey Design</p><p>Body text.</p>");

        assert!(html.contains("<h3 id=\"a-data-collection\">A. Data Collection</h3>"));
        assert!(html.contains("<h4 id=\"1-survey-design\">1) Survey Design</h4>"));
        assert!(html.contains("<p>Body text.</p>"));
    }
}
