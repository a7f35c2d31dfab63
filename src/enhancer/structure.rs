//! Structure phase: landmarks, skip link and `<section>` wrapping

use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use super::PhaseContext;
use crate::core::WcagError;
use crate::parsers::html::{
    append_child, create_text_node, element_children, find_elements, find_elements_where,
    find_first_element, following_siblings, get_node_attr, get_node_name, has_ancestor, has_class,
    insert_before, insert_child, is_element, replace_node, set_node_attr, text_content,
};

pub const MAIN_ID: &str = "main-content";
const MAIN_HREF: &str = "#main-content";
pub const SKIP_LINK_TEXT: &str = "Skip to main content";

/// Top-level body children that stay outside `<main>`
const OUTSIDE_MAIN: &[&str] = &["header", "footer", "nav", "script", "style", "noscript", "template"];

pub fn apply(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let mut changes = 0;

    if context.options.add_aria_landmarks {
        changes += ensure_landmarks(context)?;
    }
    if context.options.add_skip_link {
        changes += ensure_skip_link(context)?;
    }
    if context.options.use_sections {
        changes += wrap_sections(context)?;
    }

    Ok(changes)
}

/// A `.skip-link`, or any link to `#main-content` placed outside `<main>`
fn is_skip_link(node: &Handle) -> bool {
    is_element(node, "a")
        && (has_class(node, "skip-link")
            || (get_node_attr(node, "href").as_deref() == Some(MAIN_HREF)
                && !has_ancestor(node, &["main"])))
}

fn has_role(node: &Handle, role: &str) -> bool {
    get_node_attr(node, "role")
        .map(|r| r.trim().eq_ignore_ascii_case(role))
        .unwrap_or(false)
}

/// Exactly one `<main role="main">`, plus banner/contentinfo/navigation roles
fn ensure_landmarks(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let body = context.body()?;
    let mut changes = 0;

    let mut mains = find_elements(&body, &["main"]);
    let main = if mains.is_empty() {
        changes += 1 + free_main_id(context, None);
        synthesize_main(context, &body)
    } else {
        let main = mains.remove(0);
        for extra in mains {
            demote_main(context, &extra);
            changes += 1;
        }
        main
    };

    if !has_role(&main, "main") {
        set_node_attr(&main, "role", Some("main".to_string()));
    }
    match get_node_attr(&main, "id") {
        Some(id) if id == MAIN_ID => {}
        previous => {
            changes += free_main_id(context, Some(&main));
            set_node_attr(&main, "id", Some(MAIN_ID.to_string()));
            if let Some(previous) = previous {
                context.ids.release(&previous);
                changes += retarget_links(context, &previous);
            }
        }
    }

    // Only one element may carry the main role
    for stray in find_elements_where(&body, |node| has_role(node, "main")) {
        if !Rc::ptr_eq(&stray, &main) {
            set_node_attr(&stray, "role", None);
            changes += 1;
        }
    }

    for child in element_children(&body) {
        let role = match get_node_name(&child) {
            Some("header") => "banner",
            Some("footer") => "contentinfo",
            _ => continue,
        };
        if get_node_attr(&child, "role").is_none() {
            set_node_attr(&child, "role", Some(role.to_string()));
            changes += 1;
        }
    }

    for nav in find_elements(&body, &["nav"]) {
        if get_node_attr(&nav, "role").is_none() {
            set_node_attr(&nav, "role", Some("navigation".to_string()));
            changes += 1;
        }
    }

    Ok(changes)
}

/// Move every top-level content node into a new `<main>`
fn synthesize_main(context: &mut PhaseContext, body: &Handle) -> Handle {
    let main = context.element("main", &[("id", MAIN_ID), ("role", "main")]);

    let relocated: Vec<Handle> = body
        .children
        .borrow()
        .iter()
        .filter(|child| !OUTSIDE_MAIN.iter().any(|name| is_element(child, name)) && !is_skip_link(child))
        .cloned()
        .collect();

    match relocated.first() {
        Some(first) => insert_before(first, &main),
        None => {
            // after a leading header/nav when there is nothing to wrap
            let index = body
                .children
                .borrow()
                .iter()
                .position(|child| is_element(child, "footer") || is_element(child, "script"))
                .unwrap_or(body.children.borrow().len());
            insert_child(body, index, &main);
        }
    }

    for node in &relocated {
        append_child(&main, node);
    }

    debug!(moved = relocated.len(), "synthesized main landmark");
    main
}

/// Reserve `main-content` for `main`, renaming any other element holding it
fn free_main_id(context: &mut PhaseContext, main: Option<&Handle>) -> usize {
    let holders = find_elements_where(&context.dom.document, |node| {
        get_node_attr(node, "id").as_deref() == Some(MAIN_ID)
    });

    let mut renamed = 0;
    for holder in holders {
        if main.is_some_and(|main| Rc::ptr_eq(main, &holder)) {
            continue;
        }
        let id = context.ids.unique_from(MAIN_ID);
        debug!(to = %id, "renamed element holding the main landmark id");
        set_node_attr(&holder, "id", Some(id));
        renamed += 1;
    }

    // a renamed holder hands its registry entry over to main
    if renamed == 0 {
        context.ids.claim(MAIN_ID);
    }
    renamed
}

/// Point in-page links at `#main-content` after main lost `previous_id`
fn retarget_links(context: &PhaseContext, previous_id: &str) -> usize {
    let old_href = format!("#{previous_id}");
    let links = find_elements_where(&context.dom.document, |node| {
        is_element(node, "a") && get_node_attr(node, "href").as_deref() == Some(old_href.as_str())
    });
    for link in &links {
        set_node_attr(link, "href", Some(MAIN_HREF.to_string()));
    }
    links.len()
}

/// Turn a surplus `<main>` into a `<div>` carrying its attributes and children
fn demote_main(context: &PhaseContext, extra: &Handle) {
    let div = context.element("div", &[]);
    if let NodeData::Element { attrs, .. } = &extra.data {
        for attr in attrs.borrow().iter() {
            if &*attr.name.local != "role" {
                set_node_attr(&div, &attr.name.local, Some(attr.value.to_string()));
            }
        }
    }
    let children: Vec<Handle> = extra.children.borrow().iter().cloned().collect();
    for child in &children {
        append_child(&div, child);
    }
    replace_node(extra, &div);
    debug!("demoted extra main element");
}

fn ensure_skip_link(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let body = context.body()?;
    if find_elements_where(&body, is_skip_link).first().is_some() {
        return Ok(0);
    }

    let target = find_first_element(&body, &["main"])
        .and_then(|main| get_node_attr(&main, "id"))
        .unwrap_or_else(|| MAIN_ID.to_string());
    let href = format!("#{target}");

    let link = context.element("a", &[("href", &href), ("class", "skip-link")]);
    append_child(&link, &create_text_node(SKIP_LINK_TEXT));
    insert_child(&body, 0, &link);

    Ok(1)
}

/// Section id for a heading id: `intro-heading` -> `intro`, `intro` -> `section-intro`
fn section_id_for(heading_id: &str) -> String {
    match heading_id.strip_suffix("-heading") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => format!("section-{heading_id}"),
    }
}

/// Wrap each `<h2>` and its following siblings in a labelled `<section>`
fn wrap_sections(context: &mut PhaseContext) -> Result<usize, WcagError> {
    let root = context.content_root()?;
    let mut wrapped = 0;

    for heading in find_elements(&root, &["h2"]) {
        if has_ancestor(&heading, &["section"]) {
            continue;
        }

        let heading_id = match get_node_attr(&heading, "id") {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                let id = context.ids.unique_slug(&text_content(&heading));
                set_node_attr(&heading, "id", Some(id.clone()));
                id
            }
        };

        // snapshot before any node moves
        let content: Vec<Handle> = following_siblings(&heading)
            .into_iter()
            .take_while(|sibling| !is_element(sibling, "h2"))
            .collect();

        let section_id = context.ids.unique_from(&section_id_for(&heading_id));
        let section = context.element(
            "section",
            &[("aria-labelledby", &heading_id), ("id", &section_id)],
        );

        insert_before(&heading, &section);
        append_child(&section, &heading);
        for node in &content {
            append_child(&section, node);
        }

        wrapped += 1;
    }

    debug!(sections = wrapped, "wrapped sections");
    Ok(wrapped)
}
