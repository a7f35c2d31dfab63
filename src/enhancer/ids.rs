//! Per-run registry of element ids
//!
//! Seeded with the ids already present in the document, so generated ids
//! never collide with authored ones. Lives for exactly one `enhance()` call.

use std::collections::HashMap;

use markup5ever_rcdom::Handle;
use tracing::debug;

use crate::heuristics::slugify;
use crate::parsers::html::{find_elements_where, get_node_attr, set_node_attr};

#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    /// id -> number of elements holding it
    taken: HashMap<String, usize>,
    /// base slug -> collision count
    heading_ids: HashMap<String, usize>,
    figure_counter: u32,
    table_counter: u32,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a document, renaming duplicate ids on the way
    ///
    /// The first element holding an id keeps it; later holders get a
    /// `-N` suffix. Empty `id` attributes are removed.
    pub fn from_document(root: &Handle) -> Self {
        let mut registry = IdRegistry::new();

        let holders = find_elements_where(root, |node| get_node_attr(node, "id").is_some());
        let mut duplicates = Vec::new();

        for node in holders {
            let id = get_node_attr(&node, "id").unwrap_or_default();
            if id.trim().is_empty() {
                set_node_attr(&node, "id", None);
            } else if registry.is_taken(&id) {
                duplicates.push((node, id));
            } else {
                registry.claim(&id);
            }
        }

        for (node, id) in duplicates {
            let renamed = registry.unique_from(&id);
            debug!(from = %id, to = %renamed, "renamed duplicate id");
            set_node_attr(&node, "id", Some(renamed));
        }

        registry
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.get(id).copied().unwrap_or(0) > 0
    }

    /// Record `id` as used
    pub fn claim(&mut self, id: &str) {
        *self.taken.entry(id.to_string()).or_insert(0) += 1;
    }

    /// Forget one holder of `id`
    pub fn release(&mut self, id: &str) {
        if let Some(count) = self.taken.get_mut(id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.taken.remove(id);
            }
        }
    }

    /// Claim `base`, or `base-N` for the smallest free N
    pub fn unique_from(&mut self, base: &str) -> String {
        if !self.is_taken(base) {
            self.claim(base);
            return base.to_string();
        }

        loop {
            let count = self.heading_ids.entry(base.to_string()).or_insert(0);
            *count += 1;
            let candidate = format!("{base}-{count}");
            if !self.is_taken(&candidate) {
                self.claim(&candidate);
                return candidate;
            }
        }
    }

    /// Claim a unique slug derived from heading text
    pub fn unique_slug(&mut self, text: &str) -> String {
        self.unique_from(&slugify(text))
    }

    /// Next free `figure-N` id together with its number
    pub fn next_figure_id(&mut self) -> (u32, String) {
        loop {
            self.figure_counter += 1;
            let id = format!("figure-{}", self.figure_counter);
            if !self.is_taken(&id) {
                self.claim(&id);
                return (self.figure_counter, id);
            }
        }
    }

    /// Next free `table-N` id together with its number
    pub fn next_table_id(&mut self) -> (u32, String) {
        loop {
            self.table_counter += 1;
            let id = format!("table-{}", self.table_counter);
            if !self.is_taken(&id) {
                self.claim(&id);
                return (self.table_counter, id);
            }
        }
    }

    pub fn figure_count(&self) -> u32 {
        self.figure_counter
    }

    pub fn table_count(&self) -> u32 {
        self.table_counter
    }
}
