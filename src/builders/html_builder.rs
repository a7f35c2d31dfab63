//! Semantic HTML from extracted document structure
//!
//! Text extractors (plain `pdftotext` style output or a model that labels
//! blocks) hand over a `DocumentStructure`. `build_html` renders it as a
//! complete document with a header, labelled sections and a reference list.
//! `structure_raw_text` produces a `DocumentStructure` from unlabelled text.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enhancer::IdRegistry;
use crate::heuristics::{
    clean_paragraph, heading_level_for, is_heading_text, is_reference_heading,
    parse_reference_line, slugify, split_heading_from_paragraph,
};
use crate::utils::static_regex;

const UNTITLED: &str = "Untitled Document";
/// Unknown blocks shorter than this are dropped as extraction noise
const MIN_OTHER_BLOCK_LENGTH: usize = 30;
const MIN_BLOCK_LENGTH: usize = 5;
const TITLE_SEARCH_BLOCKS: usize = 8;
const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Kind of an extracted block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Heading,
    Paragraph,
    ListItem,
    Reference,
    FigureCaption,
    Table,
    Definition,
    Algorithm,
    Metadata,
    Author,
    Footer,
    /// Anything an extractor reports that has no dedicated rendering
    Other(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Heading => "heading",
            BlockType::Paragraph => "paragraph",
            BlockType::ListItem => "list_item",
            BlockType::Reference => "reference",
            BlockType::FigureCaption => "figure_caption",
            BlockType::Table => "table",
            BlockType::Definition => "definition",
            BlockType::Algorithm => "algorithm",
            BlockType::Metadata => "metadata",
            BlockType::Author => "author",
            BlockType::Footer => "footer",
            BlockType::Other(name) => name,
        }
    }
}

impl From<&str> for BlockType {
    fn from(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "heading" => BlockType::Heading,
            "paragraph" => BlockType::Paragraph,
            "list_item" => BlockType::ListItem,
            "reference" => BlockType::Reference,
            "figure_caption" => BlockType::FigureCaption,
            "table" => BlockType::Table,
            "definition" => BlockType::Definition,
            "algorithm" => BlockType::Algorithm,
            "metadata" => BlockType::Metadata,
            "author" => BlockType::Author,
            "footer" => BlockType::Footer,
            other => BlockType::Other(other.to_string()),
        }
    }
}

impl From<String> for BlockType {
    fn from(name: String) -> Self {
        BlockType::from(name.as_str())
    }
}

impl From<BlockType> for String {
    fn from(block_type: BlockType) -> Self {
        block_type.as_str().to_string()
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub block_type: BlockType,
    pub content: String,
    #[serde(default)]
    pub heading_level: Option<u8>,
    #[serde(default)]
    pub reference_number: Option<u32>,
}

impl TextBlock {
    pub fn new(block_type: BlockType, content: &str) -> Self {
        TextBlock {
            block_type,
            content: content.to_string(),
            heading_level: None,
            reference_number: None,
        }
    }

    pub fn heading(content: &str, level: u8) -> Self {
        TextBlock {
            heading_level: Some(level),
            ..TextBlock::new(BlockType::Heading, content)
        }
    }

    pub fn reference(content: &str, number: u32) -> Self {
        TextBlock {
            reference_number: Some(number),
            ..TextBlock::new(BlockType::Reference, content)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `I. I NTRODUCTION` (an OCR artifact) -> `I. INTRODUCTION`
fn fix_section_headers(text: &str) -> String {
    static_regex!(r"(?m)^([IVX]+\.\s+[A-Z])\s([A-Z]{2,})")
        .replace_all(text, "$1$2")
        .to_string()
}

/// Classify blank-line separated text into blocks and pick a title
///
/// The title is the first plausible paragraph among the leading blocks;
/// `fallback_title` (usually the file name) is used when there is none.
/// An `Abstract` heading followed by a paragraph becomes `abstract_text`.
pub fn structure_raw_text(raw_text: &str, fallback_title: Option<&str>) -> DocumentStructure {
    let text = fix_section_headers(raw_text);
    let mut blocks = Vec::new();

    for chunk in static_regex!(r"\n\s*\n").split(&text) {
        let paragraph = clean_paragraph(chunk);
        if paragraph.chars().count() < MIN_BLOCK_LENGTH {
            continue;
        }

        if let Some((heading, remainder)) = split_heading_from_paragraph(&paragraph) {
            blocks.push(TextBlock::heading(&heading, heading_level_for(&heading)));
            if remainder.chars().count() > MIN_OTHER_BLOCK_LENGTH {
                blocks.push(TextBlock::new(BlockType::Paragraph, &remainder));
            }
        } else if is_heading_text(&paragraph) {
            blocks.push(TextBlock::heading(&paragraph, heading_level_for(&paragraph)));
        } else if let Some(reference) = parse_reference_line(&paragraph) {
            blocks.push(TextBlock::reference(&reference.content, reference.number));
        } else {
            blocks.push(TextBlock::new(BlockType::Paragraph, &paragraph));
        }
    }

    let title = match detect_title(&blocks) {
        Some(index) => blocks.remove(index).content,
        None => fallback_title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(UNTITLED)
            .to_string(),
    };

    let abstract_text = take_abstract(&mut blocks);

    debug!(blocks = blocks.len(), title = %title, "structured raw text");
    DocumentStructure {
        title,
        authors: Vec::new(),
        abstract_text,
        blocks,
        keywords: Vec::new(),
    }
}

fn looks_like_author_names(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    words.len() <= 4
        && words.iter().filter(|word| word.chars().count() > 1).all(|word| {
            let mut chars = word.chars();
            chars.next().map(char::is_uppercase).unwrap_or(false) && chars.all(char::is_lowercase)
        })
}

/// Index of the block that is most likely the document title
fn detect_title(blocks: &[TextBlock]) -> Option<usize> {
    let not_a_title = static_regex!(r"(?i)^(?:abstract|keywords|introduction|\d|arxiv:|fig\.|table)");

    blocks
        .iter()
        .enumerate()
        .take(TITLE_SEARCH_BLOCKS)
        .find(|(_, block)| {
            let text = block.content.trim();
            let length = text.chars().count();

            block.block_type == BlockType::Paragraph
                && (15..=200).contains(&length)
                && !text.contains('@')
                && !text.contains("University")
                && !text.ends_with(',')
                && !not_a_title.is_match(text)
                && !looks_like_author_names(text)
        })
        .map(|(index, _)| index)
}

fn take_abstract(blocks: &mut Vec<TextBlock>) -> Option<String> {
    let index = blocks.iter().position(|block| {
        block.block_type == BlockType::Heading && block.content.trim().eq_ignore_ascii_case("abstract")
    })?;

    match blocks.get(index + 1) {
        Some(next) if next.block_type == BlockType::Paragraph => {
            let text = blocks.remove(index + 1).content;
            blocks.remove(index);
            Some(text)
        }
        _ => None,
    }
}

/// Short description for `<meta name="description">`
fn description(abstract_text: &str) -> String {
    let text = abstract_text.trim();
    if text.chars().count() <= MAX_DESCRIPTION_LENGTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_DESCRIPTION_LENGTH).collect();
    format!("{}...", cut.trim_end())
}

#[derive(PartialEq)]
enum OpenList {
    None,
    Items,
    References,
}

struct BodyWriter {
    html: String,
    ids: IdRegistry,
    section_open: bool,
    list: OpenList,
    /// The current section is a references section
    in_references: bool,
}

impl BodyWriter {
    fn new() -> Self {
        BodyWriter {
            html: String::new(),
            ids: IdRegistry::new(),
            section_open: false,
            list: OpenList::None,
            in_references: false,
        }
    }

    fn line(&mut self, markup: &str) {
        self.html.push_str(markup);
        self.html.push('\n');
    }

    fn close_list(&mut self) {
        match self.list {
            OpenList::Items => self.line("</ul>"),
            OpenList::References => self.line("</ol>"),
            OpenList::None => {}
        }
        self.list = OpenList::None;
    }

    fn close_section(&mut self) {
        self.close_list();
        if self.section_open {
            self.line("</section>");
            self.section_open = false;
        }
        self.in_references = false;
    }

    fn heading(&mut self, text: &str, level: u8) {
        self.close_section();

        let level = level.clamp(2, 4);
        let base = slugify(text);
        let section_id = self.ids.unique_from(&base);
        let heading_id = self.ids.unique_from(&format!("{section_id}-heading"));
        self.in_references = is_reference_heading(text);

        let class = if self.in_references {
            " class=\"references\""
        } else {
            ""
        };
        self.line(&format!(
            "<section id=\"{section_id}\"{class} aria-labelledby=\"{heading_id}\">"
        ));
        self.line(&format!(
            "<h{level} id=\"{heading_id}\">{}</h{level}>",
            escape_html(text)
        ));
        self.section_open = true;
    }

    fn reference(&mut self, text: &str, number: Option<u32>) {
        if !self.in_references {
            self.close_list();
            let marker = number.map(|n| format!("[{n}] ")).unwrap_or_default();
            self.line(&format!("<p class=\"reference\">{marker}{}</p>", escape_html(text)));
            return;
        }

        if self.list != OpenList::References {
            self.close_list();
            self.line("<ol>");
            self.list = OpenList::References;
        }
        match number {
            Some(number) => {
                let id = self.ids.unique_from(&format!("ref-{number}"));
                self.line(&format!(
                    "<li id=\"{id}\" value=\"{number}\">{}</li>",
                    escape_html(text)
                ));
            }
            None => self.line(&format!("<li>{}</li>", escape_html(text))),
        }
    }

    fn list_item(&mut self, text: &str) {
        if self.list != OpenList::Items {
            self.close_list();
            self.line("<ul>");
            self.list = OpenList::Items;
        }
        self.line(&format!("<li>{}</li>", escape_html(text)));
    }

    fn block(&mut self, block: &TextBlock) {
        let text = block.content.trim();
        if text.is_empty() {
            return;
        }

        match &block.block_type {
            BlockType::Heading => return self.heading(text, block.heading_level.unwrap_or(2)),
            BlockType::Reference => return self.reference(text, block.reference_number),
            BlockType::ListItem => return self.list_item(text),
            _ => self.close_list(),
        }

        let escaped = escape_html(text);
        match &block.block_type {
            BlockType::Paragraph => self.line(&format!("<p>{escaped}</p>")),
            BlockType::FigureCaption => {
                self.line(&format!("<figure><figcaption>{escaped}</figcaption></figure>"))
            }
            BlockType::Table => {
                // one paragraph per row, the enhancer builds the table
                self.line("<div class=\"table-content\">");
                for row in text.lines().filter(|row| !row.trim().is_empty()) {
                    self.line(&format!("<p>{}</p>", escape_html(row.trim())));
                }
                self.line("</div>");
            }
            BlockType::Definition => self.line(&format!(
                "<div class=\"definition\" role=\"region\" aria-label=\"Definition\"><p>{escaped}</p></div>"
            )),
            BlockType::Algorithm => self.line(&format!(
                "<div class=\"algorithm\" role=\"region\" aria-label=\"Algorithm\"><pre>{escaped}</pre></div>"
            )),
            BlockType::Metadata => self.line(&format!("<p class=\"metadata\">{escaped}</p>")),
            BlockType::Author | BlockType::Footer => {}
            BlockType::Other(kind) => {
                if text.chars().count() > MIN_OTHER_BLOCK_LENGTH {
                    self.line(&format!("<p>{escaped}</p>"));
                } else {
                    debug!(kind = %kind, "dropped short block of unknown type");
                }
            }
            BlockType::Heading | BlockType::Reference | BlockType::ListItem => {}
        }
    }
}

/// Render a `DocumentStructure` as a complete HTML document
pub fn build_html(structure: &DocumentStructure) -> String {
    let title = match structure.title.trim() {
        "" => UNTITLED,
        title => title,
    };
    let title = escape_html(title);

    let mut head = String::new();
    if !structure.authors.is_empty() {
        head.push_str(&format!(
            "<meta name=\"author\" content=\"{}\">\n",
            escape_html(&structure.authors.join(", "))
        ));
    }
    if !structure.keywords.is_empty() {
        head.push_str(&format!(
            "<meta name=\"keywords\" content=\"{}\">\n",
            escape_html(&structure.keywords.join(", "))
        ));
    }
    if let Some(abstract_text) = structure.abstract_text.as_deref().filter(|a| !a.trim().is_empty()) {
        head.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            escape_html(&description(abstract_text))
        ));
    }

    let mut writer = BodyWriter::new();

    writer.line("<header>");
    writer.line(&format!("<h1>{title}</h1>"));
    if !structure.authors.is_empty() {
        let authors: Vec<String> = structure
            .authors
            .iter()
            .map(|author| format!("<strong>{}</strong>", escape_html(author)))
            .collect();
        writer.line(&format!("<p class=\"authors\">{}</p>", authors.join(", ")));
    }
    writer.line("</header>");

    if let Some(abstract_text) = structure.abstract_text.as_deref().filter(|a| !a.trim().is_empty()) {
        let section_id = writer.ids.unique_from("abstract");
        let heading_id = writer.ids.unique_from("abstract-heading");
        writer.line(&format!(
            "<section id=\"{section_id}\" class=\"abstract\" aria-labelledby=\"{heading_id}\">"
        ));
        writer.line(&format!("<h2 id=\"{heading_id}\">Abstract</h2>"));
        writer.line(&format!("<p>{}</p>", escape_html(abstract_text.trim())));
        writer.line("</section>");
    }

    for block in &structure.blocks {
        writer.block(block);
    }
    writer.close_section();

    let footer: Vec<String> = structure
        .blocks
        .iter()
        .filter(|block| block.block_type == BlockType::Footer && !block.content.trim().is_empty())
        .map(|block| format!("<p>{}</p>", escape_html(block.content.trim())))
        .collect();
    if !footer.is_empty() {
        writer.line(&format!("<footer>{}</footer>", footer.join("")));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{head}</head>
<body>
{body}</body>
</html>
"#,
        title = title,
        head = head,
        body = writer.html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(blocks: Vec<TextBlock>) -> DocumentStructure {
        DocumentStructure {
            title: "A Study of Things".to_string(),
            blocks,
            ..DocumentStructure::default()
        }
    }

    #[test]
    fn test_block_type_names() {
        assert_eq!(BlockType::from("figure_caption"), BlockType::FigureCaption);
        assert_eq!(BlockType::from("Heading"), BlockType::Heading);
        assert_eq!(BlockType::from("toc_item"), BlockType::Other("toc_item".to_string()));
        assert_eq!(BlockType::ListItem.to_string(), "list_item");
    }

    #[test]
    fn test_structure_deserializes_from_json() {
        let json = r#"{
            "title": "T",
            "authors": ["Ann Lee"],
            "blocks": [
                {"block_type": "heading", "content": "Intro", "heading_level": 2},
                {"block_type": "toc_item", "content": "1 Intro ..... 3"}
            ]
        }"#;
        let structure: DocumentStructure = serde_json::from_str(json).unwrap();

        assert_eq!(structure.authors, vec!["Ann Lee".to_string()]);
        assert_eq!(structure.blocks[0].heading_level, Some(2));
        assert_eq!(structure.blocks[1].block_type, BlockType::Other("toc_item".to_string()));
    }

    #[test]
    fn test_headings_open_labelled_sections() {
        let html = build_html(&structure(vec![
            TextBlock::heading("Introduction", 1),
            TextBlock::new(BlockType::Paragraph, "Some text."),
            TextBlock::heading("Deep Detail", 6),
        ]));

        assert!(html.contains(
            "<section id=\"introduction\" aria-labelledby=\"introduction-heading\">\n\
             <h2 id=\"introduction-heading\">Introduction</h2>\n<p>Some text.</p>\n</section>"
        ));
        assert!(html.contains("<h4 id=\"deep-detail-heading\">Deep Detail</h4>"));
    }

    #[test]
    fn test_reference_section_gets_ordered_list() {
        let html = build_html(&structure(vec![
            TextBlock::heading("References", 2),
            TextBlock::reference("Smith, J. A paper.", 1),
            TextBlock::reference("Doe, A. <Another>.", 2),
        ]));

        assert!(html.contains("<section id=\"references\" class=\"references\""));
        assert!(html.contains(
            "<ol>\n<li id=\"ref-1\" value=\"1\">Smith, J. A paper.</li>\n\
             <li id=\"ref-2\" value=\"2\">Doe, A. &lt;Another&gt;.</li>\n</ol>"
        ));
    }

    #[test]
    fn test_block_renderings() {
        let html = build_html(&structure(vec![
            TextBlock::new(BlockType::FigureCaption, "Figure 1: Overview"),
            TextBlock::new(BlockType::Definition, "A graph is a pair."),
            TextBlock::new(BlockType::Algorithm, "for x in xs"),
            TextBlock::new(BlockType::ListItem, "first"),
            TextBlock::new(BlockType::ListItem, "second"),
            TextBlock::new(BlockType::Other("caption_note".to_string()), "short"),
            TextBlock::new(
                BlockType::Other("sidebar".to_string()),
                "A sidebar long enough to be kept as a paragraph.",
            ),
            TextBlock::new(BlockType::Footer, "Preprint."),
        ]));

        assert!(html.contains("<figure><figcaption>Figure 1: Overview</figcaption></figure>"));
        assert!(html.contains("<div class=\"definition\" role=\"region\" aria-label=\"Definition\">"));
        assert!(html.contains("<pre>for x in xs</pre>"));
        assert!(html.contains("<ul>\n<li>first</li>\n<li>second</li>\n</ul>"));
        assert!(!html.contains("short"));
        assert!(html.contains("<p>A sidebar long enough to be kept as a paragraph.</p>"));
        assert!(html.contains("<footer><p>Preprint.</p></footer>"));
    }

    #[test]
    fn test_header_and_metadata() {
        let html = build_html(&DocumentStructure {
            title: "Parsing & Things".to_string(),
            authors: vec!["Ann Lee".to_string(), "Bo Chen".to_string()],
            abstract_text: Some("We parse.".to_string()),
            keywords: vec!["parsing".to_string()],
            blocks: Vec::new(),
        });

        assert!(html.contains("<title>Parsing &amp; Things</title>"));
        assert!(html.contains("<meta name=\"author\" content=\"Ann Lee, Bo Chen\">"));
        assert!(html.contains("<meta name=\"keywords\" content=\"parsing\">"));
        assert!(html.contains("<meta name=\"description\" content=\"We parse.\">"));
        assert!(html.contains("<p class=\"authors\"><strong>Ann Lee</strong>, <strong>Bo Chen</strong></p>"));
        assert!(html.contains("<h2 id=\"abstract-heading\">Abstract</h2>\n<p>We parse.</p>"));
    }

    #[test]
    fn test_structure_raw_text() {
        let raw = "Deep Learning for Parsing\n\nAbstract\n\nWe study parsing with neural net-\nworks in depth.\n\n1. Introduction\n\nParsing is a core task.\n\n12\n\nReferences\n\n[1] Smith, J. Parsing.";
        let structure = structure_raw_text(raw, Some("fallback"));

        assert_eq!(structure.title, "Deep Learning for Parsing");
        assert_eq!(
            structure.abstract_text.as_deref(),
            Some("We study parsing with neural networks in depth.")
        );
        assert_eq!(
            structure.blocks,
            vec![
                TextBlock::heading("1. Introduction", 2),
                TextBlock::new(BlockType::Paragraph, "Parsing is a core task."),
                TextBlock::heading("References", 2),
                TextBlock::reference("Smith, J. Parsing.", 1),
            ]
        );
    }

    #[test]
    fn test_title_falls_back() {
        let structure = structure_raw_text("INTRODUCTION TEXT\n\nshort", Some("paper"));
        assert_eq!(structure.title, "paper");

        let structure = structure_raw_text("", None);
        assert_eq!(structure.title, UNTITLED);
    }

    #[test]
    fn test_ocr_heading_is_repaired() {
        assert_eq!(fix_section_headers("I. I NTRODUCTION"), "I. INTRODUCTION");
    }
}
