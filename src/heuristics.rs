//! Structure-recovery heuristics
//!
//! Pure classification functions over single text fragments. Nothing in
//! here touches the document tree; the enhancer and the HTML builder call
//! these to decide what a paragraph or an image really is.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::utils::static_regex;

/// Headings whose following paragraphs are treated as a reference list
pub const REFERENCE_HEADINGS: [&str; 3] = ["references", "bibliography", "works cited"];

/// Symbols counted when deciding whether alt text describes math
pub const MATH_SYMBOLS: [char; 37] = [
    '=', '+', '-', '×', '÷', '^', '_', '∑', '∫', 'Σ', '∏', '√', '∞', '≤', '≥', '≠', '≈', '∈',
    '∉', '⊂', '⊃', '∪', '∩', 'α', 'β', 'γ', 'δ', 'ε', 'θ', 'λ', 'μ', 'π', 'σ', 'φ', 'ω', 'Δ',
    'Ω',
];

const MAX_SUBSECTION_TEXT: usize = 200;
const MIN_SUBSECTION_TITLE: usize = 3;
const MAX_SLUG_LENGTH: usize = 50;

/// Heading level for a paragraph that is really a lettered or numbered subsection
///
/// `A. Title` and `B) Title` become level 3, `1) Title` becomes level 4.
///
/// # Examples
///
/// ```
/// use wcagify::heuristics::detect_subsection;
///
/// assert_eq!(detect_subsection("A. Background Work"), Some(3));
/// assert_eq!(detect_subsection("2) Data Collection"), Some(4));
/// assert_eq!(detect_subsection("A. b"), None);
/// ```
pub fn detect_subsection(text: &str) -> Option<u8> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > MAX_SUBSECTION_TEXT {
        return None;
    }

    let lettered = static_regex!(r"^([A-Z])[.)]\s+([A-Z][a-zA-Z\s]+.*)$");
    let numbered = static_regex!(r"^(\d+)\)\s+([A-Z][a-zA-Z\s]+.*)$");

    for (pattern, level) in [(lettered, 3), (numbered, 4)] {
        if let Some(captures) = pattern.captures(text) {
            let title = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            if title.chars().count() >= MIN_SUBSECTION_TITLE {
                return Some(level);
            }
        }
    }

    None
}

/// One entry of a numbered reference list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLine {
    pub number: u32,
    pub content: String,
}

/// Parse `[N] content` (content may span several lines)
pub fn parse_reference_line(text: &str) -> Option<ReferenceLine> {
    let captures = static_regex!(r"(?s)^\[(\d+)\]\s*(.+)$").captures(text.trim())?;
    let number = captures.get(1)?.as_str().parse::<u32>().ok()?;
    let content = captures.get(2)?.as_str().trim().to_string();

    if content.is_empty() {
        return None;
    }

    Some(ReferenceLine { number, content })
}

/// Whether a heading introduces a reference list
pub fn is_reference_heading(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    REFERENCE_HEADINGS.contains(&text.as_str())
}

/// Cell delimiter used for one run of table-like paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDelimiter {
    Tab,
    Pipe,
    /// Three or more consecutive spaces
    SpaceRun,
}

impl RowDelimiter {
    /// Pick the delimiter for a row, preferring tab over pipe over space runs
    pub fn for_row(text: &str) -> Option<RowDelimiter> {
        if text.contains('\t') {
            Some(RowDelimiter::Tab)
        } else if text.matches('|').count() >= 2 {
            Some(RowDelimiter::Pipe)
        } else if split_on_space_runs(text).len() >= 2 {
            Some(RowDelimiter::SpaceRun)
        } else {
            None
        }
    }

    /// Split a row into trimmed, non-empty cells
    pub fn split(self, text: &str) -> Vec<String> {
        let parts: Vec<&str> = match self {
            RowDelimiter::Tab => text.split('\t').collect(),
            RowDelimiter::Pipe => text.split('|').collect(),
            RowDelimiter::SpaceRun => return split_on_space_runs(text),
        };

        parts
            .into_iter()
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn split_on_space_runs(text: &str) -> Vec<String> {
    static_regex!(r" {3,}")
        .split(text.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// A line looks like a table row when any delimiter applies to it
pub fn looks_like_table_row(text: &str) -> bool {
    RowDelimiter::for_row(text).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossRefKind {
    Figure,
    Table,
}

impl CrossRefKind {
    /// Id prefix of the element a reference points to
    pub fn id_prefix(self) -> &'static str {
        match self {
            CrossRefKind::Figure => "figure",
            CrossRefKind::Table => "table",
        }
    }
}

/// A `Figure N` / `Table N` mention inside running text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReference {
    pub kind: CrossRefKind,
    /// Byte range of the whole mention
    pub start: usize,
    pub end: usize,
    /// `None` for ranges such as `Figures 2-4`
    pub number: Option<u32>,
}

impl CrossReference {
    pub fn is_range(&self) -> bool {
        self.number.is_none()
    }

    /// Link target, `None` for ranges
    pub fn target_id(&self) -> Option<String> {
        self.number
            .map(|number| format!("{}-{}", self.kind.id_prefix(), number))
    }
}

/// Find figure and table mentions, ordered by position
pub fn find_cross_references(text: &str) -> Vec<CrossReference> {
    let figure =
        static_regex!(r"(?i)\b(Figures|Figure|Figs\.?|Fig\.?)\s+(\d+(?:\s*[-–—]\s*\d+)?)\b");
    let table = static_regex!(r"(?i)\b(Tables|Table)\s+(\d+(?:\s*[-–—]\s*\d+)?)\b");

    let mut found = Vec::new();

    for (pattern, kind) in [(figure, CrossRefKind::Figure), (table, CrossRefKind::Table)] {
        for captures in pattern.captures_iter(text) {
            let (whole, number) = match (captures.get(0), captures.get(2)) {
                (Some(whole), Some(number)) => (whole, number.as_str()),
                _ => continue,
            };

            let is_range = number.contains(['-', '–', '—']);
            found.push(CrossReference {
                kind,
                start: whole.start(),
                end: whole.end(),
                number: if is_range {
                    None
                } else {
                    number.trim().parse().ok()
                },
            });
        }
    }

    found.sort_by_key(|reference| reference.start);
    found
}

/// Whether an image most likely shows a formula
pub fn is_math_image(src: &str, alt: &str) -> bool {
    let src = src.to_lowercase();
    if ["math", "equation", "formula"]
        .iter()
        .any(|keyword| src.contains(keyword))
    {
        return true;
    }

    let symbols: HashSet<char> = alt
        .chars()
        .filter(|c| MATH_SYMBOLS.contains(c))
        .collect();
    if symbols.len() >= 2 {
        return true;
    }

    static_regex!(r"(?i)[a-z]_\{|\^[\{\d]|\\[a-z]+|\b(?:sum|int|lim)\b").is_match(alt)
}

const MATH_DESCRIPTION_RULES: [(&str, &str); 17] = [
    (r"Σ|∑|\\sum", " the sum of "),
    (r"∏|\\prod", " the product of "),
    (r"∫|\\int", " the integral of "),
    (r"√|\\sqrt", " the square root of "),
    (r"≤|\\leq?\b", " less than or equal to "),
    (r"≥|\\geq?\b", " greater than or equal to "),
    (r"≠|\\neq?\b", " not equal to "),
    (r"≈|\\approx", " approximately equal to "),
    (r"∉|\\notin", " is not an element of "),
    (r"∈|\\in\b", " is an element of "),
    (r"⊂|\\subset", " is a subset of "),
    (r"∪|\\cup", " union "),
    (r"∩|\\cap", " intersection "),
    (r"_\{([^}]+)\}", " subscript ${1} "),
    (r"\^\{([^}]+)\}", " superscript ${1} "),
    (r"_([a-zA-Z0-9])", " subscript ${1} "),
    (r"\^([a-zA-Z0-9])", " superscript ${1} "),
];

fn math_description_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        MATH_DESCRIPTION_RULES
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|re| (re, *replacement))
            })
            .collect()
    })
}

/// Spoken-style walk through the notation in a math image's alt text
///
/// # Examples
///
/// ```
/// use wcagify::heuristics::describe_math;
///
/// assert_eq!(
///     describe_math("x_{i} ≤ 1"),
///     "Mathematical expression: x subscript i less than or equal to 1"
/// );
/// ```
pub fn describe_math(alt: &str) -> String {
    let mut description = alt.to_string();

    for (pattern, replacement) in math_description_rules() {
        description = pattern.replace_all(&description, *replacement).to_string();
    }

    let description = description.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("Mathematical expression: {description}")
}

fn fold_to_ascii(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' | 'ń' => 'n',
        'Ñ' | 'Ń' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'š' | 'ś' => 's',
        'Š' | 'Ś' => 'S',
        'ž' | 'ź' | 'ż' => 'z',
        'Ž' | 'Ź' | 'Ż' => 'Z',
        c if c.is_ascii() => c,
        _ => return None,
    };
    Some(folded)
}

/// URL-safe id fragment for a heading
///
/// Accents are folded to ASCII, anything else outside `[a-z0-9 -]` is
/// dropped, whitespace becomes `-` and the result is capped at 50 chars.
/// Falls back to `heading` when nothing survives.
pub fn slugify(text: &str) -> String {
    let folded: String = text.chars().filter_map(fold_to_ascii).collect();
    let lowered = folded.to_lowercase();

    let kept = static_regex!(r"[^a-z0-9\s-]").replace_all(&lowered, "");
    let dashed = static_regex!(r"[\s_]+").replace_all(&kept, "-");
    let collapsed = static_regex!(r"-+").replace_all(&dashed, "-");

    let slug: String = collapsed.trim_matches('-').chars().take(MAX_SLUG_LENGTH).collect();
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "heading".to_string()
    } else {
        slug.to_string()
    }
}

const HEADING_KEYWORDS: [&str; 25] = [
    "abstract",
    "introduction",
    "conclusion",
    "conclusions",
    "references",
    "acknowledgment",
    "acknowledgement",
    "appendix",
    "bibliography",
    "methods",
    "methodology",
    "results",
    "discussion",
    "background",
    "related work",
    "future work",
    "evaluation",
    "experiments",
    "overview",
    "summary",
    "implementation",
    "architecture",
    "approach",
    "contributions",
    "limitations",
];

fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

/// Whether a block of extracted text is a section heading
pub fn is_heading_text(text: &str) -> bool {
    let text = text.trim();
    let length = text.chars().count();
    if !(5..=200).contains(&length) {
        return false;
    }

    let lowered = text.to_lowercase();
    for keyword in HEADING_KEYWORDS {
        if lowered == keyword {
            return true;
        }
    }

    let personal_name = static_regex!(r"^[A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?$");
    let not_a_heading = static_regex!(
        r"(?i)University|Institute|Department|College|@|^Fig\.|^Table|^\d+$|^\[\d+\]|^\d+\)\s+[A-Z]|^[A-Z]\s+[A-Z]$"
    );
    if personal_name.is_match(text) || not_a_heading.is_match(text) {
        return false;
    }

    if static_regex!(r"^[IVX]+\.\s+[A-Z]").is_match(text)
        || static_regex!(r"^\d+(?:\.\d+)*\.?\s+[A-Z]").is_match(text)
    {
        return true;
    }

    if is_all_caps(text) && length < 100 && text.split_whitespace().count() >= 2 {
        return true;
    }

    let numbered_keyword = static_regex!(r"^[ivx\d]+\.?\s*([a-z][a-z ]*)$");
    if let Some(captures) = numbered_keyword.captures(&lowered) {
        let rest = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        return HEADING_KEYWORDS.contains(&rest);
    }

    false
}

/// Heading level (2-4) implied by a heading's numbering
pub fn heading_level_for(text: &str) -> u8 {
    let text = text.trim();

    if static_regex!(r"^[IVX]+\.\s+").is_match(text) || is_all_caps(text) {
        2
    } else if static_regex!(r"^[A-Z]\.\s+").is_match(text) {
        3
    } else if static_regex!(r"^\d+\.\d+\.\d+").is_match(text) {
        4
    } else if static_regex!(r"^\d+\.\d+\.?\s+").is_match(text) {
        3
    } else {
        2
    }
}

/// Split `I. INTRODUCTION Large language models...` into heading and body
pub fn split_heading_from_paragraph(text: &str) -> Option<(String, String)> {
    let candidates: [(&Regex, usize); 3] = [
        (
            static_regex!(r"^([IVX]+\.\s+[A-Z][A-Z\s]+?)(\s+[A-Z][a-z].+)$"),
            100,
        ),
        (
            static_regex!(r"^(\d+\.\s+[A-Z][a-z][^\n]{5,50}?)(\s+[A-Z][a-z].+)$"),
            80,
        ),
        (
            static_regex!(r"^([A-Z]\.\s+[A-Z][a-z][^\n]{5,50}?)(\s+[A-Z][a-z].+)$"),
            80,
        ),
    ];

    for (pattern, max_heading) in candidates {
        if let Some(captures) = pattern.captures(text) {
            let heading = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let remainder = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            if heading.chars().count() < max_heading && remainder.chars().count() > 50 {
                return Some((heading.to_string(), remainder.to_string()));
            }
        }
    }

    None
}

/// Normalise one paragraph of extracted text
///
/// Collapses runs of spaces, joins lines and glues words hyphenated across
/// a line break back together.
pub fn clean_paragraph(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| static_regex!(r"  +").replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    let mut joined = String::new();
    for (i, line) in lines.iter().enumerate() {
        match line.strip_suffix('-') {
            Some(stem) if i + 1 < lines.len() => joined.push_str(stem),
            _ => {
                joined.push_str(line);
                joined.push(' ');
            }
        }
    }

    let joined = joined.trim();
    if static_regex!(r"^\d+$").is_match(joined) {
        return String::new();
    }

    static_regex!(r"\s+").replace_all(joined, " ").trim().to_string()
}
