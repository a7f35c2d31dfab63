//! Alt text generation contract
//!
//! Real alt text comes from vision models or OCR, which live outside this
//! crate. The enhancer only knows the `AltTextProvider` trait; the built-in
//! `CaptionAltTextProvider` derives alt text from caption text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for short alt text, in characters
pub const MAX_ALT_TEXT_LENGTH: usize = 150;

/// Where a piece of alt text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltTextSource {
    Ai,
    Ocr,
    Caption,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltTextResult {
    /// At most `MAX_ALT_TEXT_LENGTH` characters
    pub alt_text: String,
    pub long_description: String,
    pub source: AltTextSource,
    pub success: bool,
}

impl AltTextResult {
    /// Successful result; `alt_text` is shortened at a word boundary when too long
    pub fn new(alt_text: &str, long_description: &str, source: AltTextSource) -> Self {
        AltTextResult {
            alt_text: truncate_alt_text(alt_text),
            long_description: long_description.trim().to_string(),
            source,
            success: true,
        }
    }

    /// Placeholder used whenever no real description is available
    pub fn generic(figure_number: u32) -> Self {
        AltTextResult {
            alt_text: format!("Figure {figure_number}"),
            long_description: String::new(),
            source: AltTextSource::Generic,
            success: false,
        }
    }
}

/// What a provider gets to look at
#[derive(Debug, Clone, Default)]
pub struct ImageContext {
    pub src: String,
    pub figure_number: u32,
    /// Existing caption text, if any
    pub caption: Option<String>,
    /// Text right before the figure
    pub surrounding_text: Option<String>,
    /// Raw image bytes when the image could be read locally
    pub image_data: Option<Vec<u8>>,
    pub image_quality: u8,
    pub max_image_width: u32,
}

#[derive(Error, Debug)]
pub enum AltTextError {
    #[error("Nothing to derive alt text from")]
    NoSource,

    #[error("Alt text service unavailable: {0}")]
    Unavailable(String),
}

pub trait AltTextProvider {
    fn generate(&self, context: &ImageContext) -> Result<AltTextResult, AltTextError>;
}

/// Alt text from the figure caption, or from the sentence introducing the figure
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionAltTextProvider;

impl AltTextProvider for CaptionAltTextProvider {
    fn generate(&self, context: &ImageContext) -> Result<AltTextResult, AltTextError> {
        if let Some(caption) = context.caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let caption = strip_figure_label(caption);
            if !caption.is_empty() {
                return Ok(AltTextResult::new(caption, caption, AltTextSource::Caption));
            }
        }

        if let Some(text) = context
            .surrounding_text
            .as_deref()
            .map(str::trim)
            .filter(|t| t.to_lowercase().contains("figure") || t.ends_with(':'))
        {
            let sentence = text.rsplit(['.', '!', '?']).find(|s| !s.trim().is_empty()).unwrap_or(text);
            let sentence = sentence.trim().trim_end_matches(':').trim();
            if !sentence.is_empty() {
                return Ok(AltTextResult::new(sentence, "", AltTextSource::Caption));
            }
        }

        Err(AltTextError::NoSource)
    }
}

/// `Figure 3: A cat` -> `A cat`
fn strip_figure_label(caption: &str) -> &str {
    let lowered = caption.to_lowercase();
    for label in ["figure", "fig."] {
        if lowered.starts_with(label) {
            let rest = &caption[label.len()..];
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit() || c.is_whitespace());
            let rest = rest.trim_start_matches([':', '.', '-', '–']).trim();
            return if rest.is_empty() { caption } else { rest };
        }
    }
    caption
}

fn truncate_alt_text(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= MAX_ALT_TEXT_LENGTH {
        return text;
    }

    let budget = MAX_ALT_TEXT_LENGTH - 3;
    let cut: String = text.chars().take(budget).collect();
    let cut = match cut.rfind(' ') {
        Some(index) if index > budget / 2 => &cut[..index],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}
