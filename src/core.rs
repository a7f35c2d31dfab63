use std::fs;
use std::io;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

use crate::builders::html_builder::{build_html, structure_raw_text};
use crate::enhancer::{Enhancer, WcagOptions};
use crate::env::{core::NoColor, EnvVar};
use crate::report::ValidationReport;
use crate::utils::static_regex;
use crate::validator::Validator;

/// Errors surfaced by the public API
///
/// Phase-internal failures inside the enhancer never show up here; they are
/// reported per phase through `PhaseOutcome`.
#[derive(Error, Debug)]
pub enum WcagError {
    /// The input could not be turned into a document tree
    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid options or configuration file
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A math, alt-text or structure collaborator failed
    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    /// The parsed tree lacks a node the pipeline cannot synthesize
    #[error("Malformed document: {0}")]
    Document(String),
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";
// `.` in a signature matches any byte
const FILE_SIGNATURES: [[&[u8]; 2]; 8] = [
    [b"GIF87a", b"image/gif"],
    [b"GIF89a", b"image/gif"],
    [b"\xFF\xD8\xFF", b"image/jpeg"],
    [b"\x89PNG\x0D\x0A\x1A\x0A", b"image/png"],
    [b"<svg ", b"image/svg+xml"],
    [b"<?xml ", b"image/svg+xml"],
    [b"RIFF....WEBPVP8", b"image/webp"],
    [b"\x00\x00\x01\x00", b"image/x-icon"],
];

/// Enhance an HTML document with the given options
///
/// # Examples
///
/// ```
/// use wcagify::core::enhance_html;
/// use wcagify::enhancer::WcagOptions;
///
/// let html = enhance_html("<h1>X</h1><p>hi</p>", &WcagOptions::default()).unwrap();
/// assert!(html.contains("<main id=\"main-content\" role=\"main\">"));
/// ```
pub fn enhance_html(html: &str, options: &WcagOptions) -> Result<String, WcagError> {
    Enhancer::new(options.clone()).enhance(html)
}

/// Validate an HTML document against the built-in WCAG 2.2 AA rules
pub fn validate_html(html: &str, strict_mode: bool) -> Result<ValidationReport, WcagError> {
    Validator::new(strict_mode).validate(html)
}

/// Turn raw extracted text into enhanced, accessible HTML
///
/// Paragraph boundaries are blank lines; headings are recognised with the
/// usual academic-paper heuristics.
pub fn convert_text(
    raw_text: &str,
    fallback_title: Option<&str>,
    options: &WcagOptions,
) -> Result<String, WcagError> {
    let structure = structure_raw_text(raw_text, fallback_title);
    let semantic = build_html(&structure);
    enhance_html(&semantic, options)
}

/// Decode a document, honouring a BOM or a `<meta charset>` in the first 1 KiB
///
/// Unknown labels fall back to UTF-8 with replacement characters.
pub fn decode_document(data: &[u8]) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(data) {
        let (text, _) = encoding.decode_without_bom_handling(&data[bom_length..]);
        return text.into_owned();
    }

    let head = String::from_utf8_lossy(&data[..data.len().min(1024)]);
    let encoding = static_regex!(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.-]+)"#)
        .captures(&head)
        .and_then(|captures| captures.get(1))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _) = encoding.decode_without_bom_handling(data);
    text.into_owned()
}

/// Read and decode an HTML or text file
pub fn read_document(path: &Path) -> Result<String, WcagError> {
    let data = fs::read(path)?;
    Ok(decode_document(&data))
}

fn matches_signature(data: &[u8], signature: &[u8]) -> bool {
    data.len() >= signature.len()
        && signature
            .iter()
            .zip(data)
            .all(|(expected, actual)| *expected == b'.' || expected == actual)
}

/// Determines the media type of image data from its magic bytes, falling back to the file name
pub fn detect_media_type(data: &[u8], file_name: &str) -> String {
    for signature in &FILE_SIGNATURES {
        if matches_signature(data, signature[0]) {
            return String::from_utf8_lossy(signature[1]).to_string();
        }
    }

    detect_media_type_by_file_name(file_name)
}

/// Determines the media type based on file extension
pub fn detect_media_type_by_file_name(filename: &str) -> String {
    let filename_lowercased = filename.to_lowercase();

    if filename_lowercased.ends_with(".svg") {
        "image/svg+xml".to_string()
    } else if filename_lowercased.ends_with(".png") {
        "image/png".to_string()
    } else if filename_lowercased.ends_with(".jpg") || filename_lowercased.ends_with(".jpeg") {
        "image/jpeg".to_string()
    } else if filename_lowercased.ends_with(".gif") {
        "image/gif".to_string()
    } else if filename_lowercased.ends_with(".webp") {
        "image/webp".to_string()
    } else if filename_lowercased.ends_with(".ico") {
        "image/x-icon".to_string()
    } else if filename_lowercased.ends_with(".bmp") {
        "image/bmp".to_string()
    } else {
        "application/octet-stream".to_string()
    }
}

/// Formats output path with title substitution and sanitization
///
/// Supported placeholders: `%title%`, `%timestamp%`, `%extension%`.
pub fn format_output_path(path: &str, document_title: Option<&str>) -> String {
    let datetime: &str = &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let title = document_title.unwrap_or("");

    path.replace("%timestamp%", &datetime.replace(':', "_"))
        .replace(
            "%title%",
            title
                .replace(['/', '\\'], "_")
                .replace('<', "[")
                .replace('>', "]")
                .replace(':', " - ")
                .replace('\"', "")
                .replace('|', "-")
                .replace('?', "")
                .trim_start_matches('.'),
        )
        .replace("%extension%", "html")
}

fn use_color() -> bool {
    !NoColor::get_or_default(false) && atty::is(atty::Stream::Stderr)
}

/// Prints an error message to stderr
pub fn print_error_message(msg: &str) {
    if use_color() {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}
