//! # Utilities
//!
//! - `static_regex!` - compile a hard-coded pattern once and reuse it
//! - data URL creation for inlined images

use base64::prelude::{Engine, BASE64_STANDARD};

/// Compile a regex literal once and hand out a `&'static Regex`
///
/// Only ever used with literal patterns, which are covered by unit tests.
macro_rules! static_regex {
    ($pattern:expr $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).expect("hard-coded regex must compile"))
    }};
}

pub(crate) use static_regex;

/// Build a base64 `data:` URL for the given payload
pub fn create_data_url(media_type: &str, data: &[u8]) -> String {
    let media_type = if media_type.is_empty() {
        "application/octet-stream"
    } else {
        media_type
    };

    format!("data:{};base64,{}", media_type, BASE64_STANDARD.encode(data))
}
