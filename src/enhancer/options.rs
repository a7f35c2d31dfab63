//! Enhancement options
//!
//! Every boolean toggles one phase or one behavior inside a phase. Defaults
//! favour maximal compliance: everything is switched on. Options can be
//! read from TOML; any key left out keeps its default.
//!
//! ```toml
//! dark_mode = false
//! document_title = "Attention Is All You Need"
//! image_quality = 70
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::WcagError;

pub const DEFAULT_WCAG_VERSION: &str = "2.2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WcagOptions {
    // Structure
    pub add_skip_link: bool,
    pub add_aria_landmarks: bool,
    pub use_sections: bool,

    // Semantic content
    pub detect_tables: bool,
    pub detect_references: bool,
    pub detect_subsections: bool,

    // Figures and math
    pub enhance_figures: bool,
    pub expandable_descriptions: bool,
    pub enhance_math: bool,
    pub mathml_fallback_text: bool,
    pub create_figure_links: bool,

    // Images
    pub embed_images: bool,
    pub generate_alt_text: bool,
    /// 1-100
    pub image_quality: u8,
    /// Pixels
    pub max_image_width: u32,

    // Presentation
    pub dark_mode: bool,
    pub reduced_motion: bool,
    pub print_styles: bool,
    pub focus_not_obscured: bool,
    pub focus_appearance_2px: bool,
    pub target_size_minimum: bool,
    pub wcag_version: String,

    // Metadata
    pub document_title: String,
    pub document_author: String,
    pub document_description: String,
}

impl Default for WcagOptions {
    fn default() -> Self {
        WcagOptions {
            add_skip_link: true,
            add_aria_landmarks: true,
            use_sections: true,
            detect_tables: true,
            detect_references: true,
            detect_subsections: true,
            enhance_figures: true,
            expandable_descriptions: true,
            enhance_math: true,
            mathml_fallback_text: true,
            create_figure_links: true,
            embed_images: true,
            generate_alt_text: true,
            image_quality: 85,
            max_image_width: 1200,
            dark_mode: true,
            reduced_motion: true,
            print_styles: true,
            focus_not_obscured: true,
            focus_appearance_2px: true,
            target_size_minimum: true,
            wcag_version: DEFAULT_WCAG_VERSION.to_string(),
            document_title: String::new(),
            document_author: String::new(),
            document_description: String::new(),
        }
    }
}

impl WcagOptions {
    /// Parse options from TOML text and validate them
    pub fn from_toml_str(text: &str) -> Result<Self, WcagError> {
        let options: WcagOptions =
            toml::from_str(text).map_err(|e| WcagError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file
    pub fn load(path: &Path) -> Result<Self, WcagError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| WcagError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<(), WcagError> {
        if !(1..=100).contains(&self.image_quality) {
            return Err(WcagError::Config(format!(
                "image_quality must be between 1 and 100, got {}",
                self.image_quality
            )));
        }
        if self.max_image_width == 0 {
            return Err(WcagError::Config(
                "max_image_width must be greater than 0".to_string(),
            ));
        }
        if self.wcag_version.trim().is_empty() {
            return Err(WcagError::Config("wcag_version must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, WcagError> {
        toml::to_string_pretty(self).map_err(|e| WcagError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let options = WcagOptions::default();
        assert!(options.add_skip_link);
        assert!(options.enhance_math);
        assert!(options.target_size_minimum);
        assert_eq!(options.image_quality, 85);
        assert_eq!(options.wcag_version, "2.2");
        assert!(options.document_title.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options = WcagOptions::from_toml_str(
            "dark_mode = false\ndocument_title = \"Paper\"\nimage_quality = 70\n",
        )
        .unwrap();

        assert!(!options.dark_mode);
        assert_eq!(options.document_title, "Paper");
        assert_eq!(options.image_quality, 70);
        assert!(options.print_styles);
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let err = WcagOptions::from_toml_str("image_quality = 0").unwrap_err();
        assert!(matches!(err, WcagError::Config(_)));
    }

    #[test]
    fn test_rejects_wrong_type() {
        assert!(WcagOptions::from_toml_str("dark_mode = \"yes\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut options = WcagOptions::default();
        options.reduced_motion = false;
        let text = options.to_toml_string().unwrap();
        assert_eq!(WcagOptions::from_toml_str(&text).unwrap(), options);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wcag.toml");
        fs::write(&path, "use_sections = false\n").unwrap();

        let options = WcagOptions::load(&path).unwrap();
        assert!(!options.use_sections);
    }
}
