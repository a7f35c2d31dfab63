//! Typed environment variables
//!
//! Every variable the crate reads is declared once here with its name,
//! default and description, so parsing and docs stay in one place.

use std::env;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// Accessor for one environment variable
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => match Self::DEFAULT {
                Some(default) => Ok(default),
                None => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Required environment variable not set".to_string(),
                }),
            },
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// Logging and terminal output
pub mod core {
    use super::*;

    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "WCAGIFY_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("warn".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let level = value.trim().to_lowercase();
            match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(level),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // any non-empty value disables color
            Ok(!value.is_empty())
        }
    }
}

/// Enhancer and validator defaults
pub mod wcag {
    use super::*;

    pub struct Strict;
    impl EnvVar<bool> for Strict {
        const NAME: &'static str = "WCAGIFY_STRICT";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str =
            "Count HIGH issues against compliance when validating";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    pub struct ConfigPath;
    impl EnvVar<PathBuf> for ConfigPath {
        const NAME: &'static str = "WCAGIFY_CONFIG";
        const DEFAULT: Option<PathBuf> = None;
        const DESCRIPTION: &'static str = "Path to a TOML file with enhancement options";

        fn parse(value: &str) -> EnvResult<PathBuf> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path must not be empty".to_string(),
                });
            }
            Ok(PathBuf::from(path))
        }
    }

    pub struct WcagVersion;
    impl EnvVar<String> for WcagVersion {
        const NAME: &'static str = "WCAGIFY_WCAG_VERSION";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str =
            "WCAG version named in the stylesheet banner and statement";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("2.2".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let version = value.trim();
            let valid = version.split('.').count() == 2
                && version
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
            if valid {
                Ok(version.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid WCAG version '{}'. Use e.g. 2.1 or 2.2", value),
                })
            }
        }
    }
}

fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

/// Snapshot of every variable the crate reads
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log_level: String,
    pub no_color: bool,
    pub strict: bool,
    pub config_path: Option<PathBuf>,
    pub wcag_version: String,
}

impl EnvConfig {
    /// Read all variables, failing on the first malformed one
    pub fn from_env() -> EnvResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, with values taken from `lookup` instead of the process
    pub fn from_lookup<L>(lookup: L) -> EnvResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = EnvConfig::default();
        let config_path = lookup(wcag::ConfigPath::NAME)
            .map(|value| wcag::ConfigPath::parse(&value))
            .transpose()?;

        Ok(EnvConfig {
            log_level: read::<_, core::LogLevel, _>(&lookup, defaults.log_level)?,
            no_color: read::<_, core::NoColor, _>(&lookup, defaults.no_color)?,
            strict: read::<_, wcag::Strict, _>(&lookup, defaults.strict)?,
            config_path,
            wcag_version: read::<_, wcag::WcagVersion, _>(&lookup, defaults.wcag_version)?,
        })
    }
}

fn read<T, V, L>(lookup: &L, default: T) -> EnvResult<T>
where
    V: EnvVar<T>,
    L: Fn(&str) -> Option<String>,
{
    match lookup(V::NAME) {
        Some(value) => V::parse(&value),
        None => Ok(default),
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            log_level: "warn".to_string(),
            no_color: false,
            strict: false,
            config_path: None,
            wcag_version: "2.2".to_string(),
        }
    }
}

fn doc_line<T: fmt::Debug, V: EnvVar<T>>(docs: &mut String) {
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        V::NAME,
        V::DESCRIPTION,
        V::DEFAULT
    ));
}

/// Markdown reference for all environment variables
pub fn generate_env_docs() -> String {
    let mut docs = String::from("# Environment Variables\n\n");

    docs.push_str("## Output\n\n");
    doc_line::<String, core::LogLevel>(&mut docs);
    doc_line::<bool, core::NoColor>(&mut docs);

    docs.push_str("\n## Enhancement and validation\n\n");
    doc_line::<bool, wcag::Strict>(&mut docs);
    doc_line::<PathBuf, wcag::ConfigPath>(&mut docs);
    doc_line::<String, wcag::WcagVersion>(&mut docs);

    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert_eq!(core::LogLevel::parse(" warn ").unwrap(), "warn");
        assert!(core::LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        for value in ["true", "1", "YES", "on", "enabled"] {
            assert!(wcag::Strict::parse(value).unwrap(), "{value}");
        }
        for value in ["false", "0", "NO", "off", "disabled"] {
            assert!(!wcag::Strict::parse(value).unwrap(), "{value}");
        }
        assert!(wcag::Strict::parse("maybe").is_err());
    }

    #[test]
    fn test_no_color_accepts_any_value() {
        assert!(core::NoColor::parse("1").unwrap());
        assert!(core::NoColor::parse("anything").unwrap());
        assert!(!core::NoColor::parse("").unwrap());
    }

    #[test]
    fn test_wcag_version_validation() {
        assert_eq!(wcag::WcagVersion::parse("2.1").unwrap(), "2.1");
        assert!(wcag::WcagVersion::parse("2").is_err());
        assert!(wcag::WcagVersion::parse("2.x").is_err());
        assert!(wcag::WcagVersion::parse("2.2.1").is_err());
    }

    #[test]
    fn test_config_path_rejects_empty() {
        assert_eq!(
            wcag::ConfigPath::parse("opts.toml").unwrap(),
            PathBuf::from("opts.toml")
        );
        assert!(wcag::ConfigPath::parse("  ").is_err());
    }

    #[test]
    fn test_error_display() {
        let error = wcag::Strict::parse("maybe").unwrap_err();
        assert!(error
            .to_string()
            .starts_with("Environment variable 'WCAGIFY_STRICT': Invalid boolean value 'maybe'"));
    }

    #[test]
    fn test_env_config_loading() {
        let vars: HashMap<&str, &str> = [
            ("WCAGIFY_STRICT", "yes"),
            ("WCAGIFY_WCAG_VERSION", "2.1"),
            ("WCAGIFY_CONFIG", "opts.toml"),
        ]
        .into_iter()
        .collect();

        let config = EnvConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert!(config.strict);
        assert_eq!(config.wcag_version, "2.1");
        assert_eq!(config.config_path, Some(PathBuf::from("opts.toml")));
        assert_eq!(config.log_level, "warn");
        assert!(!config.no_color);
    }

    #[test]
    fn test_env_config_rejects_malformed_values() {
        let config = EnvConfig::from_lookup(|name| {
            (name == "WCAGIFY_STRICT").then(|| "sometimes".to_string())
        });
        let error = config.unwrap_err();
        assert_eq!(error.variable, "WCAGIFY_STRICT");

        assert!(EnvConfig::from_lookup(|name| (name == "WCAGIFY_CONFIG").then(String::new)).is_err());
    }

    #[test]
    fn test_env_config_defaults_when_unset() {
        let config = EnvConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.wcag_version, "2.2");
        assert_eq!(config.config_path, None);
        assert!(!config.strict);
    }

    #[test]
    fn test_generate_env_docs_lists_every_variable() {
        let docs = generate_env_docs();
        for name in [
            "WCAGIFY_LOG_LEVEL",
            "NO_COLOR",
            "WCAGIFY_STRICT",
            "WCAGIFY_CONFIG",
            "WCAGIFY_WCAG_VERSION",
        ] {
            assert!(docs.contains(&format!("`{name}`")), "{name}");
        }
    }
}
